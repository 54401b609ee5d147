// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Resonance Ledger Simulation Suite - Parameter Distributions

//! Truncated Gaussian model behind each parameter.
//!
//! Every parameter carries a normal distribution cut to its hard bounds. The
//! spread feeds the Hamiltonian's potential well and the uncertainty
//! product; the mean follows the field so fresh draws (block proposals)
//! centre on where the network currently sits.

use std::f64::consts::{PI, SQRT_2};

use rand::Rng;
use rand_distr::Distribution;
use serde::{Deserialize, Serialize};
use statrs::function::erf::{erf, erf_inv};

use crate::config::{ConfigError, ParameterConfig};

#[inline]
fn std_normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / SQRT_2))
}

#[inline]
fn std_normal_pdf(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * PI).sqrt()
}

// ---------------------------------------------------------------------------
// TruncatedGaussian
// ---------------------------------------------------------------------------

/// `N(mean, std_dev^2)` restricted to `[min, max]` and renormalised.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruncatedGaussian {
    mean: f64,
    std_dev: f64,
    min: f64,
    max: f64,
}

impl TruncatedGaussian {
    /// Build from a parameter's config. Same checks as
    /// [`ParameterConfig::validate`].
    pub fn from_config(cfg: &ParameterConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { mean: cfg.mean, std_dev: cfg.sigma, min: cfg.min, max: cfg.max })
    }

    pub fn mean(&self) -> f64 { self.mean }
    pub fn std_dev(&self) -> f64 { self.std_dev }
    pub fn min(&self) -> f64 { self.min }
    pub fn max(&self) -> f64 { self.max }

    /// Move the centre. The value is clamped into the support; a non-finite
    /// value leaves the distribution unchanged.
    pub fn set_mean(&mut self, mean: f64) {
        if mean.is_finite() {
            self.mean = mean.clamp(self.min, self.max);
        }
    }

    /// Untruncated CDF at both bounds.
    fn cdf_bounds(&self) -> (f64, f64) {
        (
            std_normal_cdf((self.min - self.mean) / self.std_dev),
            std_normal_cdf((self.max - self.mean) / self.std_dev),
        )
    }

    /// Probability mass of the untruncated normal inside `[min, max]`.
    pub fn mass(&self) -> f64 {
        let (lo, hi) = self.cdf_bounds();
        hi - lo
    }

    pub fn pdf(&self, x: f64) -> f64 {
        let mass = self.mass();
        if !(self.min..=self.max).contains(&x) || mass <= 0.0 {
            return 0.0;
        }
        std_normal_pdf((x - self.mean) / self.std_dev) / (self.std_dev * mass)
    }

    pub fn cdf(&self, x: f64) -> f64 {
        if x <= self.min {
            return 0.0;
        }
        if x >= self.max {
            return 1.0;
        }
        let (lo, hi) = self.cdf_bounds();
        if hi <= lo {
            return 0.5;
        }
        (std_normal_cdf((x - self.mean) / self.std_dev) - lo) / (hi - lo)
    }
}

/// Inverse-CDF sampling; every draw lands in `[min, max]`.
impl Distribution<f64> for TruncatedGaussian {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let (lo, hi) = self.cdf_bounds();
        let u = lo + (hi - lo) * rng.gen::<f64>();
        let x = self.mean + self.std_dev * SQRT_2 * erf_inv(2.0 * u - 1.0);
        if x.is_nan() {
            return self.mean;
        }
        x.clamp(self.min, self.max)
    }
}

// ---------------------------------------------------------------------------
// UncertaintyRelation
// ---------------------------------------------------------------------------

/// Lower bound on the joint spread of two parameters:
/// `std_dev(a) * std_dev(b) >= constant`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UncertaintyRelation {
    constant: f64,
}

impl UncertaintyRelation {
    pub const fn new(constant: f64) -> Self {
        Self { constant }
    }

    pub fn product(a: &TruncatedGaussian, b: &TruncatedGaussian) -> f64 {
        a.std_dev * b.std_dev
    }

    pub fn holds(&self, product: f64) -> bool {
        product >= self.constant
    }

    pub fn is_satisfied(&self, a: &TruncatedGaussian, b: &TruncatedGaussian) -> bool {
        self.holds(Self::product(a, b))
    }
}
