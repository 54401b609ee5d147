// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Resonance Ledger Simulation Suite - Configuration

//! Run configuration. Every field has a default reproducing the reference
//! network (two parameters, five Hamiltonian weights, Langevin dynamics),
//! so a partial JSON document only needs to name what it changes.

use serde::{Deserialize, Serialize};

use crate::governor::adaptive::WeightLimits;
use crate::gradient::{AnalyticalGradient, GradientStrategy, NumericalGradient};
use crate::hamiltonian::HamiltonianWeights;
use crate::routing::PathIntegralRouter;
use crate::types::NodeId;

pub const DEFAULT_THROUGHPUT_PARAM: &str = "block_size";
pub const DEFAULT_FEE_PARAM: &str = "fee_rate";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fatal construction-time errors. Never silently corrected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("node identifier must not be empty")]
    EmptyNodeId,
    #[error("duplicate node identifier `{0}`")]
    DuplicateNode(NodeId),
    #[error("unknown node `{0}`")]
    UnknownNode(NodeId),
    #[error("self-loop on node `{0}` is not allowed")]
    SelfLoop(NodeId),
    #[error("edge {from} -> {to} has invalid attributes (latency {latency}, fee {fee})")]
    InvalidEdge { from: NodeId, to: NodeId, latency: f64, fee: f64 },
    #[error("parameter name must not be empty")]
    EmptyParameterName,
    #[error("duplicate parameter `{0}`")]
    DuplicateParameter(String),
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
    #[error("parameter `{name}` has invalid bounds: min {min} must be below max {max}")]
    InvalidBounds { name: String, min: f64, max: f64 },
    #[error("parameter `{name}` has non-positive sigma {sigma}")]
    NonPositiveSigma { name: String, sigma: f64 },
    #[error("parameter `{name}` smoothing coefficient {value} is outside [0, 1]")]
    InvalidSmoothing { name: String, value: f64 },
    #[error("parameter `{name}` seed value {mean} is outside [{min}, {max}]")]
    SeedOutOfBounds { name: String, mean: f64, min: f64, max: f64 },
    #[error("throughput and fee roles must name different parameters (both `{0}`)")]
    SharedRole(String),
    #[error("invalid setting `{field}`: {value}")]
    InvalidSetting { field: &'static str, value: f64 },
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// ParameterConfig
// ---------------------------------------------------------------------------

/// Static description of one per-node parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterConfig {
    pub name: String,
    /// Seed value assigned to every node.
    pub mean: f64,
    /// Volatility scale used by the Hamiltonian's potential well.
    pub sigma: f64,
    pub min: f64,
    pub max: f64,
    /// Laplacian blending weight in `[0, 1]`.
    pub smoothing: f64,
}

impl ParameterConfig {
    pub fn new(name: &str, mean: f64, sigma: f64, min: f64, max: f64, smoothing: f64) -> Self {
        Self { name: name.to_string(), mean, sigma, min, max, smoothing }
    }

    pub fn block_size() -> Self {
        Self::new(DEFAULT_THROUGHPUT_PARAM, 1.0, 0.1, 0.5, 2.0, 0.1)
    }

    pub fn fee_rate() -> Self {
        Self::new(DEFAULT_FEE_PARAM, 0.01, 0.005, 0.001, 0.1, 0.05)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::EmptyParameterName);
        }
        // `!(a < b)` also rejects NaN bounds
        if !(self.min < self.max) {
            return Err(ConfigError::InvalidBounds { name: self.name.clone(), min: self.min, max: self.max });
        }
        if !(self.sigma > 0.0) || !self.sigma.is_finite() {
            return Err(ConfigError::NonPositiveSigma { name: self.name.clone(), sigma: self.sigma });
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(ConfigError::InvalidSmoothing { name: self.name.clone(), value: self.smoothing });
        }
        if !(self.min..=self.max).contains(&self.mean) {
            return Err(ConfigError::SeedOutOfBounds {
                name: self.name.clone(),
                mean: self.mean,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dynamics
// ---------------------------------------------------------------------------

/// Constants of the stochastic update and of the imbalance model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dynamics {
    /// Gradient-descent step size.
    pub step_size: f64,
    /// Langevin noise level; the noise standard deviation is `sqrt(2 * noise_level)`.
    pub noise_level: f64,
    /// Standard deviation of per-step settlement noise on the imbalance field.
    pub imbalance_noise: f64,
    /// Factor in `imbalance -= correction * laplacian(imbalance)`.
    pub imbalance_correction: f64,
    /// Magnitude at which imbalance values saturate after correction.
    pub imbalance_limit: f64,
    /// Standard deviation of the confirmation-time noise.
    pub confirmation_noise: f64,
    /// Perturbation used by the finite-difference gradient.
    pub finite_difference_delta: f64,
}

impl Default for Dynamics {
    fn default() -> Self {
        Self {
            step_size: 0.01,
            noise_level: 0.05,
            imbalance_noise: 0.01,
            imbalance_correction: 0.1,
            imbalance_limit: 1.0e6,
            confirmation_noise: 0.5,
            finite_difference_delta: 0.001,
        }
    }
}

impl Dynamics {
    /// Deterministic dynamics: every noise source switched off.
    pub fn noiseless() -> Self {
        Self { noise_level: 0.0, imbalance_noise: 0.0, confirmation_noise: 0.0, ..Self::default() }
    }

    pub fn noise_std(&self) -> f64 {
        (2.0 * self.noise_level).sqrt()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("step_size", self.step_size),
            ("noise_level", self.noise_level),
            ("imbalance_noise", self.imbalance_noise),
            ("confirmation_noise", self.confirmation_noise),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigError::InvalidSetting { field, value });
            }
        }
        if !self.imbalance_correction.is_finite() {
            return Err(ConfigError::InvalidSetting {
                field: "imbalance_correction",
                value: self.imbalance_correction,
            });
        }
        let positive = [
            ("imbalance_limit", self.imbalance_limit),
            ("finite_difference_delta", self.finite_difference_delta),
        ];
        for (field, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ConfigError::InvalidSetting { field, value });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GradientKind
// ---------------------------------------------------------------------------

/// Which gradient strategy a deployment runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientKind {
    #[default]
    Numerical,
    Analytical,
}

impl GradientKind {
    pub fn build(self, dynamics: &Dynamics) -> Box<dyn GradientStrategy> {
        match self {
            Self::Numerical => Box::new(NumericalGradient::new(dynamics.finite_difference_delta)),
            Self::Analytical => Box::new(AnalyticalGradient),
        }
    }
}

// ---------------------------------------------------------------------------
// SimulationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed of the run's single random source.
    pub seed: u64,
    pub gradient: GradientKind,
    pub parameters: Vec<ParameterConfig>,
    /// Parameter playing the throughput role in the Hamiltonian.
    pub throughput_param: String,
    /// Parameter playing the fee role in the Hamiltonian and the router.
    pub fee_param: String,
    pub weights: HamiltonianWeights,
    pub weight_limits: WeightLimits,
    pub dynamics: Dynamics,
    pub routing: PathIntegralRouter,
    /// Deviation-product threshold of the block admissibility gate.
    pub block_gate_threshold: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            gradient: GradientKind::default(),
            parameters: vec![ParameterConfig::block_size(), ParameterConfig::fee_rate()],
            throughput_param: DEFAULT_THROUGHPUT_PARAM.to_string(),
            fee_param: DEFAULT_FEE_PARAM.to_string(),
            weights: HamiltonianWeights::default(),
            weight_limits: WeightLimits::default(),
            dynamics: Dynamics::default(),
            routing: PathIntegralRouter::default(),
            block_gate_threshold: 0.002,
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_gradient(mut self, gradient: GradientKind) -> Self {
        self.gradient = gradient;
        self
    }

    pub fn with_dynamics(mut self, dynamics: Dynamics) -> Self {
        self.dynamics = dynamics;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for p in &self.parameters {
            p.validate()?;
            if !seen.insert(p.name.as_str()) {
                return Err(ConfigError::DuplicateParameter(p.name.clone()));
            }
        }
        for role in [&self.throughput_param, &self.fee_param] {
            if !seen.contains(role.as_str()) {
                return Err(ConfigError::UnknownParameter(role.clone()));
            }
        }
        if self.throughput_param == self.fee_param {
            return Err(ConfigError::SharedRole(self.fee_param.clone()));
        }
        self.dynamics.validate()?;
        self.weight_limits.validate()?;
        self.routing.validate()?;
        if !(self.block_gate_threshold >= 0.0) {
            return Err(ConfigError::InvalidSetting {
                field: "block_gate_threshold",
                value: self.block_gate_threshold,
            });
        }
        Ok(())
    }
}
