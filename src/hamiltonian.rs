// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Resonance Ledger Simulation Suite - Hamiltonian

//! Network-wide scalar cost.
//!
//! Every term is a function of parameter *means*, never of a single node's
//! value, so the cost is the same wherever it is evaluated:
//!
//! ```text
//! H = w.order      * exp(-0.5 * (avg_p1 - 1.2)^2 / sigma_p1^2)
//!   + w.efficiency * avg_p2
//!   + w.robustness * (max(0, avg_p1 - 1.8)^2 + max(0, 0.6 - avg_p1)^2)
//!   + w.uncertainty_penalty * max(0, 0.005 - sigma_p1 * sigma_p2)^2
//!   + w.imbalance_penalty   * mean(imbalance)^2
//! ```
//!
//! `p1` is the throughput parameter and `p2` the fee parameter. The result
//! is capped at [`H_MAX`].

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::distribution::UncertaintyRelation;
use crate::field::{ParamId, ParameterField};
use crate::imbalance::ImbalanceField;

pub const TARGET_THROUGHPUT: f64 = 1.2;
pub const UPPER_SOFT_THROUGHPUT: f64 = 1.8;
pub const LOWER_SOFT_THROUGHPUT: f64 = 0.6;
pub const TARGET_UNCERTAINTY: f64 = 0.005;
pub const H_MAX: f64 = 1000.0;

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Coefficients of the Hamiltonian terms. Mutated only by the adaptive
/// weight controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HamiltonianWeights {
    /// Gaussian well around the target throughput. Negative = reward.
    pub order: f64,
    /// Linear cost on the mean fee.
    pub efficiency: f64,
    /// Quadratic penalty outside the soft throughput band.
    pub robustness: f64,
    /// Penalty for an uncertainty product below target.
    pub uncertainty_penalty: f64,
    /// Penalty on the squared mean quantity imbalance.
    pub imbalance_penalty: f64,
}

impl Default for HamiltonianWeights {
    fn default() -> Self {
        Self {
            order: -0.4,
            efficiency: 0.2,
            robustness: 0.1,
            uncertainty_penalty: 0.05,
            imbalance_penalty: 0.2,
        }
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Energy {
    /// Capped value, always `<= H_MAX`.
    pub value: f64,
    /// Value before the cap.
    pub raw: f64,
    pub capped: bool,
}

impl Energy {
    fn from_raw(raw: f64) -> Self {
        // NaN compares false and is reported as capped at H_MAX
        if raw <= H_MAX {
            Self { value: raw, raw, capped: false }
        } else {
            Self { value: H_MAX, raw, capped: true }
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Binds the Hamiltonian's throughput and fee roles to parameters of a field.
#[derive(Debug, Clone, Copy)]
pub struct Hamiltonian {
    throughput: ParamId,
    fee: ParamId,
}

impl Hamiltonian {
    pub fn new(field: &ParameterField, throughput: &str, fee: &str) -> Result<Self, ConfigError> {
        if throughput == fee {
            return Err(ConfigError::SharedRole(fee.to_string()));
        }
        let lookup = |name: &str| {
            field.param_id(name).ok_or_else(|| ConfigError::UnknownParameter(name.to_string()))
        };
        Ok(Self { throughput: lookup(throughput)?, fee: lookup(fee)? })
    }

    pub fn throughput(&self) -> ParamId { self.throughput }
    pub fn fee(&self) -> ParamId { self.fee }

    /// Global uncertainty product `sigma_p1 * sigma_p2`.
    pub fn uncertainty_product(&self, field: &ParameterField) -> f64 {
        UncertaintyRelation::product(
            field.parameter(self.throughput).distribution(),
            field.parameter(self.fee).distribution(),
        )
    }

    /// Uncapped cost.
    pub fn raw(&self, field: &ParameterField, imbalance: &ImbalanceField, w: &HamiltonianWeights) -> f64 {
        let avg_p1 = field.mean_of(self.throughput);
        let avg_p2 = field.mean_of(self.fee);
        let sigma_p1 = field.parameter(self.throughput).sigma();

        let order = (-0.5 * (avg_p1 - TARGET_THROUGHPUT).powi(2) / sigma_p1.powi(2)).exp();
        let robustness = (avg_p1 - UPPER_SOFT_THROUGHPUT).max(0.0).powi(2)
            + (LOWER_SOFT_THROUGHPUT - avg_p1).max(0.0).powi(2);
        let uncertainty = (TARGET_UNCERTAINTY - self.uncertainty_product(field)).max(0.0).powi(2);
        let imbalance = imbalance.mean().powi(2);

        w.order * order
            + w.efficiency * avg_p2
            + w.robustness * robustness
            + w.uncertainty_penalty * uncertainty
            + w.imbalance_penalty * imbalance
    }

    /// Capped cost. Pure: reporting a cap event is the caller's job.
    pub fn evaluate(&self, field: &ParameterField, imbalance: &ImbalanceField, w: &HamiltonianWeights) -> Energy {
        Energy::from_raw(self.raw(field, imbalance, w))
    }

    /// Derivative of the uncapped cost with respect to the mean of `param`.
    /// Parameters playing neither role do not enter the cost.
    pub fn mean_derivative(&self, field: &ParameterField, w: &HamiltonianWeights, param: ParamId) -> f64 {
        if param == self.fee {
            return w.efficiency;
        }
        if param != self.throughput {
            return 0.0;
        }
        let m = field.mean_of(self.throughput);
        let s2 = field.parameter(self.throughput).sigma().powi(2);
        let dev = m - TARGET_THROUGHPUT;
        let d_order = (-0.5 * dev * dev / s2).exp() * (-dev / s2);
        let d_robust = 2.0 * (m - UPPER_SOFT_THROUGHPUT).max(0.0) - 2.0 * (LOWER_SOFT_THROUGHPUT - m).max(0.0);
        w.order * d_order + w.robustness * d_robust
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParameterConfig;
    use crate::types::NodeId;

    fn setup(n: usize) -> (ParameterField, ImbalanceField, Hamiltonian) {
        let ids: Vec<NodeId> = (0..n).map(|i| NodeId(format!("n{i}"))).collect();
        let field = ParameterField::new(&ids, &[ParameterConfig::block_size(), ParameterConfig::fee_rate()])
            .expect("test: field");
        let h = Hamiltonian::new(&field, "block_size", "fee_rate").expect("test: hamiltonian");
        (field, ImbalanceField::new(n), h)
    }

    #[test]
    fn reference_value_at_seed() {
        let (field, imb, h) = setup(5);
        let w = HamiltonianWeights::default();
        let energy = h.evaluate(&field, &imb, &w);
        // avg_p1 = 1.0: exp(-0.5 * 0.04 / 0.01) = exp(-2)
        let expected = -0.4 * (-2.0_f64).exp()
            + 0.2 * 0.01
            + 0.05 * (0.005 - 0.1 * 0.005_f64).powi(2);
        assert!((energy.value - expected).abs() < 1e-12, "got {}", energy.value);
        assert!(!energy.capped);
    }

    #[test]
    fn imbalance_term_uses_mean_squared() {
        let (field, mut imb, h) = setup(2);
        let w = HamiltonianWeights { imbalance_penalty: 0.5, ..HamiltonianWeights::default() };
        let base = h.raw(&field, &imb, &w);
        imb.perturb(0, 0.4);
        imb.perturb(1, 0.0);
        // mean = 0.2, term = 0.5 * 0.04
        assert!((h.raw(&field, &imb, &w) - base - 0.02).abs() < 1e-12);
    }

    #[test]
    fn capped_for_extreme_injected_means() {
        let (mut field, imb, h) = setup(4);
        let w = HamiltonianWeights::default();
        for extreme in [50.0, 200.0, 1.0e6, -1.0e6] {
            field.fill("block_size", extreme);
            let e = h.evaluate(&field, &imb, &w);
            assert!(e.value <= H_MAX, "{extreme}: {}", e.value);
        }
        field.fill("block_size", 200.0);
        let e = h.evaluate(&field, &imb, &w);
        assert!(e.capped);
        assert_eq!(e.value, H_MAX);
        assert!(e.raw > H_MAX);
    }

    #[test]
    fn roles_must_resolve() {
        let (field, _, _) = setup(1);
        assert!(matches!(
            Hamiltonian::new(&field, "block_size", "gas"),
            Err(ConfigError::UnknownParameter(_))
        ));
        assert!(matches!(
            Hamiltonian::new(&field, "fee_rate", "fee_rate"),
            Err(ConfigError::SharedRole(_))
        ));
    }

    #[test]
    fn mean_derivative_matches_central_difference() {
        let (mut field, imb, h) = setup(3);
        let w = HamiltonianWeights::default();
        for m in [0.4, 0.9, 1.15, 1.3, 1.95] {
            field.fill("block_size", m);
            let analytic = h.mean_derivative(&field, &w, h.throughput());
            let d = 1e-6;
            field.fill("block_size", m + d);
            let plus = h.raw(&field, &imb, &w);
            field.fill("block_size", m - d);
            let minus = h.raw(&field, &imb, &w);
            field.fill("block_size", m);
            let numeric = (plus - minus) / (2.0 * d);
            assert!((analytic - numeric).abs() < 1e-5, "m={m}: {analytic} vs {numeric}");
        }
    }
}
