// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Resonance Ledger Simulation Suite - Adaptive Weight Controller

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::history::{PerformanceHistory, WINDOW};
use crate::config::ConfigError;
use crate::distribution::UncertaintyRelation;
use crate::hamiltonian::{HamiltonianWeights, TARGET_UNCERTAINTY};

/// Mean confirmation time above which the network counts as congested.
pub const CONGESTED_ABOVE: f64 = 6.0;
/// Mean confirmation time below which the network counts as underutilized.
pub const UNDERUTILIZED_BELOW: f64 = 4.0;
/// Mean throughput parameter above which the order reward is strengthened.
pub const HIGH_THROUGHPUT_ABOVE: f64 = 1.9;

/// Joint spread below which the uncertainty penalty is raised.
const UNCERTAINTY_FLOOR: UncertaintyRelation = UncertaintyRelation::new(0.8 * TARGET_UNCERTAINTY);

const EFFICIENCY_UP: f64 = 0.01;
const EFFICIENCY_DOWN: f64 = 0.005;
const ORDER_RELAX: f64 = 0.005;
const ORDER_TIGHTEN: f64 = 0.01;
const UNCERTAINTY_STEP: f64 = 0.005;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightRange {
    pub low: f64,
    pub high: f64,
}

impl WeightRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.low, self.high)
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !(self.low <= self.high) || !self.low.is_finite() || !self.high.is_finite() {
            return Err(ConfigError::InvalidSetting { field, value: self.high });
        }
        Ok(())
    }
}

/// Clamp ranges applied after every adaptation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightLimits {
    pub order: WeightRange,
    pub efficiency: WeightRange,
    pub robustness: WeightRange,
    pub uncertainty_penalty: WeightRange,
    pub imbalance_penalty: WeightRange,
}

impl Default for WeightLimits {
    fn default() -> Self {
        Self {
            order: WeightRange::new(-0.5, 0.0),
            efficiency: WeightRange::new(0.0, 0.5),
            robustness: WeightRange::new(0.0, 0.5),
            uncertainty_penalty: WeightRange::new(0.0, 0.1),
            imbalance_penalty: WeightRange::new(0.0, 0.5),
        }
    }
}

impl WeightLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.order.validate("weight_limits.order")?;
        self.efficiency.validate("weight_limits.efficiency")?;
        self.robustness.validate("weight_limits.robustness")?;
        self.uncertainty_penalty.validate("weight_limits.uncertainty_penalty")?;
        self.imbalance_penalty.validate("weight_limits.imbalance_penalty")
    }

    pub fn apply(&self, w: &mut HamiltonianWeights) {
        w.order = self.order.clamp(w.order);
        w.efficiency = self.efficiency.clamp(w.efficiency);
        w.robustness = self.robustness.clamp(w.robustness);
        w.uncertainty_penalty = self.uncertainty_penalty.clamp(w.uncertainty_penalty);
        w.imbalance_penalty = self.imbalance_penalty.clamp(w.imbalance_penalty);
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadRegime {
    Congested,
    Underutilized,
    Nominal,
}

impl LoadRegime {
    pub fn classify(mean_confirmation_time: f64) -> Self {
        if mean_confirmation_time > CONGESTED_ABOVE {
            Self::Congested
        } else if mean_confirmation_time < UNDERUTILIZED_BELOW {
            Self::Underutilized
        } else {
            Self::Nominal
        }
    }
}

/// What the controller observed and which rules fired.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adaptation {
    pub load: LoadRegime,
    pub mean_confirmation_time: f64,
    pub high_block_size: bool,
    pub uncertainty_raised: bool,
}

/// Rule-based feedback on the Hamiltonian weights.
///
/// Reads the last [`WINDOW`] records:
/// - congested: efficiency +0.01, order -0.005
/// - underutilized: efficiency -0.005, order +0.01
/// - mean throughput parameter above 1.9: order -0.01
/// - uncertainty product below 80% of target: uncertainty penalty +0.005
///
/// Every weight is then clamped to its [`WeightLimits`] range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveWeightController {
    limits: WeightLimits,
}

impl AdaptiveWeightController {
    pub fn new(limits: WeightLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &WeightLimits {
        &self.limits
    }

    /// Adjust `weights` in place. No-op on an empty history.
    pub fn adapt(
        &self,
        weights: &mut HamiltonianWeights,
        history: &PerformanceHistory,
        mean_throughput: f64,
        uncertainty_product: f64,
    ) -> Option<Adaptation> {
        let mean_ct = history.mean_confirmation_time(WINDOW)?;
        let load = LoadRegime::classify(mean_ct);
        match load {
            LoadRegime::Congested => {
                weights.efficiency += EFFICIENCY_UP;
                weights.order -= ORDER_RELAX;
            }
            LoadRegime::Underutilized => {
                weights.efficiency -= EFFICIENCY_DOWN;
                weights.order += ORDER_TIGHTEN;
            }
            LoadRegime::Nominal => {}
        }

        let high_block_size = mean_throughput > HIGH_THROUGHPUT_ABOVE;
        if high_block_size {
            weights.order -= ORDER_TIGHTEN;
        }

        let uncertainty_raised = !UNCERTAINTY_FLOOR.holds(uncertainty_product);
        if uncertainty_raised {
            weights.uncertainty_penalty += UNCERTAINTY_STEP;
        }

        self.limits.apply(weights);
        debug!(
            ?load,
            mean_confirmation_time = mean_ct,
            order = weights.order,
            efficiency = weights.efficiency,
            uncertainty_penalty = weights.uncertainty_penalty,
            "weights adapted"
        );
        Some(Adaptation { load, mean_confirmation_time: mean_ct, high_block_size, uncertainty_raised })
    }
}
