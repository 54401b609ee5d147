// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Resonance Ledger Simulation Suite - Stochastic Update Rule

//! Langevin-style parameter update with a two-tier bound policy.
//!
//! ```text
//! new = old - step_size * gradient + smoothing * laplacian + noise
//! noise ~ Normal(0, sqrt(2 * noise_level))
//! ```
//!
//! The proposal is first clamped to the soft bounds, then resolved through
//! [`BoundDecision`].

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::config::Dynamics;
use crate::field::Parameter;

/// Zero-mean Gaussian sample. A zero `std_dev` returns exactly 0.
pub(crate) fn gaussian<R: Rng + ?Sized>(rng: &mut R, std_dev: f64) -> f64 {
    let z: f64 = StandardNormal.sample(rng);
    z * std_dev
}

/// Clamp to `[min - 0.2*min, max + 0.2*max]`.
pub fn soft_clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min - 0.2 * min).min(max + 0.2 * max)
}

// ---------------------------------------------------------------------------
// Bound decision table
// ---------------------------------------------------------------------------

/// How a soft-clamped proposal is committed.
///
/// | case                     | condition                                    | commit        |
/// |--------------------------|----------------------------------------------|---------------|
/// | `WithinBounds`           | `min <= c <= max`                            | `c`           |
/// | `HardExceededDecreasing` | `old > max`, `max < c < old`                 | `c`           |
/// | `SoftExceededIncreasing` | `c` outside `[min, max]` and `c > old`       | hard clamp    |
/// | `HardExceededOther`      | anything else                                | hard clamp    |
///
/// The decreasing case lets an externally forced overshoot decay toward
/// `max` over several steps; it can never raise a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundDecision {
    WithinBounds,
    SoftExceededIncreasing,
    HardExceededDecreasing,
    HardExceededOther,
}

impl BoundDecision {
    pub fn classify(old: f64, candidate: f64, min: f64, max: f64) -> Self {
        if (min..=max).contains(&candidate) {
            Self::WithinBounds
        } else if old > max && candidate > max && candidate < old {
            Self::HardExceededDecreasing
        } else if candidate > old {
            Self::SoftExceededIncreasing
        } else {
            Self::HardExceededOther
        }
    }

    pub fn resolve(self, candidate: f64, min: f64, max: f64) -> f64 {
        match self {
            Self::WithinBounds | Self::HardExceededDecreasing => candidate,
            Self::SoftExceededIncreasing | Self::HardExceededOther => candidate.clamp(min, max),
        }
    }
}

/// Per-step tally of bound decisions, for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionCounts {
    pub within: u32,
    pub soft_increasing: u32,
    pub decaying: u32,
    pub hard_other: u32,
}

impl DecisionCounts {
    pub fn record(&mut self, decision: BoundDecision) {
        match decision {
            BoundDecision::WithinBounds => self.within += 1,
            BoundDecision::SoftExceededIncreasing => self.soft_increasing += 1,
            BoundDecision::HardExceededDecreasing => self.decaying += 1,
            BoundDecision::HardExceededOther => self.hard_other += 1,
        }
    }

    pub fn clamped(&self) -> u32 {
        self.soft_increasing + self.hard_other
    }
}

// ---------------------------------------------------------------------------
// UpdateRule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateRule {
    step_size: f64,
    noise_std: f64,
}

impl Default for UpdateRule {
    fn default() -> Self {
        Self::from_dynamics(&Dynamics::default())
    }
}

impl UpdateRule {
    pub fn new(step_size: f64, noise_level: f64) -> Self {
        Self { step_size, noise_std: (2.0 * noise_level).sqrt() }
    }

    pub fn from_dynamics(d: &Dynamics) -> Self {
        Self { step_size: d.step_size, noise_std: d.noise_std() }
    }

    pub fn step_size(&self) -> f64 { self.step_size }
    pub fn noise_std(&self) -> f64 { self.noise_std }

    pub fn sample_noise<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        gaussian(rng, self.noise_std)
    }

    /// Unbounded proposal.
    pub fn propose(&self, old: f64, gradient: f64, smoothing: f64, laplacian: f64, noise: f64) -> f64 {
        old - self.step_size * gradient + smoothing * laplacian + noise
    }

    /// Soft clamp then resolve through the decision table.
    pub fn bound(&self, old: f64, proposal: f64, param: &Parameter) -> (f64, BoundDecision) {
        let (min, max) = (param.min(), param.max());
        let candidate = soft_clamp(proposal, min, max);
        let decision = BoundDecision::classify(old, candidate, min, max);
        (decision.resolve(candidate, min, max), decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParameterConfig;
    use crate::field::ParameterField;
    use crate::types::NodeId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn block_size() -> ParameterField {
        ParameterField::new(&[NodeId::from("A")], &[ParameterConfig::block_size()]).expect("test: field")
    }

    #[test]
    fn decision_table_cases() {
        // block_size bounds [0.5, 2.0], soft [0.4, 2.4]
        assert_eq!(BoundDecision::classify(1.0, 1.5, 0.5, 2.0), BoundDecision::WithinBounds);
        assert_eq!(BoundDecision::classify(1.9, 2.2, 0.5, 2.0), BoundDecision::SoftExceededIncreasing);
        assert_eq!(BoundDecision::classify(2.4, 2.2, 0.5, 2.0), BoundDecision::HardExceededDecreasing);
        assert_eq!(BoundDecision::classify(2.2, 2.3, 0.5, 2.0), BoundDecision::SoftExceededIncreasing);
        assert_eq!(BoundDecision::classify(0.6, 0.45, 0.5, 2.0), BoundDecision::HardExceededOther);
        // Overshoot collapsing below min is not a decay
        assert_eq!(BoundDecision::classify(2.3, 0.45, 0.5, 2.0), BoundDecision::HardExceededOther);
    }

    #[test]
    fn resolve_commits_or_clamps() {
        assert_eq!(BoundDecision::WithinBounds.resolve(1.5, 0.5, 2.0), 1.5);
        assert_eq!(BoundDecision::HardExceededDecreasing.resolve(2.2, 0.5, 2.0), 2.2);
        assert_eq!(BoundDecision::SoftExceededIncreasing.resolve(2.2, 0.5, 2.0), 2.0);
        assert_eq!(BoundDecision::HardExceededOther.resolve(0.45, 0.5, 2.0), 0.5);
    }

    #[test]
    fn soft_clamp_limits_proposal_first() {
        let field = block_size();
        let p = field.parameter(field.param_id("block_size").expect("test: param"));
        let rule = UpdateRule::default();
        // Forced overshoot at 50.0 decays to the soft ceiling, not to max
        let (v, d) = rule.bound(50.0, 49.0, p);
        assert_eq!(d, BoundDecision::HardExceededDecreasing);
        assert!((v - 2.4).abs() < 1e-12);
        // From inside the bounds a huge jump is hard-clamped
        let (v, d) = rule.bound(1.0, 49.0, p);
        assert_eq!(d, BoundDecision::SoftExceededIncreasing);
        assert_eq!(v, 2.0);
    }

    #[test]
    fn overshoot_never_worsens() {
        let field = block_size();
        let p = field.parameter(field.param_id("block_size").expect("test: param"));
        let rule = UpdateRule::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut value = 2.35;
        for _ in 0..200 {
            let noise = rule.sample_noise(&mut rng);
            let proposal = rule.propose(value, 0.0, 0.0, 0.0, noise);
            let (next, _) = rule.bound(value, proposal, p);
            if value > p.max() {
                assert!(next <= value, "overshoot grew from {value} to {next}");
            } else {
                assert!((p.min()..=p.max()).contains(&next));
            }
            value = next;
        }
    }

    #[test]
    fn propose_combines_terms() {
        let rule = UpdateRule::new(0.01, 0.0);
        let v = rule.propose(1.0, 2.0, 0.1, 0.5, 0.0);
        assert!((v - (1.0 - 0.02 + 0.05)).abs() < 1e-12);
        assert_eq!(rule.noise_std(), 0.0);
    }

    #[test]
    fn decision_counts_tally() {
        let mut c = DecisionCounts::default();
        c.record(BoundDecision::WithinBounds);
        c.record(BoundDecision::HardExceededOther);
        c.record(BoundDecision::SoftExceededIncreasing);
        assert_eq!(c.within, 1);
        assert_eq!(c.clamped(), 2);
    }
}
