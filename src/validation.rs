// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Resonance Ledger Simulation Suite - Block Admissibility

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::field::ParameterField;
use crate::hamiltonian::Hamiltonian;

pub const DEFAULT_GATE_THRESHOLD: f64 = 0.002;

/// Parameters a proposed block would be produced with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockCandidate {
    pub block_size: f64,
    pub fee_rate: f64,
}

impl BlockCandidate {
    /// Propose a block by drawing each role from its parameter's
    /// truncated Gaussian.
    pub fn sample<R: Rng + ?Sized>(field: &ParameterField, roles: &Hamiltonian, rng: &mut R) -> Self {
        Self {
            block_size: field.sample(roles.throughput(), rng),
            fee_rate: field.sample(roles.fee(), rng),
        }
    }
}

/// Uncertainty-style admissibility check: a block is admitted only if its
/// joint deviation from the network means exceeds the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockGate {
    threshold: f64,
}

impl Default for BlockGate {
    fn default() -> Self {
        Self { threshold: DEFAULT_GATE_THRESHOLD }
    }
}

impl BlockGate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `|block_size - mean| * |fee_rate - mean|` against the current field.
    pub fn deviation_product(&self, field: &ParameterField, roles: &Hamiltonian, block: &BlockCandidate) -> f64 {
        let throughput_dev = (block.block_size - field.mean_of(roles.throughput())).abs();
        let fee_dev = (block.fee_rate - field.mean_of(roles.fee())).abs();
        throughput_dev * fee_dev
    }

    pub fn admits(&self, field: &ParameterField, roles: &Hamiltonian, block: &BlockCandidate) -> bool {
        self.deviation_product(field, roles, block) > self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParameterConfig;
    use crate::types::NodeId;

    fn setup() -> (ParameterField, Hamiltonian) {
        let field = ParameterField::new(
            &[NodeId::from("A"), NodeId::from("B")],
            &[ParameterConfig::block_size(), ParameterConfig::fee_rate()],
        )
        .expect("test: field");
        let h = Hamiltonian::new(&field, "block_size", "fee_rate").expect("test: hamiltonian");
        (field, h)
    }

    #[test]
    fn large_joint_deviation_is_admitted() {
        let (field, h) = setup();
        let gate = BlockGate::default();
        // 0.3 * 0.007 = 0.0021
        assert!(gate.admits(&field, &h, &BlockCandidate { block_size: 1.3, fee_rate: 0.017 }));
    }

    #[test]
    fn small_deviation_is_rejected() {
        let (field, h) = setup();
        let gate = BlockGate::default();
        assert!(!gate.admits(&field, &h, &BlockCandidate { block_size: 1.001, fee_rate: 0.011 }));
        // one factor at zero rejects whatever the other is
        assert!(!gate.admits(&field, &h, &BlockCandidate { block_size: 1.9, fee_rate: 0.01 }));
    }

    #[test]
    fn sampled_blocks_are_mostly_close_to_the_means() {
        use rand::SeedableRng;
        let (field, h) = setup();
        let gate = BlockGate::default();
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(17);
        let blocks: Vec<BlockCandidate> = (0..1000).map(|_| BlockCandidate::sample(&field, &h, &mut rng)).collect();
        assert!(blocks.iter().all(|b| (0.5..=2.0).contains(&b.block_size) && (0.001..=0.1).contains(&b.fee_rate)));
        // typical joint deviation is 0.08 * 0.004, far under the threshold
        let admitted = blocks.iter().filter(|b| gate.admits(&field, &h, b)).count();
        assert!(admitted < 100, "admitted {admitted}");
    }
}
