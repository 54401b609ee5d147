// Transfer Perturbation Model - seedable token transfers between demo nodes
// Each settlement leaks a little quantity; the receiver's share is reported
// to the core as an imbalance perturbation.

use std::collections::HashMap;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use resonance_engine::NodeId;

/// Settlement noise per unit of `amount * fee_mean`.
const NOISE_SCALE: f64 = 0.5;
const AMOUNT_RANGE: (f64, f64) = (1.0, 10.0);

#[derive(Debug, Clone)]
pub struct Transfer {
    pub sender: NodeId,
    pub receiver: NodeId,
    pub amount: f64,
    /// Signed imbalance to apply at the receiver.
    pub perturbation: f64,
}

pub struct TransferModel {
    rng: ChaCha8Rng,
    balances: HashMap<NodeId, f64>,
    pub transfer_count: u64,
}

impl TransferModel {
    pub fn new(rng: ChaCha8Rng, nodes: &[NodeId], initial_balance: f64) -> Self {
        Self {
            rng,
            balances: nodes.iter().map(|n| (n.clone(), initial_balance)).collect(),
            transfer_count: 0,
        }
    }

    /// Uniform amount rounded to cents.
    pub fn sample_amount(&mut self) -> f64 {
        let raw = self.rng.gen_range(AMOUNT_RANGE.0..AMOUNT_RANGE.1);
        (raw * 100.0).round() / 100.0
    }

    /// Move `amount` from sender to receiver with independent noise on each
    /// leg. Returns `None` if either side is unknown.
    pub fn transfer(&mut self, sender: &NodeId, receiver: &NodeId, amount: f64, fee_mean: f64) -> Option<Transfer> {
        if !self.balances.contains_key(sender) || !self.balances.contains_key(receiver) {
            return None;
        }
        let std_dev = amount * fee_mean * NOISE_SCALE;
        let send_noise: f64 = StandardNormal.sample(&mut self.rng);
        let recv_noise: f64 = StandardNormal.sample(&mut self.rng);
        let (send_noise, recv_noise) = (send_noise * std_dev, recv_noise * std_dev);

        if let Some(b) = self.balances.get_mut(sender) {
            *b -= amount + send_noise;
        }
        if let Some(b) = self.balances.get_mut(receiver) {
            *b += amount + recv_noise;
        }
        self.transfer_count += 1;

        Some(Transfer {
            sender: sender.clone(),
            receiver: receiver.clone(),
            amount,
            perturbation: (send_noise + recv_noise) / 2.0,
        })
    }

    pub fn total_balance(&self) -> f64 {
        self.balances.values().sum()
    }
}
