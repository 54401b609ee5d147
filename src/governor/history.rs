// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Resonance Ledger Simulation Suite - Performance History

use serde::{Deserialize, Serialize};

/// Number of trailing records the weight controller reads.
pub const WINDOW: usize = 5;

/// Metrics captured once per simulation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub step: u64,
    /// Confirmation-time proxy driven by the mean throughput parameter.
    pub confirmation_time: f64,
    /// Mean edge latency of the topology.
    pub path_latency: f64,
    /// Mean quantity imbalance across nodes.
    pub quantity_imbalance: f64,
    /// Capped Hamiltonian of the post-update state.
    pub hamiltonian: f64,
}

impl PerformanceRecord {
    /// Record carrying only a confirmation time; other metrics zeroed.
    pub fn with_confirmation_time(step: u64, confirmation_time: f64) -> Self {
        Self { step, confirmation_time, path_latency: 0.0, quantity_imbalance: 0.0, hamiltonian: 0.0 }
    }
}

/// Append-only sequence of per-step records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceHistory {
    records: Vec<PerformanceRecord>,
}

impl PerformanceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: PerformanceRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize { self.records.len() }
    pub fn is_empty(&self) -> bool { self.records.is_empty() }
    pub fn records(&self) -> &[PerformanceRecord] { &self.records }
    pub fn latest(&self) -> Option<&PerformanceRecord> { self.records.last() }

    /// The last `n` records, or all of them if fewer exist.
    pub fn window(&self, n: usize) -> &[PerformanceRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// Mean confirmation time over the last `n` records; `None` when empty.
    pub fn mean_confirmation_time(&self, n: usize) -> Option<f64> {
        let window = self.window(n);
        if window.is_empty() {
            return None;
        }
        Some(window.iter().map(|r| r.confirmation_time).sum::<f64>() / window.len() as f64)
    }
}

impl FromIterator<PerformanceRecord> for PerformanceHistory {
    fn from_iter<I: IntoIterator<Item = PerformanceRecord>>(iter: I) -> Self {
        Self { records: iter.into_iter().collect() }
    }
}
