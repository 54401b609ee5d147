// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Resonance Ledger Simulation Suite - Quantity Imbalance

//! Per-node accumulated deviation from exact quantity conservation.
//!
//! Settlement error arrives from the ledger collaborator as signed
//! perturbations and as per-step noise; the field is then corrected with the
//! same successor Laplacian used for parameters.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::graph::NetworkGraph;
use crate::laplacian::laplacian;
use crate::types::mean;
use crate::update::gaussian;

/// Absolute per-node imbalance below this threshold is considered balanced.
const TOLERANCE: f64 = 0.0001;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ImbalanceField {
    values: Vec<f64>,
}

/// Summary of the field after a correction pass.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ImbalanceSummary {
    pub mean: f64,
    pub max_abs: f64,
    pub balanced: bool,
    /// Nodes pulled back to the saturation limit on this pass.
    #[serde(default)]
    pub saturated: usize,
}

impl ImbalanceField {
    /// All-zero field for `node_count` nodes.
    pub fn new(node_count: usize) -> Self {
        Self { values: vec![0.0; node_count] }
    }

    pub fn values(&self) -> &[f64] { &self.values }

    pub fn get(&self, index: usize) -> f64 {
        self.values[index]
    }

    pub fn mean(&self) -> f64 {
        mean(&self.values)
    }

    pub fn max_abs(&self) -> f64 {
        self.values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    pub fn summary(&self) -> ImbalanceSummary {
        let max_abs = self.max_abs();
        ImbalanceSummary { mean: self.mean(), max_abs, balanced: max_abs < TOLERANCE, saturated: 0 }
    }

    /// Apply a signed perturbation reported for one transfer's receiver.
    pub fn perturb(&mut self, index: usize, delta: f64) {
        self.values[index] += delta;
    }

    /// Add zero-mean Gaussian settlement noise to every node.
    pub fn inject_noise<R: Rng + ?Sized>(&mut self, rng: &mut R, std_dev: f64) {
        for v in &mut self.values {
            *v += gaussian(rng, std_dev);
        }
    }

    /// `imbalance[j] -= factor * laplacian(imbalance)[j]`, all terms read
    /// from the field as it stands before the pass, then [`saturate`] at
    /// `limit`.
    ///
    /// With a positive factor the pass is anti-diffusive and grows without
    /// bound on any cycle, so the limit is what keeps the field finite.
    ///
    /// [`saturate`]: ImbalanceField::saturate
    pub fn apply_correction(&mut self, graph: &NetworkGraph, factor: f64, limit: f64) -> ImbalanceSummary {
        let lap = laplacian(graph, &self.values);
        for (v, l) in self.values.iter_mut().zip(lap) {
            *v -= factor * l;
        }
        let saturated = self.saturate(limit);
        ImbalanceSummary { saturated, ..self.summary() }
    }

    /// Clamp every value into `[-limit, limit]`. NaN resets to zero.
    /// Returns how many nodes were touched.
    pub fn saturate(&mut self, limit: f64) -> usize {
        let mut touched = 0;
        for v in &mut self.values {
            if v.is_nan() {
                *v = 0.0;
                touched += 1;
            } else if v.abs() > limit {
                *v = limit.copysign(*v);
                touched += 1;
            }
        }
        touched
    }
}
