// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Resonance Ledger Simulation Suite - Parameter Field

//! Per-node, per-parameter scalar state.
//!
//! Values are stored densely, one `Vec<f64>` per parameter aligned with the
//! graph's node indices. The field itself enforces no bounds; the update
//! rule does.

use std::collections::HashMap;

use rand::Rng;
use rand_distr::Distribution;

use crate::config::{ConfigError, ParameterConfig};
use crate::distribution::TruncatedGaussian;
use crate::graph::index_nodes;
use crate::types::{mean, NodeId};

/// Dense handle of a parameter inside a [`ParameterField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(pub(crate) usize);

/// One named parameter: its truncated Gaussian plus a value per node.
/// Bounds and sigma are static; the distribution's mean tracks the field.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    distribution: TruncatedGaussian,
    smoothing: f64,
    values: Vec<f64>,
}

impl Parameter {
    fn from_config(cfg: &ParameterConfig, node_count: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            name: cfg.name.clone(),
            distribution: TruncatedGaussian::from_config(cfg)?,
            smoothing: cfg.smoothing,
            values: vec![cfg.mean; node_count],
        })
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn distribution(&self) -> &TruncatedGaussian { &self.distribution }
    pub fn min(&self) -> f64 { self.distribution.min() }
    pub fn max(&self) -> f64 { self.distribution.max() }
    pub fn sigma(&self) -> f64 { self.distribution.std_dev() }
    pub fn smoothing(&self) -> f64 { self.smoothing }
    pub fn values(&self) -> &[f64] { &self.values }

    /// Transient clamp range: 20% beyond each hard bound.
    pub fn soft_bounds(&self) -> (f64, f64) {
        let (min, max) = (self.min(), self.max());
        (min - 0.2 * min, max + 0.2 * max)
    }

    pub fn mean(&self) -> f64 {
        mean(&self.values)
    }
}

#[derive(Debug, Clone)]
pub struct ParameterField {
    nodes: Vec<NodeId>,
    index: HashMap<NodeId, usize>,
    params: Vec<Parameter>,
}

impl ParameterField {
    /// Seed every parameter at its configured mean on every node.
    pub fn new(nodes: &[NodeId], configs: &[ParameterConfig]) -> Result<Self, ConfigError> {
        let index = index_nodes(nodes)?;
        let mut params: Vec<Parameter> = Vec::with_capacity(configs.len());
        for cfg in configs {
            if params.iter().any(|p| p.name == cfg.name) {
                return Err(ConfigError::DuplicateParameter(cfg.name.clone()));
            }
            params.push(Parameter::from_config(cfg, nodes.len())?);
        }
        Ok(Self { nodes: nodes.to_vec(), index, params })
    }

    pub fn node_ids(&self) -> &[NodeId] { &self.nodes }
    pub fn node_count(&self) -> usize { self.nodes.len() }

    pub fn node_index(&self, node: &NodeId) -> Option<usize> {
        self.index.get(node).copied()
    }

    pub fn param_id(&self, name: &str) -> Option<ParamId> {
        self.params.iter().position(|p| p.name == name).map(ParamId)
    }

    pub fn param_ids(&self) -> impl Iterator<Item = ParamId> {
        (0..self.params.len()).map(ParamId)
    }

    pub fn parameter(&self, id: ParamId) -> &Parameter {
        &self.params[id.0]
    }

    pub fn values(&self, id: ParamId) -> &[f64] {
        &self.params[id.0].values
    }

    pub(crate) fn values_mut(&mut self, id: ParamId) -> &mut [f64] {
        &mut self.params[id.0].values
    }

    pub fn mean_of(&self, id: ParamId) -> f64 {
        self.params[id.0].mean()
    }

    fn locate(&self, param: &str, node: &NodeId) -> (usize, usize) {
        let Some(p) = self.param_id(param) else {
            panic!("unknown parameter `{param}`");
        };
        let Some(n) = self.node_index(node) else {
            panic!("unknown node `{node}`");
        };
        (p.0, n)
    }

    /// Value of `param` at `node`. Panics on an unknown parameter or node.
    pub fn get(&self, param: &str, node: &NodeId) -> f64 {
        let (p, n) = self.locate(param, node);
        self.params[p].values[n]
    }

    /// Overwrite `param` at `node` without bound enforcement. Panics on an
    /// unknown parameter or node.
    pub fn set(&mut self, param: &str, node: &NodeId, value: f64) {
        let (p, n) = self.locate(param, node);
        self.params[p].values[n] = value;
    }

    pub fn try_get(&self, param: &str, node: &NodeId) -> Option<f64> {
        let p = self.param_id(param)?;
        let n = self.node_index(node)?;
        Some(self.params[p.0].values[n])
    }

    /// Set `param` to the same value on every node.
    pub fn fill(&mut self, param: &str, value: f64) {
        let Some(p) = self.param_id(param) else {
            panic!("unknown parameter `{param}`");
        };
        self.params[p.0].values.iter_mut().for_each(|v| *v = value);
    }

    /// Arithmetic mean of `param` across nodes. Panics on an unknown parameter.
    pub fn mean(&self, param: &str) -> f64 {
        match self.param_id(param) {
            Some(p) => self.mean_of(p),
            None => panic!("unknown parameter `{param}`"),
        }
    }

    /// Draw a network-wide value of `id` from its distribution.
    pub fn sample<R: Rng + ?Sized>(&self, id: ParamId, rng: &mut R) -> f64 {
        self.params[id.0].distribution.sample(rng)
    }

    /// Re-centre every parameter's distribution on the current field mean.
    pub fn recentre_distributions(&mut self) {
        for p in &mut self.params {
            let m = p.mean();
            p.distribution.set_mean(m);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(ids: &[&str]) -> Vec<NodeId> {
        ids.iter().map(|&s| NodeId::from(s)).collect()
    }

    fn default_field(n: usize) -> ParameterField {
        let ids: Vec<NodeId> = (0..n).map(|i| NodeId(format!("n{i}"))).collect();
        ParameterField::new(&ids, &[ParameterConfig::block_size(), ParameterConfig::fee_rate()])
            .expect("test: field")
    }

    #[test]
    fn mean_equals_seed_before_any_update() {
        for n in [1, 5, 64] {
            let field = default_field(n);
            assert!((field.mean("block_size") - 1.0).abs() < 1e-12);
            assert!((field.mean("fee_rate") - 0.01).abs() < 1e-12);
        }
    }

    #[test]
    fn get_set_round_trip() {
        let mut field = default_field(3);
        let n1 = NodeId::from("n1");
        field.set("fee_rate", &n1, 0.05);
        assert_eq!(field.get("fee_rate", &n1), 0.05);
        assert_eq!(field.get("fee_rate", &NodeId::from("n0")), 0.01);
        assert!((field.mean("fee_rate") - (0.07 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn try_get_reports_unknowns() {
        let field = default_field(2);
        assert!(field.try_get("nope", &NodeId::from("n0")).is_none());
        assert!(field.try_get("fee_rate", &NodeId::from("zz")).is_none());
    }

    #[test]
    #[should_panic(expected = "unknown parameter")]
    fn unknown_parameter_is_fatal() {
        default_field(2).get("latency", &NodeId::from("n0"));
    }

    #[test]
    #[should_panic(expected = "unknown node")]
    fn unknown_node_is_fatal() {
        let mut field = default_field(2);
        field.set("fee_rate", &NodeId::from("ghost"), 1.0);
    }

    #[test]
    fn construction_rejects_bad_parameters() {
        let ids = nodes(&["A", "B"]);
        let mut bad = ParameterConfig::block_size();
        bad.max = 0.1;
        assert!(matches!(
            ParameterField::new(&ids, &[bad]),
            Err(ConfigError::InvalidBounds { .. })
        ));
        assert!(matches!(
            ParameterField::new(&ids, &[ParameterConfig::fee_rate(), ParameterConfig::fee_rate()]),
            Err(ConfigError::DuplicateParameter(_))
        ));
        assert!(matches!(
            ParameterField::new(&nodes(&["A", ""]), &[ParameterConfig::fee_rate()]),
            Err(ConfigError::EmptyNodeId)
        ));
    }

    #[test]
    fn soft_bounds_extend_twenty_percent() {
        let field = default_field(1);
        let id = field.param_id("block_size").expect("test: param");
        let (lo, hi) = field.parameter(id).soft_bounds();
        assert!((lo - 0.4).abs() < 1e-12);
        assert!((hi - 2.4).abs() < 1e-12);
    }

    #[test]
    fn distribution_follows_field_mean_within_bounds() {
        let mut field = default_field(2);
        let id = field.param_id("block_size").expect("test: param");
        assert_eq!(field.parameter(id).distribution().mean(), 1.0);
        assert_eq!(field.parameter(id).sigma(), 0.1);

        field.fill("block_size", 1.5);
        // writes alone do not move the distribution
        assert_eq!(field.parameter(id).distribution().mean(), 1.0);
        field.recentre_distributions();
        assert_eq!(field.parameter(id).distribution().mean(), 1.5);

        field.fill("block_size", 2.3);
        field.recentre_distributions();
        assert_eq!(field.parameter(id).distribution().mean(), 2.0);
    }

    #[test]
    fn samples_respect_hard_bounds() {
        use rand::SeedableRng;
        let field = default_field(3);
        let id = field.param_id("fee_rate").expect("test: param");
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(5);
        for _ in 0..500 {
            let v = field.sample(id, &mut rng);
            assert!((0.001..=0.1).contains(&v), "{v}");
        }
    }

    #[test]
    fn empty_field_mean_is_zero() {
        let field = ParameterField::new(&[], &[ParameterConfig::block_size()]).expect("test: field");
        assert_eq!(field.mean("block_size"), 0.0);
    }
}
