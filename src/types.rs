// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Resonance Ledger Simulation Suite - Shared Types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// Unique node identifier in the resonance network.
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self { NodeId(s) }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self { NodeId(s.to_string()) }
}

// ---------------------------------------------------------------------------
// EdgeAttrs
// ---------------------------------------------------------------------------

/// Attributes carried by a directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeAttrs {
    /// Transit latency, non-negative.
    pub latency: f64,
    /// Transit fee, non-negative.
    pub fee: f64,
}

impl EdgeAttrs {
    pub fn new(latency: f64, fee: f64) -> Self {
        Self { latency, fee }
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.latency.is_finite() && self.fee.is_finite() && self.latency >= 0.0 && self.fee >= 0.0
    }
}

/// One scalar per node, e.g. a gradient or a Laplacian term.
pub type NodeValues = HashMap<NodeId, f64>;

/// Arithmetic mean of a slice; 0.0 when empty.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_display_and_conversions() {
        let a = NodeId::from("A");
        let b = NodeId::from("A".to_string());
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "A");
        assert!(!a.is_empty());
        assert!(NodeId::from("").is_empty());
    }

    #[test]
    fn edge_attrs_reject_negative_and_nan() {
        assert!(EdgeAttrs::new(0.0, 0.0).is_valid());
        assert!(!EdgeAttrs::new(-0.1, 0.0).is_valid());
        assert!(!EdgeAttrs::new(0.1, f64::NAN).is_valid());
    }

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[1.0, 2.0, 3.0]) - 2.0).abs() < 1e-12);
    }
}
