// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Resonance Ledger Simulation Suite - Path-Integral Routing

//! Minimum-action route selection.
//!
//! Every simple path between the endpoints (bounded by `max_hops` edges) is
//! scored with a discrete action
//!
//! ```text
//! S(path) = latency_weight * sum(latency)
//!         + fee_weight * fee_mean * sum(fee)
//!         + length_weight * nodes(path)
//! ```
//!
//! and the smallest action wins. Ties go to the first path enumerated.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigError;
use crate::graph::NetworkGraph;
use crate::types::NodeId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from route selection. Recoverable: the simulation carries on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoutingError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },
    #[error("unknown node `{0}`")]
    UnknownNode(NodeId),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Selected path plus its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub path: Vec<NodeId>,
    pub action: f64,
    /// Number of simple paths that were scored.
    pub candidates: usize,
}

impl Route {
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

// ---------------------------------------------------------------------------
// PathIntegralRouter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathIntegralRouter {
    /// Longest path considered, in edges.
    pub max_hops: usize,
    pub latency_weight: f64,
    pub fee_weight: f64,
    pub length_weight: f64,
}

impl Default for PathIntegralRouter {
    fn default() -> Self {
        Self { max_hops: 5, latency_weight: 2.0, fee_weight: 1.0, length_weight: 0.5 }
    }
}

impl PathIntegralRouter {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_hops == 0 {
            return Err(ConfigError::InvalidSetting { field: "routing.max_hops", value: 0.0 });
        }
        let weights = [
            ("routing.latency_weight", self.latency_weight),
            ("routing.fee_weight", self.fee_weight),
            ("routing.length_weight", self.length_weight),
        ];
        for (field, value) in weights {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigError::InvalidSetting { field, value });
            }
        }
        Ok(())
    }

    /// Action of a path given as node indices. Missing edges contribute nothing.
    pub fn action(&self, graph: &NetworkGraph, path: &[usize], fee_mean: f64) -> f64 {
        let (latency, fee) = path
            .windows(2)
            .filter_map(|hop| graph.edge(hop[0], hop[1]))
            .fold((0.0, 0.0), |(l, f), e| (l + e.latency, f + e.fee));
        self.latency_weight * latency + self.fee_weight * fee_mean * fee + self.length_weight * path.len() as f64
    }

    /// Minimum-action simple path from `from` to `to`.
    pub fn find_route(
        &self,
        graph: &NetworkGraph,
        from: &NodeId,
        to: &NodeId,
        fee_mean: f64,
    ) -> Result<Route, RoutingError> {
        let src = graph.index_of(from).ok_or_else(|| RoutingError::UnknownNode(from.clone()))?;
        let dst = graph.index_of(to).ok_or_else(|| RoutingError::UnknownNode(to.clone()))?;

        let paths = graph.simple_paths(src, dst, self.max_hops);
        let mut best: Option<(usize, f64)> = None;
        for (i, path) in paths.iter().enumerate() {
            let action = self.action(graph, path, fee_mean);
            // strict `<` keeps the first path on ties
            if best.map_or(true, |(_, a)| action < a) {
                best = Some((i, action));
            }
        }

        let (winner, action) = best.ok_or_else(|| RoutingError::NoRoute { from: from.clone(), to: to.clone() })?;
        let route = Route {
            path: paths[winner].iter().map(|&i| graph.node_id(i).clone()).collect(),
            action,
            candidates: paths.len(),
        };
        debug!(%from, %to, action, candidates = route.candidates, hops = route.hops(), "route selected");
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> NetworkGraph {
        NetworkGraph::with_edges(
            ["A", "B", "C"],
            &[("A", "B", 0.1, 0.01), ("B", "C", 0.2, 0.02), ("A", "C", 0.4, 0.03)],
        )
        .expect("test: graph")
    }

    #[test]
    fn direct_edge_beats_two_hop_path() {
        let g = triangle();
        let route = PathIntegralRouter::default()
            .find_route(&g, &NodeId::from("A"), &NodeId::from("C"), 0.01)
            .expect("test: route");
        assert_eq!(route.path, vec![NodeId::from("A"), NodeId::from("C")]);
        assert!((route.action - 1.8003).abs() < 1e-9, "action {}", route.action);
        assert_eq!(route.candidates, 2);

        let via_b = [0, 1, 2];
        let a = PathIntegralRouter::default().action(&g, &via_b, 0.01);
        assert!((a - 2.1003).abs() < 1e-9);
    }

    #[test]
    fn no_route_against_edge_direction() {
        let g = triangle();
        let err = PathIntegralRouter::default()
            .find_route(&g, &NodeId::from("C"), &NodeId::from("A"), 0.01)
            .expect_err("test: no route");
        assert!(matches!(err, RoutingError::NoRoute { .. }));
    }

    #[test]
    fn same_endpoint_is_no_route() {
        let g = triangle();
        let err = PathIntegralRouter::default()
            .find_route(&g, &NodeId::from("A"), &NodeId::from("A"), 0.01)
            .expect_err("test: no route");
        assert!(matches!(err, RoutingError::NoRoute { .. }));
    }

    #[test]
    fn unknown_endpoint() {
        let g = triangle();
        let err = PathIntegralRouter::default()
            .find_route(&g, &NodeId::from("A"), &NodeId::from("Z"), 0.01)
            .expect_err("test: unknown");
        assert_eq!(err, RoutingError::UnknownNode(NodeId::from("Z")));
    }

    #[test]
    fn ties_keep_first_enumerated_path() {
        // two identical two-hop paths; B was inserted first
        let g = NetworkGraph::with_edges(
            ["S", "B", "C", "T"],
            &[("S", "B", 0.1, 0.0), ("S", "C", 0.1, 0.0), ("B", "T", 0.1, 0.0), ("C", "T", 0.1, 0.0)],
        )
        .expect("test: graph");
        let route = PathIntegralRouter::default()
            .find_route(&g, &NodeId::from("S"), &NodeId::from("T"), 0.01)
            .expect("test: route");
        assert_eq!(route.path[1], NodeId::from("B"));
    }

    #[test]
    fn hop_limit_excludes_long_paths() {
        let g = NetworkGraph::with_edges(
            ["A", "B", "C", "D"],
            &[("A", "B", 0.1, 0.0), ("B", "C", 0.1, 0.0), ("C", "D", 0.1, 0.0)],
        )
        .expect("test: graph");
        let router = PathIntegralRouter { max_hops: 2, ..PathIntegralRouter::default() };
        assert!(router.find_route(&g, &NodeId::from("A"), &NodeId::from("D"), 0.0).is_err());
        assert!(PathIntegralRouter::default().find_route(&g, &NodeId::from("A"), &NodeId::from("D"), 0.0).is_ok());
    }

    #[test]
    fn zero_hop_limit_is_invalid() {
        let router = PathIntegralRouter { max_hops: 0, ..PathIntegralRouter::default() };
        assert!(router.validate().is_err());
    }
}
