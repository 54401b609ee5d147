// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Resonance Ledger Simulation Suite - Laplacian Smoothing

//! Graph diffusion toward the outgoing neighbourhood.
//!
//! For node `j` the smoothing term is the mean of `values[s] - values[j]`
//! over the direct successors `s` of `j`. Predecessors do not contribute, and
//! a node without successors gets 0.

use crate::graph::NetworkGraph;

/// Smoothing term at a single node.
pub fn laplacian_at(graph: &NetworkGraph, values: &[f64], node: usize) -> f64 {
    let succ = graph.successors(node);
    if succ.is_empty() {
        return 0.0;
    }
    let own = values[node];
    succ.iter().map(|&s| values[s] - own).sum::<f64>() / succ.len() as f64
}

/// Smoothing term for every node, index-aligned with `values`.
pub fn laplacian(graph: &NetworkGraph, values: &[f64]) -> Vec<f64> {
    (0..graph.len()).map(|j| laplacian_at(graph, values, j)).collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_node_has_zero_smoothing() {
        let g = NetworkGraph::with_edges(["A", "B", "C"], &[("A", "B", 0.1, 0.0), ("A", "C", 0.1, 0.0)])
            .expect("test: graph");
        let values = [0.0, 5.0, -3.0];
        assert_eq!(laplacian_at(&g, &values, 1), 0.0);
        assert_eq!(laplacian_at(&g, &values, 2), 0.0);
        assert!((laplacian_at(&g, &values, 0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn predecessors_do_not_pull() {
        // B -> A only: A is a sink even though B points at it
        let g = NetworkGraph::with_edges(["A", "B"], &[("B", "A", 0.1, 0.0)]).expect("test: graph");
        let lap = laplacian(&g, &[10.0, 0.0]);
        assert_eq!(lap[0], 0.0);
        assert!((lap[1] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn repeated_smoothing_shrinks_neighbour_gap() {
        let g = NetworkGraph::with_edges(["B", "C"], &[("B", "C", 0.2, 0.02)]).expect("test: graph");
        let mut values: [f64; 2] = [0.02, 0.08];
        let initial = (values[1] - values[0]).abs();
        let mut last = initial;
        for _ in 0..3 {
            let lap = laplacian(&g, &values);
            values.iter_mut().zip(lap).for_each(|(v, l)| *v += 0.05 * l);
            let gap = (values[1] - values[0]).abs();
            assert!(gap < last, "gap must shrink monotonically: {gap} vs {last}");
            last = gap;
        }
        assert!(last < 0.06);
    }
}
