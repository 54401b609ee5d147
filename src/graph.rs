// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Resonance Ledger Simulation Suite - Network Topology

//! Directed network topology stored as an arena of nodes plus adjacency
//! lists. Node indices are stable for the lifetime of the graph and are
//! shared with the parameter and imbalance fields.

use std::collections::HashMap;

use crate::config::ConfigError;
use crate::types::{EdgeAttrs, NodeId};

#[derive(Debug, Clone, Default)]
pub struct NetworkGraph {
    ids: Vec<NodeId>,
    index: HashMap<NodeId, usize>,
    /// Successor indices per node, in edge insertion order.
    successors: Vec<Vec<usize>>,
    edges: HashMap<(usize, usize), EdgeAttrs>,
}

/// Build the id -> index map, rejecting empty and duplicate identifiers.
pub(crate) fn index_nodes(ids: &[NodeId]) -> Result<HashMap<NodeId, usize>, ConfigError> {
    let mut index = HashMap::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        if id.is_empty() {
            return Err(ConfigError::EmptyNodeId);
        }
        if index.insert(id.clone(), i).is_some() {
            return Err(ConfigError::DuplicateNode(id.clone()));
        }
    }
    Ok(index)
}

impl NetworkGraph {
    /// Create a graph with a fixed node set and no edges.
    pub fn new<I, N>(nodes: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = N>,
        N: Into<NodeId>,
    {
        let ids: Vec<NodeId> = nodes.into_iter().map(Into::into).collect();
        let index = index_nodes(&ids)?;
        let successors = vec![Vec::new(); ids.len()];
        Ok(Self { ids, index, successors, edges: HashMap::new() })
    }

    /// Convenience builder: nodes plus `(from, to, latency, fee)` edges.
    pub fn with_edges<N: Into<NodeId>>(
        nodes: impl IntoIterator<Item = N>,
        edges: &[(&str, &str, f64, f64)],
    ) -> Result<Self, ConfigError> {
        let mut graph = Self::new(nodes)?;
        for &(from, to, latency, fee) in edges {
            graph.add_edge(&NodeId::from(from), &NodeId::from(to), EdgeAttrs::new(latency, fee))?;
        }
        Ok(graph)
    }

    /// Insert a directed edge, or replace the attributes of an existing one.
    pub fn add_edge(&mut self, from: &NodeId, to: &NodeId, attrs: EdgeAttrs) -> Result<(), ConfigError> {
        let src = self.require(from)?;
        let dst = self.require(to)?;
        if src == dst {
            return Err(ConfigError::SelfLoop(from.clone()));
        }
        if !attrs.is_valid() {
            return Err(ConfigError::InvalidEdge {
                from: from.clone(),
                to: to.clone(),
                latency: attrs.latency,
                fee: attrs.fee,
            });
        }
        if self.edges.insert((src, dst), attrs).is_none() {
            self.successors[src].push(dst);
        }
        Ok(())
    }

    /// Remove a directed edge, returning its attributes if it existed.
    pub fn remove_edge(&mut self, from: &NodeId, to: &NodeId) -> Option<EdgeAttrs> {
        let src = self.index_of(from)?;
        let dst = self.index_of(to)?;
        let attrs = self.edges.remove(&(src, dst))?;
        self.successors[src].retain(|&s| s != dst);
        Some(attrs)
    }

    /// Remove every edge pointing at `to`. Returns the number removed.
    pub fn remove_inbound(&mut self, to: &NodeId) -> usize {
        let Some(dst) = self.index_of(to) else { return 0 };
        let mut removed = 0;
        for src in 0..self.ids.len() {
            if self.edges.remove(&(src, dst)).is_some() {
                self.successors[src].retain(|&s| s != dst);
                removed += 1;
            }
        }
        removed
    }

    fn require(&self, id: &NodeId) -> Result<usize, ConfigError> {
        self.index_of(id).ok_or_else(|| ConfigError::UnknownNode(id.clone()))
    }

    pub fn len(&self) -> usize { self.ids.len() }
    pub fn is_empty(&self) -> bool { self.ids.is_empty() }
    pub fn edge_count(&self) -> usize { self.edges.len() }
    pub fn node_ids(&self) -> &[NodeId] { &self.ids }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Identifier at `index`. Panics on an out-of-range index.
    pub fn node_id(&self, index: usize) -> &NodeId {
        &self.ids[index]
    }

    /// Direct successors of `index` (outgoing neighbourhood only).
    pub fn successors(&self, index: usize) -> &[usize] {
        &self.successors[index]
    }

    pub fn edge(&self, from: usize, to: usize) -> Option<&EdgeAttrs> {
        self.edges.get(&(from, to))
    }

    pub fn edge_between(&self, from: &NodeId, to: &NodeId) -> Option<&EdgeAttrs> {
        self.edge(self.index_of(from)?, self.index_of(to)?)
    }

    /// Mean latency over all edges; 0.0 for an edgeless graph.
    pub fn mean_latency(&self) -> f64 {
        if self.edges.is_empty() {
            return 0.0;
        }
        self.edges.values().map(|e| e.latency).sum::<f64>() / self.edges.len() as f64
    }

    /// Enumerate loop-free paths from `from` to `to` with at most `max_hops`
    /// edges. Paths come out in depth-first order over successors, which is
    /// edge insertion order. `from == to` yields nothing.
    pub fn simple_paths(&self, from: usize, to: usize, max_hops: usize) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        if from == to || max_hops == 0 || from >= self.len() || to >= self.len() {
            return out;
        }
        let mut visited = vec![false; self.len()];
        let mut path = vec![from];
        visited[from] = true;
        self.walk(to, max_hops, &mut path, &mut visited, &mut out);
        out
    }

    fn walk(
        &self,
        target: usize,
        max_hops: usize,
        path: &mut Vec<usize>,
        visited: &mut [bool],
        out: &mut Vec<Vec<usize>>,
    ) {
        let current = *path.last().unwrap_or(&target);
        for &next in &self.successors[current] {
            if visited[next] {
                continue;
            }
            path.push(next);
            let hops = path.len() - 1;
            if next == target {
                out.push(path.clone());
            } else if hops < max_hops {
                visited[next] = true;
                self.walk(target, max_hops, path, visited, out);
                visited[next] = false;
            }
            path.pop();
        }
    }
}
