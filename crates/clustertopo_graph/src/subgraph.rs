// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connected components extracted from a [`Graph`](crate::Graph).

use crate::cluster::Cluster;
use crate::edge::Edge;
use crate::graph::{Graph, Result};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Size-based acceptance rules for subgraphs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubGraphLimits {
    /// Discard components below the minimum counts
    pub remove_small_clusters: bool,
    /// Minimum node count
    pub min_vtx_count: usize,
    /// Minimum edge count
    pub min_edge_count: usize,
    /// Discard components above the maximum counts
    pub remove_big_clusters: bool,
    /// Maximum node count
    pub max_vtx_count: usize,
    /// Maximum edge count
    pub max_edge_count: usize,
}

impl Default for SubGraphLimits {
    fn default() -> Self {
        Self {
            remove_small_clusters: false,
            min_vtx_count: 3,
            min_edge_count: 3,
            remove_big_clusters: false,
            max_vtx_count: 500,
            max_edge_count: 500,
        }
    }
}

impl SubGraphLimits {
    /// Whether a component of this size is kept
    pub fn is_valid(&self, num_nodes: usize, num_edges: usize) -> bool {
        if self.remove_small_clusters && (num_nodes < self.min_vtx_count || num_edges < self.min_edge_count) {
            return false;
        }
        if self.remove_big_clusters && (num_nodes > self.max_vtx_count || num_edges > self.max_edge_count) {
            return false;
        }
        true
    }
}

/// An edge index paired with its endpoint key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexKey {
    /// Edge index in the owning graph
    pub index: usize,
    /// Order-independent endpoint key
    pub key: u64,
}

/// A connected component: node and edge indices into the owning graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubGraph {
    nodes: Vec<usize>,
    edges: Vec<IndexKey>,
    io_indices: BTreeSet<usize>,
}

impl SubGraph {
    pub(crate) fn add_node(&mut self, node: usize) {
        self.nodes.push(node);
    }

    pub(crate) fn add_edge(&mut self, edge: &Edge) {
        self.edges.push(IndexKey {
            index: edge.index,
            key: edge.h64u(),
        });
        if let Some(io) = edge.io_index {
            self.io_indices.insert(io);
        }
    }

    pub(crate) fn shrink(&mut self) {
        self.nodes.shrink_to_fit();
        self.edges.shrink_to_fit();
    }

    /// Node indices, in discovery order
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    /// Edges with their keys, in discovery order
    pub fn edges(&self) -> &[IndexKey] {
        &self.edges
    }

    /// Edge indices, in discovery order
    pub fn edge_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.edges.iter().map(|e| e.index)
    }

    /// Edges ordered by endpoint key, independent of discovery order
    pub fn sorted_edges(&self) -> Vec<IndexKey> {
        let mut sorted = self.edges.clone();
        sorted.sort_unstable_by_key(|e| e.key);
        sorted
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether `node` belongs to this component
    pub fn contains_node(&self, node: usize) -> bool {
        self.nodes.contains(&node)
    }

    /// Distinct source collections the edges came from
    pub fn io_indices(&self) -> &BTreeSet<usize> {
        &self.io_indices
    }

    /// Lowest source collection index, if any edge carries one
    pub fn first_io_index(&self) -> Option<usize> {
        self.io_indices.first().copied()
    }

    /// Build a compact [`Cluster`] from this component
    ///
    /// `positions` is indexed by the nodes' point index.
    pub fn build_cluster(&self, graph: &Graph, positions: &[DVec3]) -> Result<Cluster> {
        Cluster::from_subgraph(graph, self, positions)
    }
}
