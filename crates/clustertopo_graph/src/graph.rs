// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure owning nodes and deduplicated edges.
//!
//! A [`Graph`] can be filled from many threads at once: node/edge storage
//! sits behind one reader/writer lock and metadata behind another, so
//! metadata writes never stall edge insertion. Every `&self` insertion
//! method has a `_mut` twin taking `&mut self` that skips locking entirely
//! for single-threaded callers.

use crate::edge::Edge;
use crate::hash::{edge_key, h64_split, h64u};
use crate::metadata::{EdgeMetadata, GraphMetadata, NodeMetadata};
use crate::node::Node;
use crate::subgraph::{SubGraph, SubGraphLimits};
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::HashMap;
use std::ops::Range;

/// Error raised by graph and cluster construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Both endpoints of an edge are the same node
    #[error("Self-loop not allowed on node {0}")]
    SelfLoop(usize),

    /// A node index does not exist
    #[error("Node index {index} out of range ({len} nodes)")]
    NodeOutOfRange {
        /// Offending index
        index: usize,
        /// Number of nodes available
        len: usize,
    },

    /// A node index is too wide for a 32-bit edge key
    #[error("Node index {0} does not fit a 32-bit edge key")]
    IndexOverflow(usize),

    /// A cluster needs at least one edge
    #[error("Cluster has no edges")]
    EmptyCluster,

    /// No position was supplied for a point
    #[error("Missing position for point {0}")]
    MissingPosition(usize),
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Node and edge storage guarded by the graph lock
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    unique_edges: HashMap<u64, usize>,
}

impl GraphStore {
    /// All nodes, valid or not
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges, valid or not
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Mutable node access
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Mutable edge access
    pub fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    /// Get a node by index
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Get an edge by index
    pub fn edge(&self, index: usize) -> Option<&Edge> {
        self.edges.get(index)
    }

    /// Look up an edge by its unordered endpoint key
    pub fn find_edge_by_hash(&self, hash: u64) -> Option<&Edge> {
        self.unique_edges.get(&hash).map(|&i| &self.edges[i])
    }

    /// Look up the edge joining `a` and `b`, in either direction
    pub fn find_edge(&self, a: usize, b: usize) -> Option<&Edge> {
        edge_key(a, b).and_then(|hash| self.find_edge_by_hash(hash))
    }

    /// Validate both endpoints and return their edge key
    fn checked_key(&self, a: usize, b: usize) -> Result<u64> {
        if a == b {
            return Err(GraphError::SelfLoop(a));
        }
        let len = self.nodes.len();
        for index in [a, b] {
            if index >= len {
                return Err(GraphError::NodeOutOfRange { index, len });
            }
        }
        edge_key(a, b).ok_or(GraphError::IndexOverflow(a.max(b)))
    }

    fn insert_edge(&mut self, a: usize, b: usize, io_index: Option<usize>) -> Result<(Edge, bool)> {
        let hash = self.checked_key(a, b)?;
        if let Some(&index) = self.unique_edges.get(&hash) {
            return Ok((self.edges[index], false));
        }

        Ok((self.push_edge(hash, a, b, io_index), true))
    }

    fn push_edge(&mut self, hash: u64, a: usize, b: usize, io_index: Option<usize>) -> Edge {
        let index = self.edges.len();
        let edge = Edge::new(index, a, b, io_index);
        self.edges.push(edge);
        self.unique_edges.insert(hash, index);

        self.nodes[a].link(b, index);
        self.nodes[b].link(a, index);

        edge
    }

    fn add_nodes(&mut self, count: usize) -> Range<usize> {
        let start = self.nodes.len();
        let end = start + count;
        self.nodes.reserve(count);
        self.nodes.extend((start..end).map(|i| Node::new(i, i)));
        start..end
    }

    /// Collect nodes reachable from `from` within `depth` hops over valid edges
    pub fn get_connected_nodes(&self, from: usize, out: &mut Vec<usize>, depth: usize) {
        let Some(root) = self.nodes.get(from) else {
            return;
        };
        let next_depth = depth.saturating_sub(1);

        for link in &root.links {
            let edge = &self.edges[link.edge];
            if !edge.valid {
                continue;
            }

            let other = edge.other(from);
            if out.contains(&other) {
                continue;
            }

            out.push(other);
            if next_depth > 0 {
                self.get_connected_nodes(other, out, next_depth);
            }
        }
    }
}

/// A graph of nodes and unique undirected edges
#[derive(Debug, Default)]
pub struct Graph {
    store: RwLock<GraphStore>,
    metadata: RwLock<GraphMetadata>,
    subgraphs: Vec<SubGraph>,
}

impl Graph {
    /// Create a graph with `num_nodes` unlinked nodes
    pub fn new(num_nodes: usize) -> Self {
        let mut store = GraphStore::default();
        store.add_nodes(num_nodes);
        Self {
            store: RwLock::new(store),
            metadata: RwLock::new(GraphMetadata::default()),
            subgraphs: Vec::new(),
        }
    }

    /// Shared access to node and edge storage
    pub fn read(&self) -> RwLockReadGuard<'_, GraphStore> {
        self.store.read()
    }

    /// Exclusive access to node and edge storage
    pub fn store_mut(&mut self) -> &mut GraphStore {
        self.store.get_mut()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.store.read().nodes.len()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.store.read().edges.len()
    }

    /// Get a copy of a node
    pub fn node(&self, index: usize) -> Option<Node> {
        self.store.read().nodes.get(index).cloned()
    }

    /// Get a copy of an edge
    pub fn edge(&self, index: usize) -> Option<Edge> {
        self.store.read().edges.get(index).copied()
    }

    /// Reserve room for upcoming edges
    pub fn reserve_for_edges(&self, additional: usize, reserve_metadata: bool) {
        {
            let mut store = self.store.write();
            store.unique_edges.reserve(additional);
            store.edges.reserve(additional);
        }
        if reserve_metadata {
            self.metadata.write().reserve(additional);
        }
    }

    /// Insert the edge `a`-`b`, or return the existing one
    ///
    /// The boolean is `true` when the edge was newly inserted. Lookups run
    /// under the read lock; only a miss takes the write lock, and the key
    /// is checked again once it is held.
    pub fn insert_edge(&self, a: usize, b: usize, io_index: Option<usize>) -> Result<(Edge, bool)> {
        let hash = {
            let store = self.store.read();
            let hash = store.checked_key(a, b)?;
            if let Some(&index) = store.unique_edges.get(&hash) {
                return Ok((store.edges[index], false));
            }
            hash
        };

        let mut store = self.store.write();
        if let Some(&index) = store.unique_edges.get(&hash) {
            return Ok((store.edges[index], false));
        }
        Ok((store.push_edge(hash, a, b, io_index), true))
    }

    /// Lock-free variant of [`Graph::insert_edge`] for exclusive owners
    pub fn insert_edge_mut(&mut self, a: usize, b: usize, io_index: Option<usize>) -> Result<(Edge, bool)> {
        self.store.get_mut().insert_edge(a, b, io_index)
    }

    /// Insert a batch of edges given as packed `h64` endpoint pairs
    ///
    /// Already-present edges are skipped and never rewritten. The batch is
    /// validated first, so an invalid pair leaves the graph untouched.
    /// Returns the number of newly inserted edges.
    pub fn insert_edges(&self, pairs: &[u64], io_index: Option<usize>) -> Result<usize> {
        let mut store = self.store.write();
        Self::insert_pairs(&mut store, pairs, io_index)
    }

    /// Lock-free variant of [`Graph::insert_edges`]
    pub fn insert_edges_mut(&mut self, pairs: &[u64], io_index: Option<usize>) -> Result<usize> {
        Self::insert_pairs(self.store.get_mut(), pairs, io_index)
    }

    fn insert_pairs(store: &mut GraphStore, pairs: &[u64], io_index: Option<usize>) -> Result<usize> {
        for &pair in pairs {
            let (a, b) = h64_split(pair);
            store.checked_key(a as usize, b as usize)?;
        }

        store.unique_edges.reserve(pairs.len());
        store.edges.reserve(pairs.len());

        let mut inserted = 0;
        for &pair in pairs {
            let (a, b) = h64_split(pair);
            let hash = h64u(a, b);
            if store.unique_edges.contains_key(&hash) {
                continue;
            }
            store.push_edge(hash, a as usize, b as usize, io_index);
            inserted += 1;
        }

        tracing::trace!("Inserted {} of {} edges", inserted, pairs.len());
        Ok(inserted)
    }

    /// Insert a list of edges, keeping each edge's own `io_index`
    ///
    /// Returns the edge count before insertion, i.e. the index of the first
    /// newly inserted edge.
    pub fn insert_edge_list(&self, edges: &[Edge]) -> Result<usize> {
        let mut store = self.store.write();
        for edge in edges {
            store.checked_key(edge.start, edge.end)?;
        }

        let start_index = store.edges.len();
        store.unique_edges.reserve(edges.len());
        store.edges.reserve(edges.len());

        for edge in edges {
            let hash = edge.h64u();
            if store.unique_edges.contains_key(&hash) {
                continue;
            }
            store.push_edge(hash, edge.start, edge.end, edge.io_index);
        }

        Ok(start_index)
    }

    /// Find the edge joining `a` and `b`, in either direction
    pub fn find_edge(&self, a: usize, b: usize) -> Option<Edge> {
        self.store.read().find_edge(a, b).copied()
    }

    /// Find an edge by its unordered endpoint key
    pub fn find_edge_by_hash(&self, hash: u64) -> Option<Edge> {
        self.store.read().find_edge_by_hash(hash).copied()
    }

    /// Append `count` unlinked nodes and return their index range
    ///
    /// Existing indices stay valid.
    pub fn add_nodes(&self, count: usize) -> Range<usize> {
        self.store.write().add_nodes(count)
    }

    /// Get edge metadata, creating it if missing
    pub fn get_or_create_edge_metadata(&self, edge_index: usize, root_index: Option<usize>) -> EdgeMetadata {
        if let Some(meta) = self.metadata.read().edges.get(&edge_index) {
            return *meta;
        }
        *self.metadata.write().edge_entry(edge_index, root_index)
    }

    /// Get node metadata, creating it if missing
    pub fn get_or_create_node_metadata(&self, node_index: usize) -> NodeMetadata {
        if let Some(meta) = self.metadata.read().nodes.get(&node_index) {
            return *meta;
        }
        *self.metadata.write().node_entry(node_index)
    }

    /// Mutate edge metadata in place, creating it if missing
    pub fn update_edge_metadata<R>(
        &self,
        edge_index: usize,
        root_index: Option<usize>,
        f: impl FnOnce(&mut EdgeMetadata) -> R,
    ) -> R {
        f(self.metadata.write().edge_entry(edge_index, root_index))
    }

    /// Mutate node metadata in place, creating it if missing
    pub fn update_node_metadata<R>(&self, node_index: usize, f: impl FnOnce(&mut NodeMetadata) -> R) -> R {
        f(self.metadata.write().node_entry(node_index))
    }

    /// Find edge metadata without creating it
    pub fn find_edge_metadata(&self, edge_index: usize) -> Option<EdgeMetadata> {
        self.metadata.read().edges.get(&edge_index).copied()
    }

    /// Find node metadata without creating it
    pub fn find_node_metadata(&self, node_index: usize) -> Option<NodeMetadata> {
        self.metadata.read().nodes.get(&node_index).copied()
    }

    /// Exclusive access to metadata
    pub fn metadata_mut(&mut self) -> &mut GraphMetadata {
        self.metadata.get_mut()
    }

    /// Subgraphs produced by the last [`Graph::build_subgraphs`] call
    pub fn subgraphs(&self) -> &[SubGraph] {
        &self.subgraphs
    }

    /// Partition the graph into connected components
    ///
    /// Invalid or unlinked nodes are skipped and marked invalid. Components
    /// rejected by `limits` have all their nodes and edges marked invalid;
    /// components without any edge are dropped. Returns the nodes of every
    /// kept component, in discovery order.
    ///
    /// Runs a flood fill over an explicit stack in `O(V + E)`; it must not
    /// overlap with concurrent insertion, hence `&mut self`.
    pub fn build_subgraphs(&mut self, limits: &SubGraphLimits) -> Vec<usize> {
        let store = self.store.get_mut();
        let num_nodes = store.nodes.len();
        let num_edges = store.edges.len();

        let mut visited_nodes = vec![false; num_nodes];
        let mut visited_edges = vec![false; num_edges];
        let mut stack: Vec<usize> = Vec::with_capacity(num_nodes);
        let mut valid_nodes = Vec::with_capacity(num_nodes);

        let mut subgraphs = Vec::new();
        let mut discarded = 0usize;

        for i in 0..num_nodes {
            if visited_nodes[i] {
                continue;
            }

            if !store.nodes[i].valid || store.nodes[i].is_empty() {
                store.nodes[i].valid = false;
                continue;
            }

            stack.clear();
            stack.push(i);
            visited_nodes[i] = true;

            let mut subgraph = SubGraph::default();

            while let Some(node_index) = stack.pop() {
                subgraph.add_node(node_index);
                let mut exported = 0;

                for li in 0..store.nodes[node_index].links.len() {
                    let e = store.nodes[node_index].links[li].edge;
                    if visited_edges[e] {
                        continue;
                    }
                    visited_edges[e] = true;

                    let edge = store.edges[e];
                    if !edge.valid {
                        continue;
                    }

                    let other = edge.other(node_index);
                    if !store.nodes[other].valid {
                        continue;
                    }

                    exported += 1;
                    subgraph.add_edge(&edge);

                    if !visited_nodes[other] {
                        visited_nodes[other] = true;
                        stack.push(other);
                    }
                }

                store.nodes[node_index].num_exported_edges = exported;
            }

            if !limits.is_valid(subgraph.node_count(), subgraph.edge_count()) {
                for &n in subgraph.nodes() {
                    store.nodes[n].valid = false;
                }
                for e in subgraph.edge_indices() {
                    store.edges[e].valid = false;
                }
                discarded += 1;
            } else if subgraph.edge_count() > 0 {
                valid_nodes.extend_from_slice(subgraph.nodes());
                subgraph.shrink();
                subgraphs.push(subgraph);
            }
        }

        tracing::debug!(
            "Built {} subgraphs ({} discarded by limits, {} valid nodes)",
            subgraphs.len(),
            discarded,
            valid_nodes.len()
        );

        self.subgraphs = subgraphs;
        valid_nodes
    }

    /// Collect nodes reachable from `from` within `depth` hops over valid edges
    pub fn get_connected_nodes(&self, from: usize, out: &mut Vec<usize>, depth: usize) {
        self.store.read().get_connected_nodes(from, out, depth);
    }
}
