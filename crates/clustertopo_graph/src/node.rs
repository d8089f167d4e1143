// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph.

use serde::{Deserialize, Serialize};

/// One adjacency entry: the neighbor reached and the edge used to reach it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// Neighbor node index
    pub node: usize,
    /// Edge index joining the owner to `node`
    pub edge: usize,
}

impl Link {
    /// Create a new link
    pub fn new(node: usize, edge: usize) -> Self {
        Self { node, edge }
    }
}

/// A node in a graph or cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Index of this node in the owning node list
    pub index: usize,
    /// Index of the source point this node stands for
    pub point_index: usize,
    /// Invalid nodes are kept in place but ignored by traversals
    pub valid: bool,
    /// Number of edges this node contributed to its subgraph
    pub num_exported_edges: usize,
    /// Adjacency, in insertion order
    pub links: Vec<Link>,
}

impl Node {
    /// Create a new node with no links
    pub fn new(index: usize, point_index: usize) -> Self {
        Self {
            index,
            point_index,
            valid: true,
            num_exported_edges: 0,
            links: Vec::new(),
        }
    }

    /// Number of links
    #[inline]
    pub fn num(&self) -> usize {
        self.links.len()
    }

    /// No links at all
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Exactly one link
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.links.len() == 1
    }

    /// Exactly two links
    #[inline]
    pub fn is_binary(&self) -> bool {
        self.links.len() == 2
    }

    /// More than two links
    #[inline]
    pub fn is_complex(&self) -> bool {
        self.links.len() > 2
    }

    /// Append a link unless an identical one is already present
    pub fn link(&mut self, node: usize, edge: usize) {
        let link = Link::new(node, edge);
        if !self.links.contains(&link) {
            self.links.push(link);
        }
    }

    /// Whether `other` is a direct neighbor
    pub fn is_adjacent_to(&self, other: usize) -> bool {
        self.links.iter().any(|l| l.node == other)
    }

    /// Edge joining this node to `other`, if any
    pub fn edge_index_to(&self, other: usize) -> Option<usize> {
        self.links.iter().find(|l| l.node == other).map(|l| l.edge)
    }
}
