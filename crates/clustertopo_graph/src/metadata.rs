// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-node and per-edge metadata recorded while a graph is assembled.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a node or edge came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntersectionKind {
    /// No particular origin
    #[default]
    Unknown,
    /// A point landed on an edge and split it
    PointEdge,
    /// Two edges crossed
    EdgeEdge,
    /// Several points were fused into one
    Fusion,
}

/// Metadata attached to a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Node this entry belongs to
    pub node_index: usize,
    /// Number of source points fused into this node
    pub union_size: usize,
    /// Origin of the node
    pub kind: IntersectionKind,
}

impl NodeMetadata {
    /// Create a new entry
    pub fn new(node_index: usize, kind: IntersectionKind) -> Self {
        Self {
            node_index,
            union_size: 0,
            kind,
        }
    }

    /// More than one source point was fused into this node
    pub fn is_union(&self) -> bool {
        self.union_size > 1
    }

    /// The node was created by a point/edge intersection
    pub fn is_intersector(&self) -> bool {
        self.kind == IntersectionKind::PointEdge
    }

    /// The node was created by an edge/edge crossing
    pub fn is_crossing(&self) -> bool {
        self.kind == IntersectionKind::EdgeEdge
    }
}

/// Metadata attached to an edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeMetadata {
    /// Edge this entry belongs to
    pub edge_index: usize,
    /// Edge this one was split from (itself when not split)
    pub root_index: usize,
    /// Origin of the edge
    pub kind: IntersectionKind,
    /// Number of source edges fused into this edge
    pub union_size: usize,
    /// Result of splitting a larger edge
    pub is_sub_edge: bool,
}

impl EdgeMetadata {
    /// Create a new entry; `root_index` defaults to the edge itself
    pub fn new(edge_index: usize, root_index: Option<usize>, kind: IntersectionKind) -> Self {
        Self {
            edge_index,
            root_index: root_index.unwrap_or(edge_index),
            kind,
            union_size: 0,
            is_sub_edge: false,
        }
    }

    /// More than one source edge was fused into this edge
    pub fn is_union(&self) -> bool {
        self.union_size > 1
    }

    /// The edge has not been split from another one
    pub fn is_root(&self) -> bool {
        self.edge_index == self.root_index
    }
}

/// Metadata maps, guarded as a unit by the graph's metadata lock
#[derive(Debug, Default)]
pub struct GraphMetadata {
    /// Node metadata by node index
    pub nodes: HashMap<usize, NodeMetadata>,
    /// Edge metadata by edge index
    pub edges: HashMap<usize, EdgeMetadata>,
}

impl GraphMetadata {
    /// Find or insert node metadata
    pub fn node_entry(&mut self, node_index: usize) -> &mut NodeMetadata {
        self.nodes
            .entry(node_index)
            .or_insert_with(|| NodeMetadata::new(node_index, IntersectionKind::Unknown))
    }

    /// Find or insert edge metadata
    pub fn edge_entry(&mut self, edge_index: usize, root_index: Option<usize>) -> &mut EdgeMetadata {
        self.edges
            .entry(edge_index)
            .or_insert_with(|| EdgeMetadata::new(edge_index, root_index, IntersectionKind::Unknown))
    }

    /// Root of a split edge, if metadata exists for it
    pub fn edge_root(&self, edge_index: usize) -> Option<usize> {
        self.edges.get(&edge_index).map(|m| m.root_index)
    }

    /// Reserve room for upcoming entries
    pub fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional);
        self.edges.reserve(additional);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_root_defaults_to_self() {
        let meta = EdgeMetadata::new(4, None, IntersectionKind::Unknown);
        assert!(meta.is_root());

        let split = EdgeMetadata::new(9, Some(4), IntersectionKind::PointEdge);
        assert!(!split.is_root());
    }

    #[test]
    fn test_entries_are_created_once() {
        let mut meta = GraphMetadata::default();
        meta.node_entry(3).union_size = 4;
        assert_eq!(meta.node_entry(3).union_size, 4);
        assert!(meta.nodes[&3].is_union());

        meta.edge_entry(2, Some(1));
        meta.edge_entry(2, Some(8));
        assert_eq!(meta.edge_root(2), Some(1));
        assert_eq!(meta.edge_root(5), None);
    }
}
