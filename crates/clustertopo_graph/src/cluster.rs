// SPDX-License-Identifier: MIT OR Apache-2.0
//! Read-only, compactly indexed view over one connected component.
//!
//! A [`Cluster`] renumbers the nodes and edges of a [`SubGraph`] to dense
//! `0..n` ranges, keeps the adjacency pre-linked and stores one position per
//! node. Traversal algorithms never mutate it.

use crate::bounds::Bounds3;
use crate::edge::Edge;
use crate::graph::{Graph, GraphError, Result};
use crate::hash::edge_key;
use crate::node::Node;
use crate::subgraph::SubGraph;
use glam::DVec3;
use std::collections::{BTreeSet, HashMap, HashSet};

/// A compact, immutable graph component with positions
#[derive(Debug, Clone)]
pub struct Cluster {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    positions: Vec<DVec3>,
    point_lookup: HashMap<usize, usize>,
    bounds: Bounds3,
}

impl Cluster {
    /// Build from a subgraph of `graph`
    ///
    /// `positions` is indexed by point index. Nodes are renumbered in
    /// ascending graph order and edges in ascending key order.
    pub fn from_subgraph(graph: &Graph, subgraph: &SubGraph, positions: &[DVec3]) -> Result<Self> {
        if subgraph.edge_count() == 0 {
            return Err(GraphError::EmptyCluster);
        }

        let store = graph.read();
        let mut graph_nodes = subgraph.nodes().to_vec();
        graph_nodes.sort_unstable();

        let mut remap = HashMap::with_capacity(graph_nodes.len());
        let mut points = Vec::with_capacity(graph_nodes.len());
        for (compact, &graph_index) in graph_nodes.iter().enumerate() {
            let node = store.node(graph_index).ok_or(GraphError::NodeOutOfRange {
                index: graph_index,
                len: store.nodes().len(),
            })?;
            remap.insert(graph_index, compact);
            points.push(node.point_index);
        }

        let mut edges = Vec::with_capacity(subgraph.edge_count());
        for key in subgraph.sorted_edges() {
            let Some(edge) = store.edge(key.index) else {
                continue;
            };
            let (Some(&start), Some(&end)) = (remap.get(&edge.start), remap.get(&edge.end)) else {
                continue;
            };
            edges.push((start, end, edge.io_index));
        }

        Self::assemble(points, &edges, positions)
    }

    /// Build directly from point positions and point-index pairs
    ///
    /// Only referenced points become nodes. Duplicate pairs are merged.
    pub fn from_edges(positions: &[DVec3], pairs: &[(usize, usize)]) -> Result<Self> {
        let mut referenced = BTreeSet::new();
        let mut keys = Vec::with_capacity(pairs.len());
        for &(a, b) in pairs {
            if a == b {
                return Err(GraphError::SelfLoop(a));
            }
            keys.push(edge_key(a, b).ok_or(GraphError::IndexOverflow(a.max(b)))?);
            referenced.insert(a);
            referenced.insert(b);
        }
        if referenced.is_empty() {
            return Err(GraphError::EmptyCluster);
        }

        let points: Vec<usize> = referenced.into_iter().collect();
        let remap: HashMap<usize, usize> = points.iter().enumerate().map(|(i, &p)| (p, i)).collect();

        let mut seen = HashSet::with_capacity(pairs.len());
        let mut edges = Vec::with_capacity(pairs.len());
        for (&(a, b), key) in pairs.iter().zip(keys) {
            if seen.insert(key) {
                edges.push((remap[&a], remap[&b], None));
            }
        }

        Self::assemble(points, &edges, positions)
    }

    fn assemble(points: Vec<usize>, edges: &[(usize, usize, Option<usize>)], positions: &[DVec3]) -> Result<Self> {
        let mut nodes = Vec::with_capacity(points.len());
        let mut node_positions = Vec::with_capacity(points.len());
        let mut point_lookup = HashMap::with_capacity(points.len());

        for (index, &point) in points.iter().enumerate() {
            let pos = positions.get(point).ok_or(GraphError::MissingPosition(point))?;
            nodes.push(Node::new(index, point));
            node_positions.push(*pos);
            point_lookup.insert(point, index);
        }

        let mut cluster_edges = Vec::with_capacity(edges.len());
        for (index, &(start, end, io_index)) in edges.iter().enumerate() {
            cluster_edges.push(Edge::new(index, start, end, io_index));
            nodes[start].link(end, index);
            nodes[end].link(start, index);
        }

        let bounds = Bounds3::from_points(node_positions.iter().copied());

        Ok(Self {
            nodes,
            edges: cluster_edges,
            positions: node_positions,
            point_lookup,
            bounds,
        })
    }

    /// All nodes
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Node by compact index
    #[inline]
    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    /// Edge by compact index
    #[inline]
    pub fn edge(&self, index: usize) -> &Edge {
        &self.edges[index]
    }

    /// Number of nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Node-indexed positions
    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }

    /// Position of a node
    #[inline]
    pub fn pos(&self, node: usize) -> DVec3 {
        self.positions[node]
    }

    /// Node standing for a source point
    pub fn node_index_for_point(&self, point: usize) -> Option<usize> {
        self.point_lookup.get(&point).copied()
    }

    /// Bounds of all node positions
    pub fn bounds(&self) -> Bounds3 {
        self.bounds
    }

    /// Length of an edge
    pub fn edge_length(&self, edge: usize) -> f64 {
        let e = &self.edges[edge];
        self.positions[e.start].distance(self.positions[e.end])
    }

    /// Number of nodes with exactly one link
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Number of nodes with exactly two links
    pub fn binary_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_binary()).count()
    }

    /// Number of nodes with more than two links
    pub fn complex_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_complex()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subgraph::SubGraphLimits;

    fn positions(count: usize) -> Vec<DVec3> {
        (0..count).map(|i| DVec3::new(i as f64, 0.0, 0.0)).collect()
    }

    #[test]
    fn test_from_edges_compacts_points() {
        let cluster = Cluster::from_edges(&positions(10), &[(7, 3), (3, 9), (9, 7), (3, 7)]).unwrap();

        assert_eq!(cluster.num_nodes(), 3);
        assert_eq!(cluster.num_edges(), 3);
        assert_eq!(cluster.node_index_for_point(7), Some(1));
        assert_eq!(cluster.node(1).point_index, 7);
        assert_eq!(cluster.pos(2), DVec3::new(9.0, 0.0, 0.0));
        assert_eq!(cluster.binary_count(), 3);
    }

    #[test]
    fn test_from_edges_errors() {
        assert_eq!(
            Cluster::from_edges(&positions(3), &[(1, 1)]).err(),
            Some(GraphError::SelfLoop(1))
        );
        assert_eq!(Cluster::from_edges(&positions(3), &[]).err(), Some(GraphError::EmptyCluster));
        assert_eq!(
            Cluster::from_edges(&positions(3), &[(0, 5)]).err(),
            Some(GraphError::MissingPosition(5))
        );
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_from_edges_rejects_wide_indices() {
        let wide = u32::MAX as usize + 1;
        assert_eq!(
            Cluster::from_edges(&positions(3), &[(0, 1), (2, wide)]).err(),
            Some(GraphError::IndexOverflow(wide))
        );
    }

    #[test]
    fn test_from_subgraph() {
        let mut graph = Graph::new(6);
        for (a, b) in [(4, 5), (5, 3), (0, 1)] {
            graph.insert_edge_mut(a, b, None).unwrap();
        }
        graph.build_subgraphs(&SubGraphLimits::default());

        let subgraph = graph
            .subgraphs()
            .iter()
            .find(|s| s.contains_node(4))
            .unwrap()
            .clone();
        let cluster = subgraph.build_cluster(&graph, &positions(6)).unwrap();

        assert_eq!(cluster.num_nodes(), 3);
        assert_eq!(cluster.num_edges(), 2);
        assert_eq!(cluster.leaf_count(), 2);
        assert_eq!(cluster.node_index_for_point(3), Some(0));
        assert!(cluster.node(cluster.node_index_for_point(5).unwrap()).is_binary());
        assert_eq!(cluster.edge_length(0), 2.0);
        assert_eq!(cluster.bounds().size().x, 2.0);
    }
}
