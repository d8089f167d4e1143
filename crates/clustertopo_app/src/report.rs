// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON run report.

use crate::error::Result;
use clustertopo_artifacts::{Cell, NodeChain};
use clustertopo_graph::Cluster;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Chain counts for one cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainSummary {
    /// Number of chains kept
    pub count: usize,
    /// Chains with a leaf end
    pub leaf: usize,
    /// Closed loops
    pub closed: usize,
    /// Chains made of one edge
    pub single_edge: usize,
}

impl ChainSummary {
    /// Count chain kinds
    pub fn from_chains(chains: &[NodeChain]) -> Self {
        Self {
            count: chains.len(),
            leaf: chains.iter().filter(|c| c.is_leaf).count(),
            closed: chains.iter().filter(|c| c.is_closed_loop).count(),
            single_edge: chains.iter().filter(|c| c.single_edge.is_some()).count(),
        }
    }
}

/// One output cell, addressed by scene point indices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellReport {
    /// Face the cell came from
    pub face_index: Option<usize>,
    /// Ring of scene point indices
    pub points: Vec<usize>,
    /// Unsigned projected area
    pub area: f64,
    /// Perimeter
    pub perimeter: f64,
    /// Compactness in `[0, 1]`
    pub compactness: f64,
    /// No reflex corner
    pub convex: bool,
}

impl CellReport {
    /// Describe `cell` with point indices taken from `cluster`
    pub fn new(cell: &Cell, cluster: &Cluster) -> Self {
        Self {
            face_index: cell.face_index,
            points: cell.nodes.iter().map(|&n| cluster.node(n).point_index).collect(),
            area: cell.data.area,
            perimeter: cell.data.perimeter,
            compactness: cell.data.compactness,
            convex: cell.data.is_convex,
        }
    }
}

/// Results for one connected component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    /// Position among the kept subgraphs
    pub index: usize,
    /// First source tag found on the cluster's edges
    pub io_index: Option<usize>,
    /// Node count
    pub nodes: usize,
    /// Edge count
    pub edges: usize,
    /// Nodes with one link
    pub leaves: usize,
    /// Nodes with two links
    pub binary: usize,
    /// Nodes with more than two links
    pub complex: usize,
    /// Chain counts
    pub chains: ChainSummary,
    /// Faces of the planar embedding, wrapper included
    pub faces: usize,
    /// Accepted cells
    pub cells: Vec<CellReport>,
    /// Cells that failed a constraint but have a polygon
    pub failed_cells: usize,
    /// Wrapping cell, when it is part of the output
    pub wrapper: Option<CellReport>,
    /// Face index to neighboring face indices
    pub adjacency: IndexMap<usize, Vec<usize>>,
    /// Number of unordered adjacent face pairs
    pub adjacency_pairs: usize,
}

/// Whole-run report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Tool version that produced the report
    pub version: String,
    /// Scene point count
    pub points: usize,
    /// Unique edges after insertion
    pub edges: usize,
    /// Nodes that belong to a kept cluster
    pub valid_nodes: usize,
    /// Per-cluster results
    pub clusters: Vec<ClusterReport>,
}

impl Report {
    /// Total accepted cells
    pub fn total_cells(&self) -> usize {
        self.clusters.iter().map(|c| c.cells.len()).sum()
    }

    /// Total chains
    pub fn total_chains(&self) -> usize {
        self.clusters.iter().map(|c| c.chains.count).sum()
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Log a one-line summary per cluster
    pub fn log_summary(&self) {
        for cluster in &self.clusters {
            tracing::info!(
                "Cluster {}: {} nodes, {} edges, {} chains, {} cells ({} failed), wrapper: {}",
                cluster.index,
                cluster.nodes,
                cluster.edges,
                cluster.chains.count,
                cluster.cells.len(),
                cluster.failed_cells,
                cluster.wrapper.is_some()
            );
        }
        tracing::info!(
            "{} clusters, {} chains, {} cells",
            self.clusters.len(),
            self.total_chains(),
            self.total_cells()
        );
    }
}
