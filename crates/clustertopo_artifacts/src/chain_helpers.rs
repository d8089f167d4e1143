// SPDX-License-Identifier: MIT OR Apache-2.0
//! Chain post-processing: filtering and writing chains back into a graph.
//!
//! The target [`Graph`] is addressed by point index, so a chain built over a
//! compact [`Cluster`] lands on the same nodes the cluster was made from.

use crate::chain::NodeChain;
use crate::error::{ArtifactError, Result};
use clustertopo_graph::{Cluster, Graph};

/// Keep only chains with a leaf end
pub fn filter_leaves_only(chains: &mut Vec<NodeChain>) {
    chains.retain(|c| c.is_leaf);
}

fn insert_cluster_edge(graph: &Graph, cluster: &Cluster, edge_index: usize) -> Result<bool> {
    let edge = cluster.edge(edge_index);
    let start = cluster.node(edge.start).point_index;
    let end = cluster.node(edge.end).point_index;
    let (_, inserted) = graph.insert_edge(start, end, edge.io_index)?;
    Ok(inserted)
}

/// Insert every edge of every chain into `graph`
///
/// Returns the number of newly inserted edges.
pub fn dump(chains: &[NodeChain], cluster: &Cluster, graph: &Graph) -> Result<usize> {
    if chains.is_empty() {
        return Err(ArtifactError::NoChains);
    }

    let mut inserted = 0;
    for chain in chains {
        for edge in chain.edges() {
            inserted += usize::from(insert_cluster_edge(graph, cluster, edge)?);
        }
    }
    Ok(inserted)
}

/// Insert one edge per open chain, joining its two ends
///
/// Single-edge chains and closed loops are inserted whole. Returns the
/// number of newly inserted edges.
pub fn dump_reduced(chains: &[NodeChain], cluster: &Cluster, graph: &Graph) -> Result<usize> {
    if chains.is_empty() {
        return Err(ArtifactError::NoChains);
    }

    let mut inserted = 0;
    for chain in chains {
        if chain.single_edge.is_some() || chain.is_closed_loop {
            for edge in chain.edges() {
                inserted += usize::from(insert_cluster_edge(graph, cluster, edge)?);
            }
            continue;
        }

        let start = cluster.node(chain.first_node()).point_index;
        let end = cluster.node(chain.last_node()).point_index;
        let io_index = cluster.edge(chain.seed.edge).io_index;
        let (_, new) = graph.insert_edge(start, end, io_index)?;
        inserted += usize::from(new);
    }

    tracing::trace!("Reduced {} chains to {} edges", chains.len(), inserted);
    Ok(inserted)
}
