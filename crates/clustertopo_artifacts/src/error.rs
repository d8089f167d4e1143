// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for cluster artifacts.

use clustertopo_graph::GraphError;

/// Error raised while building chains, faces or cells
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactError {
    /// The cluster has no edges to work with
    #[error("Cluster has no edges")]
    ClusterNotBuilt,

    /// Faces must be enumerated before this query
    #[error("Faces have not been enumerated yet")]
    EnumeratorNotBuilt,

    /// Projected positions do not match the node count
    #[error("Projection has {actual} positions, expected {expected}")]
    ProjectionSize {
        /// Number of cluster nodes
        expected: usize,
        /// Number of positions supplied
        actual: usize,
    },

    /// Breakpoint mask does not match the node count
    #[error("Breakpoint mask has {actual} entries, expected {expected}")]
    BreakpointMaskSize {
        /// Number of cluster nodes
        expected: usize,
        /// Number of entries supplied
        actual: usize,
    },

    /// Nothing to write out
    #[error("No chains to process")]
    NoChains,

    /// Underlying graph error
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result type for artifact operations
pub type Result<T> = std::result::Result<T, ArtifactError>;
