// SPDX-License-Identifier: MIT OR Apache-2.0
//! Application error type.

use clustertopo_artifacts::ArtifactError;
use clustertopo_graph::GraphError;

/// Error raised by the command-line pipeline
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// RON input could not be parsed
    #[error("Invalid RON: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// RON output could not be produced
    #[error("RON serialization failed: {0}")]
    RonWrite(#[from] ron::Error),

    /// JSON report could not be produced
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration written by a newer version
    #[error("Config version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Latest supported version
        supported: u32,
    },

    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Graph construction failed
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Chain or face processing failed
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;
