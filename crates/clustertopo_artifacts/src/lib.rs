// SPDX-License-Identifier: MIT OR Apache-2.0
//! Topological artifacts derived from a [`Cluster`](clustertopo_graph::Cluster).
//!
//! - [`NodeChainBuilder`] splits a cluster into maximal simple paths
//! - [`PlanarFaceEnumerator`] recovers the faces of a planar embedding and
//!   turns them into [`Cell`]s
//!
//! Both read the cluster only and dispatch their parallel stages through a
//! [`TaskManager`](clustertopo_graph::TaskManager).

pub mod cell;
pub mod chain;
pub mod chain_helpers;
pub mod error;
pub mod face_enumerator;
pub mod geometry;
pub mod projection;

pub use cell::{AspectFilter, Cell, CellConstraints, CellConstraintsSettings, CellData, CellOutcome, CellResult};
pub use chain::{ChainState, NodeChain, NodeChainBuilder};
pub use error::{ArtifactError, Result};
pub use face_enumerator::{CellAdjacencyMap, FaceEnumeration, HalfEdge, PlanarFaceEnumerator, RawFace};
pub use geometry::{PolygonInfos, Winding};
pub use projection::{ProjectionSettings, Projector};
