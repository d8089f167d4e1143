// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph core for `clustertopo`.
//!
//! This crate provides the index-based graph that every topology stage
//! builds on:
//! - Concurrent edge insertion with order-independent deduplication
//! - Connected-component extraction with size limits
//! - Compact, read-only cluster views with positions
//! - A task-group interface for data-parallel dispatch
//!
//! ## Architecture
//!
//! Nodes, edges and their adjacency live in dense arrays addressed by
//! integer indices. Nothing is ever removed: nodes and edges are marked
//! invalid instead, so indices handed out stay stable for the lifetime of
//! the graph.

pub mod bounds;
pub mod cluster;
pub mod edge;
pub mod graph;
pub mod hash;
pub mod metadata;
pub mod node;
pub mod subgraph;
pub mod tasks;

pub use bounds::{Bounds2, Bounds3};
pub use cluster::Cluster;
pub use edge::Edge;
pub use graph::{Graph, GraphError, GraphStore, Result};
pub use hash::{h64, h64_split, h64u};
pub use metadata::{EdgeMetadata, GraphMetadata, IntersectionKind, NodeMetadata};
pub use node::{Link, Node};
pub use subgraph::{IndexKey, SubGraph, SubGraphLimits};
pub use tasks::{GroupCompletion, InlineTaskManager, RayonTaskManager, Scope, TaskGroup, TaskManager};
