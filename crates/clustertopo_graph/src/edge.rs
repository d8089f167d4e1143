// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge definitions for the graph.

use crate::hash::h64u;
use serde::{Deserialize, Serialize};

/// An undirected edge with a fixed start/end for direction queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Index of this edge in the owning edge list
    pub index: usize,
    /// Start node index
    pub start: usize,
    /// End node index
    pub end: usize,
    /// Source collection this edge came from, if any
    pub io_index: Option<usize>,
    /// Invalid edges are kept in place but ignored by traversals
    pub valid: bool,
}

impl Edge {
    /// Create a new valid edge
    pub fn new(index: usize, start: usize, end: usize, io_index: Option<usize>) -> Self {
        Self {
            index,
            start,
            end,
            io_index,
            valid: true,
        }
    }

    /// Endpoint opposite to `node`
    ///
    /// `node` is expected to be one of the endpoints; any other value yields `start`.
    #[inline]
    pub fn other(&self, node: usize) -> usize {
        if node == self.start {
            self.end
        } else {
            self.start
        }
    }

    /// Whether `node` is one of the endpoints
    #[inline]
    pub fn contains(&self, node: usize) -> bool {
        self.start == node || self.end == node
    }

    /// Order-independent key of the two endpoints
    #[inline]
    pub fn h64u(&self) -> u64 {
        h64u(self.start as u32, self.end as u32)
    }
}
