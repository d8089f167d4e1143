// SPDX-License-Identifier: MIT OR Apache-2.0
//! Input scene: points, the edges joining them, and optional markers.

use crate::error::Result;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A batch of edges sharing one source tag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeSet {
    /// Point index pairs
    pub edges: Vec<(usize, usize)>,
    /// Tag recorded on each inserted edge
    #[serde(default)]
    pub io_index: Option<usize>,
}

/// Scene loaded from RON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Point positions, addressed by point index
    pub positions: Vec<DVec3>,
    /// Untagged edges
    pub edges: Vec<(usize, usize)>,
    /// Tagged edge batches
    pub edge_sets: Vec<EdgeSet>,
    /// Points where chains must stop
    pub breakpoints: Vec<usize>,
    /// Points no cell may contain
    pub holes: Vec<DVec3>,
}

impl Scene {
    /// Load a scene from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Parse a scene from RON text
    pub fn from_ron(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    /// Number of edges across all batches
    pub fn edge_count(&self) -> usize {
        self.edges.len() + self.edge_sets.iter().map(|set| set.edges.len()).sum::<usize>()
    }

    /// Every edge with its tag
    pub fn tagged_edges(&self) -> Vec<(usize, usize, Option<usize>)> {
        let untagged = self.edges.iter().map(|&(a, b)| (a, b, None));
        let tagged = self
            .edge_sets
            .iter()
            .flat_map(|set| set.edges.iter().map(move |&(a, b)| (a, b, set.io_index)));
        untagged.chain(tagged).collect()
    }

    /// Breakpoints as a point-indexed mask, or `None` when there are none
    pub fn breakpoint_mask(&self) -> Option<Vec<bool>> {
        if self.breakpoints.is_empty() {
            return None;
        }
        let mut mask = vec![false; self.positions.len()];
        for &point in &self.breakpoints {
            if let Some(flag) = mask.get_mut(point) {
                *flag = true;
            } else {
                tracing::warn!("Ignoring breakpoint {} past the last point", point);
            }
        }
        Some(mask)
    }
}
