// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pipeline configuration.
//!
//! Every knob of the run lives in one RON file. Missing fields fall back to
//! their defaults, so an empty `()` is a valid configuration.

use crate::error::{AppError, Result};
use clustertopo_artifacts::{CellConstraintsSettings, ProjectionSettings};
use clustertopo_graph::{Bounds3, SubGraphLimits};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current configuration format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Which chains to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChainMode {
    /// Every chain of the cluster
    #[default]
    All,
    /// Chains with at least one leaf end
    LeavesOnly,
}

/// Restrict cell building to a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsFilter {
    /// Region of interest
    pub bounds: Bounds3,
    /// Also build faces that do not touch the region
    #[serde(default)]
    pub include_outside: bool,
}

/// Full pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Format version
    pub version: u32,
    /// Component size limits
    pub limits: SubGraphLimits,
    /// Cell constraints
    pub constraints: CellConstraintsSettings,
    /// Plane the clusters are projected on
    pub projection: ProjectionSettings,
    /// Chain selection
    pub chain_mode: ChainMode,
    /// Chains walked per work item
    pub chain_chunk_size: usize,
    /// Worker threads: 0 uses the global pool, 1 runs inline
    pub worker_threads: usize,
    /// Separate the wrapping face from the cells
    pub detect_wrapper: bool,
    /// Optional region filter for cells
    pub bounds_filter: Option<BoundsFilter>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            limits: SubGraphLimits::default(),
            constraints: CellConstraintsSettings::default(),
            projection: ProjectionSettings::default(),
            chain_mode: ChainMode::All,
            chain_chunk_size: clustertopo_artifacts::chain::DEFAULT_CHAIN_CHUNK_SIZE,
            worker_threads: 0,
            detect_wrapper: true,
            bounds_filter: None,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Parse configuration from RON text
    pub fn from_ron(content: &str) -> Result<Self> {
        let config: Self = ron::from_str(content)?;
        if config.version > CONFIG_FORMAT_VERSION {
            return Err(AppError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }
        Ok(config)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clustertopo_artifacts::AspectFilter;
    use glam::DVec3;

    #[test]
    fn test_empty_config_is_default() {
        let config = PipelineConfig::from_ron("()").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert!(config.detect_wrapper);
        assert_eq!(config.chain_chunk_size, 64);
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = PipelineConfig {
            chain_mode: ChainMode::LeavesOnly,
            worker_threads: 4,
            bounds_filter: Some(BoundsFilter {
                bounds: Bounds3::new(DVec3::ZERO, DVec3::ONE),
                include_outside: false,
            }),
            ..Default::default()
        };
        config.constraints.aspect_filter = AspectFilter::ConvexOnly;
        config.constraints.max_area = Some(10.0);
        config.limits.remove_small_clusters = true;

        let text = config.to_ron().unwrap();
        let loaded = PipelineConfig::from_ron(&text).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config() {
        let text = "(chain_mode: LeavesOnly, constraints: (min_area: Some(0.5)))";
        let config = PipelineConfig::from_ron(text).unwrap();

        assert_eq!(config.chain_mode, ChainMode::LeavesOnly);
        assert_eq!(config.constraints.min_area, Some(0.5));
        assert!(config.constraints.keep_cells_with_leaves);
        assert_eq!(config.limits, SubGraphLimits::default());
    }

    #[test]
    fn test_newer_version_rejected() {
        let result = PipelineConfig::from_ron("(version: 99)");
        assert!(matches!(
            result,
            Err(AppError::UnsupportedVersion { found: 99, supported: 1 })
        ));
    }

    #[test]
    fn test_malformed_config() {
        assert!(matches!(
            PipelineConfig::from_ron("(chain_mode: Sometimes)"),
            Err(AppError::RonParse(_))
        ));
    }
}
