// SPDX-License-Identifier: MIT OR Apache-2.0
//! Planar projection of cluster positions.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// Projection plane settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionSettings {
    /// Plane normal; positions are flattened along it
    pub normal: DVec3,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self { normal: DVec3::Z }
    }
}

impl ProjectionSettings {
    /// Build a projector for these settings
    pub fn projector(&self) -> Projector {
        Projector::new(self.normal)
    }
}

/// Orthonormal in-plane basis for a normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    u: DVec3,
    v: DVec3,
}

impl Projector {
    /// Basis for the plane orthogonal to `normal`
    ///
    /// With a `+Z` normal the basis is `(+X, +Y)`, so counter-clockwise
    /// rings in the XY plane stay counter-clockwise.
    pub fn new(normal: DVec3) -> Self {
        let n = normal.try_normalize().unwrap_or(DVec3::Z);
        let helper = if n.x.abs() < 0.9 { DVec3::X } else { DVec3::Y };
        let u = (helper - n * n.dot(helper)).normalize();
        let v = n.cross(u);
        Self { u, v }
    }

    /// Project one position
    #[inline]
    pub fn project(&self, p: DVec3) -> DVec2 {
        DVec2::new(p.dot(self.u), p.dot(self.v))
    }

    /// Project a list of positions, keeping their order
    pub fn project_all(&self, positions: &[DVec3]) -> Vec<DVec2> {
        positions.iter().map(|&p| self.project(p)).collect()
    }
}
