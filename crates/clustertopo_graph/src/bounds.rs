// SPDX-License-Identifier: MIT OR Apache-2.0
//! Axis-aligned bounding boxes.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned 3D box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds3 {
    /// Minimum corner
    pub min: DVec3,
    /// Maximum corner
    pub max: DVec3,
}

impl Default for Bounds3 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Bounds3 {
    /// Inverted box that any point will grow
    pub const EMPTY: Self = Self {
        min: DVec3::splat(f64::MAX),
        max: DVec3::splat(f64::MIN),
    };

    /// Create from two corners
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing all `points`
    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Self {
        let mut bounds = Self::EMPTY;
        for p in points {
            bounds.extend(p);
        }
        bounds
    }

    /// Grow to contain `p`
    #[inline]
    pub fn extend(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// At least one point was added
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// Extent along each axis
    pub fn size(&self) -> DVec3 {
        if self.is_valid() {
            self.max - self.min
        } else {
            DVec3::ZERO
        }
    }

    /// Box center
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Grow every side by `amount`
    pub fn expanded(&self, amount: f64) -> Self {
        Self::new(self.min - DVec3::splat(amount), self.max + DVec3::splat(amount))
    }

    /// Boxes overlap or touch
    pub fn intersects(&self, other: &Self) -> bool {
        self.is_valid()
            && other.is_valid()
            && self.min.cmple(other.max).all()
            && other.min.cmple(self.max).all()
    }

    /// `other` lies entirely inside this box
    pub fn contains(&self, other: &Self) -> bool {
        self.min.cmple(other.min).all() && other.max.cmple(self.max).all()
    }

    /// `p` lies inside or on the boundary
    pub fn contains_point(&self, p: DVec3) -> bool {
        self.min.cmple(p).all() && p.cmple(self.max).all()
    }
}

/// Axis-aligned 2D box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds2 {
    /// Minimum corner
    pub min: DVec2,
    /// Maximum corner
    pub max: DVec2,
}

impl Default for Bounds2 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Bounds2 {
    /// Inverted box that any point will grow
    pub const EMPTY: Self = Self {
        min: DVec2::splat(f64::MAX),
        max: DVec2::splat(f64::MIN),
    };

    /// Smallest box containing all `points`
    pub fn from_points(points: impl IntoIterator<Item = DVec2>) -> Self {
        let mut bounds = Self::EMPTY;
        for p in points {
            bounds.extend(p);
        }
        bounds
    }

    /// Grow to contain `p`
    #[inline]
    pub fn extend(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// At least one point was added
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// `p` lies inside or on the boundary
    pub fn contains_point(&self, p: DVec2) -> bool {
        self.min.cmple(p).all() && p.cmple(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bounds() {
        let bounds = Bounds3::default();
        assert!(!bounds.is_valid());
        assert_eq!(bounds.size(), DVec3::ZERO);
        assert!(!bounds.intersects(&Bounds3::new(DVec3::ZERO, DVec3::ONE)));
    }

    #[test]
    fn test_from_points() {
        let bounds = Bounds3::from_points([DVec3::new(1.0, -2.0, 0.0), DVec3::new(-1.0, 3.0, 0.5)]);
        assert_eq!(bounds.min, DVec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.size(), DVec3::new(2.0, 5.0, 0.5));
        assert!(bounds.contains_point(DVec3::new(0.0, 0.0, 0.25)));
    }

    #[test]
    fn test_intersects_and_contains() {
        let a = Bounds3::new(DVec3::ZERO, DVec3::splat(2.0));
        let b = Bounds3::new(DVec3::ONE, DVec3::splat(3.0));
        let c = Bounds3::new(DVec3::splat(5.0), DVec3::splat(6.0));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.expanded(1.0).contains(&b));
    }

    #[test]
    fn test_bounds2_contains() {
        let bounds = Bounds2::from_points([DVec2::ZERO, DVec2::new(4.0, 2.0)]);
        assert!(bounds.contains_point(DVec2::new(4.0, 1.0)));
        assert!(!bounds.contains_point(DVec2::new(4.5, 1.0)));
    }
}
