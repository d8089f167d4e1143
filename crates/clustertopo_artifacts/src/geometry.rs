// SPDX-License-Identifier: MIT OR Apache-2.0
//! Polygon helpers on projected 2D points.
//!
//! Polygons are implicit rings: the last point connects back to the first.
//! Positive signed area means counter-clockwise winding.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Ring orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Winding {
    /// Negative signed area
    Clockwise,
    /// Positive signed area
    #[default]
    CounterClockwise,
}

/// Shoelace signed area
pub fn signed_area(polygon: &[DVec2]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        sum += polygon[i].perp_dot(polygon[(i + 1) % n]);
    }
    sum * 0.5
}

/// Length of the closed ring
pub fn perimeter(polygon: &[DVec2]) -> f64 {
    let n = polygon.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| polygon[i].distance(polygon[(i + 1) % n])).sum()
}

/// Isoperimetric ratio `4πA / P²`, 1 for a circle
pub fn compactness(area: f64, perimeter: f64) -> f64 {
    if perimeter <= f64::EPSILON {
        return 0.0;
    }
    (4.0 * PI * area.abs()) / (perimeter * perimeter)
}

/// Area, winding and shape metrics of a polygon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonInfos {
    /// Absolute area
    pub area: f64,
    /// Ring perimeter
    pub perimeter: f64,
    /// Isoperimetric ratio
    pub compactness: f64,
    /// Signed area is negative
    pub is_clockwise: bool,
}

impl PolygonInfos {
    /// Measure `polygon`
    pub fn new(polygon: &[DVec2]) -> Self {
        let signed = signed_area(polygon);
        let perimeter = perimeter(polygon);
        Self {
            area: signed.abs(),
            perimeter,
            compactness: compactness(signed, perimeter),
            is_clockwise: signed < 0.0,
        }
    }

    /// Ring already has the requested orientation
    pub fn is_winded(&self, winding: Winding) -> bool {
        self.is_clockwise == (winding == Winding::Clockwise)
    }
}

/// Incremental convexity test over consecutive point triples
#[derive(Debug, Clone, Copy)]
pub struct ConvexityTracker {
    sign: i8,
    convex: bool,
}

impl Default for ConvexityTracker {
    fn default() -> Self {
        Self { sign: 0, convex: true }
    }
}

impl ConvexityTracker {
    /// Feed the turn `a -> b -> c`; collinear turns are ignored
    pub fn push(&mut self, a: DVec2, b: DVec2, c: DVec2) {
        if !self.convex {
            return;
        }
        let cross = (b - a).perp_dot(c - b);
        if cross.abs() <= f64::EPSILON {
            return;
        }
        let sign = if cross > 0.0 { 1 } else { -1 };
        if self.sign == 0 {
            self.sign = sign;
        } else if self.sign != sign {
            self.convex = false;
        }
    }

    /// Every turn seen so far bends the same way
    pub fn is_convex(&self) -> bool {
        self.convex
    }
}

/// Crossing-number point-in-polygon test
pub fn is_point_in_polygon(point: DVec2, polygon: &[DVec2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y) {
            let x = pi.x + (point.y - pi.y) * (pj.x - pi.x) / (pj.y - pi.y);
            if point.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// At least one of `points` lies inside `polygon`
pub fn is_any_point_in_polygon(points: &[DVec2], polygon: &[DVec2]) -> bool {
    points.iter().any(|&p| is_point_in_polygon(p, polygon))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<DVec2> {
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_signed_area_winding() {
        let mut square = unit_square();
        assert_eq!(signed_area(&square), 1.0);

        square.reverse();
        let infos = PolygonInfos::new(&square);
        assert_eq!(infos.area, 1.0);
        assert!(infos.is_clockwise);
        assert!(infos.is_winded(Winding::Clockwise));
        assert!(!infos.is_winded(Winding::CounterClockwise));
    }

    #[test]
    fn test_compactness_of_square() {
        let infos = PolygonInfos::new(&unit_square());
        assert_eq!(infos.perimeter, 4.0);
        assert!((infos.compactness - PI / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_convexity() {
        let square = unit_square();
        let mut tracker = ConvexityTracker::default();
        for i in 0..4 {
            tracker.push(square[i], square[(i + 1) % 4], square[(i + 2) % 4]);
        }
        assert!(tracker.is_convex());

        let arrow = [
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 1.0),
            DVec2::new(0.0, 2.0),
            DVec2::new(0.5, 1.0),
        ];
        let mut tracker = ConvexityTracker::default();
        for i in 0..4 {
            tracker.push(arrow[i], arrow[(i + 1) % 4], arrow[(i + 2) % 4]);
        }
        assert!(!tracker.is_convex());
    }

    #[test]
    fn test_point_in_polygon() {
        let square = unit_square();
        assert!(is_point_in_polygon(DVec2::new(0.5, 0.5), &square));
        assert!(!is_point_in_polygon(DVec2::new(1.5, 0.5), &square));
        assert!(is_any_point_in_polygon(&[DVec2::new(5.0, 5.0), DVec2::new(0.2, 0.9)], &square));
        assert!(!is_any_point_in_polygon(&[], &square));
    }
}
