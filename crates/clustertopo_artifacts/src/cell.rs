// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cells: realized face polygons and the constraints they are checked against.

use crate::geometry::{is_any_point_in_polygon, ConvexityTracker, PolygonInfos, Winding};
use clustertopo_graph::hash::mix;
use clustertopo_graph::{Bounds3, Cluster};
use glam::{DVec2, DVec3};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Why a face was or was not turned into a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellResult {
    /// All constraints passed
    Success,
    /// Same ring was already produced
    Duplicate,
    /// Too few nodes, or a leaf while leaves are not kept
    Leaf,
    /// Convexity does not match the aspect filter
    WrongAspect,
    /// Point count outside limits
    OutsidePointsLimit,
    /// Bounds diagonal outside limits
    OutsideBoundsLimit,
    /// A segment length outside limits
    OutsideSegmentsLimit,
    /// Perimeter outside limits
    OutsidePerimeterLimit,
    /// Compactness outside limits
    OutsideCompactnessLimit,
    /// Area outside limits
    OutsideAreaLimit,
    /// Overlaps a hole point
    Hole,
    /// Area matches the wrapper cell
    WrapperCell,
}

/// Convexity filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectFilter {
    /// Keep convex and concave cells
    #[default]
    Both,
    /// Keep convex cells only
    ConvexOnly,
    /// Keep concave cells only
    ConcaveOnly,
}

/// User-facing cell constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellConstraintsSettings {
    /// Winding of output polygons
    pub output_winding: Winding,
    /// Convexity filter
    pub aspect_filter: AspectFilter,
    /// Keep cells whose boundary runs along dead ends
    pub keep_cells_with_leaves: bool,
    /// Emit dead-end nodes twice in the cell node list
    pub duplicate_leaf_points: bool,
    /// Exclude the wrapper face from the output cells
    pub omit_wrapping_bounds: bool,
    /// Cells whose area is this close to the wrapper's are classified as wrapper (0 disables)
    pub wrapper_classification_tolerance: f64,
    /// Output the wrapper anyway when no other cell survived
    pub keep_wrapper_if_sole: bool,
    /// Minimum node count
    pub min_point_count: Option<usize>,
    /// Maximum node count
    pub max_point_count: Option<usize>,
    /// Minimum bounds diagonal
    pub min_bounds_size: Option<f64>,
    /// Maximum bounds diagonal
    pub max_bounds_size: Option<f64>,
    /// Minimum area
    pub min_area: Option<f64>,
    /// Maximum area
    pub max_area: Option<f64>,
    /// Minimum perimeter
    pub min_perimeter: Option<f64>,
    /// Maximum perimeter
    pub max_perimeter: Option<f64>,
    /// Minimum segment length
    pub min_segment_length: Option<f64>,
    /// Maximum segment length
    pub max_segment_length: Option<f64>,
    /// Minimum compactness
    pub min_compactness: Option<f64>,
    /// Maximum compactness
    pub max_compactness: Option<f64>,
}

impl Default for CellConstraintsSettings {
    fn default() -> Self {
        Self {
            output_winding: Winding::CounterClockwise,
            aspect_filter: AspectFilter::Both,
            keep_cells_with_leaves: true,
            duplicate_leaf_points: false,
            omit_wrapping_bounds: true,
            wrapper_classification_tolerance: 0.1,
            keep_wrapper_if_sole: true,
            min_point_count: None,
            max_point_count: None,
            min_bounds_size: None,
            max_bounds_size: None,
            min_area: None,
            max_area: None,
            min_perimeter: None,
            max_perimeter: None,
            min_segment_length: None,
            max_segment_length: None,
            min_compactness: None,
            max_compactness: None,
        }
    }
}

fn within<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    if min.is_some_and(|m| value < m) {
        return false;
    }
    !max.is_some_and(|m| value > m)
}

/// Constraints shared by every cell of one or more enumerations
///
/// Holds the set of ring hashes produced so far and the wrapper cell, both
/// behind reader/writer locks so cells can be built in parallel.
#[derive(Debug, Default)]
pub struct CellConstraints {
    settings: CellConstraintsSettings,
    unique_hashes: RwLock<HashSet<u64>>,
    wrapper: RwLock<Option<Arc<Cell>>>,
    holes: Vec<DVec2>,
}

impl CellConstraints {
    /// Create constraints from settings
    pub fn new(settings: CellConstraintsSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Reject cells containing any of these projected points
    pub fn with_holes(mut self, holes: Vec<DVec2>) -> Self {
        self.holes = holes;
        self
    }

    /// Settings in use
    pub fn settings(&self) -> &CellConstraintsSettings {
        &self.settings
    }

    /// Projected hole points
    pub fn holes(&self) -> &[DVec2] {
        &self.holes
    }

    /// Record `hash`, returning `false` if it was already recorded
    pub fn is_unique_cell_hash(&self, hash: u64) -> bool {
        if self.unique_hashes.read().contains(&hash) {
            return false;
        }
        self.unique_hashes.write().insert(hash)
    }

    /// Current wrapper cell
    pub fn wrapper_cell(&self) -> Option<Arc<Cell>> {
        self.wrapper.read().clone()
    }

    /// Replace the wrapper cell
    pub fn set_wrapper_cell(&self, cell: Option<Arc<Cell>>) {
        *self.wrapper.write() = cell;
    }

    /// Forget recorded hashes and the wrapper cell
    pub fn reset(&self) {
        self.unique_hashes.write().clear();
        *self.wrapper.write() = None;
    }
}

/// Measurements of a cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellData {
    /// Bounds of the node positions
    pub bounds: Bounds3,
    /// Mean node position
    pub centroid: DVec3,
    /// Absolute projected area
    pub area: f64,
    /// Perimeter measured on the original positions
    pub perimeter: f64,
    /// Isoperimetric ratio of the projected polygon
    pub compactness: f64,
    /// Projected ring was clockwise before winding normalisation
    pub is_clockwise: bool,
    /// No reflex turn along the ring
    pub is_convex: bool,
    /// Ring closes on itself
    pub is_closed_loop: bool,
}

impl Default for CellData {
    fn default() -> Self {
        Self {
            bounds: Bounds3::EMPTY,
            centroid: DVec3::ZERO,
            area: 0.0,
            perimeter: 0.0,
            compactness: 0.0,
            is_clockwise: false,
            is_convex: true,
            is_closed_loop: false,
        }
    }
}

/// A realized face
#[derive(Debug, Clone, Default)]
pub struct Cell {
    /// Ring of cluster node indices
    pub nodes: Vec<usize>,
    /// Projected ring, parallel to `nodes`
    pub polygon: Vec<DVec2>,
    /// Measurements
    pub data: CellData,
    /// Face this cell was built from
    pub face_index: Option<usize>,
    /// Orientation-aware identity of the ring
    pub hash: u64,
}

/// Outcome of building a cell from a face
#[derive(Debug, Clone)]
pub enum CellOutcome {
    /// All constraints passed
    Accepted(Cell),
    /// Failed a constraint after the polygon was built; usable for containment tests
    Usable(Cell, CellResult),
    /// Failed before a polygon existed
    Rejected(CellResult),
}

impl CellOutcome {
    /// Detailed result code
    pub fn result(&self) -> CellResult {
        match self {
            Self::Accepted(_) => CellResult::Success,
            Self::Usable(_, result) | Self::Rejected(result) => *result,
        }
    }

    /// Built cell, accepted or not
    pub fn cell(&self) -> Option<&Cell> {
        match self {
            Self::Accepted(cell) | Self::Usable(cell, _) => Some(cell),
            Self::Rejected(_) => None,
        }
    }

    /// Whether every constraint passed
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Hash of a ring rotated to start at its smallest node
fn ring_hash(nodes: &[usize]) -> u64 {
    nodes.iter().fold(nodes.len() as u64, |h, &n| mix(h, n as u64))
}

impl Cell {
    /// Build and validate a cell from a face ring
    ///
    /// `projected` is node-indexed. Checks run in a fixed order and the
    /// first failure wins.
    pub fn build_from_face(
        face: &[usize],
        face_index: Option<usize>,
        cluster: &Cluster,
        projected: &[DVec2],
        constraints: &CellConstraints,
    ) -> CellOutcome {
        use CellOutcome::{Accepted, Rejected, Usable};

        let settings = &constraints.settings;
        let n = face.len();
        if n < 3 {
            return Rejected(CellResult::Leaf);
        }
        if !within(n, settings.min_point_count, settings.max_point_count) {
            return Rejected(CellResult::OutsidePointsLimit);
        }

        let mut nodes = Vec::with_capacity(n * 2);
        let mut data = CellData::default();
        let mut convexity = ConvexityTracker::default();
        let mut perimeter = 0.0;
        let mut prev = cluster.pos(face[n - 1]);

        for i in 0..n {
            let node_index = face[i];
            let is_leaf = cluster.node(node_index).is_leaf();
            if is_leaf && !settings.keep_cells_with_leaves {
                return Rejected(CellResult::Leaf);
            }

            nodes.push(node_index);
            if is_leaf && settings.duplicate_leaf_points {
                nodes.push(node_index);
            }

            let pos = cluster.pos(node_index);
            data.bounds.extend(pos);
            data.centroid += pos;

            let segment = prev.distance(pos);
            perimeter += segment;
            prev = pos;
            if !within(segment, settings.min_segment_length, settings.max_segment_length) {
                return Rejected(CellResult::OutsideSegmentsLimit);
            }

            if i >= 2 {
                convexity.push(projected[face[i - 2]], projected[face[i - 1]], projected[node_index]);
                if settings.aspect_filter == AspectFilter::ConvexOnly && !convexity.is_convex() {
                    return Rejected(CellResult::WrongAspect);
                }
            }
        }

        // wrap-around turns
        convexity.push(projected[face[n - 2]], projected[face[n - 1]], projected[face[0]]);
        convexity.push(projected[face[n - 1]], projected[face[0]], projected[face[1]]);
        data.is_convex = convexity.is_convex();
        if settings.aspect_filter == AspectFilter::ConvexOnly && !data.is_convex {
            return Rejected(CellResult::WrongAspect);
        }

        if let Some(start) = nodes.iter().enumerate().min_by_key(|&(_, &node)| node).map(|(i, _)| i) {
            nodes.rotate_left(start);
        }
        let hash = ring_hash(&nodes);
        if !constraints.is_unique_cell_hash(hash) {
            return Rejected(CellResult::Duplicate);
        }

        data.centroid /= n as f64;
        data.perimeter = perimeter;
        data.is_closed_loop = true;

        let bounds_size = data.bounds.size().length();
        if !within(bounds_size, settings.min_bounds_size, settings.max_bounds_size) {
            return Rejected(CellResult::OutsideBoundsLimit);
        }
        if !within(perimeter, settings.min_perimeter, settings.max_perimeter) {
            return Rejected(CellResult::OutsidePerimeterLimit);
        }

        let mut polygon: Vec<DVec2> = nodes.iter().map(|&node| projected[node]).collect();
        let infos = PolygonInfos::new(&polygon);
        data.area = infos.area;
        data.is_clockwise = infos.is_clockwise;
        data.compactness = infos.compactness;

        if !infos.is_winded(settings.output_winding) {
            nodes.reverse();
            polygon.reverse();
        }

        let cell = Cell {
            nodes,
            polygon,
            data,
            face_index,
            hash,
        };

        if is_any_point_in_polygon(&constraints.holes, &cell.polygon) {
            return Usable(cell, CellResult::Hole);
        }
        if !within(cell.data.compactness, settings.min_compactness, settings.max_compactness) {
            return Usable(cell, CellResult::OutsideCompactnessLimit);
        }
        if !within(cell.data.area, settings.min_area, settings.max_area) {
            return Usable(cell, CellResult::OutsideAreaLimit);
        }
        if settings.aspect_filter == AspectFilter::ConcaveOnly && cell.data.is_convex {
            return Usable(cell, CellResult::WrongAspect);
        }

        let tolerance = settings.wrapper_classification_tolerance;
        if tolerance > 0.0 {
            if let Some(wrapper) = constraints.wrapper.read().as_ref() {
                if (cell.data.area - wrapper.data.area).abs() <= tolerance {
                    return Usable(cell, CellResult::WrapperCell);
                }
            }
        }

        Accepted(cell)
    }

    /// Number of nodes in the ring
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Ring is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
