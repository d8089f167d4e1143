// SPDX-License-Identifier: MIT OR Apache-2.0
//! Planar face enumeration over a half-edge structure.
//!
//! Every undirected cluster edge becomes two half-edges. Outgoing half-edges
//! are sorted by polar angle around their origin, and the successor of
//! `u -> v` is the half-edge preceding `v -> u` in that order around `v`,
//! i.e. the sharpest left turn. Following successors walks one face with
//! its interior on the left: bounded faces come out counter-clockwise and
//! the unbounded wrapper face clockwise.
//!
//! Faces of fewer than three half-edges are dropped. Only a lone edge walks
//! such a face, so `V - E + F == 2` holds for every connected cluster except
//! a single edge, which has no face at all.

use crate::cell::{Cell, CellConstraints, CellOutcome};
use crate::error::{ArtifactError, Result};
use crate::geometry::{is_point_in_polygon, signed_area};
use crate::projection::ProjectionSettings;
use clustertopo_graph::{Bounds3, Cluster, TaskGroup, TaskManager};
use glam::DVec2;
use indexmap::{IndexMap, IndexSet};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Below this many faces, cells are built serially
pub const PARALLEL_FACE_THRESHOLD: usize = 32;

/// Face index to the set of faces sharing an edge with it
pub type CellAdjacencyMap = IndexMap<usize, IndexSet<usize>>;

/// One direction of an undirected edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfEdge {
    /// Origin node
    pub origin: usize,
    /// Target node
    pub target: usize,
    /// Undirected edge this half-edge belongs to
    pub edge: usize,
    /// Reverse half-edge
    pub twin: usize,
    /// Successor along the same face
    pub next: usize,
    /// Face this half-edge bounds, once enumerated
    pub face: Option<usize>,
    /// Polar angle of the direction from origin to target
    pub angle: f64,
}

/// Node ring of one face, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct RawFace {
    /// Face index
    pub index: usize,
    /// Origin node of every half-edge along the face
    pub nodes: Vec<usize>,
    /// Bounds of the node positions
    pub bounds: Bounds3,
}

/// Cells produced by one enumeration
#[derive(Debug, Default)]
pub struct FaceEnumeration {
    /// Cells that passed every constraint
    pub cells: Vec<Cell>,
    /// Cells that failed a constraint but have a polygon
    pub failed: Vec<Cell>,
    /// Detected wrapper cell, if requested and found
    pub wrapper: Option<Arc<Cell>>,
}

#[derive(Debug, Default)]
struct AdjacencyCache {
    excluded: Option<usize>,
    map: Option<Arc<CellAdjacencyMap>>,
}

/// Half-edge structure and face enumeration over one cluster
#[derive(Debug)]
pub struct PlanarFaceEnumerator<'a> {
    cluster: &'a Cluster,
    projected: Vec<DVec2>,
    half_edges: Vec<HalfEdge>,
    raw_faces: Option<Vec<RawFace>>,
    adjacency: RwLock<AdjacencyCache>,
}

impl<'a> PlanarFaceEnumerator<'a> {
    /// Build the half-edge structure from node-indexed projected positions
    pub fn build(cluster: &'a Cluster, projected: Vec<DVec2>) -> Result<Self> {
        if cluster.num_edges() == 0 {
            return Err(ArtifactError::ClusterNotBuilt);
        }
        if projected.len() != cluster.num_nodes() {
            return Err(ArtifactError::ProjectionSize {
                expected: cluster.num_nodes(),
                actual: projected.len(),
            });
        }

        let num_edges = cluster.num_edges();
        let mut half_edges = Vec::with_capacity(num_edges * 2);

        for edge in cluster.edges() {
            let (a, b) = (edge.start, edge.end);
            let ab = half_edges.len();

            let dir = (projected[b] - projected[a]).normalize_or_zero();
            half_edges.push(HalfEdge {
                origin: a,
                target: b,
                edge: edge.index,
                twin: ab + 1,
                next: ab,
                face: None,
                angle: dir.y.atan2(dir.x),
            });

            let dir = -dir;
            half_edges.push(HalfEdge {
                origin: b,
                target: a,
                edge: edge.index,
                twin: ab,
                next: ab + 1,
                face: None,
                angle: dir.y.atan2(dir.x),
            });
        }

        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); cluster.num_nodes()];
        for (i, he) in half_edges.iter().enumerate() {
            outgoing[he.origin].push(i);
        }

        // ties on angle keep half-edge order
        for list in &mut outgoing {
            list.sort_by(|&a, &b| half_edges[a].angle.total_cmp(&half_edges[b].angle).then(a.cmp(&b)));
        }

        let mut position = vec![0usize; half_edges.len()];
        for list in &outgoing {
            for (pos, &he) in list.iter().enumerate() {
                position[he] = pos;
            }
        }

        for i in 0..half_edges.len() {
            let twin = half_edges[i].twin;
            let around = &outgoing[half_edges[i].target];
            half_edges[i].next = around[(position[twin] + around.len() - 1) % around.len()];
        }

        tracing::trace!(
            "Built {} half-edges over {} nodes",
            half_edges.len(),
            cluster.num_nodes()
        );

        Ok(Self {
            cluster,
            projected,
            half_edges,
            raw_faces: None,
            adjacency: RwLock::new(AdjacencyCache::default()),
        })
    }

    /// Build the half-edge structure, projecting positions on a plane
    pub fn build_with_projection(cluster: &'a Cluster, projection: &ProjectionSettings) -> Result<Self> {
        let projected = projection.projector().project_all(cluster.positions());
        Self::build(cluster, projected)
    }

    /// Cluster this structure was built over
    pub fn cluster(&self) -> &Cluster {
        self.cluster
    }

    /// Node-indexed projected positions
    pub fn projected(&self) -> &[DVec2] {
        &self.projected
    }

    /// All half-edges
    pub fn half_edges(&self) -> &[HalfEdge] {
        &self.half_edges
    }

    /// Number of enumerated faces, 0 before enumeration
    pub fn num_faces(&self) -> usize {
        self.raw_faces.as_ref().map_or(0, Vec::len)
    }

    /// Enumerated faces, if [`Self::enumerate_raw_faces`] ran
    pub fn raw_faces(&self) -> Option<&[RawFace]> {
        self.raw_faces.as_deref()
    }

    /// Walk every face once and stamp its half-edges
    ///
    /// Faces with fewer than three half-edges are dropped and their
    /// half-edges stay unassigned. The result is cached.
    pub fn enumerate_raw_faces(&mut self) -> &[RawFace] {
        if self.raw_faces.is_none() {
            let faces = self.walk_faces();
            tracing::debug!("Enumerated {} faces", faces.len());
            *self.adjacency.get_mut() = AdjacencyCache::default();
            self.raw_faces = Some(faces);
        }
        self.raw_faces.as_deref().unwrap_or_default()
    }

    fn walk_faces(&mut self) -> Vec<RawFace> {
        let count = self.half_edges.len();
        let mut visited = vec![false; count];
        let mut faces = Vec::new();
        let mut walked = Vec::with_capacity(64);

        for start in 0..count {
            if visited[start] {
                continue;
            }

            walked.clear();
            let mut nodes = Vec::with_capacity(16);
            let mut bounds = Bounds3::EMPTY;
            let mut current = start;
            let mut closed = false;

            for _ in 0..=count {
                if visited[current] {
                    closed = current == start;
                    break;
                }
                visited[current] = true;
                walked.push(current);

                let origin = self.half_edges[current].origin;
                nodes.push(origin);
                bounds.extend(self.cluster.pos(origin));
                current = self.half_edges[current].next;
            }

            if !closed || nodes.len() < 3 {
                continue;
            }

            let index = faces.len();
            for &he in &walked {
                self.half_edges[he].face = Some(index);
            }
            faces.push(RawFace { index, nodes, bounds });
        }

        faces
    }

    fn face_polygon(&self, face: &RawFace) -> Vec<DVec2> {
        face.nodes.iter().map(|&n| self.projected[n]).collect()
    }

    /// Signed projected area of a face
    pub fn face_signed_area(&self, face: &RawFace) -> f64 {
        signed_area(&self.face_polygon(face))
    }

    /// Validate one raw face into a cell
    pub fn build_cell_from_raw_face(&self, face: &RawFace, constraints: &CellConstraints) -> CellOutcome {
        Cell::build_from_face(&face.nodes, Some(face.index), self.cluster, &self.projected, constraints)
    }

    /// Build cells for every face
    ///
    /// With `detect_wrapper`, the cell built from
    /// [`Self::wrapper_face_index`] is stored in `constraints` and returned
    /// separately instead of among the cells.
    pub fn enumerate_all_faces(
        &mut self,
        constraints: &CellConstraints,
        manager: &dyn TaskManager,
        detect_wrapper: bool,
    ) -> FaceEnumeration {
        self.enumerate_raw_faces();
        self.realize(constraints, manager, detect_wrapper, |_| true)
    }

    /// Build cells for faces whose bounds touch `bounds`
    ///
    /// Faces entirely outside are skipped before any polygon is built,
    /// unless `include_outside` is set.
    pub fn enumerate_faces_within_bounds(
        &mut self,
        constraints: &CellConstraints,
        manager: &dyn TaskManager,
        bounds: &Bounds3,
        include_outside: bool,
        detect_wrapper: bool,
    ) -> FaceEnumeration {
        self.enumerate_raw_faces();
        self.realize(constraints, manager, detect_wrapper, |face| {
            include_outside || face.bounds.intersects(bounds)
        })
    }

    fn realize(
        &self,
        constraints: &CellConstraints,
        manager: &dyn TaskManager,
        detect_wrapper: bool,
        filter: impl Fn(&RawFace) -> bool,
    ) -> FaceEnumeration {
        let Some(raw_faces) = self.raw_faces.as_deref() else {
            return FaceEnumeration::default();
        };
        let faces: Vec<&RawFace> = raw_faces.iter().filter(|f| filter(f)).collect();
        if faces.is_empty() {
            return FaceEnumeration::default();
        }

        let outcomes: Vec<CellOutcome> = if faces.len() < PARALLEL_FACE_THRESHOLD {
            faces
                .iter()
                .map(|face| self.build_cell_from_raw_face(face, constraints))
                .collect()
        } else {
            let slots: Vec<Mutex<Option<CellOutcome>>> = faces.iter().map(|_| Mutex::new(None)).collect();
            let group = TaskGroup::new(manager, "BuildCells");
            group
                .start_iterations(faces.len(), 8, true, |i, _| {
                    *slots[i].lock() = Some(self.build_cell_from_raw_face(faces[i], constraints));
                })
                .then(|| slots.into_iter().filter_map(Mutex::into_inner).collect())
        };

        let wrapper_index = if detect_wrapper { self.wrapper_face_index() } else { None };
        let mut result = FaceEnumeration::default();
        let mut wrapper: Option<Cell> = None;

        for outcome in outcomes {
            match outcome {
                CellOutcome::Accepted(cell) if wrapper_index.is_some() && cell.face_index == wrapper_index => {
                    wrapper = Some(cell);
                }
                CellOutcome::Accepted(cell) => result.cells.push(cell),
                CellOutcome::Usable(cell, _) => result.failed.push(cell),
                CellOutcome::Rejected(_) => {}
            }
        }

        if let Some(cell) = wrapper {
            let cell = Arc::new(cell);
            constraints.set_wrapper_cell(Some(Arc::clone(&cell)));
            tracing::debug!("Wrapper detected on face {:?}", cell.face_index);
            result.wrapper = Some(cell);
        }

        tracing::debug!(
            "Realized {} cells ({} failed) from {} faces",
            result.cells.len(),
            result.failed.len(),
            faces.len()
        );
        result
    }

    /// Index of the unbounded face
    ///
    /// Picks the largest clockwise face, falling back to the largest face
    /// by absolute area when none winds clockwise (a tree walks a single
    /// face of zero area).
    pub fn wrapper_face_index(&self) -> Option<usize> {
        let faces = self.raw_faces.as_deref()?;
        let areas: Vec<(usize, f64)> = faces.iter().map(|f| (f.index, self.face_signed_area(f))).collect();

        let largest = |clockwise_only: bool| {
            areas
                .iter()
                .filter(|(_, area)| !clockwise_only || *area < 0.0)
                .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
                .map(|&(index, _)| index)
        };

        largest(true).or_else(|| largest(false))
    }

    /// Bounded face whose polygon contains `point`
    pub fn find_face_containing(&self, point: DVec2) -> Option<usize> {
        let faces = self.raw_faces.as_deref()?;
        faces.iter().find_map(|face| {
            let polygon = self.face_polygon(face);
            (signed_area(&polygon) > 0.0 && is_point_in_polygon(point, &polygon)).then_some(face.index)
        })
    }

    /// Faces sharing an edge, derived from twin half-edges
    ///
    /// `exclude` removes one face (usually the wrapper) from the map.
    pub fn build_cell_adjacency_map(&self, exclude: Option<usize>) -> CellAdjacencyMap {
        let mut map = CellAdjacencyMap::new();
        for he in &self.half_edges {
            let (Some(a), Some(b)) = (he.face, self.half_edges[he.twin].face) else {
                continue;
            };
            if a == b || exclude == Some(a) || exclude == Some(b) {
                continue;
            }
            map.entry(a).or_default().insert(b);
            map.entry(b).or_default().insert(a);
        }
        map
    }

    /// Cached adjacency map, rebuilt when `exclude` changes
    pub fn get_or_build_adjacency_map(&self, exclude: Option<usize>) -> Result<Arc<CellAdjacencyMap>> {
        if self.raw_faces.is_none() {
            return Err(ArtifactError::EnumeratorNotBuilt);
        }

        {
            let cache = self.adjacency.read();
            if let Some(map) = &cache.map {
                if cache.excluded == exclude {
                    return Ok(Arc::clone(map));
                }
            }
        }

        let mut cache = self.adjacency.write();
        if let Some(map) = &cache.map {
            if cache.excluded == exclude {
                return Ok(Arc::clone(map));
            }
        }

        let map = Arc::new(self.build_cell_adjacency_map(exclude));
        tracing::debug!("Rebuilt face adjacency ({} faces, excluding {:?})", map.len(), exclude);
        cache.excluded = exclude;
        cache.map = Some(Arc::clone(&map));
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellConstraintsSettings, CellResult};
    use crate::chain::NodeChainBuilder;
    use clustertopo_graph::{Graph, InlineTaskManager, RayonTaskManager, SubGraphLimits};
    use glam::DVec3;

    fn square() -> Cluster {
        let positions = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ];
        Cluster::from_edges(&positions, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap()
    }

    #[test]
    fn test_twins_and_next() {
        let cluster = square();
        let enumerator = PlanarFaceEnumerator::build_with_projection(&cluster, &ProjectionSettings::default()).unwrap();
        let half_edges = enumerator.half_edges();

        assert_eq!(half_edges.len(), 8);
        for (i, he) in half_edges.iter().enumerate() {
            let twin = &half_edges[he.twin];
            assert_eq!(twin.twin, i);
            assert_eq!((twin.origin, twin.target), (he.target, he.origin));
            assert_eq!(half_edges[he.next].origin, he.target);
        }

        // 0 -> 1 turns left onto 1 -> 2
        assert_eq!(half_edges[half_edges[0].next].target, 2);
    }

    #[test]
    fn test_square_faces() {
        let cluster = square();
        let mut enumerator =
            PlanarFaceEnumerator::build_with_projection(&cluster, &ProjectionSettings::default()).unwrap();
        let faces = enumerator.enumerate_raw_faces().to_vec();

        assert_eq!(faces.len(), 2);
        assert!(enumerator.half_edges().iter().all(|he| he.face.is_some()));

        let areas: Vec<f64> = faces.iter().map(|f| enumerator.face_signed_area(f)).collect();
        assert!(areas.iter().any(|&a| a > 0.0));
        assert!(areas.iter().any(|&a| a < 0.0));

        let wrapper = enumerator.wrapper_face_index().unwrap();
        assert!(enumerator.face_signed_area(&faces[wrapper]) < 0.0);

        let inner = enumerator.find_face_containing(DVec2::new(0.5, 0.5)).unwrap();
        assert_ne!(inner, wrapper);
        assert_eq!(enumerator.find_face_containing(DVec2::new(3.0, 3.0)), None);
    }

    #[test]
    fn test_wrapper_detection() {
        let cluster = square();
        let mut enumerator =
            PlanarFaceEnumerator::build_with_projection(&cluster, &ProjectionSettings::default()).unwrap();
        let constraints = CellConstraints::new(CellConstraintsSettings::default());

        let result = enumerator.enumerate_all_faces(&constraints, &InlineTaskManager, true);
        assert_eq!(result.cells.len(), 1);
        assert!(result.wrapper.is_some());
        assert!(constraints.wrapper_cell().is_some());
        assert_eq!(result.cells[0].data.area, 1.0);
    }

    #[test]
    fn test_without_wrapper_detection() {
        let cluster = square();
        let mut enumerator =
            PlanarFaceEnumerator::build_with_projection(&cluster, &ProjectionSettings::default()).unwrap();
        let constraints = CellConstraints::new(CellConstraintsSettings::default());

        let result = enumerator.enumerate_all_faces(&constraints, &InlineTaskManager, false);
        assert_eq!(result.cells.len(), 2);
        assert!(result.wrapper.is_none());
    }

    #[test]
    fn test_reused_constraints_reject_duplicates() {
        let cluster = square();
        let mut enumerator =
            PlanarFaceEnumerator::build_with_projection(&cluster, &ProjectionSettings::default()).unwrap();
        let constraints = CellConstraints::new(CellConstraintsSettings::default());

        enumerator.enumerate_all_faces(&constraints, &InlineTaskManager, false);
        let again = enumerator.enumerate_all_faces(&constraints, &InlineTaskManager, false);
        assert!(again.cells.is_empty());

        let face = enumerator.raw_faces().unwrap()[0].clone();
        let outcome = enumerator.build_cell_from_raw_face(&face, &constraints);
        assert_eq!(outcome.result(), CellResult::Duplicate);
    }

    #[test]
    fn test_bounds_filter() {
        let cluster = square();
        let mut enumerator =
            PlanarFaceEnumerator::build_with_projection(&cluster, &ProjectionSettings::default()).unwrap();

        let far = Bounds3::new(DVec3::splat(10.0), DVec3::splat(11.0));
        let constraints = CellConstraints::new(CellConstraintsSettings::default());
        let result = enumerator.enumerate_faces_within_bounds(&constraints, &InlineTaskManager, &far, false, true);
        assert!(result.cells.is_empty());
        assert!(result.wrapper.is_none());

        let constraints = CellConstraints::new(CellConstraintsSettings::default());
        let result = enumerator.enumerate_faces_within_bounds(&constraints, &InlineTaskManager, &far, true, true);
        assert_eq!(result.cells.len(), 1);
    }

    #[test]
    fn test_adjacency_cache() {
        let cluster = square();
        let mut enumerator =
            PlanarFaceEnumerator::build_with_projection(&cluster, &ProjectionSettings::default()).unwrap();
        assert_eq!(
            enumerator.get_or_build_adjacency_map(None).err(),
            Some(ArtifactError::EnumeratorNotBuilt)
        );

        enumerator.enumerate_raw_faces();
        let full = enumerator.get_or_build_adjacency_map(None).unwrap();
        assert_eq!(full.len(), 2);
        assert!(full[&0].contains(&1) && full[&1].contains(&0));

        let cached = enumerator.get_or_build_adjacency_map(None).unwrap();
        assert!(Arc::ptr_eq(&full, &cached));

        let wrapper = enumerator.wrapper_face_index();
        let excluded = enumerator.get_or_build_adjacency_map(wrapper).unwrap();
        assert!(excluded.is_empty());
        assert!(!Arc::ptr_eq(&full, &excluded));
    }

    #[test]
    fn test_projection_size_mismatch() {
        let cluster = square();
        let err = PlanarFaceEnumerator::build(&cluster, vec![DVec2::ZERO; 3]).err();
        assert_eq!(err.map(|e| e.to_string()), Some("Projection has 3 positions, expected 4".to_string()));
    }

    /// `size` x `size` lattice of points joined to their right and upper neighbors
    fn grid(size: usize) -> Cluster {
        let positions: Vec<DVec3> = (0..size * size)
            .map(|i| DVec3::new((i % size) as f64, (i / size) as f64, 0.0))
            .collect();

        let mut pairs = Vec::new();
        for y in 0..size {
            for x in 0..size {
                let i = y * size + x;
                if x + 1 < size {
                    pairs.push((i, i + 1));
                }
                if y + 1 < size {
                    pairs.push((i, i + size));
                }
            }
        }
        Cluster::from_edges(&positions, &pairs).unwrap()
    }

    fn enumerator(cluster: &Cluster) -> PlanarFaceEnumerator<'_> {
        PlanarFaceEnumerator::build_with_projection(cluster, &ProjectionSettings::default()).unwrap()
    }

    // V - E + F == 2 for connected clusters; a lone edge is the exception,
    // see test_lone_edge_has_no_face
    #[test]
    fn test_euler_characteristic_on_grid() {
        let cluster = grid(3);
        let mut enumerator = enumerator(&cluster);
        let faces = enumerator.enumerate_raw_faces().len();

        let (v, e) = (cluster.num_nodes() as i64, cluster.num_edges() as i64);
        assert_eq!((v, e, faces), (9, 12, 5));
        assert_eq!(v - e + faces as i64, 2);
    }

    #[test]
    fn test_euler_with_dangling_edge() {
        // square with a spike poking outward
        let positions = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(2.0, 2.0, 0.0),
        ];
        let cluster = Cluster::from_edges(&positions, &[(0, 1), (1, 2), (2, 3), (3, 0), (2, 4)]).unwrap();
        let mut enumerator = enumerator(&cluster);
        let faces = enumerator.enumerate_raw_faces().to_vec();

        assert_eq!(5 - 5 + faces.len() as i64, 2);
        assert!(enumerator.half_edges().iter().all(|he| he.face.is_some()));

        // the spike is walked on both sides by the wrapper
        let wrapper = enumerator.wrapper_face_index().unwrap();
        assert_eq!(faces[wrapper].nodes.iter().filter(|&&n| n == 2).count(), 2);
    }

    #[test]
    fn test_lone_edge_has_no_face() {
        // the two half-edges of a single edge form a face too short to keep
        let positions = [DVec3::ZERO, DVec3::X];
        let cluster = Cluster::from_edges(&positions, &[(0, 1)]).unwrap();
        let mut enumerator = enumerator(&cluster);

        assert!(enumerator.enumerate_raw_faces().is_empty());
        assert!(enumerator.half_edges().iter().all(|he| he.face.is_none()));
        assert_eq!(enumerator.wrapper_face_index(), None);
    }

    #[test]
    fn test_grid_faces_wind_counter_clockwise() {
        let cluster = grid(3);
        let mut enumerator = enumerator(&cluster);
        let faces = enumerator.enumerate_raw_faces().to_vec();
        let wrapper = enumerator.wrapper_face_index().unwrap();

        assert_eq!(faces[wrapper].nodes.len(), 8);
        assert_eq!(enumerator.face_signed_area(&faces[wrapper]), -4.0);
        for face in faces.iter().filter(|f| f.index != wrapper) {
            assert_eq!(enumerator.face_signed_area(face), 1.0);
        }
    }

    /// Two unit cells side by side, sharing the edge between nodes 1 and 4
    fn domino() -> Cluster {
        let positions = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(2.0, 1.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ];
        let pairs = [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0), (1, 4)];
        Cluster::from_edges(&positions, &pairs).unwrap()
    }

    #[test]
    fn test_wrapper_through_junctions() {
        let cluster = domino();
        assert_eq!(cluster.complex_count(), 2);

        let mut enumerator = enumerator(&cluster);
        let faces = enumerator.enumerate_raw_faces().to_vec();
        assert_eq!(faces.len(), 3);

        let largest = faces
            .iter()
            .max_by(|a, b| {
                let (a, b) = (enumerator.face_signed_area(a), enumerator.face_signed_area(b));
                a.abs().total_cmp(&b.abs())
            })
            .map(|f| f.index);
        let wrapper = enumerator.wrapper_face_index();
        assert_eq!(wrapper, largest);

        let left = enumerator.find_face_containing(DVec2::new(0.5, 0.5)).unwrap();
        let right = enumerator.find_face_containing(DVec2::new(1.5, 0.5)).unwrap();
        assert_ne!(left, right);
        assert_ne!(Some(left), wrapper);
        assert_ne!(Some(right), wrapper);
        assert_eq!(enumerator.find_face_containing(DVec2::new(2.5, 0.5)), None);

        let constraints = CellConstraints::new(CellConstraintsSettings::default());
        let result = enumerator.enumerate_all_faces(&constraints, &InlineTaskManager, true);
        assert_eq!(result.cells.len(), 2);
        assert!(result.cells.iter().all(|c| c.data.area == 1.0));
        let outer = result.wrapper.unwrap();
        assert_eq!(outer.data.area, 2.0);
        assert_eq!(outer.face_index, wrapper);
    }

    #[test]
    fn test_tree_face_is_the_wrapper() {
        let positions = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ];
        let cluster = Cluster::from_edges(&positions, &[(0, 1), (1, 2), (1, 3)]).unwrap();
        let mut enumerator = enumerator(&cluster);
        let constraints = CellConstraints::new(CellConstraintsSettings::default());

        let result = enumerator.enumerate_all_faces(&constraints, &InlineTaskManager, true);
        assert_eq!(enumerator.num_faces(), 1);
        assert!(result.cells.is_empty());
        assert_eq!(result.wrapper.map(|w| w.data.area), Some(0.0));
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let cluster = grid(4);
        let mut enumerator = enumerator(&cluster);
        enumerator.enumerate_raw_faces();

        let map = enumerator.get_or_build_adjacency_map(None).unwrap();
        for (&a, neighbors) in map.iter() {
            for &b in neighbors {
                assert!(map[&b].contains(&a), "{a} -> {b} is not mirrored");
            }
        }

        // center cell of a 3x3 block touches four others plus nothing else
        let center = enumerator.find_face_containing(DVec2::new(1.5, 1.5)).unwrap();
        let wrapper = enumerator.wrapper_face_index();
        let bounded = enumerator.get_or_build_adjacency_map(wrapper).unwrap();
        assert_eq!(bounded[&center].len(), 4);
        assert!(!bounded.contains_key(&wrapper.unwrap()));
    }

    #[test]
    fn test_parallel_cell_building() {
        let cluster = grid(7);
        let mut enumerator = enumerator(&cluster);
        let constraints = CellConstraints::new(CellConstraintsSettings::default());
        let manager = RayonTaskManager::with_threads(4).unwrap();

        let result = enumerator.enumerate_all_faces(&constraints, &manager, true);

        assert_eq!(enumerator.num_faces(), 37);
        assert_eq!(result.cells.len(), 36);
        assert!(result.cells.iter().all(|c| (c.data.area - 1.0).abs() < 1e-9));
        assert_eq!(result.wrapper.as_ref().map(|w| w.data.area), Some(36.0));
    }

    #[test]
    fn test_failed_cells_kept_for_containment() {
        let cluster = grid(3);
        let mut enumerator = enumerator(&cluster);
        let constraints = CellConstraints::new(CellConstraintsSettings {
            max_area: Some(0.5),
            ..Default::default()
        });

        let result = enumerator.enumerate_all_faces(&constraints, &InlineTaskManager, true);
        assert!(result.cells.is_empty());
        assert!(result.wrapper.is_none());
        assert_eq!(result.failed.len(), 5);
        assert!(result.failed.iter().all(|c| !c.polygon.is_empty() && c.face_index.is_some()));
    }

    #[test]
    fn test_square_end_to_end() {
        let mut graph = Graph::new(4);
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
            graph.insert_edge(a, b, None).unwrap();
        }
        graph.build_subgraphs(&SubGraphLimits::default());
        assert_eq!(graph.subgraphs().len(), 1);
        assert_eq!(graph.subgraphs()[0].node_count(), 4);
        assert_eq!(graph.subgraphs()[0].edge_count(), 4);

        let positions = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ];
        let cluster = graph.subgraphs()[0].build_cluster(&graph, &positions).unwrap();

        let mut chains = NodeChainBuilder::new(&cluster).unwrap();
        assert!(chains.compile(&InlineTaskManager));
        assert_eq!(chains.chains().len(), 1);
        assert!(chains.chains()[0].is_closed_loop);
        assert_eq!(chains.chains()[0].nodes(false).len(), 4);

        let mut enumerator = enumerator(&cluster);
        assert_eq!(enumerator.enumerate_raw_faces().len(), 2);

        let adjacency = enumerator.get_or_build_adjacency_map(None).unwrap();
        assert!(adjacency[&0].contains(&1));
        assert!(adjacency[&1].contains(&0));
    }
}
