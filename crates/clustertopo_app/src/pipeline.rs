// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene processing: insertion, components, chains, faces.

use crate::config::{ChainMode, PipelineConfig};
use crate::error::Result;
use crate::report::{CellReport, ChainSummary, ClusterReport, Report};
use crate::scene::Scene;
use clustertopo_artifacts::{CellConstraints, NodeChainBuilder, PlanarFaceEnumerator};
use clustertopo_graph::{Cluster, Graph, GraphError, InlineTaskManager, RayonTaskManager, TaskGroup, TaskManager};
use indexmap::IndexMap;
use parking_lot::Mutex;

/// Edges inserted per work item
const INSERT_CHUNK_SIZE: usize = 256;

/// Runs a scene through every stage with one configuration
pub struct Pipeline {
    config: PipelineConfig,
    manager: Box<dyn TaskManager>,
}

impl Pipeline {
    /// Create a pipeline and its worker pool
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let manager: Box<dyn TaskManager> = match config.worker_threads {
            0 => Box::new(RayonTaskManager::new()),
            1 => Box::new(InlineTaskManager),
            n => Box::new(RayonTaskManager::with_threads(n)?),
        };
        tracing::debug!("Pipeline using {} workers", manager.num_workers());
        Ok(Self { config, manager })
    }

    /// Process `scene` and describe the result
    pub fn run(&self, scene: &Scene) -> Result<Report> {
        let mut graph = self.insert(scene)?;
        let valid_nodes = graph.build_subgraphs(&self.config.limits);
        tracing::info!(
            "{} points, {} unique edges, {} clusters",
            scene.positions.len(),
            graph.edge_count(),
            graph.subgraphs().len()
        );

        let breakpoints = scene.breakpoint_mask();
        let holes = self.config.projection.projector().project_all(&scene.holes);

        let mut clusters = Vec::with_capacity(graph.subgraphs().len());
        for (index, subgraph) in graph.subgraphs().iter().enumerate() {
            let cluster = subgraph.build_cluster(&graph, &scene.positions)?;
            let constraints = CellConstraints::new(self.config.constraints.clone()).with_holes(holes.clone());

            let mut report = self.process_cluster(&cluster, breakpoints.as_deref(), &constraints)?;
            report.index = index;
            report.io_index = subgraph.first_io_index();
            clusters.push(report);
        }

        Ok(Report {
            version: env!("CARGO_PKG_VERSION").to_string(),
            points: scene.positions.len(),
            edges: graph.edge_count(),
            valid_nodes: valid_nodes.len(),
            clusters,
        })
    }

    /// Insert every scene edge, spread over the workers
    ///
    /// Duplicate edges keep the tag of whichever insertion lands first.
    fn insert(&self, scene: &Scene) -> Result<Graph> {
        let edges = scene.tagged_edges();
        let graph = Graph::new(scene.positions.len());
        graph.reserve_for_edges(edges.len(), false);

        let first_error: Mutex<Option<GraphError>> = Mutex::new(None);
        let group = TaskGroup::new(self.manager.as_ref(), "InsertEdges");
        let parallel = edges.len() > INSERT_CHUNK_SIZE;

        group
            .start_iterations(edges.len(), INSERT_CHUNK_SIZE, parallel, |i, _| {
                let (a, b, io_index) = edges[i];
                if let Err(e) = graph.insert_edge(a, b, io_index) {
                    first_error.lock().get_or_insert(e);
                }
            })
            .then(|| match first_error.into_inner() {
                Some(e) => Err(e.into()),
                None => Ok(graph),
            })
    }

    fn process_cluster(
        &self,
        cluster: &Cluster,
        breakpoints: Option<&[bool]>,
        constraints: &CellConstraints,
    ) -> Result<ClusterReport> {
        let manager = self.manager.as_ref();

        let mut builder = NodeChainBuilder::new(cluster)?.with_chunk_size(self.config.chain_chunk_size);
        if let Some(mask) = breakpoints {
            let local = cluster
                .nodes()
                .iter()
                .map(|n| mask.get(n.point_index).copied().unwrap_or(false))
                .collect();
            builder = builder.with_breakpoints(local)?;
        }
        let compiled = match self.config.chain_mode {
            ChainMode::All => builder.compile(manager),
            ChainMode::LeavesOnly => builder.compile_leaves_only(manager),
        };
        if !compiled {
            tracing::debug!("Cluster with {} nodes produced no chain", cluster.num_nodes());
        }
        let chains = builder.into_chains();

        let mut enumerator = PlanarFaceEnumerator::build_with_projection(cluster, &self.config.projection)?;
        let detect_wrapper = self.config.detect_wrapper;
        let enumeration = match &self.config.bounds_filter {
            Some(filter) => enumerator.enumerate_faces_within_bounds(
                constraints,
                manager,
                &filter.bounds,
                filter.include_outside,
                detect_wrapper,
            ),
            None => enumerator.enumerate_all_faces(constraints, manager, detect_wrapper),
        };

        let settings = constraints.settings();
        let emit_wrapper =
            !settings.omit_wrapping_bounds || (settings.keep_wrapper_if_sole && enumeration.cells.is_empty());
        let wrapper = enumeration
            .wrapper
            .as_deref()
            .filter(|_| emit_wrapper)
            .map(|cell| CellReport::new(cell, cluster));

        let exclude = if detect_wrapper { enumerator.wrapper_face_index() } else { None };
        let adjacency_map = enumerator.get_or_build_adjacency_map(exclude)?;
        let adjacency: IndexMap<usize, Vec<usize>> = adjacency_map
            .iter()
            .map(|(&face, neighbors)| (face, neighbors.iter().copied().collect()))
            .collect();
        let adjacency_pairs = adjacency.values().map(Vec::len).sum::<usize>() / 2;

        Ok(ClusterReport {
            index: 0,
            io_index: None,
            nodes: cluster.num_nodes(),
            edges: cluster.num_edges(),
            leaves: cluster.leaf_count(),
            binary: cluster.binary_count(),
            complex: cluster.complex_count(),
            chains: ChainSummary::from_chains(&chains),
            faces: enumerator.num_faces(),
            cells: enumeration.cells.iter().map(|c| CellReport::new(c, cluster)).collect(),
            failed_cells: enumeration.failed.len(),
            wrapper,
            adjacency,
            adjacency_pairs,
        })
    }
}
