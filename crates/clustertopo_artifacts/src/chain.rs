// SPDX-License-Identifier: MIT OR Apache-2.0
//! Decomposition of a cluster into maximal simple paths.
//!
//! A chain runs between two nodes that are not plain pass-through nodes:
//! leaves, junctions with more than two links, or caller-flagged
//! breakpoints. Every chain is seeded from one of its ends; chains reached
//! from both ends are collapsed by [`NodeChainBuilder`] through their
//! direction-independent hash.

use crate::error::{ArtifactError, Result};
use clustertopo_graph::hash::{link_key, mix, unordered_mix};
use clustertopo_graph::{Cluster, Link, TaskGroup, TaskManager};
use parking_lot::Mutex;
use std::collections::HashSet;

/// Default number of chains walked per work item
pub const DEFAULT_CHAIN_CHUNK_SIZE: usize = 64;

/// Progress of a chain walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// Seed recorded, not walked yet
    Seeded,
    /// Walk in progress
    Walking,
    /// The walk came back to a visited node
    ClosedLoop,
    /// The walk stopped on a leaf, junction or breakpoint
    Terminated,
}

/// A simple path through a cluster
#[derive(Debug, Clone)]
pub struct NodeChain {
    /// Start node and the first edge taken from it
    pub seed: Link,
    /// Nodes after the seed, each with the edge used to reach it
    pub links: Vec<Link>,
    /// Set when the chain is exactly one open edge
    pub single_edge: Option<usize>,
    /// Whether the walk closed a loop
    pub is_closed_loop: bool,
    /// Whether either end is a leaf node
    pub is_leaf: bool,
    /// Direction-independent identity
    pub unique_hash: u64,
    state: ChainState,
}

impl NodeChain {
    /// Create an unwalked chain
    pub fn new(seed: Link) -> Self {
        Self {
            seed,
            links: Vec::new(),
            single_edge: None,
            is_closed_loop: false,
            is_leaf: false,
            unique_hash: 0,
            state: ChainState::Seeded,
        }
    }

    /// Walk state
    pub fn state(&self) -> ChainState {
        self.state
    }

    /// Walk the cluster from the seed until the path ends
    ///
    /// `breakpoints`, when present, is node-indexed.
    pub fn build(&mut self, cluster: &Cluster, breakpoints: Option<&[bool]>) {
        let is_breakpoint = |node: usize| breakpoints.is_some_and(|bp| bp[node]);

        self.state = ChainState::Walking;
        self.links.clear();

        let mut visited = HashSet::new();
        visited.insert(self.seed.node);

        let mut last_edge = self.seed.edge;
        let mut current = cluster.edge(last_edge).other(self.seed.node);
        visited.insert(current);
        self.links.push(Link::new(current, last_edge));

        loop {
            let node = cluster.node(current);
            if !node.is_binary() || is_breakpoint(current) {
                self.state = ChainState::Terminated;
                break;
            }

            let Some(&next) = node.links.iter().find(|l| l.edge != last_edge) else {
                self.state = ChainState::Terminated;
                break;
            };

            if next.node == self.seed.node {
                // the closing edge becomes the seed edge
                self.seed.edge = next.edge;
                self.state = ChainState::ClosedLoop;
                break;
            }

            if !visited.insert(next.node) {
                self.state = ChainState::ClosedLoop;
                break;
            }

            self.links.push(next);
            last_edge = next.edge;
            current = next.node;
        }

        self.is_closed_loop = self.state == ChainState::ClosedLoop;
        self.finalize(cluster);
    }

    fn finalize(&mut self, cluster: &Cluster) {
        let last = self.links[self.links.len() - 1];

        self.is_leaf = !self.is_closed_loop && (cluster.node(self.seed.node).is_leaf() || cluster.node(last.node).is_leaf());

        if self.links.len() == 1 && !self.is_closed_loop {
            self.single_edge = Some(self.seed.edge);
            self.unique_hash = self.seed.edge as u64;
        } else if self.is_closed_loop {
            let first = self.links[0];
            self.unique_hash = mix(
                unordered_mix(first.edge as u64, self.seed.edge as u64),
                self.seed.node as u64,
            );
        } else {
            self.unique_hash = unordered_mix(
                link_key(self.seed.node, self.seed.edge),
                link_key(last.node, last.edge),
            );
        }
    }

    /// Node path from seed to end, or end to seed when `reverse`
    ///
    /// Closed loops list every node once; the ring closes implicitly.
    pub fn nodes(&self, reverse: bool) -> Vec<usize> {
        let mut nodes = Vec::with_capacity(self.links.len() + 1);
        nodes.push(self.seed.node);
        nodes.extend(self.links.iter().map(|l| l.node));
        if reverse {
            nodes.reverse();
        }
        nodes
    }

    /// Edges along the path, including the closing edge of a loop
    pub fn edges(&self) -> Vec<usize> {
        let mut edges: Vec<usize> = self.links.iter().map(|l| l.edge).collect();
        if self.is_closed_loop && self.links.last().map(|l| l.edge) != Some(self.seed.edge) {
            edges.push(self.seed.edge);
        }
        edges
    }

    /// Number of edges along the path
    pub fn len(&self) -> usize {
        self.edges().len()
    }

    /// Chain has not been walked
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Seed node
    pub fn first_node(&self) -> usize {
        self.seed.node
    }

    /// Last node reached
    pub fn last_node(&self) -> usize {
        self.links.last().map_or(self.seed.node, |l| l.node)
    }
}

/// Builds and deduplicates every chain of a cluster
pub struct NodeChainBuilder<'a> {
    cluster: &'a Cluster,
    breakpoints: Option<Vec<bool>>,
    chunk_size: usize,
    chains: Vec<NodeChain>,
}

impl<'a> NodeChainBuilder<'a> {
    /// Create a builder over `cluster`
    pub fn new(cluster: &'a Cluster) -> Result<Self> {
        if cluster.num_edges() == 0 {
            return Err(ArtifactError::ClusterNotBuilt);
        }
        Ok(Self {
            cluster,
            breakpoints: None,
            chunk_size: DEFAULT_CHAIN_CHUNK_SIZE,
            chains: Vec::new(),
        })
    }

    /// Force chain boundaries at flagged nodes
    pub fn with_breakpoints(mut self, mask: Vec<bool>) -> Result<Self> {
        if mask.len() != self.cluster.num_nodes() {
            return Err(ArtifactError::BreakpointMaskSize {
                expected: self.cluster.num_nodes(),
                actual: mask.len(),
            });
        }
        self.breakpoints = Some(mask);
        Ok(self)
    }

    /// Number of chains walked per work item
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    fn is_breakpoint(&self, node: usize) -> bool {
        self.breakpoints.as_ref().is_some_and(|bp| bp[node])
    }

    /// Seed, walk and dedupe every chain
    ///
    /// Returns `false` when nothing could be seeded.
    pub fn compile(&mut self, manager: &dyn TaskManager) -> bool {
        let mut seeds = Vec::new();

        for node in self.cluster.nodes() {
            if node.is_leaf() {
                seeds.push(Link::new(node.index, node.links[0].edge));
                continue;
            }

            if node.is_complex() || (node.is_binary() && self.is_breakpoint(node.index)) {
                for link in &node.links {
                    if !self.cluster.node(link.node).is_leaf() {
                        seeds.push(Link::new(node.index, link.edge));
                    }
                }
            }
        }

        if seeds.is_empty() {
            let nodes = self.cluster.nodes();
            if nodes.is_empty() || !nodes.iter().all(|n| n.is_binary()) {
                tracing::debug!("No chain could be seeded");
                return false;
            }
            seeds.push(Link::new(0, nodes[0].links[0].edge));
        }

        self.walk(seeds, manager)
    }

    /// Seed chains from leaf nodes only
    ///
    /// Returns `false` when the cluster has no leaves.
    pub fn compile_leaves_only(&mut self, manager: &dyn TaskManager) -> bool {
        let seeds: Vec<Link> = self
            .cluster
            .nodes()
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| Link::new(n.index, n.links[0].edge))
            .collect();

        if seeds.is_empty() {
            tracing::debug!("No leaf to seed chains from");
            return false;
        }

        self.walk(seeds, manager)
    }

    fn walk(&mut self, seeds: Vec<Link>, manager: &dyn TaskManager) -> bool {
        let slots: Vec<Mutex<NodeChain>> = seeds.into_iter().map(|s| Mutex::new(NodeChain::new(s))).collect();
        let cluster = self.cluster;
        let breakpoints = self.breakpoints.as_deref();

        let group = TaskGroup::new(manager, "BuildChains");
        let done = group.start_iterations(slots.len(), self.chunk_size, true, |i, _| {
            slots[i].lock().build(cluster, breakpoints);
        });

        done.then(|| {
            self.chains = slots.into_iter().map(Mutex::into_inner).collect();
            self.dedupe();
        });

        tracing::debug!("Compiled {} chains", self.chains.len());
        !self.chains.is_empty()
    }

    /// Drop chains whose hash was already seen; first occurrence wins
    pub fn dedupe(&mut self) {
        let mut seen = HashSet::with_capacity(self.chains.len());
        self.chains.retain(|c| seen.insert(c.unique_hash));
    }

    /// Compiled chains
    pub fn chains(&self) -> &[NodeChain] {
        &self.chains
    }

    /// Take the compiled chains
    pub fn into_chains(self) -> Vec<NodeChain> {
        self.chains
    }
}
