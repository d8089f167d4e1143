// SPDX-License-Identifier: MIT OR Apache-2.0
//! Task-group interface used for data-parallel dispatch.
//!
//! Algorithms never spawn threads themselves. They describe work as a
//! [`TaskGroup`] over an index range split into [`Scope`]s and hand it to a
//! [`TaskManager`]. The call returns a [`GroupCompletion`] only once every
//! scope has run, so whatever is chained through [`GroupCompletion::then`]
//! is guaranteed to observe all results.

use std::ops::Range;

/// A contiguous slice of a task group's index range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    /// First item index
    pub start: usize,
    /// Number of items
    pub count: usize,
    /// Index of this scope within the group
    pub loop_index: usize,
}

impl Scope {
    /// Item indices covered by this scope
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.count
    }

    /// Split `count` items into scopes of at most `chunk` items
    pub fn split(count: usize, chunk: usize) -> Vec<Scope> {
        let chunk = chunk.max(1);
        (0..count.div_ceil(chunk))
            .map(|loop_index| {
                let start = loop_index * chunk;
                Scope {
                    start,
                    count: chunk.min(count - start),
                    loop_index,
                }
            })
            .collect()
    }
}

/// Executes the scopes of a task group
pub trait TaskManager: Send + Sync {
    /// Run `body` once per scope and return after all of them finished
    ///
    /// When `parallel` is false the scopes run in order on the caller thread.
    fn dispatch(&self, scopes: &[Scope], parallel: bool, body: &(dyn Fn(&Scope) + Sync));

    /// Number of workers available for parallel dispatch
    fn num_workers(&self) -> usize;
}

/// Runs every scope serially on the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineTaskManager;

impl TaskManager for InlineTaskManager {
    fn dispatch(&self, scopes: &[Scope], _parallel: bool, body: &(dyn Fn(&Scope) + Sync)) {
        scopes.iter().for_each(body);
    }

    fn num_workers(&self) -> usize {
        1
    }
}

/// Runs scopes on a rayon thread pool
#[derive(Debug, Default)]
pub struct RayonTaskManager {
    pool: Option<rayon::ThreadPool>,
}

impl RayonTaskManager {
    /// Use rayon's global pool
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Use a dedicated pool with `num_threads` workers
    pub fn with_threads(num_threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("clustertopo-worker-{i}"))
            .build()?;
        Ok(Self { pool: Some(pool) })
    }
}

impl TaskManager for RayonTaskManager {
    fn dispatch(&self, scopes: &[Scope], parallel: bool, body: &(dyn Fn(&Scope) + Sync)) {
        use rayon::prelude::*;

        if !parallel || scopes.len() <= 1 {
            scopes.iter().for_each(body);
            return;
        }

        match &self.pool {
            Some(pool) => pool.install(|| scopes.par_iter().for_each(body)),
            None => scopes.par_iter().for_each(body),
        }
    }

    fn num_workers(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }
}

/// A named batch of work submitted to a [`TaskManager`]
pub struct TaskGroup<'a> {
    manager: &'a dyn TaskManager,
    name: &'static str,
}

impl<'a> TaskGroup<'a> {
    /// Create a group bound to `manager`
    pub fn new(manager: &'a dyn TaskManager, name: &'static str) -> Self {
        Self { manager, name }
    }

    /// Call `per_item` for every index in `0..count`, batched by `chunk`
    pub fn start_iterations<F>(&self, count: usize, chunk: usize, parallel: bool, per_item: F) -> GroupCompletion
    where
        F: Fn(usize, &Scope) + Sync,
    {
        let scopes = Scope::split(count, chunk);
        tracing::trace!("{}: {} items in {} scopes", self.name, count, scopes.len());

        self.manager.dispatch(&scopes, parallel, &|scope: &Scope| {
            for i in scope.range() {
                per_item(i, scope);
            }
        });

        GroupCompletion {
            name: self.name,
            scopes: scopes.len(),
            items: count,
        }
    }

    /// Call `per_scope` once for every chunk of `0..count`, in parallel
    pub fn start_sub_loops<F>(&self, count: usize, chunk: usize, per_scope: F) -> GroupCompletion
    where
        F: Fn(&Scope) + Sync,
    {
        let scopes = Scope::split(count, chunk);
        tracing::trace!("{}: {} sub-loops", self.name, scopes.len());

        self.manager.dispatch(&scopes, true, &per_scope);

        GroupCompletion {
            name: self.name,
            scopes: scopes.len(),
            items: count,
        }
    }
}

/// Proof that every scope of a task group has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct GroupCompletion {
    /// Group name
    pub name: &'static str,
    /// Number of scopes that ran
    pub scopes: usize,
    /// Number of items processed
    pub items: usize,
}

impl GroupCompletion {
    /// Run the completion continuation
    pub fn then<R>(self, f: impl FnOnce() -> R) -> R {
        tracing::trace!("{}: completed {} items", self.name, self.items);
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_scope_split() {
        let scopes = Scope::split(10, 4);
        assert_eq!(scopes.len(), 3);
        assert_eq!(scopes[2].range(), 8..10);
        assert_eq!(scopes[1].loop_index, 1);

        assert!(Scope::split(0, 4).is_empty());
        assert_eq!(Scope::split(3, 0).len(), 3);
    }

    #[test]
    fn test_inline_iterations() {
        let manager = InlineTaskManager;
        let group = TaskGroup::new(&manager, "inline");
        let order = parking_lot::Mutex::new(Vec::new());

        let done = group.start_iterations(5, 2, true, |i, _| order.lock().push(i));
        let total = done.then(|| order.lock().len());

        assert_eq!(total, 5);
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_rayon_iterations_visit_every_item() {
        let manager = RayonTaskManager::with_threads(4).unwrap();
        let group = TaskGroup::new(&manager, "rayon");
        let sum = AtomicUsize::new(0);

        let done = group.start_iterations(1000, 64, true, |i, _| {
            sum.fetch_add(i, Ordering::Relaxed);
        });

        assert_eq!(done.scopes, 16);
        assert_eq!(done.then(|| sum.load(Ordering::Relaxed)), 999 * 1000 / 2);
        assert_eq!(manager.num_workers(), 4);
    }

    #[test]
    fn test_sub_loops() {
        let manager = RayonTaskManager::new();
        let group = TaskGroup::new(&manager, "sub");
        let covered = AtomicUsize::new(0);

        let done = group.start_sub_loops(100, 30, |scope| {
            covered.fetch_add(scope.count, Ordering::Relaxed);
        });

        assert_eq!(done.scopes, 4);
        assert_eq!(covered.load(Ordering::Relaxed), 100);
    }
}
