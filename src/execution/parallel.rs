//! Parallel Execution Framework
//!
//! Partitions are independent units of work: each one is ordered, scanned
//! for peer groups and ranked without looking at any other. This module runs
//! such units on a rayon work-stealing pool sized by the configuration,
//! keeping results in submission order.

use crate::common::constants::MAX_THREADS;
use crate::common::error::Result;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::warn;

/// Parallel execution context
#[derive(Debug, Clone)]
pub struct ParallelContext {
    /// Number of worker threads
    pub num_threads: usize,
    /// Enable parallel execution
    pub parallel_enabled: bool,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl ParallelContext {
    pub fn new(num_threads: usize) -> Self {
        let num_threads = num_threads.clamp(1, MAX_THREADS);
        let pool = if num_threads > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .thread_name(|i| format!("prism-window-{}", i))
                .build()
            {
                Ok(pool) => Some(Arc::new(pool)),
                Err(e) => {
                    warn!(error = %e, "failed to build worker pool, evaluating sequentially");
                    None
                }
            }
        } else {
            None
        };

        Self {
            num_threads,
            parallel_enabled: pool.is_some(),
            pool,
        }
    }

    pub fn from_system() -> Self {
        Self::new(num_cpus::get())
    }

    pub fn sequential() -> Self {
        Self::new(1)
    }

    /// Apply `f` to every item, on the worker pool when one is available
    ///
    /// Results come back in item order. The first error stops the work: the
    /// sequential path returns the earliest failing item's error, the pool
    /// returns whichever failure it saw and skips items not yet started.
    pub fn try_map_ordered<I, T, F>(&self, items: &[I], f: F) -> Result<Vec<T>>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> Result<T> + Sync + Send,
    {
        match &self.pool {
            Some(pool) if self.parallel_enabled => {
                pool.install(|| items.par_iter().map(|item| f(item)).collect())
            }
            _ => items.iter().map(f).collect(),
        }
    }
}

impl Default for ParallelContext {
    fn default() -> Self {
        Self::from_system()
    }
}
