//! Parallel processing configuration
//!
//! Diagnostics are single-threaded. Only reading many model files at once runs on a
//! Rayon pool, sized by [`ParallelConfig`].

use crate::errors::{FociError, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Configuration for parallel file reading
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Number of reader threads; `None` uses Rayon's default
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    /// Create a new parallel configuration
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Create a configuration that uses all available CPU cores
    pub fn all_cores() -> Self {
        Self {
            num_threads: Some(num_cpus::get()),
        }
    }

    /// Create a configuration that uses a specific number of threads
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
        }
    }

    /// Number of threads the reader will use
    pub fn effective_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Build a dedicated thread pool for this configuration
    ///
    /// # Errors
    ///
    /// Returns [`FociError::ThreadPoolError`] if the pool cannot be created.
    pub fn build_pool(&self) -> Result<ThreadPool> {
        let threads = self.effective_threads();
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| {
                FociError::ThreadPoolError(format!(
                    "Failed to initialize thread pool with {} threads: {}",
                    threads, e
                ))
            })
    }
}
