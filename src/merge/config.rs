//! Configuration for the multi-query merger

/// Default concurrency ceiling for sub-query fan-out.
///
/// Two in-flight sub-queries bounds load on the datastore's query engine;
/// raising it is a performance knob only and never changes output.
pub const DEFAULT_WORKER_COUNT: usize = 2;

/// Tunables for one merger instance.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Maximum number of sub-queries executing at once (minimum 1)
    pub worker_count: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
        }
    }
}

impl MergeConfig {
    /// One sub-query at a time (useful for tests and debugging; output is
    /// identical to any other ceiling)
    pub fn serial() -> Self {
        Self { worker_count: 1 }
    }

    /// Create a config with a custom concurrency ceiling
    pub fn with_workers(worker_count: usize) -> Self {
        Self {
            worker_count: worker_count.max(1),
        }
    }
}
