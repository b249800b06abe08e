use std::time::Duration;

/// Configuration of the executor middleware stack.
///
/// Controls per-batch timeouts and the batch size limit.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum time a single batch may take, in milliseconds.
    pub batch_timeout_ms: u64,
    /// Batches with more operations are rejected before reaching the store.
    pub max_batch_operations: usize,
}

impl ExecutorConfig {
    #[must_use]
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_timeout_ms)
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            batch_timeout_ms: 30_000,
            max_batch_operations: 10_000,
        }
    }
}
