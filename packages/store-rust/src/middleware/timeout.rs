//! Timeout middleware for batches.
//!
//! Fails batches that exceed the configured duration with
//! `ExecutorError::Timeout`. The in-flight executor call is dropped.

use std::time::Duration;

use async_trait::async_trait;
use keyseg_core::BatchExecutor;
use tower::Layer;

use crate::error::ExecutorError;

// ---------------------------------------------------------------------------
// TimeoutLayer
// ---------------------------------------------------------------------------

/// Tower layer that wraps executors with per-batch timeout enforcement.
#[derive(Debug, Clone)]
pub struct TimeoutLayer {
    timeout: Duration,
}

impl TimeoutLayer {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl<E> Layer<E> for TimeoutLayer {
    type Service = Timeout<E>;

    fn layer(&self, inner: E) -> Self::Service {
        Timeout {
            inner,
            timeout: self.timeout,
        }
    }
}

// ---------------------------------------------------------------------------
// Timeout
// ---------------------------------------------------------------------------

/// Executor wrapper that enforces the per-batch timeout.
#[derive(Debug, Clone)]
pub struct Timeout<E> {
    inner: E,
    timeout: Duration,
}

#[async_trait]
impl<E, Op, Raw> BatchExecutor<Op, Raw> for Timeout<E>
where
    E: BatchExecutor<Op, Raw>,
    Op: Sync + 'static,
    Raw: 'static,
{
    async fn execute(&self, operations: &[Op]) -> anyhow::Result<Vec<Raw>> {
        match tokio::time::timeout(self.timeout, self.inner.execute(operations)).await {
            Ok(result) => result,
            Err(_elapsed) => {
                #[allow(clippy::cast_possible_truncation)]
                let timeout_ms = self.timeout.as_millis() as u64;
                Err(ExecutorError::Timeout { timeout_ms }.into())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
