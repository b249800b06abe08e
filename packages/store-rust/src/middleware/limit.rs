//! Batch size limit.
//!
//! Rejects batches with more than `max_operations` operations with
//! `ExecutorError::BatchTooLarge` without calling the inner executor.

use async_trait::async_trait;
use keyseg_core::BatchExecutor;
use tower::Layer;

use crate::error::ExecutorError;

// ---------------------------------------------------------------------------
// BatchLimitLayer
// ---------------------------------------------------------------------------

/// Tower layer that caps the number of operations per batch.
#[derive(Debug, Clone)]
pub struct BatchLimitLayer {
    max_operations: usize,
}

impl BatchLimitLayer {
    /// Create a new `BatchLimitLayer` with the given per-batch limit.
    #[must_use]
    pub fn new(max_operations: usize) -> Self {
        Self { max_operations }
    }
}

impl<E> Layer<E> for BatchLimitLayer {
    type Service = BatchLimit<E>;

    fn layer(&self, inner: E) -> Self::Service {
        BatchLimit {
            inner,
            max_operations: self.max_operations,
        }
    }
}

// ---------------------------------------------------------------------------
// BatchLimit
// ---------------------------------------------------------------------------

/// Executor wrapper that enforces the batch size limit.
#[derive(Debug, Clone)]
pub struct BatchLimit<E> {
    inner: E,
    max_operations: usize,
}

#[async_trait]
impl<E, Op, Raw> BatchExecutor<Op, Raw> for BatchLimit<E>
where
    E: BatchExecutor<Op, Raw>,
    Op: Sync + 'static,
    Raw: 'static,
{
    async fn execute(&self, operations: &[Op]) -> anyhow::Result<Vec<Raw>> {
        if operations.len() > self.max_operations {
            return Err(ExecutorError::BatchTooLarge {
                operations: operations.len(),
                max: self.max_operations,
            }
            .into());
        }
        self.inner.execute(operations).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
