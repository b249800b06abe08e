//! The batch executor contract.
//!
//! A [`BatchExecutor`] is the only place a segment run touches the outside
//! world. It receives the operations of one batch and answers with one raw
//! result per operation, in order, as a single atomic round trip.

use std::sync::Arc;

use async_trait::async_trait;

/// Executes an ordered batch of operations as one atomic round trip.
///
/// Implementations must return exactly one raw result per operation, in the
/// same order. If any operation fails, the whole call fails with the first
/// error in operation order; mixed success and error results are never
/// returned.
///
/// Used as `&dyn BatchExecutor<Op, Raw>` by the execution engine.
#[async_trait]
pub trait BatchExecutor<Op, Raw>: Send + Sync {
    /// Execute `operations` as one batch.
    async fn execute(&self, operations: &[Op]) -> anyhow::Result<Vec<Raw>>;
}

#[async_trait]
impl<Op, Raw, E> BatchExecutor<Op, Raw> for Arc<E>
where
    E: BatchExecutor<Op, Raw> + ?Sized,
    Op: Sync + 'static,
    Raw: 'static,
{
    async fn execute(&self, operations: &[Op]) -> anyhow::Result<Vec<Raw>> {
        (**self).execute(operations).await
    }
}

#[async_trait]
impl<Op, Raw, E> BatchExecutor<Op, Raw> for &E
where
    E: BatchExecutor<Op, Raw> + ?Sized,
    Op: Sync + 'static,
    Raw: 'static,
{
    async fn execute(&self, operations: &[Op]) -> anyhow::Result<Vec<Raw>> {
        (**self).execute(operations).await
    }
}
