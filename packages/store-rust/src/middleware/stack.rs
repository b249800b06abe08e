//! Stack composition: combines all middleware layers around an executor.

use keyseg_core::BatchExecutor;
use tower::ServiceBuilder;

use super::limit::BatchLimitLayer;
use super::timeout::TimeoutLayer;
use super::trace::TraceLayer;
use crate::config::ExecutorConfig;

/// Wrap `inner` with the executor middleware layers.
///
/// Layer order (outermost to innermost):
/// 1. `BatchLimitLayer` -- reject oversized batches (fail fast before doing any work)
/// 2. `TimeoutLayer` -- enforce the per-batch timeout
/// 3. `TraceLayer` -- record timing and outcome (closest to the actual executor)
#[must_use]
pub fn build_executor_stack<E, Op, Raw>(
    inner: E,
    config: &ExecutorConfig,
) -> impl BatchExecutor<Op, Raw>
where
    E: BatchExecutor<Op, Raw>,
    Op: Sync + 'static,
    Raw: 'static,
{
    ServiceBuilder::new()
        .layer(BatchLimitLayer::new(config.max_batch_operations))
        .layer(TimeoutLayer::new(config.batch_timeout()))
        .layer(TraceLayer)
        .service(inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
