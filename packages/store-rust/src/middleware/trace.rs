//! Tracing middleware for batches.
//!
//! Records batch size, duration and outcome in a `tracing` span per executor
//! call.

use std::time::Instant;

use async_trait::async_trait;
use keyseg_core::BatchExecutor;
use tower::Layer;
use tracing::{info_span, Instrument};

// ---------------------------------------------------------------------------
// TraceLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments executor calls with `tracing` spans.
#[derive(Debug, Clone)]
pub struct TraceLayer;

impl<E> Layer<E> for TraceLayer {
    type Service = Traced<E>;

    fn layer(&self, inner: E) -> Self::Service {
        Traced { inner }
    }
}

// ---------------------------------------------------------------------------
// Traced
// ---------------------------------------------------------------------------

/// Executor wrapper that records batch timing and outcome.
#[derive(Debug, Clone)]
pub struct Traced<E> {
    inner: E,
}

#[async_trait]
impl<E, Op, Raw> BatchExecutor<Op, Raw> for Traced<E>
where
    E: BatchExecutor<Op, Raw>,
    Op: Sync + 'static,
    Raw: 'static,
{
    async fn execute(&self, operations: &[Op]) -> anyhow::Result<Vec<Raw>> {
        let span = info_span!(
            "batch",
            operations = operations.len(),
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );
        let fut = self.inner.execute(operations);

        async move {
            let start = Instant::now();
            let result = fut.await;

            #[allow(clippy::cast_possible_truncation)]
            let duration_ms = start.elapsed().as_millis() as u64;
            let outcome = match &result {
                Ok(_) => "ok",
                Err(_) => "error",
            };
            tracing::Span::current().record("duration_ms", duration_ms);
            tracing::Span::current().record("outcome", outcome);

            match &result {
                Ok(_) => tracing::debug!(duration_ms, "batch complete"),
                Err(err) => tracing::warn!(duration_ms, error = %err, "batch failed"),
            }

            result
        }
        .instrument(span)
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::cmd;
    use crate::memory::MemoryStore;
    use crate::reply::Reply;

    #[tokio::test]
    async fn trace_layer_passes_through_replies() {
        let exec = TraceLayer.layer(MemoryStore::new());
        let replies = exec.execute(&[cmd("INCR", ["n"])]).await.unwrap();
        assert_eq!(replies, vec![Reply::Int(1)]);
    }

    #[tokio::test]
    async fn trace_layer_passes_through_errors() {
        let exec = TraceLayer.layer(MemoryStore::new());
        let err = exec.execute(&[cmd("NOPE", ["x"])]).await.unwrap_err();
        assert!(err.to_string().contains("unknown command"));
    }
}
