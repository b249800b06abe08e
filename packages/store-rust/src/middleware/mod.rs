//! Tower layers wrapping a [`BatchExecutor`](keyseg_core::BatchExecutor).
//!
//! - [`limit`]: Rejects oversized batches before any work is done
//! - [`timeout`]: Per-batch timeout enforcement
//! - [`trace`]: Batch timing and outcome via `tracing` spans
//! - [`stack`]: Composes all layers around an executor

pub mod limit;
pub mod stack;
pub mod timeout;
pub mod trace;

pub use limit::{BatchLimit, BatchLimitLayer};
pub use stack::build_executor_stack;
pub use timeout::{Timeout, TimeoutLayer};
pub use trace::{Traced, TraceLayer};
