//! `keyseg` Store — typed string commands, replies and executors for segments.
//!
//! Builds [`Pipeline`] segments from the typed command [`catalog`], runs them
//! against the in-memory [`MemoryStore`], and wraps any executor in the
//! [`middleware`] stack.

pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod memory;
pub mod middleware;
pub mod pipeline;
pub mod reply;

pub use command::{cmd, Command, CommandOptions, ReplyEncoding, TypedCommand};
pub use config::ExecutorConfig;
pub use error::{try_pipeline, CommandError, ExecutorError};
pub use keyseg_core::{BatchExecutor, Concat, Segment, SegmentError};
pub use memory::MemoryStore;
pub use middleware::build_executor_stack;
pub use pipeline::{all, replies, single, Pipeline};
pub use reply::{FromReply, Reply, ReplyError};
