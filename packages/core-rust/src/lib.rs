//! `keyseg` Core — composable pipeline segments over a batch executor.
//!
//! A [`Segment`] describes work against a key-value store as batches of
//! opaque operations plus the decode of their results. Independent segments
//! merge into shared batches; dependent work is sequenced with
//! [`Segment::then`]. [`Segment::run`] sends the fewest batches the
//! dependencies allow through a [`BatchExecutor`].

pub mod algebra;
mod engine;
pub mod error;
pub mod executor;
mod node;
pub mod segment;
mod stage;

#[cfg(test)]
mod testing;

pub use algebra::Concat;
pub use error::SegmentError;
pub use executor::BatchExecutor;
pub use segment::{Operation, RawResult, Segment};
