//! Error types surfaced by [`Segment::run`](crate::Segment::run).

/// Failure of a segment run.
///
/// Every failure surfaces as a single error at the `run` call site; there is
/// no partial-result reporting.
#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    /// The batch executor rejected a batch. The executor's error is carried
    /// unchanged and can be recovered with `anyhow::Error::downcast_ref`.
    #[error("batch executor failed: {0}")]
    Executor(#[source] anyhow::Error),
    /// A decode function rejected the raw results of a batch.
    #[error("failed to decode batch results: {0}")]
    Decode(#[source] anyhow::Error),
    /// A continuation failed to build the next segment.
    #[error("continuation failed: {0}")]
    Continuation(#[source] anyhow::Error),
    /// The executor broke its contract by returning a different number of
    /// raw results than operations it was given.
    #[error("executor returned {actual} results for {expected} operations")]
    ResultCount { expected: usize, actual: usize },
}

impl SegmentError {
    /// Returns the executor error if this failure came from the executor.
    #[must_use]
    pub fn executor_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Executor(err) => Some(err),
            _ => None,
        }
    }
}
