//! The [`Segment`] data model.
//!
//! A segment is either *resolved* (its operations are known and can be sent
//! as one batch) or *pending* (its operations can only be built once a parent
//! segment has run). Combinators never mutate a segment; they build a new one
//! around the old state, so segments are cheap to clone and can be run any
//! number of times.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::engine;
use crate::error::SegmentError;
use crate::executor::BatchExecutor;
use crate::node::{downcast, erase, Node, Resolved, Value};
use crate::stage::{Pending, Rewrite, Stage};

/// Bounds required of an opaque operation.
///
/// The core never inspects operations; it only moves and clones them into
/// batches.
pub trait Operation: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Operation for T {}

/// Bounds required of a raw, undecoded per-operation result.
pub trait RawResult: Send + 'static {}

impl<T: Send + 'static> RawResult for T {}

/// A composable, possibly multi-stage unit of batched work.
///
/// `Op` is the opaque operation type handed to the [`BatchExecutor`], `Raw`
/// the per-operation result it answers with, and `R` what the segment decodes
/// to once every stage has run.
///
/// Independent segments combined with [`append`](Segment::append) or
/// [`zip_with`](Segment::zip_with) share batches; work sequenced with
/// [`then`](Segment::then) runs in a later batch because its operations depend
/// on earlier results.
pub struct Segment<Op, Raw, R> {
    node: Node<Op, Raw>,
    result: PhantomData<fn() -> R>,
}

impl<Op: Clone, Raw, R> Clone for Segment<Op, Raw, R> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            result: PhantomData,
        }
    }
}

impl<Op, Raw, R> fmt::Debug for Segment<Op, Raw, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Node::Resolved(leaf) => f
                .debug_struct("Segment")
                .field("state", &"resolved")
                .field("operations", &leaf.operations.len())
                .finish(),
            Node::Pending(_) => f
                .debug_struct("Segment")
                .field("state", &"pending")
                .finish_non_exhaustive(),
        }
    }
}

impl<Op: Operation, Raw: RawResult, R: Send + 'static> Segment<Op, Raw, R> {
    pub(crate) fn from_node(node: Node<Op, Raw>) -> Self {
        Self {
            node,
            result: PhantomData,
        }
    }

    pub(crate) fn into_node(self) -> Node<Op, Raw> {
        self.node
    }

    /// Create a resolved segment from raw operations.
    ///
    /// `decode` receives the raw results positionally aligned with
    /// `operations` and must consume all of them.
    pub fn from_operations<F>(operations: Vec<Op>, decode: F) -> Self
    where
        F: Fn(Vec<Raw>) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        Self::from_node(Node::Resolved(Resolved::leaf(
            operations,
            Arc::new(move |raw: Vec<Raw>| -> anyhow::Result<Value> { decode(raw).map(erase) }),
        )))
    }

    /// A segment with no operations that decodes to `value`.
    #[must_use]
    pub fn pure(value: R) -> Self
    where
        R: Clone + Sync,
    {
        Self::from_operations(Vec::new(), move |_| Ok(value.clone()))
    }

    /// Whether this segment waits on a parent before its operations are known.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.node, Node::Pending(_))
    }

    /// The operations of the batch this segment sends, if already known.
    ///
    /// Returns `None` for pending segments.
    #[must_use]
    pub fn operations(&self) -> Option<&[Op]> {
        match &self.node {
            Node::Resolved(leaf) => Some(&leaf.operations),
            Node::Pending(_) => None,
        }
    }

    /// Transform the decoded result.
    ///
    /// The operations and the dependency chain stay the same; `f` runs after
    /// the final decode.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Segment<Op, Raw, U>
    where
        U: Send + 'static,
        F: Fn(R) -> U + Send + Sync + 'static,
    {
        self.try_map(move |results| Ok(f(results)))
    }

    /// Fallible [`map`](Segment::map). An error fails the run with
    /// [`SegmentError::Decode`].
    #[must_use]
    pub fn try_map<U, F>(self, f: F) -> Segment<Op, Raw, U>
    where
        U: Send + 'static,
        F: Fn(R) -> anyhow::Result<U> + Send + Sync + 'static,
    {
        let map = Rewrite::Map(Arc::new(move |value: Value| -> anyhow::Result<Value> {
            f(downcast(value)?).map(erase)
        }));
        Segment::from_node(self.node.rewrite(vec![map]))
    }

    /// Sequence dependent work.
    ///
    /// The returned segment first runs `self`, then hands its decoded result
    /// to `f` to build the next segment, and runs that.
    #[must_use]
    pub fn then<U, F>(self, f: F) -> Segment<Op, Raw, U>
    where
        U: Send + 'static,
        F: Fn(R) -> Segment<Op, Raw, U> + Send + Sync + 'static,
    {
        self.try_then(move |results| Ok(f(results)))
    }

    /// Fallible [`then`](Segment::then). An error fails the run with
    /// [`SegmentError::Continuation`].
    #[must_use]
    pub fn try_then<U, F>(self, f: F) -> Segment<Op, Raw, U>
    where
        U: Send + 'static,
        F: Fn(R) -> anyhow::Result<Segment<Op, Raw, U>> + Send + Sync + 'static,
    {
        Segment::from_node(Node::Pending(Pending::new(Stage::Dependent {
            parent: self.node,
            next: Arc::new(move |value: Value| -> anyhow::Result<Node<Op, Raw>> {
                Ok(f(downcast(value)?)?.node)
            }),
        })))
    }

    /// Run the segment against `executor`.
    ///
    /// Pending stages are resolved in order, each one fully (including
    /// decoding) before the next stage's operations are built. Every
    /// resolved node costs exactly one executor call, or none when it has no
    /// operations. The first failure aborts the run; no later decode or
    /// continuation is invoked.
    pub async fn run(&self, executor: &dyn BatchExecutor<Op, Raw>) -> Result<R, SegmentError> {
        let value = engine::run(&self.node, executor).await?;
        downcast(value).map_err(SegmentError::Decode)
    }
}
