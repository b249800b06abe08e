//! Untyped segment graph.
//!
//! [`Segment`](crate::Segment) is a typed view over a [`Node`]. Decoded
//! values travel through the graph as [`Value`]s and are downcast back to
//! their static type at the typed boundary. Nothing in this module recurses
//! over the graph: a resolved node decodes with a flat postfix program, and
//! merging two resolved nodes concatenates their programs.

use std::any::{type_name, Any};
use std::sync::Arc;

use anyhow::Context;

use crate::segment::{Operation, RawResult};
use crate::stage::{Pending, Rewrite, Stage};

/// A decoded result with its type erased.
pub(crate) type Value = Box<dyn Any + Send>;

/// Decodes the raw results of one leaf's operations.
pub(crate) type DecodeFn<Raw> = Arc<dyn Fn(Vec<Raw>) -> anyhow::Result<Value> + Send + Sync>;

/// Transforms a decoded value.
pub(crate) type MapFn = Arc<dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync>;

/// Combines the decoded values of two merged nodes, left first.
pub(crate) type MergeFn = Arc<dyn Fn(Value, Value) -> anyhow::Result<Value> + Send + Sync>;

/// Builds the next node of a chain from its parent's decoded value.
pub(crate) type NextFn<Op, Raw> = Arc<dyn Fn(Value) -> anyhow::Result<Node<Op, Raw>> + Send + Sync>;

/// Recover the static type of a value.
pub(crate) fn downcast<R: 'static>(value: Value) -> anyhow::Result<R> {
    value
        .downcast::<R>()
        .map(|value| *value)
        .map_err(|_| anyhow::anyhow!("decoded value is not a `{}`", type_name::<R>()))
}

/// Erase the type of a value.
pub(crate) fn erase<R: Send + 'static>(value: R) -> Value {
    Box::new(value)
}

/// One instruction of a decode program.
pub(crate) enum Step<Raw> {
    /// Take the next `arity` raw results and push their decoded value.
    Decode { arity: usize, decode: DecodeFn<Raw> },
    /// Replace the top value.
    Map(MapFn),
    /// Pop the right then the left value and push their merge.
    Zip(MergeFn),
}

impl<Raw> Clone for Step<Raw> {
    fn clone(&self) -> Self {
        match self {
            Self::Decode { arity, decode } => Self::Decode {
                arity: *arity,
                decode: Arc::clone(decode),
            },
            Self::Map(f) => Self::Map(Arc::clone(f)),
            Self::Zip(merge) => Self::Zip(Arc::clone(merge)),
        }
    }
}

/// Operations ready to be sent, plus the program decoding their raw results.
///
/// The `Decode` steps of `program` appear in operation order and their
/// arities add up to `operations.len()`.
pub(crate) struct Resolved<Op, Raw> {
    pub(crate) operations: Vec<Op>,
    pub(crate) program: Vec<Step<Raw>>,
}

impl<Op: Clone, Raw> Clone for Resolved<Op, Raw> {
    fn clone(&self) -> Self {
        Self {
            operations: self.operations.clone(),
            program: self.program.clone(),
        }
    }
}

impl<Op, Raw> Resolved<Op, Raw> {
    pub(crate) fn leaf(operations: Vec<Op>, decode: DecodeFn<Raw>) -> Self {
        let arity = operations.len();
        Self {
            operations,
            program: vec![Step::Decode { arity, decode }],
        }
    }

    /// Placeholder left behind when a node is taken apart.
    pub(crate) fn vacant() -> Self {
        Self {
            operations: Vec::new(),
            program: Vec::new(),
        }
    }

    /// Merge `right` into the same batch, after `self`.
    pub(crate) fn merge(mut self, right: Self, merge: MergeFn) -> Self {
        self.operations.extend(right.operations);
        self.program.extend(right.program);
        self.program.push(Step::Zip(merge));
        self
    }

    /// Run the decode program over the raw results of this node's batch.
    pub(crate) fn decode(&self, raw: Vec<Raw>) -> anyhow::Result<Value> {
        let received = raw.len();
        let expected = self.operations.len();
        let mut raw = raw.into_iter();
        let mut values: Vec<Value> = Vec::new();

        for step in &self.program {
            match step {
                Step::Decode { arity, decode } => {
                    let part: Vec<Raw> = raw.by_ref().take(*arity).collect();
                    anyhow::ensure!(
                        part.len() == *arity,
                        "expected {expected} raw results, got {received}"
                    );
                    values.push(decode(part)?);
                }
                Step::Map(f) => {
                    let value = values.pop().context("decode program underflow")?;
                    values.push(f(value)?);
                }
                Step::Zip(merge) => {
                    let right = values.pop().context("decode program underflow")?;
                    let left = values.pop().context("decode program underflow")?;
                    values.push(merge(left, right)?);
                }
            }
        }

        anyhow::ensure!(
            raw.as_slice().is_empty(),
            "expected {expected} raw results, got {received}"
        );
        let value = values.pop().context("decode program produced no value")?;
        anyhow::ensure!(values.is_empty(), "decode program left unmerged values");
        Ok(value)
    }
}

/// A segment's state: resolved, or waiting on a dependency stage.
pub(crate) enum Node<Op, Raw> {
    Resolved(Resolved<Op, Raw>),
    Pending(Pending<Op, Raw>),
}

impl<Op: Clone, Raw> Clone for Node<Op, Raw> {
    fn clone(&self) -> Self {
        match self {
            Self::Resolved(leaf) => Self::Resolved(leaf.clone()),
            Self::Pending(pending) => Self::Pending(pending.clone()),
        }
    }
}

impl<Op: Operation, Raw: RawResult> Node<Op, Raw> {
    /// Apply `rewrites`, in order, to the resolved node this chain ends in.
    ///
    /// A pending node keeps its stage and queues the rewrites after its own.
    pub(crate) fn rewrite(self, rewrites: Vec<Rewrite<Op, Raw>>) -> Self {
        match self {
            Self::Resolved(leaf) => Self::Resolved(
                rewrites
                    .iter()
                    .fold(leaf, |leaf, rewrite| rewrite.apply(leaf)),
            ),
            Self::Pending(mut pending) => {
                pending.wrap.extend(rewrites);
                Self::Pending(pending)
            }
        }
    }

    /// Merge two independent nodes, `self` first.
    ///
    /// Resolved work lands in the last batch of a pending chain; two pending
    /// chains advance side by side and merge once both are resolved.
    pub(crate) fn zip(self, right: Self, merge: MergeFn) -> Self {
        match (self, right) {
            (Self::Resolved(left), Self::Resolved(right)) => {
                Self::Resolved(left.merge(right, merge))
            }
            (Self::Resolved(left), Self::Pending(mut right)) => {
                right.wrap.push(Rewrite::Before(Arc::new(left), merge));
                Self::Pending(right)
            }
            (Self::Pending(mut left), Self::Resolved(right)) => {
                left.wrap.push(Rewrite::After(Arc::new(right), merge));
                Self::Pending(left)
            }
            (left @ Self::Pending(_), right @ Self::Pending(_)) => {
                Self::Pending(Pending::new(Stage::Sequenced { left, right, merge }))
            }
        }
    }
}
