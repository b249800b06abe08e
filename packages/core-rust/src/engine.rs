//! The execution engine behind [`Segment::run`](crate::Segment::run).
//!
//! Runs a node graph as a loop over an explicit frame stack, so neither
//! the depth of a dependency chain nor the number of merged stages grows
//! the call stack.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::SegmentError;
use crate::executor::BatchExecutor;
use crate::node::{MergeFn, NextFn, Node, Resolved, Value};
use crate::segment::{Operation, RawResult};
use crate::stage::{Rewrite, Stage};

impl<Op: Operation, Raw: RawResult> Resolved<Op, Raw> {
    /// Send the operations as one batch and decode the answer.
    ///
    /// An empty batch never reaches the executor.
    async fn execute(&self, executor: &dyn BatchExecutor<Op, Raw>) -> Result<Value, SegmentError> {
        if self.operations.is_empty() {
            trace!("empty batch, executor not called");
            return self.decode(Vec::new()).map_err(SegmentError::Decode);
        }

        let expected = self.operations.len();
        debug!(operations = expected, "executing batch");

        let raw = executor
            .execute(&self.operations)
            .await
            .map_err(SegmentError::Executor)?;

        if raw.len() != expected {
            return Err(SegmentError::ResultCount {
                expected,
                actual: raw.len(),
            });
        }

        self.decode(raw).map_err(SegmentError::Decode)
    }
}

/// Work waiting for the node an advance produces.
enum Frame<Op, Raw> {
    /// Keep running that node; feed its value to `then`, if any.
    Run(Option<NextFn<Op, Raw>>),
    /// Apply the rewrites queued on the advanced pending node.
    Wrap(Vec<Rewrite<Op, Raw>>),
    /// The left side of a sequenced stage has advanced; advance the right.
    Right {
        right: Node<Op, Raw>,
        merge: MergeFn,
    },
    /// Both sides have advanced; merge them.
    Zip {
        left: Node<Op, Raw>,
        merge: MergeFn,
    },
}

enum State<Op, Raw> {
    /// Run a node to its value, then hand the value to `then`.
    Run {
        node: Node<Op, Raw>,
        then: Option<NextFn<Op, Raw>>,
    },
    /// Take one dependency step of a node.
    Advance(Node<Op, Raw>),
    /// An advance produced this node.
    Advanced(Node<Op, Raw>),
}

/// Run `root` against `executor` and return its type-erased value.
///
/// Pending stages are resolved in order, each one fully (including
/// decoding) before the next stage's operations are built. Every resolved
/// node costs exactly one executor call, or none when it has no operations.
pub(crate) async fn run<Op, Raw>(
    root: &Node<Op, Raw>,
    executor: &dyn BatchExecutor<Op, Raw>,
) -> Result<Value, SegmentError>
where
    Op: Operation,
    Raw: RawResult,
{
    let mut frames: Vec<Frame<Op, Raw>> = Vec::new();
    let mut state = State::Run {
        node: root.clone(),
        then: None,
    };

    loop {
        state = match state {
            State::Run {
                node: Node::Resolved(leaf),
                then,
            } => {
                let value = leaf.execute(executor).await?;
                match then {
                    Some(next) => {
                        State::Advanced(next(value).map_err(SegmentError::Continuation)?)
                    }
                    None => return Ok(value),
                }
            }
            State::Run { node, then } => {
                frames.push(Frame::Run(then));
                State::Advance(node)
            }
            State::Advance(Node::Resolved(leaf)) => State::Advanced(Node::Resolved(leaf)),
            State::Advance(Node::Pending(pending)) => {
                trace!("advancing pending stage");
                frames.push(Frame::Wrap(pending.wrap));
                match pending.stage.as_ref() {
                    Stage::Dependent { parent, next } => State::Run {
                        node: parent.clone(),
                        then: Some(Arc::clone(next)),
                    },
                    Stage::Sequenced { left, right, merge } => {
                        frames.push(Frame::Right {
                            right: right.clone(),
                            merge: Arc::clone(merge),
                        });
                        State::Advance(left.clone())
                    }
                }
            }
            State::Advanced(node) => match frames.pop() {
                Some(Frame::Run(then)) => State::Run { node, then },
                Some(Frame::Wrap(rewrites)) => State::Advanced(node.rewrite(rewrites)),
                Some(Frame::Right { right, merge }) => {
                    frames.push(Frame::Zip { left: node, merge });
                    State::Advance(right)
                }
                Some(Frame::Zip { left, merge }) => State::Advanced(left.zip(node, merge)),
                None => State::Run { node, then: None },
            },
        };
    }
}
