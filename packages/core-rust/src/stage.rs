//! Pending stages: the dependency nodes behind a pending segment.
//!
//! A stage is either a parent segment with the continuation fed its result
//! ([`Stage::Dependent`]), or two independent pending chains advanced side by
//! side ([`Stage::Sequenced`]). Work merged into a chain or mapped over it
//! does not nest: it is queued on the [`Pending`] node as a flat list of
//! [`Rewrite`]s applied to whatever resolved node the stage produces.

use std::sync::Arc;

use crate::node::{MapFn, MergeFn, NextFn, Node, Resolved, Step};
use crate::segment::{Operation, RawResult};

/// A stage plus the rewrites queued for the resolved node it ends in.
pub(crate) struct Pending<Op, Raw> {
    pub(crate) stage: Arc<Stage<Op, Raw>>,
    pub(crate) wrap: Vec<Rewrite<Op, Raw>>,
}

impl<Op, Raw> Clone for Pending<Op, Raw> {
    fn clone(&self) -> Self {
        Self {
            stage: Arc::clone(&self.stage),
            wrap: self.wrap.clone(),
        }
    }
}

impl<Op, Raw> Pending<Op, Raw> {
    pub(crate) fn new(stage: Stage<Op, Raw>) -> Self {
        Self {
            stage: Arc::new(stage),
            wrap: Vec::new(),
        }
    }
}

/// One dependency step.
pub(crate) enum Stage<Op, Raw> {
    /// Run `parent` to completion, then build the next node from its value.
    Dependent {
        parent: Node<Op, Raw>,
        next: NextFn<Op, Raw>,
    },
    /// Advance `left`, then `right`, and merge the two resulting nodes.
    ///
    /// Dependency stages therefore run level by level in operand order,
    /// which keeps the batch sequence independent of how a chain of merges
    /// is parenthesized.
    Sequenced {
        left: Node<Op, Raw>,
        right: Node<Op, Raw>,
        merge: MergeFn,
    },
}

impl<Op, Raw> Stage<Op, Raw> {
    /// Move every pending child stage into `out`, leaving vacant leaves.
    fn detach_children(&mut self, out: &mut Vec<Arc<Stage<Op, Raw>>>) {
        match self {
            Self::Dependent { parent, .. } => detach(parent, out),
            Self::Sequenced { left, right, .. } => {
                detach(left, out);
                detach(right, out);
            }
        }
    }
}

fn detach<Op, Raw>(node: &mut Node<Op, Raw>, out: &mut Vec<Arc<Stage<Op, Raw>>>) {
    if matches!(node, Node::Pending(_)) {
        let taken = std::mem::replace(node, Node::Resolved(Resolved::vacant()));
        if let Node::Pending(pending) = taken {
            out.push(pending.stage);
        }
    }
}

// Chains can be arbitrarily deep; tear them down with a worklist instead of
// nested drop glue.
impl<Op, Raw> Drop for Stage<Op, Raw> {
    fn drop(&mut self) {
        let mut orphans = Vec::new();
        self.detach_children(&mut orphans);
        while let Some(stage) = orphans.pop() {
            if let Some(mut stage) = Arc::into_inner(stage) {
                stage.detach_children(&mut orphans);
            }
        }
    }
}

/// Change applied to the resolved node a pending chain ends in.
pub(crate) enum Rewrite<Op, Raw> {
    /// Compose a function onto the decoded value.
    Map(MapFn),
    /// Merge a resolved node into the same batch, ahead of the chain's work.
    Before(Arc<Resolved<Op, Raw>>, MergeFn),
    /// Merge a resolved node into the same batch, after the chain's work.
    After(Arc<Resolved<Op, Raw>>, MergeFn),
}

impl<Op, Raw> Clone for Rewrite<Op, Raw> {
    fn clone(&self) -> Self {
        match self {
            Self::Map(f) => Self::Map(Arc::clone(f)),
            Self::Before(leaf, merge) => Self::Before(Arc::clone(leaf), Arc::clone(merge)),
            Self::After(leaf, merge) => Self::After(Arc::clone(leaf), Arc::clone(merge)),
        }
    }
}

impl<Op: Operation, Raw: RawResult> Rewrite<Op, Raw> {
    pub(crate) fn apply(&self, leaf: Resolved<Op, Raw>) -> Resolved<Op, Raw> {
        match self {
            Self::Map(f) => {
                let mut leaf = leaf;
                leaf.program.push(Step::Map(Arc::clone(f)));
                leaf
            }
            Self::Before(left, merge) => (**left).clone().merge(leaf, Arc::clone(merge)),
            Self::After(right, merge) => leaf.merge((**right).clone(), Arc::clone(merge)),
        }
    }
}
