//! Segment composition: merging independent segments into shared batches.
//!
//! [`Segment::zip_with`] is the general merge. Two resolved segments merge
//! directly into one batch whose raw results are split back at the boundary.
//! When either side is pending, the merge is pushed down to the terminal
//! resolved node of the pending chain, so the merged work still lands in the
//! last batch of that chain. Two pending sides advance their dependency
//! stages in order and merge once both chains are resolved.
//!
//! [`Segment::append`], [`Segment::empty`] and [`Segment::concat`] make
//! segments whose results implement [`Concat`] a monoid.

use std::sync::Arc;

use crate::node::{downcast, erase, Value};
use crate::segment::{Operation, RawResult, Segment};

/// Decoded results that can be concatenated, with an empty value as identity.
pub trait Concat: Sized {
    /// The identity element.
    fn empty() -> Self;

    /// `self` followed by `other`.
    #[must_use]
    fn concat(self, other: Self) -> Self;
}

impl<T> Concat for Vec<T> {
    fn empty() -> Self {
        Vec::new()
    }

    fn concat(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }
}

impl Concat for () {
    fn empty() -> Self {}

    fn concat(self, (): Self) -> Self {}
}

impl<Op: Operation, Raw: RawResult, R: Send + 'static> Segment<Op, Raw, R> {
    /// Merge with an independent segment, combining both results with `merge`.
    ///
    /// Operations of `self` come first in every shared batch, followed by
    /// those of `other`.
    #[must_use]
    pub fn zip_with<U, V, F>(self, other: Segment<Op, Raw, U>, merge: F) -> Segment<Op, Raw, V>
    where
        U: Send + 'static,
        V: Send + 'static,
        F: Fn(R, U) -> V + Send + Sync + 'static,
    {
        let merge = Arc::new(move |left: Value, right: Value| -> anyhow::Result<Value> {
            Ok(erase(merge(downcast(left)?, downcast(right)?)))
        });
        Segment::from_node(self.into_node().zip(other.into_node(), merge))
    }

    /// Merge with an independent segment, pairing both results.
    #[must_use]
    pub fn join<U>(self, other: Segment<Op, Raw, U>) -> Segment<Op, Raw, (R, U)>
    where
        U: Send + 'static,
    {
        self.zip_with(other, |left, right| (left, right))
    }
}

impl<Op: Operation, Raw: RawResult, R: Concat + Send + 'static> Segment<Op, Raw, R> {
    /// The identity segment: no operations, decodes to `R::empty()`.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_operations(Vec::new(), |_| Ok(R::empty()))
    }

    /// Merge with an independent segment, concatenating results.
    ///
    /// Associative, with [`Segment::empty`] as identity.
    #[must_use]
    pub fn append(self, other: Self) -> Self {
        self.zip_with(other, Concat::concat)
    }

    /// Fold `segments` with [`append`](Segment::append), starting from
    /// [`empty`](Segment::empty).
    #[must_use]
    pub fn concat<I>(segments: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        segments.into_iter().fold(Self::empty(), Self::append)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::testing::{EchoExecutor, Scripted};

    type Numbers = Segment<i64, i64, Vec<i64>>;
    type Text = Segment<&'static str, String, Vec<String>>;
    type Tagged = Segment<i64, i64, Vec<(usize, i64)>>;

    fn numbers(ops: Vec<i64>) -> Numbers {
        Segment::from_operations(ops, Ok)
    }

    fn texts(ops: Vec<&'static str>) -> Text {
        Segment::from_operations(ops, Ok)
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[tokio::test]
    async fn independent_segments_share_one_batch() {
        let exec = Scripted::new(vec![Ok(vec![
            "OK".to_string(),
            "hi".to_string(),
            "bye".to_string(),
        ])]);
        let a = texts(vec!["set k hi", "get k"]);
        let b = texts(vec!["get k2"]);

        let merged = a.append(b);
        assert_eq!(merged.operations(), Some(&["set k hi", "get k", "get k2"][..]));
        assert_eq!(merged.run(&exec).await.unwrap(), vec!["OK", "hi", "bye"]);
        assert_eq!(exec.calls().len(), 1);
    }

    #[tokio::test]
    async fn join_keeps_heterogeneous_results() {
        let exec = EchoExecutor::new();
        let count = Segment::from_operations(vec![1i64, 2], |raw: Vec<i64>| Ok(raw.len()));
        let label =
            Segment::from_operations(vec![3i64], |raw: Vec<i64>| Ok(format!("#{}", raw[0])));

        let (n, s) = count.join(label).run(&exec).await.unwrap();
        assert_eq!((n, s.as_str()), (2, "#30"));
        assert_eq!(exec.batches(), vec![vec![1, 2, 3]]);
    }

    #[tokio::test]
    async fn resolved_work_joins_last_batch_of_pending_chain() {
        let exec = EchoExecutor::new();
        let pending = numbers(vec![1]).then(|r| numbers(vec![r[0] + 1]));
        let merged = numbers(vec![5]).append(pending).append(numbers(vec![7]));

        assert_eq!(merged.run(&exec).await.unwrap(), vec![50, 110, 70]);
        assert_eq!(exec.batches(), vec![vec![1], vec![5, 11, 7]]);
    }

    #[tokio::test]
    async fn pending_chains_resolve_in_operand_order() {
        let exec = EchoExecutor::new();
        let a = numbers(vec![1]).then(|r| numbers(vec![r[0] + 1]));
        let b = numbers(vec![2]).then(|r| numbers(vec![r[0] + 2]));

        assert_eq!(a.append(b).run(&exec).await.unwrap(), vec![110, 220]);
        assert_eq!(exec.batches(), vec![vec![1], vec![2], vec![11, 22]]);
    }

    #[tokio::test]
    async fn chains_of_different_depth_merge_at_the_end() {
        let exec = EchoExecutor::new();
        let shallow = numbers(vec![1]).then(|r| numbers(vec![r[0]]));
        let deep = numbers(vec![2])
            .then(|r| numbers(vec![r[0]]))
            .then(|r| numbers(vec![r[0]]));

        assert_eq!(shallow.append(deep).run(&exec).await.unwrap(), vec![100, 2000]);
        assert_eq!(exec.batches(), vec![vec![1], vec![2], vec![20], vec![10, 200]]);
    }

    #[tokio::test]
    async fn concat_of_nothing_makes_no_calls() {
        let exec = EchoExecutor::new();
        let seg = Numbers::concat(Vec::new());
        assert_eq!(seg.run(&exec).await.unwrap(), Vec::<i64>::new());
        assert!(exec.batches().is_empty());
    }

    #[tokio::test]
    async fn unit_results_concat() {
        let exec = EchoExecutor::new();
        let a: Segment<i64, i64, ()> = Segment::from_operations(vec![1], |_| Ok(()));
        let b: Segment<i64, i64, ()> = Segment::from_operations(vec![2], |_| Ok(()));
        a.append(Segment::empty()).append(b).run(&exec).await.unwrap();
        assert_eq!(exec.batches(), vec![vec![1, 2]]);
    }

    #[test]
    fn wide_concat_keeps_every_result_in_one_batch() {
        let exec = EchoExecutor::new();
        let seg = Numbers::concat((0..20_000).map(|i| numbers(vec![i])));

        let results = block_on(seg.run(&exec)).unwrap();

        assert_eq!(results, (0..20_000).map(|i| i * 10).collect::<Vec<_>>());
        assert_eq!(exec.batches(), vec![(0..20_000).collect::<Vec<_>>()]);
    }

    #[test]
    fn right_nested_appends_split_results_in_order() {
        let exec = EchoExecutor::new();
        let seg = (0..2_000)
            .rev()
            .fold(Numbers::empty(), |acc, i| numbers(vec![i]).append(acc));

        let results = block_on(seg.run(&exec)).unwrap();

        assert_eq!(results, (0..2_000).map(|i| i * 10).collect::<Vec<_>>());
        assert_eq!(exec.batches().len(), 1);
    }

    #[test]
    fn many_pending_chains_advance_side_by_side() {
        let exec = EchoExecutor::new();
        let seg = Numbers::concat(
            (0..5_000).map(|i| numbers(vec![i]).then(|r| numbers(vec![r[0] + 1]))),
        );

        let results = block_on(seg.run(&exec)).unwrap();

        let batches = exec.batches();
        assert_eq!(batches.len(), 5_001);
        assert_eq!(batches[4_999], vec![4_999]);
        assert_eq!(batches[5_000], (0..5_000).map(|i| i * 10 + 1).collect::<Vec<_>>());
        assert_eq!(results, (0..5_000).map(|i| (i * 10 + 1) * 10).collect::<Vec<_>>());
    }

    #[test]
    fn resolved_work_merges_into_many_pending_chains() {
        let exec = EchoExecutor::new();
        let mut seg = numbers(vec![1]).then(|r| numbers(vec![r[0]]));
        for i in 0..10_000 {
            seg = seg.append(numbers(vec![i]));
        }

        let results = block_on(seg.run(&exec)).unwrap();

        let batches = exec.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].len(), 10_001);
        assert_eq!(results[..3], [100, 0, 10]);
    }

    // -----------------------------------------------------------------------
    // Laws
    // -----------------------------------------------------------------------

    /// Shape of a generated segment tree, paired with a reference evaluator.
    #[derive(Debug, Clone)]
    enum Shape {
        Leaf(Vec<i64>),
        Concat(Vec<Shape>),
        Then(Box<Shape>, Vec<i64>),
        Reverse(Box<Shape>),
    }

    fn shape() -> impl Strategy<Value = Shape> {
        let leaf = prop::collection::vec(-1000i64..1000, 0..4).prop_map(Shape::Leaf);
        leaf.prop_recursive(4, 32, 5, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..5).prop_map(Shape::Concat),
                (inner.clone(), prop::collection::vec(-1000i64..1000, 0..4))
                    .prop_map(|(parent, ops)| Shape::Then(Box::new(parent), ops)),
                inner.prop_map(|s| Shape::Reverse(Box::new(s))),
            ]
        })
    }

    /// A leaf that checks it decodes exactly the echo of its own operations
    /// and tags every result with `id`.
    fn tagged(id: usize, ops: Vec<i64>) -> Tagged {
        let sent = ops.clone();
        Segment::from_operations(ops, move |raw: Vec<i64>| {
            let echoed: Vec<i64> = sent.iter().map(|op| op * 10).collect();
            anyhow::ensure!(raw == echoed, "leaf {id} decoded {raw:?}, expected {echoed:?}");
            Ok(raw.into_iter().map(|r| (id, r)).collect())
        })
    }

    fn offset(results: &[(usize, i64)]) -> i64 {
        results.iter().map(|(_, r)| r).sum::<i64>() % 1000
    }

    fn next_id(ids: &mut usize) -> usize {
        *ids += 1;
        *ids
    }

    /// Build the segment for `shape`, numbering leaves in traversal order.
    fn build(shape: &Shape, ids: &mut usize) -> Tagged {
        match shape {
            Shape::Leaf(ops) => tagged(next_id(ids), ops.clone()),
            Shape::Concat(parts) => {
                let parts: Vec<Tagged> = parts.iter().map(|part| build(part, ids)).collect();
                Tagged::concat(parts)
            }
            Shape::Then(parent, ops) => {
                let parent = build(parent, ids);
                let id = next_id(ids);
                let ops = ops.clone();
                parent.then(move |results| {
                    let offset = offset(&results);
                    tagged(id, ops.iter().map(|op| op + offset).collect())
                })
            }
            Shape::Reverse(inner) => build(inner, ids).map(|mut results| {
                results.reverse();
                results
            }),
        }
    }

    /// Reference result for `shape`, numbering leaves like [`build`].
    fn expected(shape: &Shape, ids: &mut usize) -> Vec<(usize, i64)> {
        match shape {
            Shape::Leaf(ops) => {
                let id = next_id(ids);
                ops.iter().map(|op| (id, op * 10)).collect()
            }
            Shape::Concat(parts) => parts.iter().flat_map(|part| expected(part, ids)).collect(),
            Shape::Then(parent, ops) => {
                let offset = offset(&expected(parent, ids));
                let id = next_id(ids);
                ops.iter().map(|op| (id, (op + offset) * 10)).collect()
            }
            Shape::Reverse(inner) => {
                let mut results = expected(inner, ids);
                results.reverse();
                results
            }
        }
    }

    fn built(shape: &Shape) -> Tagged {
        build(shape, &mut 0)
    }

    fn reference(shape: &Shape) -> Vec<(usize, i64)> {
        expected(shape, &mut 0)
    }

    /// Run and return both the decoded result and the batches sent.
    fn observe(segment: &Tagged) -> (Vec<(usize, i64)>, Vec<Vec<i64>>) {
        let exec = EchoExecutor::new();
        let results = block_on(segment.run(&exec)).unwrap();
        (results, exec.batches())
    }

    proptest! {
        #[test]
        fn demultiplexes_results_to_their_leaves(s in shape()) {
            let (results, _) = observe(&built(&s));
            prop_assert_eq!(results, reference(&s));
        }

        #[test]
        fn empty_is_identity(s in shape()) {
            let plain = observe(&built(&s));
            let left = observe(&Tagged::empty().append(built(&s)));
            let right = observe(&built(&s).append(Tagged::empty()));
            prop_assert_eq!(&plain, &left);
            prop_assert_eq!(&plain, &right);
        }

        #[test]
        fn append_is_associative(a in shape(), b in shape(), c in shape()) {
            let ids = &mut 0;
            let left = build(&a, ids).append(build(&b, ids)).append(build(&c, ids));
            let ids = &mut 0;
            let (a, b, c) = (build(&a, ids), build(&b, ids), build(&c, ids));
            let right = a.append(b.append(c));
            prop_assert_eq!(observe(&left), observe(&right));
        }

        #[test]
        fn append_concatenates_results(a in shape(), b in shape()) {
            let ids = &mut 0;
            let joined = build(&a, ids).append(build(&b, ids));
            let ids = &mut 0;
            let mut want = expected(&a, ids);
            want.extend(expected(&b, ids));
            prop_assert_eq!(observe(&joined).0, want);
        }

        #[test]
        fn map_is_a_functor(s in shape()) {
            let (plain, plain_batches) = observe(&built(&s));
            let (identity, identity_batches) = observe(&built(&s).map(|r| r));
            prop_assert_eq!(&plain, &identity);
            prop_assert_eq!(&plain_batches, &identity_batches);

            let f = |r: Vec<(usize, i64)>| {
                r.into_iter().map(|(id, x)| (id, x + 1)).collect::<Vec<_>>()
            };
            let g = |r: Vec<(usize, i64)>| {
                r.into_iter().filter(|(_, x)| x % 2 == 0).collect::<Vec<_>>()
            };
            let (chained, _) = observe(&built(&s).map(f).map(g));
            let (composed, _) = observe(&built(&s).map(move |r| g(f(r))));
            prop_assert_eq!(&chained, &composed);
            prop_assert_eq!(chained, g(f(plain)));
        }

        #[test]
        fn independent_leaves_cost_one_round_trip(
            leaves in prop::collection::vec(prop::collection::vec(-1000i64..1000, 0..4), 0..6)
        ) {
            let seg = Tagged::concat(
                leaves.iter().cloned().enumerate().map(|(id, ops)| tagged(id, ops)),
            );
            let (results, batches) = observe(&seg);
            let want: Vec<(usize, i64)> = leaves
                .iter()
                .enumerate()
                .flat_map(|(id, ops)| ops.iter().map(move |op| (id, op * 10)))
                .collect();
            prop_assert_eq!(results, want);
            let ops: Vec<i64> = leaves.into_iter().flatten().collect();
            if ops.is_empty() {
                prop_assert!(batches.is_empty());
            } else {
                prop_assert_eq!(batches, vec![ops]);
            }
        }
    }
}
