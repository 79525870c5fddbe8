//! AVL-balanced numeric range index.
//!
//! Each distinct value is one node of a self-balancing binary search tree
//! and holds the postings of the records having that value. Insertion is
//! the textbook recursive AVL insert; range retrieval prunes subtrees that
//! cannot contain matches.

use std::collections::BTreeMap;
use std::ops::Bound;

use log::trace;
use uuid::Uuid;

use crate::index::options::{RetrieveMethod, RetrieveOptions};
use crate::index::posting::Postings;
use crate::index::{IdSet, cap_results};

#[derive(Debug, Clone)]
struct NumericNode {
    value: f64,
    left: Option<Box<NumericNode>>,
    right: Option<Box<NumericNode>>,
    height: i32,
    postings: Postings,
}

impl NumericNode {
    fn new(value: f64) -> Box<Self> {
        Box::new(NumericNode {
            value,
            left: None,
            right: None,
            height: 1,
            postings: Postings::new(),
        })
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    fn balance_factor(&self) -> i32 {
        height(&self.left) - height(&self.right)
    }
}

/// Folds `-0.0` into `0.0` so both compare equal under `total_cmp`.
fn normalize(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

fn height(node: &Option<Box<NumericNode>>) -> i32 {
    node.as_ref().map_or(0, |n| n.height)
}

fn rotate_right(mut node: Box<NumericNode>) -> Box<NumericNode> {
    match node.left.take() {
        Some(mut pivot) => {
            node.left = pivot.right.take();
            node.update_height();
            pivot.right = Some(node);
            pivot.update_height();
            pivot
        }
        None => node,
    }
}

fn rotate_left(mut node: Box<NumericNode>) -> Box<NumericNode> {
    match node.right.take() {
        Some(mut pivot) => {
            node.right = pivot.left.take();
            node.update_height();
            pivot.left = Some(node);
            pivot.update_height();
            pivot
        }
        None => node,
    }
}

fn rebalance(mut node: Box<NumericNode>) -> Box<NumericNode> {
    node.update_height();
    let balance = node.balance_factor();

    if balance > 1 {
        if node.left.as_ref().is_some_and(|l| l.balance_factor() < 0) {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }
    if balance < -1 {
        if node.right.as_ref().is_some_and(|r| r.balance_factor() > 0) {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }
    node
}

/// Insert `id` at `value`, returning the new subtree root and whether a
/// new posting was created.
fn insert(node: Option<Box<NumericNode>>, value: f64, id: Uuid) -> (Box<NumericNode>, bool) {
    let Some(mut node) = node else {
        let mut leaf = NumericNode::new(value);
        leaf.postings.add(id, 0);
        return (leaf, true);
    };

    let created = match value.total_cmp(&node.value) {
        std::cmp::Ordering::Less => {
            let (child, created) = insert(node.left.take(), value, id);
            node.left = Some(child);
            created
        }
        std::cmp::Ordering::Greater => {
            let (child, created) = insert(node.right.take(), value, id);
            node.right = Some(child);
            created
        }
        std::cmp::Ordering::Equal => {
            let created = node.postings.add(id, 0);
            return (node, created);
        }
    };

    (rebalance(node), created)
}

/// A reverse index from numeric values to postings.
#[derive(Debug, Clone, Default)]
pub struct NumericTree {
    root: Option<Box<NumericNode>>,
    members: BTreeMap<Uuid, usize>,
}

impl NumericTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        NumericTree::default()
    }

    /// Index `value` for record `id`. Non-finite values are ignored.
    pub fn add(&mut self, id: Uuid, value: f64) {
        if !value.is_finite() {
            return;
        }
        let (root, created) = insert(self.root.take(), normalize(value), id);
        self.root = Some(root);
        if created {
            *self.members.entry(id).or_insert(0) += 1;
        }
    }

    /// Remove the posting of `id` at `value`.
    ///
    /// The node stays in the tree even when its postings become empty, so
    /// the balance is never disturbed. Missing postings are ignored.
    pub fn delete(&mut self, id: Uuid, value: f64) {
        let value = normalize(value);
        let mut current = self.root.as_deref_mut();
        while let Some(node) = current {
            current = match value.total_cmp(&node.value) {
                std::cmp::Ordering::Less => node.left.as_deref_mut(),
                std::cmp::Ordering::Greater => node.right.as_deref_mut(),
                std::cmp::Ordering::Equal => {
                    if node.postings.remove(&id) {
                        if let Some(count) = self.members.get_mut(&id) {
                            *count -= 1;
                            if *count == 0 {
                                self.members.remove(&id);
                            }
                        }
                    }
                    return;
                }
            };
        }
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        self.root = None;
        self.members.clear();
    }

    /// All record ids with at least one posting.
    pub fn all(&self) -> IdSet {
        self.members.keys().copied().collect()
    }

    /// Whether no record is indexed.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Height of the tree (0 when empty).
    pub fn height(&self) -> i32 {
        height(&self.root)
    }

    /// Number of distinct values stored.
    pub fn node_count(&self) -> usize {
        fn count(node: &Option<Box<NumericNode>>) -> usize {
            node.as_ref()
                .map_or(0, |n| 1 + count(&n.left) + count(&n.right))
        }
        count(&self.root)
    }

    /// Whether every node satisfies the AVL balance invariant and the
    /// cached heights are correct.
    pub fn is_balanced(&self) -> bool {
        fn check(node: &Option<Box<NumericNode>>) -> Option<i32> {
            let Some(n) = node else {
                return Some(0);
            };
            let left = check(&n.left)?;
            let right = check(&n.right)?;
            let h = 1 + left.max(right);
            ((left - right).abs() <= 1 && h == n.height).then_some(h)
        }
        check(&self.root).is_some()
    }

    /// Values in ascending order (including values whose postings were
    /// all deleted).
    pub fn values(&self) -> Vec<f64> {
        fn inorder(node: &Option<Box<NumericNode>>, out: &mut Vec<f64>) {
            if let Some(n) = node {
                inorder(&n.left, out);
                out.push(n.value);
                inorder(&n.right, out);
            }
        }
        let mut out = Vec::new();
        inorder(&self.root, &mut out);
        out
    }

    /// Retrieve records whose value matches `search` under the options'
    /// method.
    pub fn retrieve(&self, search: f64, options: &RetrieveOptions) -> IdSet {
        if search.is_nan() {
            return IdSet::new();
        }
        let search = normalize(search);

        let (lower, upper) = match options.method {
            RetrieveMethod::GreaterThan => (Bound::Excluded(search), Bound::Unbounded),
            RetrieveMethod::GreaterThanOrEqual => (Bound::Included(search), Bound::Unbounded),
            RetrieveMethod::LessThan => (Bound::Unbounded, Bound::Excluded(search)),
            RetrieveMethod::LessThanOrEqual => (Bound::Unbounded, Bound::Included(search)),
            RetrieveMethod::Fuzzy => {
                let tolerance = options.similarity.abs();
                (
                    Bound::Included(search - tolerance),
                    Bound::Included(search + tolerance),
                )
            }
            RetrieveMethod::Default
            | RetrieveMethod::Phrase
            | RetrieveMethod::Proximity
            | RetrieveMethod::Prefix => (Bound::Included(search), Bound::Included(search)),
        };

        let mut out = IdSet::new();
        collect_range(&self.root, lower, upper, &mut out);
        trace!(
            "numeric retrieve {} with {:?}: {} match(es)",
            search,
            options.method,
            out.len()
        );
        cap_results(out, options.max_results)
    }
}

fn above_lower(value: f64, lower: Bound<f64>) -> bool {
    match lower {
        Bound::Unbounded => true,
        Bound::Included(l) => value >= l,
        Bound::Excluded(l) => value > l,
    }
}

fn below_upper(value: f64, upper: Bound<f64>) -> bool {
    match upper {
        Bound::Unbounded => true,
        Bound::Included(u) => value <= u,
        Bound::Excluded(u) => value < u,
    }
}

fn collect_range(
    node: &Option<Box<NumericNode>>,
    lower: Bound<f64>,
    upper: Bound<f64>,
    out: &mut IdSet,
) {
    let Some(n) = node else {
        return;
    };

    // left subtree only holds smaller values, right subtree larger ones
    let descend_left = match lower {
        Bound::Unbounded => true,
        Bound::Included(l) | Bound::Excluded(l) => l < n.value,
    };
    let descend_right = match upper {
        Bound::Unbounded => true,
        Bound::Included(u) | Bound::Excluded(u) => u > n.value,
    };

    if descend_left {
        collect_range(&n.left, lower, upper, out);
    }
    if above_lower(n.value, lower) && below_upper(n.value, upper) {
        n.postings.collect_into(out);
    }
    if descend_right {
        collect_range(&n.right, lower, upper, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_greater_than_with_duplicates() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0];
        let ids: Vec<Uuid> = values.iter().map(|_| Uuid::new_v4()).collect();
        let mut tree = NumericTree::new();
        for (id, value) in ids.iter().zip(values.iter()) {
            tree.add(*id, *value);
        }

        let found = tree.retrieve(3.0, &RetrieveOptions::method(RetrieveMethod::GreaterThan));
        assert_eq!(found, IdSet::from([ids[2], ids[4]]));
        assert_eq!(tree.node_count(), 4);
        assert!(tree.is_balanced());
    }

    #[test]
    fn test_comparison_methods() {
        let mut tree = NumericTree::new();
        let ids: Vec<Uuid> = (0..10).map(|_| Uuid::new_v4()).collect();
        for (i, id) in ids.iter().enumerate() {
            tree.add(*id, i as f64);
        }

        let check = |method, search: f64, expected: Vec<usize>| {
            let found = tree.retrieve(search, &RetrieveOptions::method(method));
            let wanted: IdSet = expected.into_iter().map(|i| ids[i]).collect();
            assert_eq!(found, wanted, "{method:?} {search}");
        };

        check(RetrieveMethod::Phrase, 4.0, vec![4]);
        check(RetrieveMethod::Default, 4.5, vec![]);
        check(RetrieveMethod::GreaterThanOrEqual, 8.0, vec![8, 9]);
        check(RetrieveMethod::LessThan, 2.0, vec![0, 1]);
        check(RetrieveMethod::LessThanOrEqual, 2.0, vec![0, 1, 2]);
        check(RetrieveMethod::GreaterThan, 9.0, vec![]);

        let near = tree.retrieve(
            5.0,
            &RetrieveOptions::method(RetrieveMethod::Fuzzy).with_similarity(1.0),
        );
        assert_eq!(near, IdSet::from([ids[4], ids[5], ids[6]]));
    }

    #[test]
    fn test_delete() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut tree = NumericTree::new();
        tree.add(a, 1.0);
        tree.add(b, 1.0);

        tree.delete(a, 1.0);
        tree.delete(a, 7.0);
        let equal = RetrieveOptions::default();
        assert_eq!(tree.retrieve(1.0, &equal), IdSet::from([b]));
        assert_eq!(tree.all(), IdSet::from([b]));

        tree.delete(b, 1.0);
        assert!(tree.is_empty());
        assert_eq!(tree.values(), vec![1.0]);
    }

    #[test]
    fn test_sequential_inserts_stay_balanced() {
        let mut tree = NumericTree::new();
        for i in 0..1024 {
            tree.add(Uuid::new_v4(), i as f64);
            assert!(tree.is_balanced());
        }
        // a perfectly sequential load still yields logarithmic height
        assert!(tree.height() <= 14);
    }

    #[test]
    fn test_random_inserts_stay_balanced() {
        let mut rng = rand::rng();
        let mut tree = NumericTree::new();
        for _ in 0..500 {
            let value: f64 = rng.random_range(-100.0..100.0);
            tree.add(Uuid::new_v4(), value.round());
        }
        assert!(tree.is_balanced());

        let values = tree.values();
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_non_finite_values_ignored() {
        let mut tree = NumericTree::new();
        tree.add(Uuid::new_v4(), f64::NAN);
        tree.add(Uuid::new_v4(), f64::INFINITY);
        assert!(tree.is_empty());
        assert!(tree.retrieve(f64::NAN, &RetrieveOptions::default()).is_empty());
    }
}
