use core::cmp::Ordering;
use core::iter::FusedIterator;

use smallvec::SmallVec;
use tracing::trace;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Node, Side};

/// The unbalanced binary search tree backing `OrderedIndex`.
///
/// Keys strictly less than a node's key live in its left subtree; keys greater than or
/// equal to it live in its right subtree. Equal keys are therefore allowed and always
/// descend right on insert.
pub(crate) struct RawTree<K, V> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K, V>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
}

/// The link that holds a node: the root pointer or one side of a parent.
#[derive(Clone, Copy, Debug)]
enum Slot {
    Root,
    Child(Handle, Side),
}

/// Stack of pending nodes for in-order walks. Deep trees spill to the heap.
type Stack = SmallVec<[Handle; 16]>;

impl<K, V> RawTree<K, V> {
    /// Creates a new, empty tree.
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
        }
    }

    /// Creates a new tree with room for `capacity` nodes.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
        }
    }

    /// Returns the number of entries in the tree.
    pub(crate) const fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Releases every node at once.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    fn slot(&self, slot: Slot) -> Option<Handle> {
        match slot {
            Slot::Root => self.root,
            Slot::Child(parent, side) => self.nodes.get(parent).child(side),
        }
    }

    fn set_slot(&mut self, slot: Slot, child: Option<Handle>) {
        match slot {
            Slot::Root => self.root = child,
            Slot::Child(parent, side) => self.nodes.get_mut(parent).set_child(side, child),
        }
    }

    /// Number of nodes on the longest root-to-leaf path; zero for an empty tree.
    pub(crate) fn height(&self) -> usize {
        let mut height = 0;
        let mut pending: SmallVec<[(Handle, usize); 16]> = SmallVec::new();
        if let Some(root) = self.root {
            pending.push((root, 1));
        }

        while let Some((handle, depth)) = pending.pop() {
            height = height.max(depth);
            let node = self.nodes.get(handle);
            for child in [node.left(), node.right()].into_iter().flatten() {
                pending.push((child, depth + 1));
            }
        }

        height
    }

    /// Follows `side` links from `start` to the end of the spine.
    fn spine_end(&self, start: Handle, side: Side) -> Handle {
        let mut current = start;
        while let Some(next) = self.nodes.get(current).child(side) {
            current = next;
        }
        current
    }

    pub(crate) fn first(&self) -> Option<(&K, &V)> {
        let node = self.nodes.get(self.spine_end(self.root?, Side::Left));
        Some((node.key(), node.value()))
    }

    pub(crate) fn last(&self) -> Option<(&K, &V)> {
        let node = self.nodes.get(self.spine_end(self.root?, Side::Right));
        Some((node.key(), node.value()))
    }

    /// Returns an in-order iterator over the entries.
    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            nodes: &self.nodes,
            stack: Stack::new(),
            remaining: self.len(),
        };
        iter.push_left_spine(self.root);
        iter
    }
}

impl<K: Ord, V> RawTree<K, V> {
    /// Inserts an entry, never replacing an existing one. Returns the depth (root = 1) at
    /// which the new node was linked.
    pub(crate) fn insert(&mut self, key: K, value: V) -> usize {
        let mut slot = Slot::Root;
        let mut depth = 1;

        while let Some(handle) = self.slot(slot) {
            let side = if key < *self.nodes.get(handle).key() {
                Side::Left
            } else {
                Side::Right
            };
            slot = Slot::Child(handle, side);
            depth += 1;
        }

        let handle = self.nodes.alloc(Node::new(key, value));
        self.set_slot(slot, Some(handle));
        depth
    }

    /// Finds the first node on the search path whose key equals `key`, along with the
    /// slot that links it.
    fn find(&self, key: &K) -> Option<(Slot, Handle)> {
        let mut slot = Slot::Root;

        while let Some(handle) = self.slot(slot) {
            let side = match key.cmp(self.nodes.get(handle).key()) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return Some((slot, handle)),
            };
            slot = Slot::Child(handle, side);
        }

        None
    }

    pub(crate) fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|(_, handle)| self.nodes.get(handle).value())
    }

    pub(crate) fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let (_, handle) = self.find(key)?;
        Some(self.nodes.get_mut(handle).value_mut())
    }

    /// Removes one entry whose key equals `key` and returns it.
    ///
    /// A node with two children is not unlinked: its in-order successor is detached
    /// instead and that entry is moved into the node in place. Handles to the removed
    /// node's entry do not survive.
    pub(crate) fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let (slot, handle) = self.find(key)?;
        let node = self.nodes.get(handle);

        match (node.left(), node.right()) {
            (None, None) => {
                trace!(case = "leaf", "unlinking node");
                self.set_slot(slot, None);
                Some(self.nodes.take(handle).into_entry())
            }
            (Some(only), None) | (None, Some(only)) => {
                trace!(case = "one-child", "splicing child into parent slot");
                self.set_slot(slot, Some(only));
                Some(self.nodes.take(handle).into_entry())
            }
            (Some(_), Some(right)) => {
                trace!(case = "two-children", "replacing entry with in-order successor");
                let (successor_key, successor_value) = self.detach_min(Slot::Child(handle, Side::Right), right);
                Some(self.nodes.get_mut(handle).replace_entry(successor_key, successor_value))
            }
        }
    }

    /// Unlinks the leftmost node of the subtree rooted at `top` (held by `slot`). The
    /// leftmost node has no left child, so its right child takes its place.
    fn detach_min(&mut self, mut slot: Slot, top: Handle) -> (K, V) {
        let mut current = top;
        while let Some(left) = self.nodes.get(current).left() {
            slot = Slot::Child(current, Side::Left);
            current = left;
        }

        let right = self.nodes.get(current).right();
        self.set_slot(slot, right);
        self.nodes.take(current).into_entry()
    }
}

/// In-order iterator over the entries of a [`RawTree`].
pub(crate) struct Iter<'a, K, V> {
    nodes: &'a Arena<Node<K, V>>,
    stack: Stack,
    remaining: usize,
}

impl<K, V> Iter<'_, K, V> {
    fn push_left_spine(&mut self, mut current: Option<Handle>) {
        while let Some(handle) = current {
            self.stack.push(handle);
            current = self.nodes.get(handle).left();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.stack.pop()?;
        let nodes = self.nodes;
        let node = nodes.get(handle);
        self.push_left_spine(node.right());
        self.remaining -= 1;
        Some((node.key(), node.value()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(
    clippy::manual_assert,
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    impl<K: Ord + core::fmt::Debug, V> RawTree<K, V> {
        /// Checks the ordering invariant and that every live arena slot is reachable
        /// exactly once from the root. Panics with every violation found.
        pub(crate) fn validate_invariants(&self) {
            let mut errors: Vec<String> = Vec::new();
            let mut seen: Vec<Handle> = Vec::new();
            // (node, inclusive lower bound, exclusive upper bound)
            let mut pending: Vec<(Handle, Option<&K>, Option<&K>)> = Vec::new();
            if let Some(root) = self.root {
                pending.push((root, None, None));
            }

            while let Some((handle, lower, upper)) = pending.pop() {
                if seen.contains(&handle) {
                    errors.push(alloc::format!("handle {:?} reachable twice", handle));
                    continue;
                }
                seen.push(handle);

                let node = self.nodes.get(handle);
                let key = node.key();
                if lower.is_some_and(|lower| key < lower) {
                    errors.push(alloc::format!("key {:?} below right-subtree bound {:?}", key, lower));
                }
                if upper.is_some_and(|upper| key >= upper) {
                    errors.push(alloc::format!("key {:?} not below left-subtree bound {:?}", key, upper));
                }

                if let Some(left) = node.left() {
                    pending.push((left, lower, Some(key)));
                }
                if let Some(right) = node.right() {
                    pending.push((right, Some(key), upper));
                }
            }

            if seen.len() != self.nodes.len() {
                errors.push(alloc::format!("reachable nodes={}, live slots={}", seen.len(), self.nodes.len()));
            }

            assert!(errors.is_empty(), "Tree invariant violations:\n{}", errors.join("\n"));
        }

        fn keys(&self) -> Vec<&K> {
            self.iter().map(|(key, _)| key).collect()
        }
    }

    fn tree_of(keys: &[i32]) -> RawTree<i32, i32> {
        let mut tree = RawTree::new();
        for (position, &key) in keys.iter().enumerate() {
            tree.insert(key, position as i32);
        }
        tree.validate_invariants();
        tree
    }

    #[test]
    fn empty_tree() {
        let mut tree: RawTree<i32, i32> = RawTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.first(), None);
        assert_eq!(tree.last(), None);
        assert_eq!(tree.iter().next(), None);
        assert_eq!(tree.remove(&1), None);
        tree.validate_invariants();
    }

    #[test]
    fn insert_reports_depth() {
        let mut tree = RawTree::new();
        assert_eq!(tree.insert(2, ()), 1);
        assert_eq!(tree.insert(1, ()), 2);
        assert_eq!(tree.insert(3, ()), 2);
        assert_eq!(tree.insert(4, ()), 3);
        assert_eq!(tree.height(), 3);
    }

    #[test]
    fn equal_keys_descend_right() {
        let mut tree = RawTree::new();
        tree.insert(5, 'a');
        tree.insert(5, 'b');
        tree.insert(5, 'c');
        tree.validate_invariants();

        let root = tree.nodes.get(tree.root.unwrap());
        assert!(root.left().is_none());
        assert_eq!(tree.height(), 3);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn remove_leaf() {
        let mut tree = tree_of(&[2, 1, 3]);
        assert_eq!(tree.remove(&1), Some((1, 1)));
        tree.validate_invariants();
        assert_eq!(tree.keys(), vec![&2, &3]);
    }

    #[test]
    fn remove_node_with_one_child() {
        let mut tree = tree_of(&[2, 1, 3, 4]);
        assert_eq!(tree.remove(&3), Some((3, 2)));
        tree.validate_invariants();
        assert_eq!(tree.keys(), vec![&1, &2, &4]);
        assert_eq!(tree.height(), 2);
    }

    #[test]
    fn remove_root_with_two_children_moves_successor_in_place() {
        let mut tree = tree_of(&[20, 10, 40, 30, 50, 35]);
        let root = tree.root.unwrap();

        assert_eq!(tree.remove(&20), Some((20, 0)));
        tree.validate_invariants();

        // The root slot still holds the same handle, now carrying the successor.
        assert_eq!(tree.root, Some(root));
        assert_eq!(*tree.nodes.get(root).key(), 30);
        assert_eq!(tree.keys(), vec![&10, &30, &35, &40, &50]);
    }

    #[test]
    fn remove_with_successor_directly_right() {
        let mut tree = tree_of(&[2, 1, 3, 4]);
        assert_eq!(tree.remove(&2), Some((2, 0)));
        tree.validate_invariants();
        assert_eq!(tree.keys(), vec![&1, &3, &4]);
    }

    #[test]
    fn remove_takes_one_of_several_equal_keys() {
        let mut tree = tree_of(&[5, 5, 3, 5]);
        assert!(tree.remove(&5).is_some());
        tree.validate_invariants();
        assert_eq!(tree.keys(), vec![&3, &5, &5]);
    }

    #[test]
    fn degenerate_chain_walks_without_recursion() {
        let keys: Vec<i32> = (0..5_000).collect();
        let mut tree = tree_of(&keys);
        assert_eq!(tree.height(), 5_000);
        assert_eq!(tree.iter().len(), 5_000);
        assert!(tree.iter().map(|(key, _)| *key).eq(0..5_000));
        assert_eq!(tree.first(), Some((&0, &0)));
        assert_eq!(tree.last(), Some((&4_999, &4_999)));

        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn get_mut_updates_value() {
        let mut tree = tree_of(&[2, 1, 3]);
        *tree.get_mut(&3).unwrap() = 99;
        assert_eq!(tree.get(&3), Some(&99));
        assert_eq!(tree.get_mut(&7), None);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32),
        Remove(i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0i32..200).prop_map(Op::Insert),
            2 => (0i32..200).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn tree_matches_sorted_model(ops in prop::collection::vec(op_strategy(), 0..400)) {
            let mut tree: RawTree<i32, ()> = RawTree::new();
            let mut model: Vec<i32> = Vec::new();

            for op in ops {
                match op {
                    Op::Insert(key) => {
                        tree.insert(key, ());
                        let at = model.partition_point(|&k| k <= key);
                        model.insert(at, key);
                    }
                    Op::Remove(key) => {
                        let removed = tree.remove(&key).map(|(k, ())| k);
                        let expected = model.iter().position(|&k| k == key).map(|at| model.remove(at));
                        prop_assert_eq!(removed, expected);
                    }
                }

                tree.validate_invariants();
                prop_assert_eq!(tree.len(), model.len());
            }

            let keys: Vec<i32> = tree.iter().map(|(k, ())| *k).collect();
            prop_assert_eq!(keys, model.clone());
            prop_assert_eq!(tree.first().map(|(k, ())| *k), model.first().copied());
            prop_assert_eq!(tree.last().map(|(k, ())| *k), model.last().copied());
        }

        #[test]
        fn reads_do_not_mutate(keys in prop::collection::vec(0i32..100, 0..100), probe in 0i32..100) {
            let tree = tree_of(&keys);
            let before: Vec<(i32, i32)> = tree.iter().map(|(k, v)| (*k, *v)).collect();

            let first = tree.contains_key(&probe);
            let second = tree.contains_key(&probe);
            prop_assert_eq!(first, second);
            prop_assert_eq!(first, keys.contains(&probe));

            let after: Vec<(i32, i32)> = tree.iter().map(|(k, v)| (*k, *v)).collect();
            prop_assert_eq!(before, after);
        }
    }
}
