use core::borrow::Borrow;
use core::cmp::Ordering;

use log::trace;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{EMPTY_HEIGHT, Node, Side};
use crate::error::{Error, Result, Violation};

/// The four restructurings used to restore balance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Rotation {
    Left,
    Right,
    RightLeft,
    LeftRight,
}

/// The AVL tree backing `AvlTreeMap`.
///
/// Every recursive helper takes the handle of a subtree root and returns the
/// handle of the (possibly different) root after the change; the caller
/// writes that handle back into its own child slot.
#[derive(Clone)]
pub(crate) struct RawAvlTree<K, V> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K>>,
    /// Arena storing the values; nodes refer to their value by handle.
    values: Arena<V>,
    root: Option<Handle>,
    len: usize,
    #[cfg(test)]
    rotations: alloc::vec::Vec<Rotation>,
}

impl<K, V> RawAvlTree<K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            values: Arena::new(),
            root: None,
            len: 0,
            #[cfg(test)]
            rotations: alloc::vec::Vec::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            values: Arena::with_capacity(capacity),
            root: None,
            len: 0,
            #[cfg(test)]
            rotations: alloc::vec::Vec::new(),
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity().min(self.values.capacity())
    }

    pub(crate) const fn root(&self) -> Option<Handle> {
        self.root
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<K> {
        self.nodes.get(handle)
    }

    pub(crate) fn value(&self, handle: Handle) -> &V {
        self.values.get(handle)
    }

    /// Height of the whole tree, `-1` when empty.
    pub(crate) fn height(&self) -> i32 {
        self.height_of(self.root)
    }

    /// Removes the root entry until the tree is empty.
    pub(crate) fn clear(&mut self) {
        while let Some(root) = self.root {
            let (root, removed) = self.unlink(root);
            self.root = root;
            drop(self.release(removed));
        }
    }

    /// Returns the entry with the smallest key.
    pub(crate) fn first_key_value(&self) -> Option<(&K, &V)> {
        let mut current = self.root?;
        while let Some(left) = self.nodes.get(current).left() {
            current = left;
        }
        Some(self.entry(current))
    }

    /// Returns the entry with the largest key.
    pub(crate) fn last_key_value(&self) -> Option<(&K, &V)> {
        let mut current = self.root?;
        while let Some(right) = self.nodes.get(current).right() {
            current = right;
        }
        Some(self.entry(current))
    }

    fn entry(&self, handle: Handle) -> (&K, &V) {
        let node = self.nodes.get(handle);
        (node.key(), self.values.get(node.value()))
    }

    // ─── Height and balance ─────────────────────────────────────────────────

    #[inline]
    fn height_of(&self, slot: Option<Handle>) -> i32 {
        slot.map_or(EMPTY_HEIGHT, |handle| self.nodes.get(handle).height())
    }

    /// `height(right) - height(left)`.
    #[inline]
    fn balance_factor(&self, handle: Handle) -> i32 {
        let node = self.nodes.get(handle);
        self.height_of(node.right()) - self.height_of(node.left())
    }

    /// Recomputes a node's height from its children, which must be current.
    fn update_height(&mut self, handle: Handle) {
        let node = self.nodes.get(handle);
        let height = 1 + self.height_of(node.left()).max(self.height_of(node.right()));
        self.nodes.get_mut(handle).set_height(height);
    }

    /// Updates the height of `current` and rotates if its balance factor
    /// left `-1..=1`. Returns the root of the subtree afterwards.
    fn rebalance(&mut self, current: Handle) -> Handle {
        self.update_height(current);
        let balance = self.balance_factor(current);

        if balance > 1 {
            let right = self
                .nodes
                .get(current)
                .right()
                .expect("`RawAvlTree::rebalance()` - right-heavy node has no right child!");
            if self.balance_factor(right) >= 0 {
                self.rotate(current, Rotation::Left)
            } else {
                self.rotate(current, Rotation::RightLeft)
            }
        } else if balance < -1 {
            let left = self
                .nodes
                .get(current)
                .left()
                .expect("`RawAvlTree::rebalance()` - left-heavy node has no left child!");
            if self.balance_factor(left) <= 0 {
                self.rotate(current, Rotation::Right)
            } else {
                self.rotate(current, Rotation::LeftRight)
            }
        } else {
            current
        }
    }

    // ─── Rotations ──────────────────────────────────────────────────────────

    fn rotate(&mut self, current: Handle, rotation: Rotation) -> Handle {
        trace!("{rotation:?} rotation at {current:?}");
        #[cfg(test)]
        self.rotations.push(rotation);

        match rotation {
            Rotation::Left => self.rotate_left(current),
            Rotation::Right => self.rotate_right(current),
            Rotation::RightLeft => self.rotate_right_left(current),
            Rotation::LeftRight => self.rotate_left_right(current),
        }
    }

    ///```text
    ///   x                y
    ///  / \              / \
    /// a   y     =>     x   c
    ///    / \          / \
    ///   b   c        a   b
    ///```
    fn rotate_left(&mut self, x: Handle) -> Handle {
        let y = self
            .nodes
            .get(x)
            .right()
            .expect("`RawAvlTree::rotate_left()` - pivot has no right child!");
        let b = self.nodes.get(y).left();

        self.nodes.get_mut(x).set_right(b);
        self.nodes.get_mut(y).set_left(Some(x));

        self.update_height(x);
        self.update_height(y);
        y
    }

    fn rotate_right(&mut self, x: Handle) -> Handle {
        let y = self
            .nodes
            .get(x)
            .left()
            .expect("`RawAvlTree::rotate_right()` - pivot has no left child!");
        let b = self.nodes.get(y).right();

        self.nodes.get_mut(x).set_left(b);
        self.nodes.get_mut(y).set_right(Some(x));

        self.update_height(x);
        self.update_height(y);
        y
    }

    fn rotate_right_left(&mut self, x: Handle) -> Handle {
        let right = self
            .nodes
            .get(x)
            .right()
            .expect("`RawAvlTree::rotate_right_left()` - pivot has no right child!");
        let right = self.rotate_right(right);
        self.nodes.get_mut(x).set_right(Some(right));
        self.rotate_left(x)
    }

    fn rotate_left_right(&mut self, x: Handle) -> Handle {
        let left = self
            .nodes
            .get(x)
            .left()
            .expect("`RawAvlTree::rotate_left_right()` - pivot has no left child!");
        let left = self.rotate_left(left);
        self.nodes.get_mut(x).set_left(Some(left));
        self.rotate_right(x)
    }

    // ─── Removal ────────────────────────────────────────────────────────────

    /// Detaches `target` from the subtree it roots. Returns the new subtree
    /// root and the handle of the detached node, which is always `target`.
    fn unlink(&mut self, target: Handle) -> (Option<Handle>, Handle) {
        let node = self.nodes.get(target);
        match (node.left(), node.right()) {
            (None, None) => (None, target),
            (Some(child), None) | (None, Some(child)) => (Some(child), target),
            (Some(_), Some(_)) => {
                let top = self.swap_with_predecessor(target);
                let left = self
                    .nodes
                    .get(top)
                    .left()
                    .expect("`RawAvlTree::unlink()` - swapped node has no left subtree!");
                let (left, removed) = self.unlink_rightmost(left);
                debug_assert_eq!(removed, target);
                self.nodes.get_mut(top).set_left(left);
                (Some(self.rebalance(top)), removed)
            }
        }
    }

    /// Swaps the two-child node `target` with its in-order predecessor by
    /// rewiring child links; keys and values stay where they are. Afterwards
    /// the predecessor roots the subtree and `target` is the rightmost node of
    /// its left subtree, with at most a left child. Returns the predecessor.
    fn swap_with_predecessor(&mut self, target: Handle) -> Handle {
        let node = self.nodes.get(target);
        let left = node
            .left()
            .expect("`RawAvlTree::swap_with_predecessor()` - target has no left child!");
        let right = node
            .right()
            .expect("`RawAvlTree::swap_with_predecessor()` - target has no right child!");

        let mut parent = None;
        let mut predecessor = left;
        while let Some(next) = self.nodes.get(predecessor).right() {
            parent = Some(predecessor);
            predecessor = next;
        }

        let predecessor_left = self.nodes.get(predecessor).left();
        let target_height = self.nodes.get(target).height();
        let predecessor_height = self.nodes.get(predecessor).height();

        let top = self.nodes.get_mut(predecessor);
        // When the predecessor is the left child itself, `target` takes its place directly below.
        top.set_left(Some(if parent.is_some() { left } else { target }));
        top.set_right(Some(right));
        top.set_height(target_height);

        if let Some(parent) = parent {
            self.nodes.get_mut(parent).set_right(Some(target));
        }

        let moved = self.nodes.get_mut(target);
        moved.set_left(predecessor_left);
        moved.set_right(None);
        moved.set_height(predecessor_height);

        trace!("swapped {target:?} with in-order predecessor {predecessor:?}");
        predecessor
    }

    /// Detaches the rightmost node of the subtree rooted at `current`,
    /// rebalancing on the way back up.
    fn unlink_rightmost(&mut self, current: Handle) -> (Option<Handle>, Handle) {
        match self.nodes.get(current).right() {
            Some(right) => {
                let (right, removed) = self.unlink_rightmost(right);
                self.nodes.get_mut(current).set_right(right);
                (Some(self.rebalance(current)), removed)
            }
            None => (self.nodes.get(current).left(), current),
        }
    }

    /// Frees a detached node and its value.
    fn release(&mut self, handle: Handle) -> (K, V) {
        let (key, value) = self.nodes.take(handle).into_parts();
        self.len -= 1;
        (key, self.values.take(value))
    }
}

impl<K: Ord, V> RawAvlTree<K, V> {
    /// Finds the node holding `key`.
    pub(crate) fn search<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root?;
        loop {
            let node = self.nodes.get(current);
            current = match node.search(key) {
                Ordering::Less => node.left()?,
                Ordering::Greater => node.right()?,
                Ordering::Equal => return Some(current),
            };
        }
    }

    pub(crate) fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.search(key).map(|handle| self.entry(handle))
    }

    /// Inserts a new entry. An existing key is left untouched and the offered
    /// pair is handed back.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Result<(), (K, V)> {
        let root = self.insert_at(self.root, key, value)?;
        self.root = Some(root);
        self.len += 1;
        Ok(())
    }

    fn insert_at(&mut self, slot: Option<Handle>, key: K, value: V) -> Result<Handle, (K, V)> {
        let Some(current) = slot else {
            let value = self.values.alloc(value);
            return Ok(self.nodes.alloc(Node::new(key, value)));
        };

        let side = match self.nodes.get(current).search(&key) {
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
            Ordering::Equal => return Err((key, value)),
        };

        let child = self.nodes.get(current).child(side);
        let child = self.insert_at(child, key, value)?;
        self.nodes.get_mut(current).set_child(side, Some(child));
        Ok(self.rebalance(current))
    }

    /// Removes the entry for `key`, returning it.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let root = self.root.ok_or(Error::NotFound)?;
        let (root, removed) = self.remove_at(root, key)?;
        self.root = root;
        Ok(self.release(removed))
    }

    fn remove_at<Q>(&mut self, current: Handle, key: &Q) -> Result<(Option<Handle>, Handle)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let side = match self.nodes.get(current).search(key) {
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
            Ordering::Equal => return Ok(self.unlink(current)),
        };

        let child = self.nodes.get(current).child(side).ok_or(Error::NotFound)?;
        let (child, removed) = self.remove_at(child, key)?;
        self.nodes.get_mut(current).set_child(side, child);
        Ok((Some(self.rebalance(current)), removed))
    }

    // ─── Diagnostics ────────────────────────────────────────────────────────

    /// Walks the whole tree, re-deriving ordering, heights, balance and the
    /// entry count without trusting any cached state.
    pub(crate) fn check_invariants(&self) -> Result<(), Violation> {
        let counted = match self.root {
            Some(root) => self.check_subtree(root, None, None)?.1,
            None => 0,
        };

        for counted in [counted, self.nodes.len(), self.values.len()] {
            if counted != self.len {
                return Err(Violation::Length { recorded: self.len, counted });
            }
        }
        Ok(())
    }

    /// Returns the computed height and entry count of the subtree. Every key
    /// must lie strictly between `lower` and `upper`.
    fn check_subtree(&self, handle: Handle, lower: Option<&K>, upper: Option<&K>) -> Result<(i32, usize), Violation> {
        let node = self.nodes.get(handle);
        let key = node.key();

        if lower.is_some_and(|lower| key <= lower) || upper.is_some_and(|upper| key >= upper) {
            return Err(Violation::Order);
        }

        let (left_height, left_count) = match node.left() {
            Some(left) => self.check_subtree(left, lower, Some(key))?,
            None => (EMPTY_HEIGHT, 0),
        };
        let (right_height, right_count) = match node.right() {
            Some(right) => self.check_subtree(right, Some(key), upper)?,
            None => (EMPTY_HEIGHT, 0),
        };

        let computed = 1 + left_height.max(right_height);
        if node.height() != computed {
            return Err(Violation::HeightCache {
                cached: node.height(),
                computed,
            });
        }

        let factor = right_height - left_height;
        if !(-1..=1).contains(&factor) {
            return Err(Violation::Balance { factor });
        }

        Ok((computed, 1 + left_count + right_count))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    impl<K: Ord + Copy, V> RawAvlTree<K, V> {
        fn key_of(&self, handle: Option<Handle>) -> Option<K> {
            handle.map(|handle| *self.nodes.get(handle).key())
        }

        /// `(key, left key, right key)` of the root.
        fn root_shape(&self) -> (Option<K>, Option<K>, Option<K>) {
            let root = self.root.map(|root| self.nodes.get(root));
            (
                self.key_of(self.root),
                self.key_of(root.and_then(Node::left)),
                self.key_of(root.and_then(Node::right)),
            )
        }

        fn keys_in_order(&self) -> Vec<K> {
            fn walk<K: Copy, V>(tree: &RawAvlTree<K, V>, slot: Option<Handle>, out: &mut Vec<K>) {
                if let Some(handle) = slot {
                    let node = tree.nodes.get(handle);
                    walk(tree, node.left(), out);
                    out.push(*node.key());
                    walk(tree, node.right(), out);
                }
            }

            let mut keys = Vec::new();
            walk(self, self.root, &mut keys);
            keys
        }
    }

    fn build(keys: &[i32]) -> RawAvlTree<i32, i32> {
        let mut tree = RawAvlTree::new();
        for &key in keys {
            assert!(tree.insert(key, key * 10).is_ok());
            assert_eq!(tree.check_invariants(), Ok(()));
        }
        tree
    }

    #[test]
    fn ascending_triple_rotates_left_once() {
        let tree = build(&[1, 2, 3]);
        assert_eq!(tree.rotations, [Rotation::Left]);
        assert_eq!(tree.root_shape(), (Some(2), Some(1), Some(3)));
    }

    #[test]
    fn descending_triple_rotates_right_once() {
        let tree = build(&[3, 2, 1]);
        assert_eq!(tree.rotations, [Rotation::Right]);
        assert_eq!(tree.root_shape(), (Some(2), Some(1), Some(3)));
    }

    #[test]
    fn zig_zag_triples_rotate_twice() {
        let tree = build(&[1, 3, 2]);
        assert_eq!(tree.rotations, [Rotation::RightLeft]);
        assert_eq!(tree.root_shape(), (Some(2), Some(1), Some(3)));

        let tree = build(&[3, 1, 2]);
        assert_eq!(tree.rotations, [Rotation::LeftRight]);
        assert_eq!(tree.root_shape(), (Some(2), Some(1), Some(3)));
    }

    #[test]
    fn remove_two_child_root_promotes_predecessor() {
        let mut tree = build(&[5, 3, 8, 1, 4]);
        assert_eq!(tree.root_shape(), (Some(5), Some(3), Some(8)));

        assert_eq!(tree.remove(&5), Ok((5, 50)));
        assert_eq!(tree.check_invariants(), Ok(()));
        assert_eq!(tree.root_shape(), (Some(4), Some(3), Some(8)));
        assert_eq!(tree.keys_in_order(), [1, 3, 4, 8]);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn remove_two_child_node_with_adjacent_predecessor() {
        // 3's predecessor is its own left child.
        let mut tree = build(&[5, 3, 8, 2, 4, 9, 1]);
        assert_eq!(tree.remove(&3), Ok((3, 30)));
        assert_eq!(tree.check_invariants(), Ok(()));
        assert_eq!(tree.keys_in_order(), [1, 2, 4, 5, 8, 9]);
    }

    #[test]
    fn swap_keeps_payload_handles() {
        let mut tree = build(&[5, 3, 8, 1, 4]);
        let before: Vec<_> = [1, 3, 4, 8]
            .iter()
            .map(|key| {
                let handle = tree.search(key).unwrap();
                (handle, tree.nodes.get(handle).value())
            })
            .collect();

        tree.remove(&5).unwrap();

        for (key, (handle, value)) in [1, 3, 4, 8].iter().zip(before) {
            assert_eq!(tree.search(key), Some(handle));
            assert_eq!(tree.nodes.get(handle).value(), value);
        }
    }

    #[test]
    fn removal_cascades_rotations_to_root() {
        // Removing 1 leaves 2 unbalanced; the fix there unbalances 5 in turn.
        let mut tree = build(&[5, 2, 8, 1, 4, 7, 10, 3, 6, 9, 11, 12]);
        tree.rotations.clear();

        tree.remove(&1).unwrap();
        assert_eq!(tree.check_invariants(), Ok(()));
        assert_eq!(tree.rotations, [Rotation::RightLeft, Rotation::Left]);
        assert_eq!(tree.keys_in_order(), [2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn missing_key_leaves_tree_untouched() {
        let mut tree = build(&[2, 1, 3]);
        assert_eq!(tree.remove(&7), Err(Error::NotFound));
        assert_eq!(tree.remove(&0), Err(Error::NotFound));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.check_invariants(), Ok(()));

        let mut empty: RawAvlTree<i32, i32> = RawAvlTree::new();
        assert_eq!(empty.remove(&1), Err(Error::NotFound));
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut tree = build(&[2, 1, 3]);
        assert_eq!(tree.insert(1, -1), Err((1, -1)));
        assert_eq!(tree.get_key_value(&1), Some((&1, &10)));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn clear_releases_every_slot() {
        let mut tree = build(&[5, 3, 8, 1, 4, 7, 9, 2, 6]);
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.nodes.len(), 0);
        assert_eq!(tree.values.len(), 0);
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.check_invariants(), Ok(()));
    }

    #[test]
    fn corrupt_height_is_reported() {
        let mut tree = build(&[2, 1, 3]);
        let root = tree.root.unwrap();
        tree.nodes.get_mut(root).set_height(7);
        assert_eq!(tree.check_invariants(), Err(Violation::HeightCache { cached: 7, computed: 1 }));
    }

    #[test]
    fn corrupt_order_is_reported() {
        let mut tree = build(&[2, 1, 3]);
        let root = tree.root.unwrap();
        let (left, right) = {
            let node = tree.nodes.get(root);
            (node.left(), node.right())
        };
        let node = tree.nodes.get_mut(root);
        node.set_left(right);
        node.set_right(left);
        assert_eq!(tree.check_invariants(), Err(Violation::Order));
    }

    #[test]
    fn imbalance_is_reported() {
        let mut tree = build(&[2, 1, 3, 4]);
        // Detach 1, leaving 2 with heights -1 and 1 below it.
        let root = tree.root.unwrap();
        tree.nodes.get_mut(root).set_left(None);
        assert_eq!(tree.check_invariants(), Err(Violation::Balance { factor: 2 }));
    }

    #[test]
    fn miscounted_length_is_reported() {
        let mut tree = build(&[2, 1, 3]);
        tree.len = 4;
        assert_eq!(tree.check_invariants(), Err(Violation::Length { recorded: 4, counted: 3 }));
    }

    // Operations for property testing.
    #[derive(Clone, Debug)]
    enum Op {
        Insert(i16),
        Remove(i16),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (-500i16..500).prop_map(Op::Insert),
            2 => (-500i16..500).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn invariants_hold_after_every_mutation(ops in prop::collection::vec(op(), 0..600)) {
            let mut tree: RawAvlTree<i16, i16> = RawAvlTree::new();
            let mut model = alloc::collections::BTreeMap::new();

            for op in ops {
                match op {
                    Op::Insert(key) => {
                        let fresh = !model.contains_key(&key);
                        if fresh {
                            model.insert(key, key);
                        }
                        prop_assert_eq!(tree.insert(key, key).is_ok(), fresh);
                    }
                    Op::Remove(key) => {
                        let expected = model.remove(&key).map(|value| (key, value)).ok_or(Error::NotFound);
                        prop_assert_eq!(tree.remove(&key), expected);
                    }
                }
                prop_assert_eq!(tree.check_invariants(), Ok(()));
                prop_assert_eq!(tree.len(), model.len());
            }

            prop_assert_eq!(tree.keys_in_order(), model.keys().copied().collect::<Vec<_>>());
        }

        #[test]
        fn height_stays_logarithmic(keys in prop::collection::btree_set(any::<i32>(), 1..2_000)) {
            let mut tree = RawAvlTree::new();
            for &key in &keys {
                tree.insert(key, ()).unwrap();
            }

            // The sparsest AVL tree of height h holds N(h) = N(h - 1) + N(h - 2) + 1 nodes.
            let (mut sparsest, mut previous) = (1usize, 0usize);
            for _ in 0..tree.height() {
                (sparsest, previous) = (sparsest + previous + 1, sparsest);
            }
            prop_assert!(keys.len() >= sparsest);
        }
    }
}
