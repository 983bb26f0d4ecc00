use core::borrow::Borrow;
use core::cmp::Ordering;

use super::handle::Handle;

/// Height of an empty subtree. A leaf is therefore at height 0.
pub(crate) const EMPTY_HEIGHT: i32 = -1;

/// A tree node. The key and the value handle are fixed for the lifetime of
/// the node; only the structural fields (children and cached height) change.
#[derive(Clone)]
pub(crate) struct Node<K> {
    key: K,
    value: Handle,
    left: Option<Handle>,
    right: Option<Handle>,
    height: i32,
}

/// Which child slot of a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl<K> Node<K> {
    /// Creates a leaf.
    pub(crate) const fn new(key: K, value: Handle) -> Self {
        Self {
            key,
            value,
            left: None,
            right: None,
            height: 0,
        }
    }

    #[inline]
    pub(crate) const fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub(crate) const fn value(&self) -> Handle {
        self.value
    }

    /// Consumes the node, returning its key and value handle.
    pub(crate) fn into_parts(self) -> (K, Handle) {
        (self.key, self.value)
    }

    #[inline]
    pub(crate) const fn left(&self) -> Option<Handle> {
        self.left
    }

    #[inline]
    pub(crate) const fn right(&self) -> Option<Handle> {
        self.right
    }

    #[inline]
    pub(crate) const fn child(&self, side: Side) -> Option<Handle> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline]
    pub(crate) fn set_child(&mut self, side: Side, child: Option<Handle>) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }

    pub(crate) fn set_left(&mut self, left: Option<Handle>) {
        self.left = left;
    }

    pub(crate) fn set_right(&mut self, right: Option<Handle>) {
        self.right = right;
    }

    /// Cached height of the subtree rooted here.
    #[inline]
    pub(crate) const fn height(&self) -> i32 {
        self.height
    }

    pub(crate) fn set_height(&mut self, height: i32) {
        self.height = height;
    }

    /// Compares `key` against this node's key, telling which way to descend.
    #[inline]
    pub(crate) fn search<Q>(&self, key: &Q) -> Ordering
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        key.cmp(self.key.borrow())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn new_node_is_a_leaf() {
        let node = Node::new("k", Handle::from_index(3));
        assert_eq!(node.height(), 0);
        assert_eq!(node.left(), None);
        assert_eq!(node.right(), None);
        assert_eq!(node.value(), Handle::from_index(3));
    }

    #[test]
    fn children_by_side() {
        let mut node = Node::new(10, Handle::from_index(0));
        node.set_child(Side::Left, Some(Handle::from_index(1)));
        node.set_child(Side::Right, Some(Handle::from_index(2)));
        assert_eq!(node.child(Side::Left), node.left());
        assert_eq!(node.child(Side::Right), node.right());
        assert_eq!(node.right(), Some(Handle::from_index(2)));
    }

    #[test]
    fn search_reports_direction() {
        let node = Node::new(10, Handle::from_index(0));
        assert_eq!(node.search(&3), Ordering::Less);
        assert_eq!(node.search(&10), Ordering::Equal);
        assert_eq!(node.search(&12), Ordering::Greater);
    }
}
