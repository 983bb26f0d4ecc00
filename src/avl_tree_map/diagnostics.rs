use alloc::string::String;
use core::fmt;

use super::AvlTreeMap;
use crate::error::Result;
use crate::raw::{Handle, RawAvlTree};

impl<K: Ord, V> AvlTreeMap<K, V> {
    /// Walks the whole tree and re-verifies its structure: keys strictly
    /// ascending in order, every cached height matching its children, every
    /// balance factor within `-1..=1`, and the entry count.
    ///
    /// Nothing in the map calls this; it exists for test harnesses and for
    /// debugging.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`](crate::Error::InvariantViolation)
    /// naming the first broken invariant found.
    ///
    /// # Complexity
    ///
    /// O(n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map: AvlTreeMap<_, _> = (0..100).map(|key| (key, key)).collect();
    /// assert_eq!(map.check_invariants(), Ok(()));
    /// ```
    pub fn check_invariants(&self) -> Result<()> {
        Ok(self.raw.check_invariants()?)
    }

    /// [`check_invariants`](Self::check_invariants) reduced to a flag.
    #[must_use]
    pub fn debug_check_invariants(&self) -> bool {
        self.check_invariants().is_ok()
    }
}

impl<K, V> AvlTreeMap<K, V> {
    /// Returns the height of the tree: `None` when empty, `Some(0)` for a
    /// single entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map: AvlTreeMap<_, _> = (0..7).map(|key| (key, ())).collect();
    /// assert_eq!(map.height(), Some(2));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn height(&self) -> Option<usize> {
        usize::try_from(self.raw.height()).ok()
    }

    /// Returns a value whose [`Display`](fmt::Display) draws the tree, one
    /// entry per line with the left subtree listed before the right one. An
    /// absent child next to a present one is drawn as `·`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(2, "b"), (1, "a"), (3, "c")]);
    /// assert_eq!(map.pretty().to_string(), "2: b\n├─ 1: a\n└─ 3: c\n");
    /// ```
    pub fn pretty(&self) -> Pretty<'_, K, V> {
        Pretty { tree: &self.raw }
    }
}

/// Draws an [`AvlTreeMap`] as a tree.
///
/// This `struct` is created by [`AvlTreeMap::pretty`].
pub struct Pretty<'a, K, V> {
    tree: &'a RawAvlTree<K, V>,
}

impl<K: fmt::Display, V: fmt::Display> Pretty<'_, K, V> {
    fn write_subtree(&self, f: &mut fmt::Formatter<'_>, handle: Handle, prefix: &mut String) -> fmt::Result {
        let node = self.tree.node(handle);
        writeln!(f, "{}: {}", node.key(), self.tree.value(node.value()))?;

        if node.left().is_none() && node.right().is_none() {
            return Ok(());
        }

        for (slot, last) in [(node.left(), false), (node.right(), true)] {
            let (branch, indent) = if last { ("└─ ", "   ") } else { ("├─ ", "│  ") };
            write!(f, "{prefix}{branch}")?;

            match slot {
                Some(child) => {
                    let depth = prefix.len();
                    prefix.push_str(indent);
                    self.write_subtree(f, child, prefix)?;
                    prefix.truncate(depth);
                }
                None => writeln!(f, "·")?,
            }
        }
        Ok(())
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Pretty<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tree.root() {
            Some(root) => self.write_subtree(f, root, &mut String::new()),
            None => f.write_str("(empty)\n"),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn pretty_marks_missing_children() {
        let map = AvlTreeMap::from([(5, 'e'), (3, 'c'), (8, 'h'), (1, 'a'), (4, 'd'), (9, 'i')]);
        let expected = "\
5: e
├─ 3: c
│  ├─ 1: a
│  └─ 4: d
└─ 8: h
   ├─ ·
   └─ 9: i
";
        assert_eq!(map.pretty().to_string(), expected);
    }

    #[test]
    fn pretty_empty_map() {
        let map: AvlTreeMap<u8, u8> = AvlTreeMap::new();
        assert_eq!(map.pretty().to_string(), "(empty)\n");
    }

    #[test]
    fn height_of_empty_and_single() {
        let mut map = AvlTreeMap::new();
        assert_eq!(map.height(), None);
        map.insert(1, ());
        assert_eq!(map.height(), Some(0));
        assert!(map.debug_check_invariants());
    }
}
