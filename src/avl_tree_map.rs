use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;
use core::ops::Index;

use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::raw::{Handle, RawAvlTree};

mod capacity;
mod diagnostics;

pub use diagnostics::Pretty;

/// An ordered map based on an [AVL tree].
///
/// Given a key type with a [total order], the map stores its entries in key
/// order and keeps the tree height-balanced: the two subtrees of every node
/// differ in height by at most one, so lookups, insertions and removals take
/// O(log n) time in the worst case.
///
/// Entries are write-once. An entry's key and value are never replaced in
/// place: inserting an existing key is rejected, and there is no API that
/// hands out a mutable reference to a stored value. Removing an entry whose
/// node has two children restructures the tree around it rather than moving
/// another entry's payload into its slot.
///
/// It is a logic error for a key to be modified in such a way that the key's
/// ordering relative to any other key, as determined by the [`Ord`] trait,
/// changes while it is in the map. The behavior resulting from such a logic
/// error is not specified, but will be encapsulated to the `AvlTreeMap` that
/// observed it and not result in undefined behavior.
///
/// # Examples
///
/// ```
/// use avl_tree::{AvlTreeMap, Error};
///
/// let mut stock = AvlTreeMap::new();
/// stock.insert("apples", 3);
/// stock.insert("pears", 7);
/// stock.insert("figs", 12);
///
/// assert_eq!(stock.find("pears"), Ok(&7));
/// assert_eq!(stock.find("plums"), Err(Error::NotFound));
///
/// // a key is stored once; the first value wins
/// assert!(!stock.insert("figs", 0));
/// assert_eq!(stock["figs"], 12);
///
/// assert_eq!(stock.remove("apples"), Ok(3));
/// assert!(!stock.contains("apples"));
///
/// // entries come out in key order
/// let names: Vec<_> = stock.iter().map(|(name, _)| *name).collect();
/// assert_eq!(names, ["figs", "pears"]);
/// ```
///
/// An `AvlTreeMap` with a known list of items can be initialized from an array:
///
/// ```
/// use avl_tree::AvlTreeMap;
///
/// let planets = AvlTreeMap::from([("Mercury", 0.4), ("Venus", 0.7), ("Earth", 1.0)]);
/// assert_eq!(planets.len(), 3);
/// ```
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
/// [total order]: https://en.wikipedia.org/wiki/Total_order
pub struct AvlTreeMap<K, V> {
    raw: RawAvlTree<K, V>,
}

/// An in-order iterator over the entries of an `AvlTreeMap`.
///
/// This `struct` is created by the [`iter`] method on [`AvlTreeMap`]. Cloning
/// it, or calling [`iter`] again, restarts the walk from the current position
/// or from the smallest key respectively.
///
/// [`iter`]: AvlTreeMap::iter
pub struct Iter<'a, K, V> {
    tree: &'a RawAvlTree<K, V>,
    // Ancestors still to be yielded, deepest on top.
    stack: SmallVec<[Handle; 32]>,
    remaining: usize,
}

impl<K, V> AvlTreeMap<K, V> {
    /// Makes a new, empty `AvlTreeMap`.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map = AvlTreeMap::new();
    /// map.insert(1, "a");
    /// ```
    #[must_use]
    pub const fn new() -> AvlTreeMap<K, V> {
        AvlTreeMap { raw: RawAvlTree::new() }
    }

    /// Clears the map by removing the root entry until none is left.
    ///
    /// Clearing an empty map does nothing.
    ///
    /// # Complexity
    ///
    /// O(n log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map = AvlTreeMap::from([(1, "a"), (2, "b")]);
    /// map.clear();
    /// assert!(map.is_empty());
    /// map.clear();
    /// assert!(map.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map = AvlTreeMap::new();
    /// assert_eq!(map.len(), 0);
    /// map.insert(1, "a");
    /// assert_eq!(map.len(), 1);
    /// ```
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map contains no entries, that is, the root slot
    /// is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map = AvlTreeMap::new();
    /// assert!(map.is_empty());
    /// map.insert(1, "a");
    /// assert!(!map.is_empty());
    /// ```
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the entry with the smallest key.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(2, "b"), (1, "a")]);
    /// assert_eq!(map.first_key_value(), Some((&1, &"a")));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.raw.first_key_value()
    }

    /// Returns the entry with the largest key.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(2, "b"), (1, "a")]);
    /// assert_eq!(map.last_key_value(), Some((&2, &"b")));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.raw.last_key_value()
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    ///
    /// The iterator is lazy: it holds one root-to-leaf path at a time and
    /// takes amortized constant time per entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(3, "c"), (1, "a"), (2, "b")]);
    ///
    /// for (key, value) in map.iter() {
    ///     println!("{key}: {value}");
    /// }
    ///
    /// let (first_key, first_value) = map.iter().next().unwrap();
    /// assert_eq!((*first_key, *first_value), (1, "a"));
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.raw)
    }
}

impl<K: Ord, V> AvlTreeMap<K, V> {
    /// Returns a reference to the value stored under `key`.
    ///
    /// The key may be any borrowed form of the map's key type, but the
    /// ordering on the borrowed form *must* match the ordering on the key type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the key is absent.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::{AvlTreeMap, Error};
    ///
    /// let map = AvlTreeMap::from([(1, "a")]);
    /// assert_eq!(map.find(&1), Ok(&"a"));
    /// assert_eq!(map.find(&2), Err(Error::NotFound));
    /// ```
    pub fn find<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.get(key).ok_or(Error::NotFound)
    }

    /// Returns a reference to the value stored under `key`, or `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(1, "a")]);
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get_key_value(key).map(|(_, value)| value)
    }

    /// Returns the stored key and value for `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(String::from("a"), 1)]);
    /// assert_eq!(map.get_key_value("a"), Some((&String::from("a"), &1)));
    /// ```
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get_key_value(key)
    }

    /// Returns `true` if the map holds an entry for `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(1, "a")]);
    /// assert!(map.contains(&1));
    /// assert!(!map.contains(&2));
    /// ```
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.search(key).is_some()
    }

    /// Inserts a new entry and returns `true`.
    ///
    /// If the key is already present the map is left unchanged, the offered
    /// key and value are dropped, and `false` is returned. Use
    /// [`try_insert`](Self::try_insert) to get the rejected pair back.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map = AvlTreeMap::new();
    /// assert!(map.insert(37, "a"));
    /// assert!(!map.insert(37, "b"));
    /// assert_eq!(map[&37], "a");
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.raw.insert(key, value).is_ok()
    }

    /// Inserts a new entry, handing the pair back if the key is already
    /// present.
    ///
    /// # Errors
    ///
    /// Returns `Err((key, value))` when the map already holds `key`; the
    /// stored entry is not touched.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map = AvlTreeMap::new();
    /// assert_eq!(map.try_insert(1, "a"), Ok(()));
    /// assert_eq!(map.try_insert(1, "b"), Err((1, "b")));
    /// ```
    pub fn try_insert(&mut self, key: K, value: V) -> core::result::Result<(), (K, V)> {
        self.raw.insert(key, value)
    }

    /// Removes the entry for `key` and returns its value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the key is absent.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::{AvlTreeMap, Error};
    ///
    /// let mut map = AvlTreeMap::from([(1, "a")]);
    /// assert_eq!(map.remove(&1), Ok("a"));
    /// assert_eq!(map.remove(&1), Err(Error::NotFound));
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(key).map(|(_, value)| value)
    }

    /// Removes the entry for `key` and returns the stored key and value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the key is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map = AvlTreeMap::from([(1, "a")]);
    /// assert_eq!(map.remove_entry(&1), Ok((1, "a")));
    /// ```
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(key)
    }
}

impl<K: Clone, V: Clone> Clone for AvlTreeMap<K, V> {
    fn clone(&self) -> Self {
        AvlTreeMap { raw: self.raw.clone() }
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for AvlTreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for AvlTreeMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Default for AvlTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTreeMap<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = AvlTreeMap::new();
        map.extend(iter);
        map
    }
}

/// Keys already present keep their first value.
impl<K: Ord, V> Extend<(K, V)> for AvlTreeMap<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for AvlTreeMap<K, V> {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<'a, K, V> IntoIterator for &'a AvlTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K, Q, V> Index<&Q> for AvlTreeMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: ?Sized + Ord,
{
    type Output = V;

    /// Returns a reference to the value stored under `key`.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the `AvlTreeMap`.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<'a, K, V> Iter<'a, K, V> {
    fn new(tree: &'a RawAvlTree<K, V>) -> Self {
        let mut iter = Iter {
            tree,
            stack: SmallVec::new(),
            remaining: tree.len(),
        };
        iter.descend_left(tree.root());
        iter
    }

    fn descend_left(&mut self, mut slot: Option<Handle>) {
        while let Some(handle) = slot {
            self.stack.push(handle);
            slot = self.tree.node(handle).left();
        }
    }
}

impl<'a, K: 'a, V: 'a> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.stack.pop()?;
        let tree = self.tree;
        let node = tree.node(handle);

        self.descend_left(node.right());
        self.remaining -= 1;

        Some((node.key(), tree.value(node.value())))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            tree: self.tree,
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
