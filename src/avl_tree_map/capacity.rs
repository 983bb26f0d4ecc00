use super::AvlTreeMap;
use crate::raw::RawAvlTree;

impl<K, V> AvlTreeMap<K, V> {
    /// Creates an empty map with room for at least `capacity` entries before
    /// its node storage reallocates.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map: AvlTreeMap<i32, i32> = AvlTreeMap::with_capacity(32);
    /// assert!(map.is_empty());
    /// assert!(map.capacity() >= 32);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        AvlTreeMap {
            raw: RawAvlTree::with_capacity(capacity),
        }
    }

    /// Returns how many entries the map can hold before its storage
    /// reallocates. Slots freed by removal are reused first.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn removal_frees_slots_for_reuse() {
        let mut map = AvlTreeMap::with_capacity(8);
        let capacity = map.capacity();
        for round in 0..10 {
            for key in 0..8 {
                assert!(map.insert(key, round));
            }
            map.clear();
        }
        assert_eq!(map.capacity(), capacity);
    }
}
