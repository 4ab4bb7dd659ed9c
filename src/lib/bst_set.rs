use crate::bst_cursor::{Cursor, IntoKeys, Keys};
use crate::bst_tree::Tree;
use crate::error::Result;
use std::borrow::Borrow;
use std::fmt;

/// An ordered set of unique keys backed by an unbalanced binary search tree.
///
/// Keys cannot be changed in place; erase and insert instead.
#[derive(Clone)]
pub struct TreeSet<K> {
    tree: Tree<K, ()>,
}

impl<K> TreeSet<K> {
    /// Creates an empty set.
    pub fn new() -> Self {
        TreeSet { tree: Tree::new() }
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns true if the set holds no keys.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Upper bound on the number of keys.
    pub fn max_size(&self) -> usize {
        self.tree.max_size()
    }

    /// Removes all keys.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Exchanges the contents of two sets.
    pub fn swap(&mut self, other: &mut TreeSet<K>) {
        self.tree.swap(&mut other.tree);
    }

    /// Cursor at the smallest key.
    pub fn begin(&self) -> Cursor {
        self.tree.begin()
    }

    /// Past-the-end cursor.
    pub fn end(&self) -> Cursor {
        self.tree.end()
    }

    /// Key at `pos`.
    pub fn key_at(&self, pos: Cursor) -> Result<&K> {
        self.tree.get(pos).map(|(k, _)| k)
    }

    /// Erases the key at `pos`. End cursors are ignored.
    pub fn erase(&mut self, pos: Cursor) -> Option<K> {
        self.tree.erase(pos).map(|(k, _)| k)
    }

    /// Smallest key.
    pub fn first(&self) -> Option<&K> {
        self.tree.first().map(|(k, _)| k)
    }

    /// Largest key.
    pub fn last(&self) -> Option<&K> {
        self.tree.last().map(|(k, _)| k)
    }

    /// Returns an iterator over the keys in ascending order.
    pub fn iter(&self) -> Keys<'_, K, ()> {
        self.tree.keys()
    }
}

impl<K: Ord> TreeSet<K> {
    /// Inserts `key` unless already present.
    pub fn insert(&mut self, key: K) -> (Cursor, bool) {
        self.tree.insert(key, ())
    }

    /// Inserts every key, reporting each outcome in argument order.
    pub fn insert_many<I>(&mut self, keys: I) -> Vec<(Cursor, bool)>
    where
        I: IntoIterator<Item = K>,
    {
        keys.into_iter().map(|key| self.insert(key)).collect()
    }

    /// Cursor at `key`, or [`TreeSet::end`] if absent.
    pub fn find<Q: ?Sized + Ord>(&self, key: &Q) -> Cursor
    where
        K: Borrow<Q>,
    {
        self.tree.find(key)
    }

    /// Returns true if the set holds `key`.
    pub fn contains<Q: ?Sized + Ord>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
    {
        self.tree.contains(key)
    }

    /// Removes `key`. Returns whether it was present.
    pub fn remove<Q: ?Sized + Ord>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
    {
        self.tree.remove(key).is_some()
    }

    /// Removes and returns the stored key equal to `key`.
    pub fn take<Q: ?Sized + Ord>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
    {
        self.tree.remove(key).map(|(k, _)| k)
    }

    /// Moves keys missing here out of `other`; shared keys stay in `other`.
    pub fn merge(&mut self, other: &mut TreeSet<K>) {
        self.tree.merge(&mut other.tree);
    }
}

impl<K> Default for TreeSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> AsRef<Tree<K, ()>> for TreeSet<K> {
    fn as_ref(&self) -> &Tree<K, ()> {
        &self.tree
    }
}

impl<K: fmt::Debug> fmt::Debug for TreeSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: PartialEq> PartialEq for TreeSet<K> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq> Eq for TreeSet<K> {}

impl<K: Ord> FromIterator<K> for TreeSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = TreeSet::new();
        set.extend(iter);
        set
    }
}

impl<K: Ord> Extend<K> for TreeSet<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<'a, K> IntoIterator for &'a TreeSet<K> {
    type Item = &'a K;
    type IntoIter = Keys<'a, K, ()>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K> IntoIterator for TreeSet<K> {
    type Item = K;
    type IntoIter = IntoKeys<K, ()>;
    fn into_iter(self) -> Self::IntoIter {
        self.tree.into_keys()
    }
}
