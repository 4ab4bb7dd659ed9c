use crate::bst_cursor::{Cursor, IntoIter, Iter, IterMut, Keys, Values};
use crate::bst_tree::Tree;
use crate::error::{Error, Result};
use log::trace;
use std::borrow::Borrow;
use std::fmt;

/// An ordered map backed by an unbalanced binary search tree.
///
/// Duplicate keys are rejected rather than overwritten; use
/// [`TreeMap::insert_or_assign`] to replace a value.
#[derive(Clone)]
pub struct TreeMap<K, V> {
    tree: Tree<K, V>,
}

impl<K, V> TreeMap<K, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        TreeMap { tree: Tree::new() }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns true if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Upper bound on the number of entries.
    pub fn max_size(&self) -> usize {
        self.tree.max_size()
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Exchanges the contents of two maps.
    pub fn swap(&mut self, other: &mut TreeMap<K, V>) {
        self.tree.swap(&mut other.tree);
    }

    /// Cursor at the entry with the smallest key.
    pub fn begin(&self) -> Cursor {
        self.tree.begin()
    }

    /// Past-the-end cursor.
    pub fn end(&self) -> Cursor {
        self.tree.end()
    }

    /// Entry at `pos`.
    pub fn entry_at(&self, pos: Cursor) -> Result<(&K, &V)> {
        self.tree.get(pos)
    }

    /// Entry at `pos`, value mutable.
    pub fn entry_at_mut(&mut self, pos: Cursor) -> Result<(&K, &mut V)> {
        self.tree.get_mut(pos)
    }

    /// Erases the entry at `pos`. End cursors are ignored.
    pub fn erase(&mut self, pos: Cursor) -> Option<(K, V)> {
        self.tree.erase(pos)
    }

    /// Entry with the smallest key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first()
    }

    /// Entry with the largest key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last()
    }

    /// Returns an iterator over the entries in key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.tree.iter()
    }

    /// Returns an iterator with mutable values in key order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.tree.iter_mut()
    }

    /// Returns the keys in order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        self.tree.keys()
    }

    /// Returns the values in key order.
    pub fn values(&self) -> Values<'_, K, V> {
        self.tree.values()
    }
}

impl<K, V> TreeMap<K, V>
where
    K: Ord,
{
    /// Inserts `value` under `key` unless the key is already present.
    pub fn insert(&mut self, key: K, value: V) -> (Cursor, bool) {
        self.tree.insert(key, value)
    }

    /// Inserts a `(key, value)` pair.
    pub fn insert_pair(&mut self, (key, value): (K, V)) -> (Cursor, bool) {
        self.insert(key, value)
    }

    /// Inserts every pair, reporting each outcome in argument order.
    pub fn insert_many<I>(&mut self, items: I) -> Vec<(Cursor, bool)>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        items.into_iter().map(|pair| self.insert_pair(pair)).collect()
    }

    /// Inserts `value`, replacing any existing entry under `key`.
    ///
    /// A replacement erases the old node and inserts a new one, and is
    /// reported as `false`.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (Cursor, bool) {
        let pos = self.tree.find(&key);
        if pos.is_end() {
            return self.tree.insert(key, value);
        }
        trace!("insert_or_assign: replacing existing entry");
        self.tree.erase(pos);
        let (pos, _) = self.tree.insert(key, value);
        (pos, false)
    }

    /// Cursor at `key`, or [`TreeMap::end`] if absent.
    pub fn find<Q: ?Sized + Ord>(&self, key: &Q) -> Cursor
    where
        K: Borrow<Q>,
    {
        self.tree.find(key)
    }

    /// Returns true if the map holds `key`.
    pub fn contains<Q: ?Sized + Ord>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
    {
        self.tree.contains(key)
    }

    /// Returns the value under `key`.
    pub fn get<Q: ?Sized + Ord>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
    {
        self.tree.get_value(key)
    }

    /// Returns the value under `key`, mutably.
    pub fn get_mut<Q: ?Sized + Ord>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
    {
        self.tree.get_value_mut(key)
    }

    /// Returns the value under `key`, or [`Error::KeyNotFound`].
    pub fn at<Q: ?Sized + Ord>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
    {
        self.tree.get_value(key).ok_or(Error::KeyNotFound)
    }

    /// Mutable form of [`TreeMap::at`].
    pub fn at_mut<Q: ?Sized + Ord>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
    {
        self.tree.get_value_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Returns the value under `key`, inserting `V::default()` if absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.tree.get_or_insert_with(key, V::default)
    }

    /// Removes `key`, returning its value.
    pub fn remove<Q: ?Sized + Ord>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
    {
        self.tree.remove(key).map(|(_, v)| v)
    }

    /// Removes `key`, returning the stored key and value.
    pub fn remove_entry<Q: ?Sized + Ord>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
    {
        self.tree.remove(key)
    }

    /// Moves entries whose keys are missing here out of `other`.
    pub fn merge(&mut self, other: &mut TreeMap<K, V>) {
        self.tree.merge(&mut other.tree);
    }
}

impl<K, V> Default for TreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> AsRef<Tree<K, V>> for TreeMap<K, V> {
    fn as_ref(&self) -> &Tree<K, V> {
        &self.tree
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for TreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for TreeMap<K, V> {}

impl<K: Ord, V> FromIterator<(K, V)> for TreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TreeMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for TreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a TreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut TreeMap<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V> IntoIterator for TreeMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.tree.into_iter()
    }
}
