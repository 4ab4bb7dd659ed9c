use crate::bst_cursor::{Cursor, IntoIter, IntoKeys, Iter, IterMut, Keys, Values};
use crate::bst_node::{
    copy_subtree, handle, maximum, minimum, resolve, search, Arena, Node, NodeId,
};
use crate::error::{Error, Result};
use log::{debug, trace};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::mem;

/// An unbalanced binary search tree with parent-linked nodes.
///
/// Nodes live in an arena and refer to each other by index: children are
/// owned by their parent, the parent link is a back-reference only. The
/// element count is stored on the root node.
pub struct Tree<K, V> {
    pub(crate) nodes: Arena<K, V>,
    pub(crate) root: Option<NodeId>,
    // Last generation handed out. Never rewinds, not even on clear.
    generation: u64,
}

impl<K, V> Tree<K, V> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Tree {
            nodes: Arena::new(),
            root: None,
            generation: 0,
        }
    }

    fn allocate(&mut self, key: K, value: V, parent: Option<NodeId>) -> NodeId {
        self.generation += 1;
        self.nodes.insert(Node::new(key, value, parent, self.generation))
    }

    pub(crate) fn cursor_at(&self, id: NodeId) -> Cursor {
        Cursor::at(handle(&self.nodes, id))
    }

    /// Slot behind `pos`, or the error dereferencing it must report.
    fn position(&self, pos: Cursor) -> Result<NodeId> {
        let current = pos.current.ok_or(Error::EndOfSequence)?;
        resolve(&self.nodes, current).ok_or(Error::StalePosition)
    }

    /// Returns the number of elements in the tree.
    pub fn len(&self) -> usize {
        self.root.map_or(0, |root| self.nodes[root].size)
    }

    /// Returns true if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Upper bound on the number of elements the tree could ever hold.
    pub fn max_size(&self) -> usize {
        usize::MAX / mem::size_of::<Node<K, V>>().max(1)
    }

    /// Cursor at the smallest element, or the end cursor if empty.
    pub fn begin(&self) -> Cursor {
        match self.root {
            Some(root) => self.cursor_at(minimum(&self.nodes, root)),
            None => self.end(),
        }
    }

    /// Past-the-end cursor. Stepping it back yields the largest element.
    pub fn end(&self) -> Cursor {
        Cursor::end(self.root.map(|root| handle(&self.nodes, maximum(&self.nodes, root))))
    }

    /// Returns the element at `pos`.
    pub fn get(&self, pos: Cursor) -> Result<(&K, &V)> {
        let node = &self.nodes[self.position(pos)?];
        Ok((&node.key, &node.value))
    }

    /// Returns the element at `pos` with its value mutable.
    pub fn get_mut(&mut self, pos: Cursor) -> Result<(&K, &mut V)> {
        let id = self.position(pos)?;
        let node = &mut self.nodes[id];
        Ok((&node.key, &mut node.value))
    }

    /// Smallest element.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.get(self.begin()).ok()
    }

    /// Largest element.
    pub fn last(&self) -> Option<(&K, &V)> {
        self.get(self.end().predecessor(self)).ok()
    }

    /// Erases the element at `pos` and returns it.
    ///
    /// End and stale cursors are ignored, including cursors whose slot has
    /// since been reused by another insert. When the node has two children
    /// its in-order successor is moved into it, so cursors to the successor
    /// are invalidated too.
    pub fn erase(&mut self, pos: Cursor) -> Option<(K, V)> {
        let id = self.position(pos).ok()?;
        Some(self.erase_node(id))
    }

    pub(crate) fn erase_node(&mut self, id: NodeId) -> (K, V) {
        let remaining = self.len() - 1;
        let node = &self.nodes[id];
        let removed = match (node.left, node.right) {
            (Some(_), Some(right)) => {
                let heir = minimum(&self.nodes, right);
                trace!("erase: promoting successor {} into node {}", heir, id);
                let Node { key, value, .. } = self.unlink(heir);
                let node = &mut self.nodes[id];
                (
                    mem::replace(&mut node.key, key),
                    mem::replace(&mut node.value, value),
                )
            }
            _ => {
                let Node { key, value, .. } = self.unlink(id);
                (key, value)
            }
        };
        if let Some(root) = self.root {
            self.nodes[root].size = remaining;
        }
        removed
    }

    /// Detaches a node with at most one child, splicing the child into its
    /// place, and frees it.
    fn unlink(&mut self, id: NodeId) -> Node<K, V> {
        let node = &self.nodes[id];
        debug_assert!(!node.has_two_children());
        let child = node.left.or(node.right);
        let parent = node.parent;
        if let Some(child) = child {
            self.nodes[child].parent = parent;
        }
        match parent {
            None => self.root = child,
            Some(parent) => {
                let parent = &mut self.nodes[parent];
                if parent.left == Some(id) {
                    parent.left = child;
                } else {
                    parent.right = child;
                }
            }
        }
        self.nodes.remove(id)
    }

    /// Removes every element, children before parents.
    pub fn clear(&mut self) {
        let mut current = self.root.take();
        let mut freed = 0usize;
        while let Some(id) = current {
            let node = &self.nodes[id];
            if let Some(child) = node.left.or(node.right) {
                current = Some(child);
                continue;
            }
            let parent = node.parent;
            self.nodes.remove(id);
            freed += 1;
            if let Some(parent) = parent {
                let parent_node = &mut self.nodes[parent];
                if parent_node.left == Some(id) {
                    parent_node.left = None;
                } else {
                    parent_node.right = None;
                }
            }
            current = parent;
        }
        debug!("clear: freed {} nodes", freed);
    }

    /// Exchanges the contents of two trees.
    pub fn swap(&mut self, other: &mut Tree<K, V>) {
        mem::swap(self, other);
    }

    /// Returns an in-order iterator.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }

    /// Returns an in-order iterator with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(self)
    }

    /// Returns the keys in order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns the values in key order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Drains the tree, yielding its keys in order.
    pub fn into_keys(self) -> IntoKeys<K, V> {
        IntoKeys {
            inner: self.into_iter(),
        }
    }
}

impl<K, V> Tree<K, V>
where
    K: Ord,
{
    fn find_node<Q: ?Sized + Ord>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
    {
        search(&self.nodes, self.root?, key).ok()
    }

    /// Cursor at `key`, or the end cursor if absent.
    pub fn find<Q: ?Sized + Ord>(&self, key: &Q) -> Cursor
    where
        K: Borrow<Q>,
    {
        match self.find_node(key) {
            Some(id) => self.cursor_at(id),
            None => self.end(),
        }
    }

    /// Returns true if the tree holds `key`.
    pub fn contains<Q: ?Sized + Ord>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
    {
        self.find_node(key).is_some()
    }

    /// Returns the value stored under `key`.
    pub fn get_value<Q: ?Sized + Ord>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
    {
        self.find_node(key).map(|id| &self.nodes[id].value)
    }

    /// Returns the value stored under `key`, mutably.
    pub fn get_value_mut<Q: ?Sized + Ord>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
    {
        let id = self.find_node(key)?;
        Some(&mut self.nodes[id].value)
    }

    /// Inserts `key` with `value` unless the key is already present.
    ///
    /// Returns a cursor at the element holding `key` and whether a new node
    /// was created. An existing entry is never overwritten.
    pub fn insert(&mut self, key: K, value: V) -> (Cursor, bool) {
        let (id, inserted) = self.insert_node(key, value);
        (self.cursor_at(id), inserted)
    }

    fn insert_node(&mut self, key: K, value: V) -> (NodeId, bool) {
        let Some(root) = self.root else {
            let id = self.allocate(key, value, None);
            self.nodes[id].size = 1;
            self.root = Some(id);
            return (id, true);
        };

        let parent = match search(&self.nodes, root, &key) {
            Ok(existing) => return (existing, false),
            Err(parent) => parent,
        };
        let goes_left = key.cmp(&self.nodes[parent].key) == Ordering::Less;
        let id = self.allocate(key, value, Some(parent));
        if goes_left {
            self.nodes[parent].left = Some(id);
        } else {
            self.nodes[parent].right = Some(id);
        }
        self.nodes[root].size += 1;
        (id, true)
    }

    /// Returns the value under `key`, inserting `make()` first if absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let id = match self.find_node(&key) {
            Some(id) => id,
            None => self.insert_node(key, make()).0,
        };
        &mut self.nodes[id].value
    }

    /// Removes `key`, returning its entry.
    pub fn remove<Q: ?Sized + Ord>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
    {
        let id = self.find_node(key)?;
        Some(self.erase_node(id))
    }

    /// Moves every entry of `other` whose key is absent from `self` into
    /// `self`. Entries with keys already present stay in `other`.
    pub fn merge(&mut self, other: &mut Tree<K, V>) {
        let mut movable = Vec::new();
        let mut current = other.begin();
        while let Ok((key, _)) = other.get(current) {
            if !self.contains(key) {
                movable.push(current);
            }
            current.move_next(&*other);
        }
        // Descending order: erasing a node only ever frees the slot of its
        // successor, which has already been visited.
        let moved = movable.len();
        for pos in movable.into_iter().rev() {
            if let Some((key, value)) = other.erase(pos) {
                self.insert(key, value);
            }
        }
        debug!("merge: moved {} entries, {} left behind", moved, other.len());
    }
}

impl<K, V> Default for Tree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> AsRef<Tree<K, V>> for Tree<K, V> {
    fn as_ref(&self) -> &Tree<K, V> {
        self
    }
}

impl<K: Clone, V: Clone> Clone for Tree<K, V> {
    fn clone(&self) -> Self {
        let mut nodes = Arena::with_capacity(self.nodes.len());
        let root = self
            .root
            .map(|root| copy_subtree(&self.nodes, root, &mut nodes));
        if let Some(root) = root {
            nodes[root].size = self.len();
        }
        Tree {
            nodes,
            root,
            generation: self.generation,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Tree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V> IntoIterator for &'a Tree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut Tree<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V> IntoIterator for Tree<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<K, V> Tree<K, V> {
    #[cfg(test)]
    /// Collects keys level by level for debugging output.
    pub(crate) fn bfs(&self) -> Vec<Vec<K>>
    where
        K: Clone,
    {
        self.root.map_or_else(Vec::new, |root| Node::bfs(&self.nodes, root))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::BTreeMap as StdBTreeMap;

    /// Print tree structure for debugging
    pub(crate) fn print_tree<K: Clone + fmt::Debug, V>(tree: &Tree<K, V>) {
        for (i, layer) in tree.bfs().iter().enumerate() {
            println!("At layer {}: {:?}", i, layer);
        }
    }

    /// Check ordering bounds, parent links, root size and arena occupancy.
    fn check_tree_invariants_impl<K: Ord + fmt::Debug, V>(
        tree: &Tree<K, V>,
    ) -> std::result::Result<(), String> {
        let Some(root) = tree.root else {
            if !tree.nodes.is_empty() {
                return Err(format!("Empty root but {} live nodes", tree.nodes.len()));
            }
            return Ok(());
        };
        if tree.nodes[root].parent.is_some() {
            return Err("Root has a parent link".to_string());
        }
        let count = check_nodes(tree, root)?;
        if count != tree.nodes.len() {
            return Err(format!(
                "Reached {} nodes but arena holds {}",
                count,
                tree.nodes.len()
            ));
        }
        if count != tree.len() {
            return Err(format!("Counted {} nodes but len() is {}", count, tree.len()));
        }
        Ok(())
    }

    /// Walks the subtree under `root` with an explicit stack, checking each
    /// key against the bounds inherited from its ancestors.
    fn check_nodes<K: Ord + fmt::Debug, V>(
        tree: &Tree<K, V>,
        root: NodeId,
    ) -> std::result::Result<usize, String> {
        let mut count = 0;
        let mut pending: Vec<(NodeId, Option<&K>, Option<&K>)> = vec![(root, None, None)];
        while let Some((id, min_bound, max_bound)) = pending.pop() {
            let node = &tree.nodes[id];
            if let Some(min) = min_bound {
                if node.key <= *min {
                    return Err(format!("Key {:?} violates min bound {:?}", node.key, min));
                }
            }
            if let Some(max) = max_bound {
                if node.key >= *max {
                    return Err(format!("Key {:?} violates max bound {:?}", node.key, max));
                }
            }
            count += 1;
            for (child, lo, hi) in [
                (node.left, min_bound, Some(&node.key)),
                (node.right, Some(&node.key), max_bound),
            ] {
                if let Some(child) = child {
                    if tree.nodes[child].parent != Some(id) {
                        return Err(format!("Child of {:?} has a wrong parent link", node.key));
                    }
                    pending.push((child, lo, hi));
                }
            }
        }
        Ok(count)
    }

    pub(crate) fn check_tree_invariants<K: Ord + Clone + fmt::Debug, V>(
        tree: &Tree<K, V>,
        context: &str,
    ) {
        if let Err(e) = check_tree_invariants_impl(tree) {
            println!("=== Tree Invariant Violation ===");
            println!("Context: {}", context);
            println!("Error: {}", e);
            print_tree(tree);
            panic!("Tree invariant violated: {}", e);
        }
    }

    fn compare_with_std<K: Ord + Clone + fmt::Debug, V: Eq + fmt::Debug>(
        ours: &Tree<K, V>,
        std_map: &StdBTreeMap<K, V>,
        context: &str,
    ) {
        let ours_items: Vec<_> = ours.iter().collect();
        let std_items: Vec<_> = std_map.iter().collect();
        if ours_items != std_items || ours.len() != std_map.len() {
            println!("=== Comparison Mismatch with std::BTreeMap ===");
            println!("Context: {}", context);
            println!("  ours: {:?}", ours_items);
            println!("  std:  {:?}", std_items);
            print_tree(ours);
            panic!("Comparison failed: {}", context);
        }
    }

    fn keys<K: Clone, V>(tree: &Tree<K, V>) -> Vec<K> {
        tree.iter().map(|(k, _)| k.clone()).collect()
    }

    fn build(keys: &[u32]) -> Tree<u32, u32> {
        let mut tree = Tree::new();
        for &k in keys {
            tree.insert(k, k * 10);
        }
        tree
    }

    /// Right-leaning chain `0..len`, linked directly so that building a deep
    /// tree does not cost a full descent per insert.
    fn chain(len: u32) -> Tree<u32, u32> {
        let mut tree = Tree::new();
        let mut parent = None;
        for k in 0..len {
            let id = tree.allocate(k, k, parent);
            match parent {
                Some(p) => tree.nodes[p].right = Some(id),
                None => tree.root = Some(id),
            }
            parent = Some(id);
        }
        if let Some(root) = tree.root {
            tree.nodes[root].size = len as usize;
        }
        tree
    }

    // ==================== Basic Tests ====================

    #[test]
    fn test_empty_tree() {
        let tree: Tree<u32, String> = Tree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert!(!tree.contains(&0));
        assert_eq!(tree.begin(), tree.end());
        assert_eq!(tree.get(tree.begin()), Err(Error::EndOfSequence));
        assert!(tree.first().is_none());
        assert!(tree.last().is_none());
        assert!(tree.max_size() > 0);
    }

    #[test]
    fn test_insert_then_find() {
        let mut tree = Tree::new();
        let (pos, inserted) = tree.insert(42, "hello".to_string());
        assert!(inserted);
        assert_eq!(tree.get(pos), Ok((&42, &"hello".to_string())));

        let found = tree.find(&42);
        assert_eq!(found, pos);
        assert_eq!(tree.get(found), Ok((&42, &"hello".to_string())));
        assert!(tree.find(&7).is_end());
    }

    #[test]
    fn test_duplicate_insert_keeps_original() {
        let mut tree = Tree::new();
        let (first, _) = tree.insert(1, "first");
        let (second, inserted) = tree.insert(1, "second");
        assert!(!inserted);
        assert_eq!(first, second);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get_value(&1), Some(&"first"));
    }

    #[test]
    fn test_scenario_two_children_erase() {
        let mut tree = build(&[5, 3, 8, 1, 4, 7, 9]);
        assert_eq!(keys(&tree), vec![1, 3, 4, 5, 7, 8, 9]);

        let root = tree.root.unwrap();
        assert_eq!(tree.nodes[root].key, 5);

        let erased = tree.erase(tree.find(&5));
        assert_eq!(erased, Some((5, 50)));
        // 7 is promoted into the root slot.
        assert_eq!(tree.root, Some(root));
        assert_eq!(tree.nodes[root].key, 7);
        assert_eq!(tree.nodes[root].value, 70);
        assert_eq!(keys(&tree), vec![1, 3, 4, 7, 8, 9]);
        assert_eq!(tree.len(), 6);
        check_tree_invariants(&tree, "after erasing 5");
    }

    #[test]
    fn test_erase_root_with_single_child() {
        let mut tree = build(&[1, 2, 3]);
        tree.erase(tree.find(&1));
        assert_eq!(tree.nodes[tree.root.unwrap()].key, 2);
        assert_eq!(tree.len(), 2);
        check_tree_invariants(&tree, "after erasing root");

        tree.erase(tree.begin());
        tree.erase(tree.begin());
        assert!(tree.is_empty());
        check_tree_invariants(&tree, "after draining");
    }

    #[test]
    fn test_erase_end_is_noop() {
        let mut tree = build(&[2, 1, 3]);
        assert_eq!(tree.erase(tree.end()), None);
        assert_eq!(tree.len(), 3);

        let mut empty: Tree<u32, u32> = Tree::new();
        assert_eq!(empty.erase(empty.end()), None);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_erase_reinsert() {
        let mut tree = build(&[4, 2, 6]);
        tree.erase(tree.find(&2));
        let (pos, inserted) = tree.insert(2, 99);
        assert!(inserted);
        assert_eq!(tree.get(pos), Ok((&2, &99)));
        assert_eq!(tree.get_value(&2), Some(&99));
    }

    #[test]
    fn test_stale_cursor() {
        let mut tree = build(&[10, 5, 15]);
        let pos = tree.find(&5);
        tree.erase(pos);
        assert_eq!(tree.get(pos), Err(Error::StalePosition));
        assert_eq!(tree.erase(pos), None);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_stale_cursor_after_slot_reuse() {
        let mut tree = build(&[10, 5, 15]);
        let pos = tree.find(&5);
        tree.erase(pos);
        let (fresh, _) = tree.insert(99, 99);
        // The freed slot is handed to the new node.
        assert_eq!(fresh.current.map(|h| h.id), pos.current.map(|h| h.id));
        assert_ne!(fresh, pos);

        assert_eq!(tree.get(pos), Err(Error::StalePosition));
        assert_eq!(tree.get_mut(pos).map(|(k, _)| *k), Err(Error::StalePosition));
        assert_eq!(tree.erase(pos), None);
        assert_eq!(keys(&tree), vec![10, 15, 99]);
        assert_eq!(tree.get(fresh), Ok((&99, &99)));

        let mut stepped = pos;
        stepped.move_next(&tree);
        assert!(stepped.is_end());
        let mut stepped = pos;
        stepped.move_prev(&tree);
        assert!(stepped.is_end());
        check_tree_invariants(&tree, "after slot reuse");
    }

    #[test]
    fn test_stale_end_fallback_after_slot_reuse() {
        let mut tree = build(&[10, 5, 15]);
        let old_end = tree.end();
        tree.erase(tree.find(&15));
        tree.insert(12, 120);

        let back = old_end.predecessor(&tree);
        assert!(back.is_end());
        assert_eq!(tree.get(tree.end().predecessor(&tree)), Ok((&12, &120)));
    }

    #[test]
    fn test_two_children_erase_invalidates_successor_cursor() {
        let mut tree = build(&[5, 3, 8, 1, 4, 7, 9]);
        let heir = tree.find(&7);
        let erased = tree.find(&5);
        assert_eq!(tree.erase(erased), Some((5, 50)));

        // 7 moved into the erased slot; its own slot was freed.
        assert_eq!(tree.get(heir), Err(Error::StalePosition));
        assert_eq!(tree.erase(heir), None);
        assert_eq!(tree.get(erased), Ok((&7, &70)));
        assert_eq!(tree.find(&7), erased);

        tree.insert(6, 60);
        assert_eq!(tree.get(heir), Err(Error::StalePosition));
        assert_eq!(keys(&tree), vec![1, 3, 4, 6, 7, 8, 9]);
        check_tree_invariants(&tree, "after promoting successor");
    }

    #[test]
    fn test_cursor_survives_unrelated_mutation() {
        let mut tree = build(&[50, 25, 75, 10, 30]);
        let pos = tree.find(&25);
        tree.insert(27, 0);
        tree.insert(5, 0);
        tree.erase(tree.find(&75));
        tree.erase(tree.find(&10));
        assert_eq!(tree.get(pos), Ok((&25, &250)));
        assert_eq!(tree.get(pos.successor(&tree)).map(|(k, _)| *k), Ok(27));
    }

    #[test]
    fn test_get_or_insert_with() {
        let mut tree = build(&[2]);
        *tree.get_or_insert_with(2, || 0) += 1;
        *tree.get_or_insert_with(3, || 7) += 1;
        assert_eq!(tree.get_value(&2), Some(&21));
        assert_eq!(tree.get_value(&3), Some(&8));
        assert_eq!(tree.len(), 2);
        check_tree_invariants(&tree, "after get_or_insert_with");
    }

    // ==================== Cursor Tests ====================

    #[test]
    fn test_cursor_walk_forward_and_back() {
        let tree = build(&[5, 3, 8, 1, 4, 7, 9]);
        let mut seen = Vec::new();
        let mut pos = tree.begin();
        while pos != tree.end() {
            seen.push(*tree.get(pos).unwrap().0);
            pos.move_next(&tree);
        }
        assert_eq!(seen, vec![1, 3, 4, 5, 7, 8, 9]);

        // Walking past the last element remembers it.
        let mut back = Vec::new();
        loop {
            pos.move_prev(&tree);
            match tree.get(pos) {
                Ok((k, _)) => back.push(*k),
                Err(_) => break,
            }
        }
        assert_eq!(back, vec![9, 8, 7, 5, 4, 3, 1]);
    }

    #[test]
    fn test_decrement_from_end() {
        let tree = build(&[2, 1, 3]);
        let last = tree.end().predecessor(&tree);
        assert_eq!(tree.get(last), Ok((&3, &30)));
        assert_eq!(tree.last(), Some((&3, &30)));
        assert_eq!(tree.first(), Some((&1, &10)));
    }

    #[test]
    fn test_increment_at_end_stays_end() {
        let tree = build(&[2, 1, 3]);
        let mut pos = tree.end();
        pos.move_next(&tree);
        assert!(pos.is_end());
    }

    #[test]
    fn test_cursor_symmetry() {
        let tree = build(&[50, 30, 70, 20, 40, 60, 80, 35, 45, 65]);
        let first = tree.begin();
        let last = tree.end().predecessor(&tree);
        let mut pos = tree.begin();
        while !pos.is_end() {
            if pos != last {
                assert_eq!(pos.successor(&tree).predecessor(&tree), pos);
            }
            if pos != first {
                assert_eq!(pos.predecessor(&tree).successor(&tree), pos);
            }
            pos.move_next(&tree);
        }
    }

    #[test]
    fn test_cursor_equality_ignores_fallback() {
        let tree = build(&[2, 1, 3]);
        let mut walked = tree.begin();
        for _ in 0..3 {
            walked.move_next(&tree);
        }
        assert_eq!(walked, tree.end());
    }

    // ==================== Structural Tests ====================

    #[test]
    fn test_clone_is_deep_and_isomorphic() {
        let original = build(&[5, 3, 8, 1, 4, 7, 9]);
        let mut copy = original.clone();
        check_tree_invariants(&copy, "clone");
        assert_eq!(copy.bfs(), original.bfs());
        assert_eq!(copy.len(), original.len());

        copy.erase(copy.find(&5));
        copy.insert(100, 0);
        assert_eq!(keys(&original), vec![1, 3, 4, 5, 7, 8, 9]);
        assert_eq!(keys(&copy), vec![1, 3, 4, 7, 8, 9, 100]);
    }

    #[test]
    fn test_clone_degenerate_chain() {
        let original = chain(100_000);
        check_tree_invariants(&original, "chain");

        let copy = original.clone();
        check_tree_invariants(&copy, "chain clone");
        assert_eq!(copy.len(), 100_000);
        assert!(copy.nodes.iter().all(|(_, node)| node.left.is_none()));
        assert!(copy.iter().eq(original.iter()));
        assert_eq!(copy.first(), Some((&0, &0)));
        assert_eq!(copy.last(), Some((&99_999, &99_999)));
    }

    #[test]
    fn test_move_leaves_source_empty() {
        let mut source = build(&[2, 1, 3]);
        let target = mem::take(&mut source);
        assert!(source.is_empty());
        assert_eq!(keys(&target), vec![1, 2, 3]);
    }

    #[test]
    fn test_clear_and_reuse() {
        let mut tree = build(&[5, 3, 8, 1, 4, 7, 9]);
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        check_tree_invariants(&tree, "after clear");
        tree.insert(1, 1);
        assert_eq!(tree.len(), 1);
        check_tree_invariants(&tree, "after reuse");
    }

    #[test]
    fn test_clear_degenerate_tree() {
        let mut tree = Tree::new();
        for i in 0..10_000u32 {
            tree.insert(i, i);
        }
        tree.clear();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_swap() {
        let mut a = build(&[1, 2]);
        let mut b = build(&[7]);
        a.swap(&mut b);
        assert_eq!(keys(&a), vec![7]);
        assert_eq!(keys(&b), vec![1, 2]);
    }

    #[test]
    fn test_merge_partitions() {
        let mut ours = build(&[1, 3, 5]);
        let mut theirs = Tree::new();
        for (k, v) in [(2, 0), (3, 0), (4, 0), (5, 0), (6, 0), (0, 0)] {
            theirs.insert(k, v);
        }
        ours.merge(&mut theirs);
        assert_eq!(keys(&ours), vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(keys(&theirs), vec![3, 5]);
        // Colliding keys keep their original values on both sides.
        assert_eq!(ours.get_value(&3), Some(&30));
        assert_eq!(theirs.get_value(&3), Some(&0));
        check_tree_invariants(&ours, "merge target");
        check_tree_invariants(&theirs, "merge source");
    }

    #[test]
    fn test_merge_two_children_sources() {
        let mut ours = build(&[40]);
        let mut theirs = build(&[50, 30, 70, 20, 40, 60, 80]);
        ours.merge(&mut theirs);
        assert_eq!(keys(&ours), vec![20, 30, 40, 50, 60, 70, 80]);
        assert_eq!(keys(&theirs), vec![40]);
        check_tree_invariants(&ours, "merge target");
        check_tree_invariants(&theirs, "merge source");
    }

    // ==================== Iterator Tests ====================

    #[test]
    fn test_iter_both_ends() {
        let tree = build(&[5, 3, 8, 1, 4, 7, 9]);
        let mut iter = tree.iter();
        assert_eq!(iter.len(), 7);
        assert_eq!(iter.next().map(|(k, _)| *k), Some(1));
        assert_eq!(iter.next_back().map(|(k, _)| *k), Some(9));
        let middle: Vec<_> = iter.map(|(k, _)| *k).collect();
        assert_eq!(middle, vec![3, 4, 5, 7, 8]);
        let rev: Vec<_> = tree.iter().rev().map(|(k, _)| *k).collect();
        assert_eq!(rev, vec![9, 8, 7, 5, 4, 3, 1]);
    }

    #[test]
    fn test_iter_mut() {
        let mut tree = build(&[5, 3, 8]);
        for (_, v) in tree.iter_mut() {
            *v += 1;
        }
        assert_eq!(tree.get_value(&3), Some(&31));
        let (k, v) = tree.iter_mut().next_back().unwrap();
        assert_eq!(*k, 8);
        *v = 0;
        assert_eq!(tree.get_value(&8), Some(&0));
    }

    #[test]
    fn test_keys_values() {
        let tree = build(&[2, 1, 3]);
        assert_eq!(tree.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(tree.values().rev().copied().collect::<Vec<_>>(), vec![30, 20, 10]);
        assert_eq!(tree.clone().into_keys().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_into_iter() {
        let tree = build(&[5, 3, 8, 1, 4, 7, 9]);
        let mut iter = tree.into_iter();
        assert_eq!(iter.len(), 7);
        assert_eq!(iter.next_back(), Some((9, 90)));
        let rest: Vec<_> = iter.collect();
        assert_eq!(rest.first(), Some(&(1, 10)));
        assert_eq!(rest.len(), 6);
    }

    // ==================== Stress Tests ====================

    #[test]
    fn stress_test() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let seed = std::env::var("STRESS_TEST_SEED")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(12345);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut tree = Tree::new();
        let mut std_map = StdBTreeMap::new();
        let mut inserted = 0usize;
        let mut erased = 0usize;

        for op_idx in 0..5000 {
            let key: u32 = rng.gen_range(0..500);
            match rng.gen_range(0..10u8) {
                0..=4 => {
                    let (_, ours) = tree.insert(key, key + 1);
                    let std = std_map.insert(key, key + 1).is_none();
                    assert_eq!(ours, std, "seed={} op={} insert {}", seed, op_idx, key);
                    if ours {
                        inserted += 1;
                    }
                }
                5..=7 => {
                    let ours = tree.remove(&key).map(|(_, v)| v);
                    let std = std_map.remove(&key);
                    assert_eq!(ours, std, "seed={} op={} remove {}", seed, op_idx, key);
                    if ours.is_some() {
                        erased += 1;
                    }
                }
                _ => {
                    assert_eq!(tree.get_value(&key), std_map.get(&key));
                }
            }
            if op_idx % 100 == 0 {
                check_tree_invariants(&tree, &format!("seed={} op={}", seed, op_idx));
            }
        }

        assert_eq!(tree.len(), inserted - erased);
        check_tree_invariants(&tree, "stress final");
        compare_with_std(&tree, &std_map, "stress final");

        let copy = tree.clone();
        check_tree_invariants(&copy, "stress clone");
        compare_with_std(&copy, &std_map, "stress clone");
    }

    #[test]
    fn test_sorted_insert_degenerates() {
        let mut tree = Tree::new();
        let mut std_map = StdBTreeMap::new();
        for i in 0..300u32 {
            tree.insert(i, i);
            std_map.insert(i, i);
        }
        // No rebalancing: one node per level.
        assert_eq!(tree.bfs().len(), 300);
        check_tree_invariants(&tree, "sorted insert");
        for i in (0..300u32).step_by(3) {
            tree.remove(&i);
            std_map.remove(&i);
        }
        check_tree_invariants(&tree, "sorted remove");
        compare_with_std(&tree, &std_map, "sorted remove");
    }
}
