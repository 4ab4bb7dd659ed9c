use crate::bst_node::{
    handle, maximum, minimum, predecessor, resolve, successor, Arena, Handle, Node, NodeId,
};
use crate::bst_tree::Tree;
use std::iter::FusedIterator;

/// A bidirectional position inside a [`Tree`].
///
/// A cursor does not borrow the tree, so it survives inserts and erases of
/// other elements. Erasing the element it points at invalidates it, and it
/// stays invalid after a later insert reuses the freed slot.
///
/// `current == None` is the end position. `last` remembers the maximum node
/// so that stepping back from the end lands on the last element.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pub(crate) current: Option<Handle>,
    pub(crate) last: Option<Handle>,
}

impl Cursor {
    pub(crate) fn at(current: Handle) -> Self {
        Cursor {
            current: Some(current),
            last: None,
        }
    }

    pub(crate) fn end(last: Option<Handle>) -> Self {
        Cursor {
            current: None,
            last,
        }
    }

    /// Returns true if the cursor is past the last element.
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Advances to the in-order successor. At the end this is a no-op.
    pub fn move_next<K, V>(&mut self, tree: &impl AsRef<Tree<K, V>>) {
        let tree = tree.as_ref();
        let Some(current) = self.current else {
            return;
        };
        let Some(id) = resolve(&tree.nodes, current) else {
            self.current = None;
            return;
        };
        self.current = successor(&tree.nodes, id).map(|next| handle(&tree.nodes, next));
        if self.current.is_none() {
            self.last = Some(current);
        }
    }

    /// Steps back to the in-order predecessor.
    ///
    /// From the end this jumps to the last element. Stepping back from the
    /// first element yields the end position.
    pub fn move_prev<K, V>(&mut self, tree: &impl AsRef<Tree<K, V>>) {
        let tree = tree.as_ref();
        self.current = match self.current {
            None => self.last.filter(|&last| resolve(&tree.nodes, last).is_some()),
            Some(current) => resolve(&tree.nodes, current)
                .and_then(|id| predecessor(&tree.nodes, id))
                .map(|prev| handle(&tree.nodes, prev)),
        };
    }

    /// By-value form of [`Cursor::move_next`].
    pub fn successor<K, V>(mut self, tree: &impl AsRef<Tree<K, V>>) -> Self {
        self.move_next(tree);
        self
    }

    /// By-value form of [`Cursor::move_prev`].
    pub fn predecessor<K, V>(mut self, tree: &impl AsRef<Tree<K, V>>) -> Self {
        self.move_prev(tree);
        self
    }
}

// Two cursors are equal when they reference the same node (or are both end).
impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
    }
}

impl Eq for Cursor {}

/// In-order iterator over a [`Tree`], walking parent links.
pub struct Iter<'a, K, V> {
    arena: &'a Arena<K, V>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(super) fn new(tree: &'a Tree<K, V>) -> Self {
        let arena = &tree.nodes;
        Iter {
            arena,
            front: tree.root.map(|r| minimum(arena, r)),
            back: tree.root.map(|r| maximum(arena, r)),
            remaining: tree.len(),
        }
    }
}

impl<'a, K: 'a, V: 'a> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        self.front = successor(self.arena, id);
        self.remaining -= 1;
        let node = &self.arena[id];
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: 'a, V: 'a> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        self.back = predecessor(self.arena, id);
        self.remaining -= 1;
        let node = &self.arena[id];
        Some((&node.key, &node.value))
    }
}

impl<'a, K: 'a, V: 'a> ExactSizeIterator for Iter<'a, K, V> {}

impl<'a, K: 'a, V: 'a> FusedIterator for Iter<'a, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter { ..*self }
    }
}

/// In-order iterator with mutable access to the values.
///
/// The visiting order is resolved up front because the parent links of
/// already-yielded nodes cannot be read while their values are borrowed.
pub struct IterMut<'a, K, V> {
    order: std::vec::IntoIter<NodeId>,
    slots: Vec<Option<&'a mut Node<K, V>>>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(super) fn new(tree: &'a mut Tree<K, V>) -> Self {
        let mut order = Vec::with_capacity(tree.len());
        let mut current = tree.root.map(|r| minimum(&tree.nodes, r));
        while let Some(id) = current {
            order.push(id);
            current = successor(&tree.nodes, id);
        }

        let mut slots = Vec::new();
        for (id, node) in tree.nodes.iter_mut() {
            if slots.len() <= id {
                slots.resize_with(id + 1, || None);
            }
            slots[id] = Some(node);
        }
        IterMut {
            order: order.into_iter(),
            slots,
        }
    }

    fn take(&mut self, id: NodeId) -> Option<(&'a K, &'a mut V)> {
        let node = self.slots.get_mut(id)?.take()?;
        let Node { key, value, .. } = node;
        Some((&*key, value))
    }
}

impl<'a, K: 'a, V: 'a> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.order.next()?;
        self.take(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<'a, K: 'a, V: 'a> DoubleEndedIterator for IterMut<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let id = self.order.next_back()?;
        self.take(id)
    }
}

impl<'a, K: 'a, V: 'a> ExactSizeIterator for IterMut<'a, K, V> {}

impl<'a, K: 'a, V: 'a> FusedIterator for IterMut<'a, K, V> {}

/// Owning iterator; drains the tree from both ends.
pub struct IntoIter<K, V> {
    tree: Tree<K, V>,
}

impl<K, V> IntoIter<K, V> {
    pub(super) fn new(tree: Tree<K, V>) -> Self {
        IntoIter { tree }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let root = self.tree.root?;
        let id = minimum(&self.tree.nodes, root);
        Some(self.tree.erase_node(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tree.len(), Some(self.tree.len()))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let root = self.tree.root?;
        let id = maximum(&self.tree.nodes, root);
        Some(self.tree.erase_node(id))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

/// Keys of a tree, in order.
pub struct Keys<'a, K, V> {
    pub(super) inner: Iter<'a, K, V>,
}

impl<'a, K: 'a, V: 'a> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K: 'a, V: 'a> DoubleEndedIterator for Keys<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<'a, K: 'a, V: 'a> ExactSizeIterator for Keys<'a, K, V> {}

impl<'a, K: 'a, V: 'a> FusedIterator for Keys<'a, K, V> {}

/// Values of a tree, in key order.
pub struct Values<'a, K, V> {
    pub(super) inner: Iter<'a, K, V>,
}

impl<'a, K: 'a, V: 'a> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K: 'a, V: 'a> DoubleEndedIterator for Values<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<'a, K: 'a, V: 'a> ExactSizeIterator for Values<'a, K, V> {}

impl<'a, K: 'a, V: 'a> FusedIterator for Values<'a, K, V> {}

/// Owning iterator over the keys of a drained tree.
pub struct IntoKeys<K, V> {
    pub(super) inner: IntoIter<K, V>,
}

impl<K, V> Iterator for IntoKeys<K, V> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoKeys<K, V> {
    fn next_back(&mut self) -> Option<K> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for IntoKeys<K, V> {}

impl<K, V> FusedIterator for IntoKeys<K, V> {}
