use slab::Slab;
use std::borrow::Borrow;
use std::cmp::Ordering;

/// Index of a node inside the tree's arena.
pub(super) type NodeId = usize;

pub(super) type Arena<K, V> = Slab<Node<K, V>>;

/// A slot index paired with the generation of the node that was allocated
/// into it. Slab slots are reused, the generation tells occupants apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Handle {
    pub(super) id: NodeId,
    pub(super) generation: u64,
}

pub(super) struct Node<K, V> {
    pub(super) key: K,
    pub(super) value: V,
    pub(super) left: Option<NodeId>,
    pub(super) right: Option<NodeId>,
    // Back-reference for navigation only; never owns.
    pub(super) parent: Option<NodeId>,
    // Live node count of the whole tree. Only kept up to date on the root.
    pub(super) size: usize,
    // Unique per allocation within one tree.
    pub(super) generation: u64,
}

impl<K, V> Node<K, V> {
    pub(super) fn new(key: K, value: V, parent: Option<NodeId>, generation: u64) -> Self {
        Node {
            key,
            value,
            left: None,
            right: None,
            parent,
            size: 0,
            generation,
        }
    }

    pub(super) fn has_two_children(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}

pub(super) fn handle<K, V>(arena: &Arena<K, V>, id: NodeId) -> Handle {
    Handle {
        id,
        generation: arena[id].generation,
    }
}

/// Returns the slot of `handle` if it still holds the node it was taken from.
pub(super) fn resolve<K, V>(arena: &Arena<K, V>, handle: Handle) -> Option<NodeId> {
    arena
        .get(handle.id)
        .filter(|node| node.generation == handle.generation)
        .map(|_| handle.id)
}

/// Descends from `id` comparing against `key`.
/// Returns Ok(node) on a match, Err(last visited node) otherwise.
pub(super) fn search<K, V, Q: ?Sized + Ord>(
    arena: &Arena<K, V>,
    mut id: NodeId,
    key: &Q,
) -> Result<NodeId, NodeId>
where
    K: Borrow<Q>,
{
    loop {
        let node = &arena[id];
        let next = match key.cmp(node.key.borrow()) {
            Ordering::Less => node.left,
            Ordering::Greater => node.right,
            Ordering::Equal => return Ok(id),
        };
        match next {
            Some(child) => id = child,
            None => return Err(id),
        }
    }
}

pub(super) fn minimum<K, V>(arena: &Arena<K, V>, mut id: NodeId) -> NodeId {
    while let Some(left) = arena[id].left {
        id = left;
    }
    id
}

pub(super) fn maximum<K, V>(arena: &Arena<K, V>, mut id: NodeId) -> NodeId {
    while let Some(right) = arena[id].right {
        id = right;
    }
    id
}

/// In-order successor, found by parent-chain walk.
pub(super) fn successor<K, V>(arena: &Arena<K, V>, mut id: NodeId) -> Option<NodeId> {
    if let Some(right) = arena[id].right {
        return Some(minimum(arena, right));
    }
    let mut parent = arena[id].parent;
    while let Some(p) = parent {
        if arena[p].right != Some(id) {
            break;
        }
        id = p;
        parent = arena[p].parent;
    }
    parent
}

/// In-order predecessor, mirror image of [`successor`].
pub(super) fn predecessor<K, V>(arena: &Arena<K, V>, mut id: NodeId) -> Option<NodeId> {
    if let Some(left) = arena[id].left {
        return Some(maximum(arena, left));
    }
    let mut parent = arena[id].parent;
    while let Some(p) = parent {
        if arena[p].left != Some(id) {
            break;
        }
        id = p;
        parent = arena[p].parent;
    }
    parent
}

/// Deep-copies the subtree rooted at `id` of `src` into `dst`, keeping its
/// shape, parent links and generations. Returns the id of the new root.
///
/// Walks with an explicit stack so degenerate trees of any depth copy fine.
pub(super) fn copy_subtree<K: Clone, V: Clone>(
    src: &Arena<K, V>,
    id: NodeId,
    dst: &mut Arena<K, V>,
) -> NodeId {
    let clone_node = |id: NodeId, parent: Option<NodeId>| {
        let node = &src[id];
        Node::new(node.key.clone(), node.value.clone(), parent, node.generation)
    };
    let new_root = dst.insert(clone_node(id, None));
    // (source node, copy of its parent, hangs on the left)
    let mut pending: Vec<(NodeId, NodeId, bool)> = Vec::new();
    let push_children =
        |pending: &mut Vec<(NodeId, NodeId, bool)>, src_id: NodeId, new_id: NodeId| {
            if let Some(right) = src[src_id].right {
                pending.push((right, new_id, false));
            }
            if let Some(left) = src[src_id].left {
                pending.push((left, new_id, true));
            }
        };
    push_children(&mut pending, id, new_root);
    while let Some((src_id, new_parent, is_left)) = pending.pop() {
        let new_id = dst.insert(clone_node(src_id, Some(new_parent)));
        if is_left {
            dst[new_parent].left = Some(new_id);
        } else {
            dst[new_parent].right = Some(new_id);
        }
        push_children(&mut pending, src_id, new_id);
    }
    new_root
}

#[cfg(test)]
impl<K: Clone, V> Node<K, V> {
    /// Collects keys level by level, for debugging output in tests.
    pub(super) fn bfs(arena: &Arena<K, V>, root: NodeId) -> Vec<Vec<K>> {
        let mut result = Vec::new();
        let mut layer = vec![root];
        while !layer.is_empty() {
            let mut next = Vec::new();
            let mut keys = Vec::with_capacity(layer.len());
            for id in layer {
                let node = &arena[id];
                keys.push(node.key.clone());
                next.extend(node.left);
                next.extend(node.right);
            }
            result.push(keys);
            layer = next;
        }
        result
    }
}
