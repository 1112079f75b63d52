use std::fmt;

use generational_arena::{Arena, Index};
use itertools::{EitherOrBoth, Itertools};
use tracing::instrument;

use crate::builder::Items;
use crate::errors::{TreeError, TreeResult};

/// Handle of a node inside one [`Tree`].
///
/// Ids are generational: once a node has been removed its id no longer resolves,
/// even after the arena slot is reused by another node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Index);

impl NodeId {
    pub(crate) fn index(self) -> Index {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "node#{}.{}", slot, generation)
    }
}

/// Tree node in the arena-based structure.
#[derive(Debug, Clone)]
pub struct TreeNode<T> {
    /// Leaf payload, None for internal nodes
    pub(crate) payload: Option<T>,
    /// Index of parent node in the arena, None for the root
    pub(crate) parent: Option<NodeId>,
    /// Indices of child nodes in the arena, in order
    pub(crate) children: Vec<NodeId>,
}

impl<T> TreeNode<T> {
    pub(crate) fn leaf(payload: T, parent: Option<NodeId>) -> Self {
        Self {
            payload: Some(payload),
            parent,
            children: Vec::new(),
        }
    }

    pub(crate) fn branch(parent: Option<NodeId>, capacity: usize) -> Self {
        Self {
            payload: None,
            parent,
            children: Vec::with_capacity(capacity),
        }
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// A leaf carries a payload. An internal node emptied by pruning is not a leaf.
    pub fn is_leaf(&self) -> bool {
        self.payload.is_some()
    }
}

/// Ordered n-ary tree stored in a generational arena.
///
/// The arena owns every node; parents and children refer to each other by [`NodeId`],
/// so there are no ownership cycles. Position, level and depth are always derived
/// on demand by walking the structure.
#[derive(Debug, Clone)]
pub struct Tree<T> {
    pub(crate) arena: Arena<TreeNode<T>>,
    pub(crate) root: NodeId,
}

impl<T> Tree<T> {
    pub(crate) fn with_root(capacity: usize, root: TreeNode<T>) -> Self {
        let mut arena = if capacity > 0 {
            Arena::with_capacity(capacity)
        } else {
            Arena::new()
        };
        let root = NodeId(arena.insert(root));
        Self { arena, root }
    }

    /// Inserts a node and appends it to its parent's children.
    pub(crate) fn insert_node(&mut self, node: TreeNode<T>) -> NodeId {
        let parent = node.parent;
        let node_idx = NodeId(self.arena.insert(node));

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx.index()) {
                parent.children.push(node_idx);
            }
        }

        node_idx
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes currently stored.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn get_node(&self, id: NodeId) -> Option<&TreeNode<T>> {
        self.arena.get(id.index())
    }

    pub(crate) fn get_node_mut(&mut self, id: NodeId) -> Option<&mut TreeNode<T>> {
        self.arena.get_mut(id.index())
    }

    pub fn node(&self, id: NodeId) -> TreeResult<&TreeNode<T>> {
        self.get_node(id).ok_or(TreeError::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> TreeResult<&mut TreeNode<T>> {
        self.get_node_mut(id).ok_or(TreeError::NodeNotFound(id))
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.arena.contains(id.index())
    }

    #[instrument(level = "trace", skip(self))]
    pub fn payload(&self, id: NodeId) -> TreeResult<Option<&T>> {
        Ok(self.node(id)?.payload())
    }

    #[instrument(level = "trace", skip(self))]
    pub fn parent(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn children(&self, id: NodeId) -> TreeResult<&[NodeId]> {
        Ok(self.node(id)?.children())
    }

    /// Number of direct children, 0 for a leaf.
    pub fn child_count(&self, id: NodeId) -> TreeResult<usize> {
        Ok(self.node(id)?.children.len())
    }

    pub fn child(&self, id: NodeId, index: usize) -> TreeResult<NodeId> {
        let children = self.children(id)?;
        children
            .get(index)
            .copied()
            .ok_or(TreeError::ChildIndexOutOfRange {
                parent: id,
                index,
                len: children.len(),
            })
    }

    pub fn is_leaf(&self, id: NodeId) -> TreeResult<bool> {
        Ok(self.node(id)?.is_leaf())
    }

    pub fn is_root(&self, id: NodeId) -> TreeResult<bool> {
        Ok(self.node(id)?.parent.is_none())
    }

    /// Tests direct-child membership by identity.
    pub fn contains(&self, parent: NodeId, candidate: NodeId) -> TreeResult<bool> {
        Ok(self.children(parent)?.contains(&candidate))
    }

    /// Index of `child` within `parent`'s children, compared by identity.
    #[instrument(level = "trace", skip(self))]
    pub fn index_in_parent(&self, parent: NodeId, child: NodeId) -> TreeResult<usize> {
        self.children(parent)?
            .iter()
            .position(|&candidate| candidate == child)
            .ok_or(TreeError::NotAChild { parent, child })
    }

    /// The node followed by each of its ancestors, ending with the root.
    #[instrument(level = "trace", skip(self))]
    pub fn parentage(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        let mut chain = vec![id];
        let mut current = self.node(id)?;
        while let Some(parent) = current.parent {
            chain.push(parent);
            current = self.node(parent)?;
        }
        Ok(chain)
    }

    pub fn root_of(&self, id: NodeId) -> TreeResult<NodeId> {
        let mut current = id;
        while let Some(parent) = self.node(current)?.parent {
            current = parent;
        }
        Ok(current)
    }

    /// Number of ancestors: the root is level 0, its children level 1.
    #[instrument(level = "trace", skip(self))]
    pub fn level(&self, id: NodeId) -> TreeResult<usize> {
        Ok(self.parentage(id)?.len() - 1)
    }

    /// One more than the deepest level found in the subtree of `id`.
    #[instrument(level = "trace", skip(self))]
    pub fn depth(&self, id: NodeId) -> TreeResult<usize> {
        let level = self.level(id)?;
        Ok(level + self.subtree_height(id))
    }

    /// Level counted from the leaves: -1 for leaves, -2 for their parents and so on,
    /// relative to the deepest leaf of the node's own subtree.
    #[instrument(level = "trace", skip(self))]
    pub fn negative_level(&self, id: NodeId) -> TreeResult<isize> {
        let level = self.level(id)? as isize;
        let depth = self.depth(id)? as isize;
        Ok(level - depth)
    }

    /// Child indices leading from the root down to `id`.
    #[instrument(level = "trace", skip(self))]
    pub fn position(&self, id: NodeId) -> TreeResult<Vec<usize>> {
        let chain = self.parentage(id)?;
        let mut position = chain
            .windows(2)
            .map(|pair| self.index_in_parent(pair[1], pair[0]))
            .collect::<TreeResult<Vec<_>>>()?;
        position.reverse();
        Ok(position)
    }

    /// Walks `position` down from the root.
    pub fn node_at(&self, position: &[usize]) -> TreeResult<NodeId> {
        self.node_at_position(self.root, position)
    }

    /// Walks `position` down from `from`.
    pub fn node_at_position(&self, from: NodeId, position: &[usize]) -> TreeResult<NodeId> {
        position.iter().try_fold(from, |current, &index| {
            self.children(current)?
                .get(index)
                .copied()
                .ok_or_else(|| TreeError::InvalidPosition(position.to_vec()))
        })
    }

    /// Lazy pre-order walk of the subtree of `id`.
    ///
    /// With `reverse`, children are visited right-to-left at every level, which mirrors
    /// the tree rather than reversing the forward sequence.
    #[instrument(level = "trace", skip(self))]
    pub fn iter_depth_first(&self, id: NodeId, reverse: bool) -> TreeResult<DepthFirst<'_, T>> {
        self.node(id)?;
        Ok(DepthFirst::new(self, id, reverse))
    }

    /// Depth-first walk filtered to nodes at `level`; `None` yields every node.
    ///
    /// Nonnegative levels count from the root, negative levels from the leaves.
    /// Negative levels are derived per visited node from its subtree height, which
    /// makes a full pass quadratic.
    #[instrument(level = "trace", skip(self))]
    pub fn iter_level(
        &self,
        id: NodeId,
        level: Option<isize>,
        reverse: bool,
    ) -> TreeResult<LevelIter<'_, T>> {
        Ok(LevelIter {
            inner: self.iter_depth_first(id, reverse)?,
            level,
        })
    }

    pub fn leaves(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        Ok(self
            .iter_depth_first(id, false)?
            .filter(|&node| self.get_node(node).is_some_and(TreeNode::is_leaf))
            .collect())
    }

    /// Leaf payloads under `id` in depth-first order, mirrored when `reverse` is set.
    #[instrument(level = "debug", skip(self))]
    pub fn payload_flat(&self, id: NodeId, reverse: bool) -> TreeResult<Vec<&T>> {
        Ok(self
            .iter_depth_first(id, reverse)?
            .filter_map(|node| self.get_node(node).and_then(TreeNode::payload))
            .collect())
    }

    /// Nested leaf payloads under `id`, in the shape the tree was built from.
    #[instrument(level = "debug", skip(self))]
    pub fn payload_nested(&self, id: NodeId) -> TreeResult<Items<T>>
    where
        T: Clone,
    {
        self.node(id)?;
        Ok(self.nested_from(id))
    }

    pub(crate) fn nested_from(&self, id: NodeId) -> Items<T>
    where
        T: Clone,
    {
        match self.get_node(id) {
            Some(TreeNode {
                payload: Some(payload),
                ..
            }) => Items::Leaf(payload.clone()),
            Some(node) => Items::Branch(
                node.children
                    .iter()
                    .map(|&child| self.nested_from(child))
                    .collect(),
            ),
            None => Items::Branch(Vec::new()),
        }
    }

    /// Deep copy of the subtree of `id` into a fresh arena; the copy's root has no parent.
    #[instrument(level = "debug", skip(self))]
    pub fn subtree(&self, id: NodeId) -> TreeResult<Tree<T>>
    where
        T: Clone,
    {
        let source = self.node(id)?;
        let mut copy = Tree::with_root(
            0,
            TreeNode {
                payload: source.payload.clone(),
                parent: None,
                children: Vec::with_capacity(source.children.len()),
            },
        );
        let copy_root = copy.root;
        let mut stack: Vec<(NodeId, NodeId)> = source
            .children
            .iter()
            .rev()
            .map(|&child| (child, copy_root))
            .collect();

        while let Some((original, parent)) = stack.pop() {
            let node = self.node(original)?;
            let cloned = copy.insert_node(TreeNode {
                payload: node.payload.clone(),
                parent: Some(parent),
                children: Vec::with_capacity(node.children.len()),
            });
            stack.extend(node.children.iter().rev().map(|&child| (child, cloned)));
        }

        Ok(copy)
    }

    /// Structural equality of two nodes, possibly from different trees.
    ///
    /// Leaves compare by payload, internal nodes by their ordered children.
    pub fn subtree_eq(&self, id: NodeId, other: &Tree<T>, other_id: NodeId) -> bool
    where
        T: PartialEq,
    {
        match (self.get_node(id), other.get_node(other_id)) {
            (Some(left), Some(right)) => match (&left.payload, &right.payload) {
                (Some(a), Some(b)) => a == b,
                (None, None) => left
                    .children
                    .iter()
                    .zip_longest(&right.children)
                    .all(|pair| match pair {
                        EitherOrBoth::Both(&a, &b) => self.subtree_eq(a, other, b),
                        _ => false,
                    }),
                _ => false,
            },
            _ => false,
        }
    }

    /// Number of levels in the subtree of `id`, 1 for a leaf.
    pub(crate) fn subtree_height(&self, id: NodeId) -> usize {
        let mut height = 0;
        let mut stack = vec![(id, 1usize)];
        while let Some((current, levels)) = stack.pop() {
            height = height.max(levels);
            if let Some(node) = self.get_node(current) {
                stack.extend(node.children.iter().map(|&child| (child, levels + 1)));
            }
        }
        height
    }

    pub(crate) fn raw_level(&self, id: NodeId) -> usize {
        let mut level = 0;
        let mut current = self.get_node(id).and_then(|node| node.parent);
        while let Some(parent) = current {
            level += 1;
            current = self.get_node(parent).and_then(|node| node.parent);
        }
        level
    }

    /// Signed level test used by level iteration and the windowed query.
    ///
    /// A negative level walks the node's whole subtree on every call, so scans at
    /// negative levels are quadratic in the size of the scanned tree.
    pub(crate) fn matches_level(&self, id: NodeId, level: isize) -> bool {
        if level >= 0 {
            self.raw_level(id) as isize == level
        } else {
            -(self.subtree_height(id) as isize) == level
        }
    }
}

impl<T: PartialEq> PartialEq for Tree<T> {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

/// Pre-order depth-first iterator over node ids.
#[derive(Debug)]
pub struct DepthFirst<'a, T> {
    tree: &'a Tree<T>,
    stack: Vec<NodeId>,
    reverse: bool,
}

impl<'a, T> DepthFirst<'a, T> {
    fn new(tree: &'a Tree<T>, start: NodeId, reverse: bool) -> Self {
        Self {
            tree,
            stack: vec![start],
            reverse,
        }
    }
}

impl<T> Iterator for DepthFirst<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        if let Some(node) = self.tree.get_node(current) {
            if self.reverse {
                // Leftmost child ends up on top of the stack last
                self.stack.extend(node.children.iter().copied());
            } else {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev().copied());
            }
        }
        Some(current)
    }
}

/// Depth-first iterator restricted to one signed level.
#[derive(Debug)]
pub struct LevelIter<'a, T> {
    inner: DepthFirst<'a, T>,
    level: Option<isize>,
}

impl<T> Iterator for LevelIter<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.inner.tree;
        match self.level {
            None => self.inner.next(),
            Some(level) => self
                .inner
                .by_ref()
                .find(|&node| tree.matches_level(node, level)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Items;

    fn sample() -> Tree<i32> {
        Tree::new(Items::branch([
            Items::leaves([0, 1]),
            Items::branch([Items::leaves([2, 3]), Items::leaf(4)]),
        ]))
        .unwrap()
    }

    #[test]
    fn test_insert_node_links_parent_and_child() {
        let mut tree: Tree<i32> = Tree::with_root(0, TreeNode::branch(None, 0));
        let root = tree.root();
        let child = tree.insert_node(TreeNode::leaf(7, Some(root)));
        assert_eq!(tree.children(root).unwrap(), &[child]);
        assert_eq!(tree.parent(child).unwrap(), Some(root));
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_subtree_height_counts_levels() {
        let tree = sample();
        assert_eq!(tree.subtree_height(tree.root()), 4);
        let first = tree.child(tree.root(), 0).unwrap();
        assert_eq!(tree.subtree_height(first), 2);
        let leaf = tree.node_at(&[1, 1]).unwrap();
        assert_eq!(tree.subtree_height(leaf), 1);
    }

    #[test]
    fn test_matches_level_uses_sign() {
        let tree = sample();
        let leaf4 = tree.node_at(&[1, 1]).unwrap();
        assert!(tree.matches_level(leaf4, 2));
        assert!(tree.matches_level(leaf4, -1));
        assert!(!tree.matches_level(leaf4, 3));
        let inner = tree.node_at(&[1, 0]).unwrap();
        assert!(tree.matches_level(inner, -2));
    }

    #[test]
    fn test_subtree_eq_rejects_extra_trailing_children() {
        let short = Tree::new(Items::branch([Items::leaves([0, 1])])).unwrap();
        let long = Tree::new(Items::branch([Items::leaves([0, 1, 2])])).unwrap();
        assert!(short != long);
        assert!(long != short);
        let first = short.child(short.root(), 0).unwrap();
        assert!(short.subtree_eq(first, &short, first));
    }

    #[test]
    fn test_stale_id_is_not_found() {
        let mut tree = sample();
        let leaf = tree.node_at(&[0, 0]).unwrap();
        tree.remove(leaf).unwrap();
        assert!(matches!(tree.level(leaf), Err(TreeError::NodeNotFound(_))));
        assert!(!tree.contains_node(leaf));
    }
}
