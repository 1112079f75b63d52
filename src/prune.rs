use tracing::{debug, instrument};

use crate::arena::{NodeId, Tree};
use crate::errors::{TreeError, TreeResult};

impl<T> Tree<T> {
    /// Removes `id` and every sibling before it, then every sibling before each
    /// ancestor, up to the root. With `reverse`, siblings after the node are removed
    /// instead. An ancestor left without children is removed as well.
    ///
    /// Called on the root this does nothing. All identity lookups happen before the
    /// first mutation, so an error leaves the tree unchanged.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_to_root(&mut self, id: NodeId, reverse: bool) -> TreeResult<()> {
        let chain = self.parentage(id)?;
        let steps = chain
            .windows(2)
            .map(|pair| -> TreeResult<(NodeId, NodeId, usize)> {
                let (child, parent) = (pair[0], pair[1]);
                Ok((parent, child, self.index_in_parent(parent, child)?))
            })
            .collect::<TreeResult<Vec<_>>>()?;

        let mut freed = 0;
        for (step, (parent, child, index)) in steps.into_iter().enumerate() {
            // The node itself goes on the first step; ancestors only lose siblings
            for sibling in self.drain_siblings(parent, index, step == 0, reverse) {
                freed += self.free_subtree(sibling);
            }
            if step > 0 && self.is_empty_branch(child) {
                if let Some(node) = self.get_node_mut(parent) {
                    node.children.retain(|&c| c != child);
                }
                freed += self.free_subtree(child);
            }
        }

        debug!(freed, remaining = self.node_count(), "pruned to root");
        Ok(())
    }

    /// Detaches a non-root node and returns its subtree as a tree of its own.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, id: NodeId) -> TreeResult<Tree<T>> {
        let parent = self.parent(id)?.ok_or(TreeError::CannotRemoveRoot)?;
        let index = self.index_in_parent(parent, id)?;

        let Some(mut top) = self.arena.remove(id.index()) else {
            return Err(TreeError::NodeNotFound(id));
        };
        self.node_mut(parent)?.children.remove(index);

        let children = std::mem::take(&mut top.children);
        top.parent = None;
        let mut detached = Tree::with_root(0, top);
        let detached_root = detached.root();

        let mut stack: Vec<(NodeId, NodeId)> = children
            .into_iter()
            .rev()
            .map(|child| (child, detached_root))
            .collect();
        while let Some((old, new_parent)) = stack.pop() {
            if let Some(mut node) = self.arena.remove(old.index()) {
                let grandchildren = std::mem::take(&mut node.children);
                node.parent = Some(new_parent);
                let moved = detached.insert_node(node);
                stack.extend(grandchildren.into_iter().rev().map(|child| (child, moved)));
            }
        }

        debug!(moved = detached.node_count(), "removed subtree");
        Ok(detached)
    }

    /// Drains the siblings of the child at `index` lying in the removal direction.
    fn drain_siblings(
        &mut self,
        parent: NodeId,
        index: usize,
        inclusive: bool,
        reverse: bool,
    ) -> Vec<NodeId> {
        let Some(node) = self.get_node_mut(parent) else {
            return Vec::new();
        };
        let len = node.children.len();
        let range = match (reverse, inclusive) {
            (false, true) => 0..index + 1,
            (false, false) => 0..index,
            (true, true) => index..len,
            (true, false) => index + 1..len,
        };
        node.children.drain(range).collect()
    }

    fn is_empty_branch(&self, id: NodeId) -> bool {
        self.get_node(id)
            .is_some_and(|node| !node.is_leaf() && node.children.is_empty())
    }

    /// Drops a node and all its descendants from the arena. Returns how many were freed.
    pub(crate) fn free_subtree(&mut self, id: NodeId) -> usize {
        let mut freed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current.index()) {
                stack.extend(node.children);
                freed += 1;
            }
        }
        freed
    }
}
