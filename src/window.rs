//! Windowed level queries: "the next N nodes at level L, starting after this node".
//!
//! The scan runs over the whole depth-first order of the node's root, so a window may
//! span several subtrees. When the requested level lies above the starting node, the
//! ancestor at that level straddles the window boundary; the query then returns a
//! trimmed copy of that ancestor holding only what comes after the starting node.

use tracing::{debug, instrument};

use crate::arena::{NodeId, Tree};
use crate::builder::Items;
use crate::errors::{TreeError, TreeResult};

/// One entry of a [`LevelWindow`].
#[derive(Debug, Clone, PartialEq)]
pub enum WindowItem<T> {
    /// A node of the queried tree.
    Node(NodeId),
    /// Trimmed copy of the ancestor that straddles the window boundary.
    Trimmed(Tree<T>),
}

/// Result of [`Tree::next_n_nodes_at_level`].
#[derive(Debug, Clone, PartialEq)]
pub struct LevelWindow<T> {
    items: Vec<WindowItem<T>>,
    first_is_partial: bool,
}

impl<T> Default for LevelWindow<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            first_is_partial: false,
        }
    }
}

impl<T> LevelWindow<T> {
    pub fn items(&self) -> &[WindowItem<T>] {
        &self.items
    }

    pub fn into_items(self) -> Vec<WindowItem<T>> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the first item is a trimmed copy rather than a complete node.
    pub fn first_is_partial(&self) -> bool {
        self.first_is_partial
    }

    /// The items without the partial boundary copy, if there is one.
    pub fn complete(self) -> Vec<WindowItem<T>> {
        let mut items = self.items;
        if self.first_is_partial && !items.is_empty() {
            items.remove(0);
        }
        items
    }

    /// Materializes every item as a standalone tree.
    pub fn to_subtrees(&self, tree: &Tree<T>) -> TreeResult<Vec<Tree<T>>>
    where
        T: Clone,
    {
        self.items
            .iter()
            .map(|item| match item {
                WindowItem::Node(id) => tree.subtree(*id),
                WindowItem::Trimmed(copy) => Ok(copy.clone()),
            })
            .collect()
    }

    /// Nested payload of every item.
    pub fn payloads(&self, tree: &Tree<T>) -> TreeResult<Vec<Items<T>>>
    where
        T: Clone,
    {
        self.items
            .iter()
            .map(|item| match item {
                WindowItem::Node(id) => tree.payload_nested(*id),
                WindowItem::Trimmed(copy) => copy.payload_nested(copy.root()),
            })
            .collect()
    }

    fn push_partial(&mut self, copy: Tree<T>) {
        self.items.push(WindowItem::Trimmed(copy));
        self.first_is_partial = true;
    }

    /// A partial first item does not count when complete nodes are required.
    fn is_full(&self, limit: Option<usize>, nodes_must_be_complete: bool) -> bool {
        match limit {
            None => false,
            Some(n) if self.first_is_partial && nodes_must_be_complete => self.items.len() > n,
            Some(n) => self.items.len() >= n,
        }
    }
}

impl<T: Clone> Tree<T> {
    /// Collects up to `n` nodes at `level` that follow `id` in the depth-first order of
    /// its root.
    ///
    /// `n < 0` scans backwards (mirrored depth-first order) for `|n|` nodes, `None`
    /// collects everything after `id`. Nonnegative levels count from the root, negative
    /// ones from the leaves. `id` itself is never part of the window.
    ///
    /// If `level` lies above `id`, the first item is a trimmed copy of the ancestor at
    /// that level (see [`WindowItem::Trimmed`]). With `nodes_must_be_complete`, that
    /// partial item does not count towards `n` and one extra node is collected.
    ///
    /// # Errors
    /// - [`TreeError::InvalidLevel`] if the root's tree has no such level
    /// - [`TreeError::InsufficientNodes`] if the scan ends before `n` nodes are found
    #[instrument(level = "debug", skip(self))]
    pub fn next_n_nodes_at_level(
        &self,
        id: NodeId,
        n: Option<isize>,
        level: isize,
        nodes_must_be_complete: bool,
    ) -> TreeResult<LevelWindow<T>> {
        let root = self.root_of(id)?;
        let depth = self.depth(root)?;
        if !is_valid_level(level, depth) {
            return Err(TreeError::InvalidLevel { level, depth });
        }

        let (limit, reverse) = match n {
            None => (None, false),
            Some(n) if n < 0 => (Some(n.unsigned_abs()), true),
            Some(n) => (Some(n.unsigned_abs()), false),
        };
        let mut window = LevelWindow::default();
        if limit == Some(0) {
            return Ok(window);
        }

        let mut self_is_found = false;
        for node in self.iter_depth_first(root, reverse)? {
            if !self_is_found {
                if node != id {
                    continue;
                }
                self_is_found = true;
                if self.is_above(id, level)? {
                    if let Some(copy) = self.trimmed_ancestor(id, level, reverse)? {
                        debug!(nodes = copy.node_count(), "first node is a trimmed copy");
                        window.push_partial(copy);
                    }
                }
            } else if self.matches_level(node, level) {
                window.items.push(WindowItem::Node(node));
            }

            if window.is_full(limit, nodes_must_be_complete) {
                debug!(found = window.len(), "window complete");
                return Ok(window);
            }
        }

        match limit {
            None => Ok(window),
            Some(wanted) => Err(TreeError::InsufficientNodes {
                wanted,
                found: window.len(),
                level,
            }),
        }
    }

    /// Whether `level` names an ancestor level strictly above `id`.
    fn is_above(&self, id: NodeId, level: isize) -> TreeResult<bool> {
        if level >= 0 {
            Ok(level < self.level(id)? as isize)
        } else {
            Ok(level < self.negative_level(id)?)
        }
    }

    /// Copies the ancestor of `id` at `level` and prunes the copy of `id` together with
    /// everything before it in scan direction. Returns `None` if nothing is left, or if
    /// no ancestor sits exactly at `level`.
    fn trimmed_ancestor(
        &self,
        id: NodeId,
        level: isize,
        reverse: bool,
    ) -> TreeResult<Option<Tree<T>>> {
        let parentage = self.parentage(id)?;
        // Negative levels can skip values on uneven trees; the matching nodes that
        // follow are then collected by the scan itself
        let Some(ancestor) = parentage
            .iter()
            .skip(1)
            .copied()
            .find(|&candidate| self.matches_level(candidate, level))
        else {
            debug!(level, "no ancestor at level, skipping trimmed copy");
            return Ok(None);
        };

        let ancestor_level = self.level(ancestor)?;
        let position = self.position(id)?;
        let mut copy = self.subtree(ancestor)?;
        let target = copy.node_at(&position[ancestor_level..])?;
        copy.remove_to_root(target, reverse)?;

        if copy.child_count(copy.root())? == 0 {
            debug!("trimmed copy is empty, skipping");
            return Ok(None);
        }
        Ok(Some(copy))
    }
}

/// A tree with `depth` levels accepts `0..depth` and `-depth..0`.
fn is_valid_level(level: isize, depth: usize) -> bool {
    let depth = depth as isize;
    if level >= 0 {
        level < depth
    } else {
        -depth <= level
    }
}
