use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::arena::{NodeId, Tree, TreeNode};
use crate::config::Settings;
use crate::errors::{BoxError, TreeError, TreeResult};

/// Nested construction input, and the shape returned by [`Tree::payload_nested`].
///
/// Deserializes untagged: sequences become branches, everything else a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items<T> {
    Branch(Vec<Items<T>>),
    Leaf(T),
}

impl<T> Items<T> {
    pub fn leaf(value: T) -> Self {
        Items::Leaf(value)
    }

    pub fn branch<I: IntoIterator<Item = Items<T>>>(items: I) -> Self {
        Items::Branch(items.into_iter().collect())
    }

    /// A branch whose children are all leaves.
    pub fn leaves<I: IntoIterator<Item = T>>(values: I) -> Self {
        Items::Branch(values.into_iter().map(Items::Leaf).collect())
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Items::Leaf(_))
    }

    /// Number of levels the input describes; a bare leaf or an empty branch is 1.
    pub fn nesting_depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((item, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Items::Branch(children) = item {
                stack.extend(children.iter().map(|child| (child, depth + 1)));
            }
        }
        deepest
    }

    /// Drops arbitrarily deep input without recursing: every branch is emptied onto an
    /// explicit stack before it is dropped.
    fn dismantle(self) {
        let mut stack = vec![self];
        while let Some(item) = stack.pop() {
            if let Items::Branch(children) = item {
                stack.extend(children);
            }
        }
    }
}

impl<T> FromIterator<Items<T>> for Items<T> {
    fn from_iter<I: IntoIterator<Item = Items<T>>>(iter: I) -> Self {
        Items::branch(iter)
    }
}

/// Copies the structure and payloads of an existing tree, so it can be fed into a new build.
impl<T: Clone> From<&Tree<T>> for Items<T> {
    fn from(tree: &Tree<T>) -> Self {
        tree.nested_from(tree.root())
    }
}

/// Builds trees from nested [`Items`], optionally coercing every leaf value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeBuilder {
    max_depth: usize,
    capacity: usize,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::from_settings(&Settings::default())
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_depth: settings.max_depth,
            capacity: settings.capacity,
        }
    }

    /// Deepest nesting accepted, counted in levels.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Arena slots to preallocate; 0 lets the arena grow on demand.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[instrument(level = "debug", skip_all)]
    pub fn build<T>(&self, items: Items<T>) -> TreeResult<Tree<T>> {
        self.build_with(items, Ok::<T, Infallible>)
    }

    /// Builds a tree, passing every raw leaf value through `item_class`.
    ///
    /// The first rejected value aborts the build with [`TreeError::Coercion`], which
    /// carries the item class's own error as its source.
    #[instrument(level = "debug", skip_all, fields(max_depth = self.max_depth))]
    pub fn build_with<R, T, E, F>(&self, items: Items<R>, item_class: F) -> TreeResult<Tree<T>>
    where
        F: Fn(R) -> Result<T, E>,
        E: Into<BoxError>,
    {
        let depth = items.nesting_depth();
        if depth > self.max_depth {
            items.dismantle();
            return Err(TreeError::DepthLimitExceeded(self.max_depth));
        }
        let coerce = |value: R| item_class(value).map_err(|e| TreeError::Coercion(e.into()));

        let (root_node, root_children) = match items {
            Items::Leaf(value) => (TreeNode::leaf(coerce(value)?, None), Vec::new()),
            Items::Branch(children) => (TreeNode::branch(None, children.len()), children),
        };
        let mut tree = Tree::with_root(self.capacity, root_node);
        let root = tree.root();

        // Explicit stack instead of recursion; children are pushed reversed so that
        // each parent receives them left to right.
        let mut stack: Vec<(Items<R>, NodeId)> = root_children
            .into_iter()
            .rev()
            .map(|item| (item, root))
            .collect();

        while let Some((item, parent)) = stack.pop() {
            match item {
                Items::Leaf(value) => {
                    tree.insert_node(TreeNode::leaf(coerce(value)?, Some(parent)));
                }
                Items::Branch(children) => {
                    let node = tree.insert_node(TreeNode::branch(Some(parent), children.len()));
                    stack.extend(children.into_iter().rev().map(|child| (child, node)));
                }
            }
        }

        debug!(nodes = tree.node_count(), depth, "built tree");
        Ok(tree)
    }
}

impl<T> Tree<T> {
    /// Builds a tree from nested items with default build settings.
    pub fn new(items: Items<T>) -> TreeResult<Self> {
        TreeBuilder::new().build(items)
    }

    /// Builds a tree, coercing every raw leaf value through `item_class`.
    pub fn with_item_class<R, E, F>(items: Items<R>, item_class: F) -> TreeResult<Self>
    where
        F: Fn(R) -> Result<T, E>,
        E: Into<BoxError>,
    {
        TreeBuilder::new().build_with(items, item_class)
    }
}
