use std::fmt;

use termtree::Tree as TextTree;
use tracing::instrument;

use crate::arena::{NodeId, Tree};

/// Label used for internal nodes in text output.
pub const BRANCH_LABEL: &str = "*";

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> TextTree<String>;
}

impl<T: fmt::Display> TreeNodeConvert for Tree<T> {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> TextTree<String> {
        let root = self.root();
        let mut text = TextTree::new(label(self, root));
        build_tree_representation(self, root, &mut text);
        text
    }
}

/// Appends the children of `node_idx` below `parent_tree`, recursively.
pub fn build_tree_representation<T: fmt::Display>(
    tree: &Tree<T>,
    node_idx: NodeId,
    parent_tree: &mut TextTree<String>,
) {
    if let Some(node) = tree.get_node(node_idx) {
        for &child_idx in node.children() {
            let mut child_tree = TextTree::new(label(tree, child_idx));
            build_tree_representation(tree, child_idx, &mut child_tree);
            parent_tree.push(child_tree);
        }
    }
}

fn label<T: fmt::Display>(tree: &Tree<T>, id: NodeId) -> String {
    match tree.get_node(id).and_then(|node| node.payload()) {
        Some(payload) => payload.to_string(),
        None => BRANCH_LABEL.to_string(),
    }
}

impl<T: fmt::Display> fmt::Display for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_tree_string())
    }
}
