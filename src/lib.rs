//! Ordered n-ary trees stored in a generational arena.
//!
//! A [`Tree`] is built once from nested [`Items`] and then read or pruned. Nodes are
//! addressed by [`NodeId`]; a node's position, its level counted from the root and its
//! negative level counted from the leaves are derived on demand.
//!
//! ```
//! use ordtree::{Items, Tree};
//!
//! let tree = Tree::new(Items::branch([
//!     Items::leaves([0, 1]),
//!     Items::leaves([2, 3]),
//! ]))?;
//! let first = tree.node_at(&[0, 0])?;
//! let window = tree.next_n_nodes_at_level(first, Some(2), 2, false)?;
//! assert_eq!(window.payloads(&tree)?, vec![Items::leaf(1), Items::leaf(2)]);
//! # Ok::<(), ordtree::TreeError>(())
//! ```

pub mod arena;
pub mod builder;
pub mod config;
pub mod errors;
mod prune;
pub mod tree_traits;
pub mod util;
pub mod window;

pub use arena::{DepthFirst, LevelIter, NodeId, Tree, TreeNode};
pub use builder::{Items, TreeBuilder};
pub use config::Settings;
pub use errors::{TreeError, TreeResult};
pub use window::{LevelWindow, WindowItem};
