mod arena;
mod handle;
mod node;
mod raw_bstree;
mod rotation;
mod walk;

pub use handle::Handle;
pub(crate) use node::{Node, Side};
pub use raw_bstree::Removed;
pub(crate) use raw_bstree::{RawBSTree, SearchResult};
