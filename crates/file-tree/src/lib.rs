//! Project file tree for capi: the sidebar model, entry icons and the file
//! operations offered from the tree's context menu.

mod clipboard;
mod icons;
pub mod operations;
mod tree;

pub use clipboard::{ClipMode, FileClipboard, PasteOutcome};
pub use icons::icon_for;
pub use tree::{Activation, FileTree, TreeRow};
