//! Editor tabs for capi.
//!
//! An [`EditorTab`] owns one document: its buffer and cursor, the highlight
//! cache, the completion engine and the find bar. Rendering draws the gutter,
//! the text, the completion popup and the minimap.

pub mod command;
pub mod editing;
pub mod find_bar;
pub mod minimap;
mod render;
mod tab;

pub use command::EditorCommand;
pub use find_bar::FindBar;
pub use tab::{EditorOptions, EditorTab};
