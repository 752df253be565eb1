//! Text buffer with rope data structure for capi.
//!
//! Provides text storage and editing on top of ropey, along with
//! cursor and selection types, undo/redo history and the viewport.

mod buffer;
mod cursor;
mod history;
mod viewport;

pub use buffer::TextBuffer;
pub use cursor::{Cursor, Selection};
pub use history::{Action, History};
pub use viewport::Viewport;

/// Line ending type, detected on load and restored on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    LF, // Unix \n
    CRLF, // Windows \r\n
}
