use std::cmp::{max, min};

/// Cursor position in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cursor {
    /// Line number (0-based)
    pub line: usize,
    /// Column in grapheme clusters (0-based)
    pub column: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn move_up(&mut self, lines: usize) {
        self.line = self.line.saturating_sub(lines);
    }

    pub fn move_down(&mut self, lines: usize, max_line: usize) {
        self.line = min(self.line + lines, max_line);
    }

    /// Move left, wrapping to the end of the previous line.
    ///
    /// After wrapping the column is `usize::MAX` until the caller clamps it
    /// to the line length.
    pub fn move_left(&mut self) {
        if self.column > 0 {
            self.column -= 1;
        } else if self.line > 0 {
            self.line -= 1;
            self.column = usize::MAX;
        }
    }

    /// Move right, wrapping to the start of the next line.
    pub fn move_right(&mut self, line_len: usize, max_line: usize) {
        if self.column < line_len {
            self.column += 1;
        } else if self.line < max_line {
            self.line += 1;
            self.column = 0;
        }
    }

    pub fn clamp_column(&mut self, max_column: usize) {
        self.column = min(self.column, max_column);
    }
}

impl PartialOrd for Cursor {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cursor {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line
            .cmp(&other.line)
            .then(self.column.cmp(&other.column))
    }
}

/// Text selection between a fixed anchor and the moving cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Cursor,
    pub active: Cursor,
}

impl Selection {
    pub fn new(anchor: Cursor, active: Cursor) -> Self {
        Self { anchor, active }
    }

    pub fn start(&self) -> Cursor {
        min(self.anchor, self.active)
    }

    pub fn end(&self) -> Cursor {
        max(self.anchor, self.active)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.active
    }

    /// Whether the cell at `pos` is inside the selection (end exclusive).
    pub fn covers(&self, pos: &Cursor) -> bool {
        *pos >= self.start() && *pos < self.end()
    }
}
