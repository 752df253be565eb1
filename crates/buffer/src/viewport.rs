use crate::Cursor;

/// Visible window onto the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// First visible line (0-based)
    pub top_line: usize,
    /// Number of visible lines
    pub height: usize,
    /// First visible column
    pub left_column: usize,
    /// Number of visible text columns
    pub width: usize,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            top_line: 0,
            height,
            left_column: 0,
            width,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// One past the last visible line.
    pub fn bottom_line(&self) -> usize {
        self.top_line + self.height
    }

    /// Largest `top_line` that still fills the view.
    pub fn max_top(&self, total_lines: usize) -> usize {
        total_lines.saturating_sub(self.height)
    }

    pub fn is_line_visible(&self, line: usize) -> bool {
        line >= self.top_line && line < self.bottom_line()
    }

    /// Scroll so the cursor is on screen. Returns true if anything moved.
    pub fn ensure_cursor_visible(&mut self, cursor: &Cursor, total_lines: usize) -> bool {
        let before = *self;

        if cursor.line < self.top_line {
            self.top_line = cursor.line;
        } else if cursor.line >= self.bottom_line() {
            self.top_line = cursor.line + 1 - self.height.max(1);
        }
        self.top_line = self.top_line.min(self.max_top(total_lines));

        if cursor.column < self.left_column {
            self.left_column = cursor.column;
        } else if cursor.column >= self.left_column + self.width {
            self.left_column = cursor.column + 1 - self.width.max(1);
        }

        *self != before
    }

    pub fn scroll_up(&mut self, lines: usize) -> bool {
        let before = self.top_line;
        self.top_line = self.top_line.saturating_sub(lines);
        self.top_line != before
    }

    pub fn scroll_down(&mut self, lines: usize, total_lines: usize) -> bool {
        let before = self.top_line;
        self.top_line = (self.top_line + lines).min(self.max_top(total_lines));
        self.top_line != before
    }

    /// Put `line` in the middle of the view (go to line).
    pub fn center_on(&mut self, line: usize, total_lines: usize) {
        self.top_line = line
            .saturating_sub(self.height / 2)
            .min(self.max_top(total_lines));
    }

    /// Scroll position as a fraction in `0.0..=1.0` (minimap sync).
    pub fn scroll_ratio(&self, total_lines: usize) -> f64 {
        let max_top = self.max_top(total_lines);
        if max_top == 0 {
            0.0
        } else {
            self.top_line as f64 / max_top as f64
        }
    }

    /// Document position of a cell inside the text area.
    pub fn position_at(&self, row: usize, col: usize) -> Cursor {
        Cursor::at(self.top_line + row, self.left_column + col)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_cursor_down_and_up() {
        let mut vp = Viewport::new(40, 10);
        assert!(vp.ensure_cursor_visible(&Cursor::at(25, 0), 100));
        assert_eq!(vp.top_line, 16);
        assert!(vp.ensure_cursor_visible(&Cursor::at(3, 0), 100));
        assert_eq!(vp.top_line, 3);
        assert!(!vp.ensure_cursor_visible(&Cursor::at(5, 0), 100));
    }

    #[test]
    fn follows_cursor_horizontally() {
        let mut vp = Viewport::new(20, 10);
        vp.ensure_cursor_visible(&Cursor::at(0, 50), 1);
        assert_eq!(vp.left_column, 31);
        vp.ensure_cursor_visible(&Cursor::at(0, 2), 1);
        assert_eq!(vp.left_column, 2);
    }

    #[test]
    fn zero_height_does_not_underflow() {
        let mut vp = Viewport::new(0, 0);
        vp.ensure_cursor_visible(&Cursor::at(4, 4), 10);
        assert_eq!(vp.top_line, 4);
    }

    #[test]
    fn scrolling_is_bounded() {
        let mut vp = Viewport::new(80, 24);
        assert!(vp.scroll_down(100, 30));
        assert_eq!(vp.top_line, 6);
        assert!(!vp.scroll_down(1, 30));
        assert!(vp.scroll_up(10));
        assert_eq!(vp.top_line, 0);
    }

    #[test]
    fn center_and_ratio() {
        let mut vp = Viewport::new(80, 20);
        vp.center_on(50, 100);
        assert_eq!(vp.top_line, 40);
        assert!((vp.scroll_ratio(100) - 0.5).abs() < f64::EPSILON);

        vp.center_on(99, 100);
        assert_eq!(vp.top_line, 80);
        assert!((vp.scroll_ratio(100) - 1.0).abs() < f64::EPSILON);
        assert_eq!(vp.scroll_ratio(5), 0.0);
    }
}
