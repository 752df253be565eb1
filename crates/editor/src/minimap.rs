//! Shrunk overview of the document at the right edge of the editor.
//!
//! Each row stands for `lines_per_row` document lines and each cell for
//! [`COLUMNS_PER_CELL`] characters. The band marking the visible part moves
//! with the editor's scroll ratio.

use capi_highlight::{Segment, TokenKind};

pub const COLUMNS_PER_CELL: usize = 2;

/// Geometry of the minimap for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinimapLayout {
    pub lines_per_row: usize,
    /// Rows that show document content
    pub content_rows: usize,
    pub band_start: usize,
    pub band_rows: usize,
}

impl MinimapLayout {
    /// `top_line`/`visible_lines` describe the editor viewport.
    pub fn new(total_lines: usize, height: usize, top_line: usize, visible_lines: usize) -> Self {
        if height == 0 || total_lines == 0 {
            return Self {
                lines_per_row: 1,
                content_rows: 0,
                band_start: 0,
                band_rows: 0,
            };
        }
        let lines_per_row = total_lines.div_ceil(height).max(1);
        let content_rows = total_lines.div_ceil(lines_per_row);
        let band_rows = visible_lines.div_ceil(lines_per_row).clamp(1, content_rows);

        let max_top = total_lines.saturating_sub(visible_lines);
        let ratio = if max_top == 0 {
            0.0
        } else {
            top_line.min(max_top) as f64 / max_top as f64
        };
        let max_offset = content_rows - band_rows;
        let band_start = (ratio * max_offset as f64).round() as usize;

        Self {
            lines_per_row,
            content_rows,
            band_start,
            band_rows,
        }
    }

    /// First document line shown on `row`.
    pub fn line_for_row(&self, row: usize, total_lines: usize) -> usize {
        (row * self.lines_per_row).min(total_lines.saturating_sub(1))
    }

    pub fn in_band(&self, row: usize) -> bool {
        row >= self.band_start && row < self.band_start + self.band_rows
    }
}

/// Token kind per cell for one line: `None` for blank cells.
pub fn line_shape(segments: &[Segment], width: usize) -> Vec<Option<TokenKind>> {
    let mut cells = vec![None; width];
    let mut col = 0;
    for (text, kind) in segments {
        for c in text.chars() {
            let cell = col / COLUMNS_PER_CELL;
            if cell >= width {
                return cells;
            }
            if !c.is_whitespace() && cells[cell].is_none() {
                cells[cell] = Some(*kind);
            }
            col += if c == '\t' { 4 } else { 1 };
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_documents_map_one_line_per_row() {
        let layout = MinimapLayout::new(10, 40, 0, 20);
        assert_eq!(layout.lines_per_row, 1);
        assert_eq!(layout.content_rows, 10);
        assert_eq!((layout.band_start, layout.band_rows), (0, 10));
    }

    #[test]
    fn long_documents_are_compressed() {
        // 1000 lines in 40 rows: 25 lines per row
        let layout = MinimapLayout::new(1000, 40, 0, 50);
        assert_eq!(layout.lines_per_row, 25);
        assert_eq!(layout.content_rows, 40);
        assert_eq!(layout.band_rows, 2);
        assert_eq!(layout.line_for_row(39, 1000), 975);
    }

    #[test]
    fn band_follows_scroll_ratio() {
        let top = MinimapLayout::new(1000, 40, 0, 50);
        assert_eq!(top.band_start, 0);

        let bottom = MinimapLayout::new(1000, 40, 950, 50);
        assert_eq!(bottom.band_start, 38);
        assert!(bottom.in_band(39));

        let middle = MinimapLayout::new(1000, 40, 475, 50);
        assert_eq!(middle.band_start, 19);
    }

    #[test]
    fn shape_starts_after_indentation() {
        let segments = vec![
            ("    ".to_string(), TokenKind::Plain),
            ("def".to_string(), TokenKind::Keyword),
            (" f():".to_string(), TokenKind::Plain),
        ];
        let cells = line_shape(&segments, 8);
        assert_eq!(&cells[..3], &[None, None, Some(TokenKind::Keyword)]);
        assert_eq!(cells[3], Some(TokenKind::Keyword));
        assert_eq!(cells[4], Some(TokenKind::Plain));
        assert_eq!(cells[7], None);
    }
}
