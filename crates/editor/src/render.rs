use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Widget};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use capi_buffer::Cursor;
use capi_theme::Theme;

use crate::find_bar::FIND_BAR_HEIGHT;
use crate::minimap::{line_shape, MinimapLayout};
use crate::tab::EditorTab;

/// Rows the completion popup shows at once.
const POPUP_ROWS: usize = 8;
/// Narrowest editor that still gets a minimap.
const MIN_TEXT_WIDTH_FOR_MINIMAP: u16 = 30;

/// A search match on screen: line, start and end column, current.
type MatchSpan = (usize, usize, usize, bool);

impl EditorTab {
    pub(crate) fn draw(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme, focused: bool) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let mut editor_area = area;

        self.last_find_area = None;
        if self.find.is_visible() && area.height > FIND_BAR_HEIGHT + 1 {
            let find_area = Rect::new(area.x, area.y, area.width, FIND_BAR_HEIGHT);
            let status = self.search.status();
            self.find.render(find_area, buf, theme, &status);
            self.last_find_area = Some(find_area);
            editor_area.y += FIND_BAR_HEIGHT;
            editor_area.height -= FIND_BAR_HEIGHT;
        }

        self.last_minimap_area = None;
        let minimap_width = self.options.minimap_width;
        if self.options.show_minimap
            && minimap_width > 0
            && editor_area.width > minimap_width + MIN_TEXT_WIDTH_FOR_MINIMAP
        {
            let minimap_area = Rect::new(
                editor_area.right() - minimap_width,
                editor_area.y,
                minimap_width,
                editor_area.height,
            );
            editor_area.width -= minimap_width;
            self.last_minimap_area = Some(minimap_area);
        }

        let total = self.buffer.line_count();
        let gutter_width = (total.to_string().len() + 1) as u16;
        let gutter_width = gutter_width.min(editor_area.width.saturating_sub(1));
        let text_area = Rect::new(
            editor_area.x + gutter_width,
            editor_area.y,
            editor_area.width - gutter_width,
            editor_area.height,
        );
        self.last_text_area = Some(text_area);

        self.viewport
            .resize(text_area.width as usize, text_area.height as usize);
        if let Some(line) = self.pending_center.take() {
            self.viewport.center_on(line, total);
            self.viewport.ensure_cursor_visible(&self.cursor, total);
        }
        self.viewport.top_line = self.viewport.top_line.min(self.viewport.max_top(total));

        let screen_cursor = self.draw_text(editor_area, text_area, gutter_width, buf, theme, focused);

        if let Some(minimap_area) = self.last_minimap_area {
            self.draw_minimap(minimap_area, buf, theme);
        }
        if let Some((x, y)) = screen_cursor {
            if self.completion.is_popup_visible() {
                self.draw_popup(area, x, y, buf, theme);
            }
        }
    }

    /// Visible search matches, one entry per match.
    fn visible_matches(&self) -> Vec<MatchSpan> {
        let current = self.search.current_match();
        self.search
            .matches()
            .iter()
            .filter(|m| self.viewport.is_line_visible(m.line))
            .map(|m| (m.line, m.col, m.end_col(), Some(*m) == current))
            .collect()
    }

    /// Gutter and text. Returns the screen position of the cursor.
    fn draw_text(
        &mut self,
        editor_area: Rect,
        text_area: Rect,
        gutter_width: u16,
        buf: &mut Buffer,
        theme: &Theme,
        focused: bool,
    ) -> Option<(u16, u16)> {
        let total = self.buffer.line_count();
        let matches = self.visible_matches();
        let selection = self.selection();
        let left = self.viewport.left_column;
        let mut screen_cursor = None;

        for row in 0..text_area.height {
            let y = text_area.y + row;
            let line_idx = self.viewport.top_line + row as usize;
            let is_cursor_line = line_idx == self.cursor.line;
            let line_bg = if is_cursor_line { theme.line_bg } else { theme.bg };
            let base = Style::default().bg(line_bg).fg(theme.fg);

            buf.set_style(Rect::new(editor_area.x, y, editor_area.width, 1), base);
            if line_idx >= total {
                buf.set_style(
                    Rect::new(editor_area.x, y, editor_area.width, 1),
                    Style::default().bg(theme.bg),
                );
                continue;
            }

            if gutter_width > 1 {
                let number = format!("{:>width$} ", line_idx + 1, width = gutter_width as usize - 1);
                let number_fg = if is_cursor_line { theme.fg } else { theme.line_fg };
                buf.set_stringn(
                    editor_area.x,
                    y,
                    &number,
                    gutter_width as usize,
                    Style::default().bg(line_bg).fg(number_fg),
                );
            }

            let text = self.buffer.line(line_idx).unwrap_or_default();
            let segments = self.highlight.line_segments(line_idx, &text).to_vec();
            let right = text_area.right();
            let mut x = text_area.x;
            let mut col = 0usize;

            for (segment, kind) in &segments {
                for grapheme in segment.graphemes(true) {
                    if col >= left {
                        if is_cursor_line && col == self.cursor.column && x < right {
                            screen_cursor = Some((x, y));
                        }
                        let width = grapheme.width().max(1) as u16;
                        if x + width > right {
                            break;
                        }
                        let mut style = theme.style_for(*kind).bg(line_bg);
                        let pos = Cursor::at(line_idx, col);
                        if let Some(&(_, _, _, current)) = matches
                            .iter()
                            .find(|(l, s, e, _)| *l == line_idx && col >= *s && col < *e)
                        {
                            style = if current {
                                style.bg(theme.select_bg).add_modifier(Modifier::BOLD)
                            } else {
                                style.add_modifier(Modifier::UNDERLINED)
                            };
                        }
                        if selection.is_some_and(|s| s.covers(&pos)) {
                            style = style.bg(theme.select_bg);
                        }
                        let symbol = if grapheme == "\t" { " " } else { grapheme };
                        buf[(x, y)].set_symbol(symbol).set_style(style);
                        x += width;
                    }
                    col += 1;
                }
            }

            if is_cursor_line && screen_cursor.is_none() && self.cursor.column >= left && x < right {
                screen_cursor = Some((x, y));
            }
        }

        if focused && !self.find.is_focused() {
            if let Some((x, y)) = screen_cursor {
                let cell = &mut buf[(x, y)];
                let style = cell.style().add_modifier(Modifier::REVERSED);
                cell.set_style(style);
            }
        }
        screen_cursor
    }

    fn draw_minimap(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let total = self.buffer.line_count();
        let layout = MinimapLayout::new(
            total,
            area.height as usize,
            self.viewport.top_line,
            self.viewport.height,
        );
        buf.set_style(area, Style::default().bg(theme.window_bg));

        for row in 0..layout.content_rows.min(area.height as usize) {
            let y = area.y + row as u16;
            let bg = if layout.in_band(row) { theme.line_bg } else { theme.window_bg };
            buf.set_style(Rect::new(area.x, y, area.width, 1), Style::default().bg(bg));

            let line_idx = layout.line_for_row(row, total);
            let text = self.buffer.line(line_idx).unwrap_or_default();
            let segments = self.highlight.line_segments(line_idx, &text);
            for (i, cell) in line_shape(segments, area.width as usize).into_iter().enumerate() {
                if let Some(kind) = cell {
                    let style = Style::default()
                        .fg(theme.color_for(kind))
                        .bg(bg)
                        .add_modifier(Modifier::DIM);
                    buf[(area.x + i as u16, y)].set_symbol("▪").set_style(style);
                }
            }
        }
    }

    fn draw_popup(&self, bounds: Rect, cursor_x: u16, cursor_y: u16, buf: &mut Buffer, theme: &Theme) {
        let popup = self.completion.popup();
        let items = popup.items();
        if items.is_empty() {
            return;
        }
        let labels: Vec<String> = items
            .iter()
            .map(|item| format!("{} {}", item.kind.marker(), item.label))
            .collect();
        let widest = labels.iter().map(|l| l.width()).max().unwrap_or(0) as u16;
        let width = (widest + 2).min(bounds.width);
        let rows = items.len().min(POPUP_ROWS);
        let height = (rows as u16 + 2).min(bounds.height);
        if width < 4 || height < 3 {
            return;
        }

        let below = cursor_y + 1;
        let y = if below + height <= bounds.bottom() {
            below
        } else {
            cursor_y.saturating_sub(height).max(bounds.y)
        };
        let x = cursor_x.min(bounds.right().saturating_sub(width)).max(bounds.x);
        let area = Rect::new(x, y, width, height);

        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.splitter).bg(theme.window_bg))
            .style(Style::default().bg(theme.window_bg).fg(theme.fg));
        let inner = block.inner(area);
        block.render(area, buf);

        let selected = popup.selected();
        let offset = selected.map_or(0, |s| (s + 1).saturating_sub(rows));
        for (row, (index, label)) in labels.iter().enumerate().skip(offset).take(rows).enumerate() {
            let style = if selected == Some(index) {
                Style::default().bg(theme.select_bg).fg(theme.fg).add_modifier(Modifier::BOLD)
            } else {
                Style::default().bg(theme.window_bg).fg(theme.fg)
            };
            let y = inner.y + row as u16;
            buf.set_style(Rect::new(inner.x, y, inner.width, 1), style);
            buf.set_stringn(inner.x, y, label, inner.width as usize, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use capi_buffer::TextBuffer;
    use crate::tab::{EditorOptions, EditorTab};
    use capi_completion::KeywordDb;
    use capi_core::{Panel, RenderContext};
    use capi_theme::Theme;
    use ratatui::buffer::Buffer;
    use ratatui::layout::Rect;
    use std::sync::Arc;

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    fn tab(text: &str) -> EditorTab {
        let mut options = EditorOptions::default();
        options.completion.semantic_enabled = false;
        options.show_minimap = false;
        let mut tab = EditorTab::untitled(options, Arc::new(KeywordDb::embedded()));
        tab.buffer = TextBuffer::from_text(text);
        tab
    }

    #[test]
    fn gutter_and_text() {
        let mut tab = tab("ab\ncd");
        let area = Rect::new(0, 0, 20, 4);
        let mut buf = Buffer::empty(area);
        let theme = Theme::get_by_name("Dark");
        tab.render(area, &mut buf, &RenderContext { theme, is_focused: true });
        assert!(row_text(&buf, 0).starts_with("1 ab"));
        assert!(row_text(&buf, 1).starts_with("2 cd"));
    }

    #[test]
    fn go_to_line_scrolls_into_view() {
        let text: String = (1..=50).map(|i| format!("line{}\n", i)).collect();
        let mut tab = tab(&text);
        tab.go_to_line(40);
        let area = Rect::new(0, 0, 30, 10);
        let mut buf = Buffer::empty(area);
        let theme = Theme::get_by_name("Dark");
        tab.render(area, &mut buf, &RenderContext { theme, is_focused: true });
        let rows: Vec<String> = (0..10).map(|y| row_text(&buf, y)).collect();
        assert!(rows.iter().any(|r| r.contains("line40")));
    }
}
