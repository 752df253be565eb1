//! Read-only text dialog (shortcuts table, about, log).

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{buffer::Buffer, layout::Rect, style::Style};

use capi_theme::Theme;

use crate::{centered_rect, modal_width, render_frame, Modal, ModalResult};

#[derive(Debug)]
pub struct InfoModal {
    title: String,
    lines: Vec<String>,
    scroll: usize,
    /// Visible rows at the last render, for paging
    page: usize,
}

impl InfoModal {
    pub fn new(title: impl Into<String>, text: impl AsRef<str>) -> Self {
        Self {
            title: title.into(),
            lines: text.as_ref().lines().map(str::to_string).collect(),
            scroll: 0,
            page: 1,
        }
    }

    /// Two-column table with the keys padded to a common width.
    pub fn table(title: impl Into<String>, rows: &[(&str, &str)]) -> Self {
        let key_width = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
        let text: Vec<String> = rows
            .iter()
            .map(|(k, v)| format!("{:<width$}  {}", k, v, width = key_width))
            .collect();
        Self::new(title, text.join("\n"))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.page)
    }
}

impl Modal for InfoModal {
    type Result = ();

    fn render(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let width = modal_width(
            self.lines
                .iter()
                .map(String::as_str)
                .chain([self.title.as_str()]),
            area.width,
        );
        let height = (self.lines.len() as u16 + 2).min(area.height.saturating_sub(2).max(3));
        let modal_area = centered_rect(width, height, area);
        let inner = render_frame(modal_area, buf, theme, &self.title);

        self.page = (inner.height as usize).max(1);
        self.scroll = self.scroll.min(self.max_scroll());
        let style = Style::default().fg(theme.fg);
        for (row, line) in self.lines.iter().skip(self.scroll).take(self.page).enumerate() {
            buf.set_stringn(
                inner.x + 1,
                inner.y + row as u16,
                line,
                inner.width.saturating_sub(2) as usize,
                style,
            );
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<Option<ModalResult<()>>> {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                return Ok(Some(ModalResult::Confirmed(())))
            }
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => self.scroll = (self.scroll + 1).min(self.max_scroll()),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(self.page),
            KeyCode::PageDown => self.scroll = (self.scroll + self.page).min(self.max_scroll()),
            _ => {}
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_aligns_columns() {
        let modal = InfoModal::table("Shortcuts", &[("Ctrl+S", "Save"), ("F5", "Run Script")]);
        assert_eq!(modal.lines(), ["Ctrl+S  Save", "F5      Run Script"]);
    }

    #[test]
    fn any_closing_key_confirms() {
        let mut modal = InfoModal::new("About", "capi");
        let esc = KeyEvent::from(KeyCode::Esc);
        assert_eq!(
            modal.handle_key(esc).unwrap(),
            Some(ModalResult::Confirmed(()))
        );
    }
}
