//! Single selection list (theme picker).

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{List, ListItem, Widget},
};

use capi_theme::Theme;

use crate::{centered_rect, contains, item_style, modal_width, render_frame, Modal, ModalResult};

const MAX_VISIBLE: usize = 12;

#[derive(Debug)]
pub struct SelectModal {
    title: String,
    items: Vec<String>,
    cursor: usize,
    scroll: usize,
    last_list_area: Option<Rect>,
}

impl SelectModal {
    /// `current` is preselected when it is one of the items.
    pub fn new(title: impl Into<String>, items: Vec<String>, current: Option<&str>) -> Self {
        let cursor = current
            .and_then(|c| items.iter().position(|i| i == c))
            .unwrap_or(0);
        Self {
            title: title.into(),
            items,
            cursor,
            scroll: 0,
            last_list_area: None,
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn confirm(&self) -> Option<ModalResult<usize>> {
        if self.items.is_empty() {
            Some(ModalResult::Cancelled)
        } else {
            Some(ModalResult::Confirmed(self.cursor))
        }
    }
}

impl Modal for SelectModal {
    type Result = usize;

    fn render(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let width = modal_width(
            self.items
                .iter()
                .map(String::as_str)
                .chain([self.title.as_str()]),
            area.width,
        );
        let visible = self.items.len().clamp(1, MAX_VISIBLE);
        let modal_area = centered_rect(width, visible as u16 + 2, area);
        let inner = render_frame(modal_area, buf, theme, &self.title);

        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + visible {
            self.scroll = self.cursor + 1 - visible;
        }

        let items: Vec<ListItem> = self
            .items
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(visible)
            .map(|(idx, label)| {
                let selected = idx == self.cursor;
                let prefix = if selected { "▶ " } else { "  " };
                let style = item_style(theme, selected);
                ListItem::new(Line::from(vec![
                    Span::styled(prefix, style),
                    Span::styled(label.as_str(), style),
                ]))
            })
            .collect();
        List::new(items).render(inner, buf);
        self.last_list_area = Some(inner);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<Option<ModalResult<usize>>> {
        let last = self.items.len().saturating_sub(1);
        match key.code {
            KeyCode::Esc => return Ok(Some(ModalResult::Cancelled)),
            KeyCode::Enter => return Ok(self.confirm()),
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => self.cursor = (self.cursor + 1).min(last),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = last,
            _ => {}
        }
        Ok(None)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<Option<ModalResult<usize>>> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Ok(None);
        }
        let Some(area) = self.last_list_area else {
            return Ok(None);
        };
        if !contains(area, mouse.column, mouse.row) {
            return Ok(None);
        }
        let idx = self.scroll + (mouse.row - area.y) as usize;
        if idx < self.items.len() {
            self.cursor = idx;
            return Ok(self.confirm());
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn themes() -> Vec<String> {
        ["Dark", "Light", "Monokai", "Dracula"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn preselects_current() {
        let modal = SelectModal::new("Theme", themes(), Some("Monokai"));
        assert_eq!(modal.cursor(), 2);
        let modal = SelectModal::new("Theme", themes(), Some("Nope"));
        assert_eq!(modal.cursor(), 0);
    }

    #[test]
    fn navigation_is_clamped() {
        let mut modal = SelectModal::new("Theme", themes(), None);
        modal.handle_key(key(KeyCode::Up)).unwrap();
        assert_eq!(modal.cursor(), 0);
        modal.handle_key(key(KeyCode::End)).unwrap();
        modal.handle_key(key(KeyCode::Down)).unwrap();
        assert_eq!(
            modal.handle_key(key(KeyCode::Enter)).unwrap(),
            Some(ModalResult::Confirmed(3))
        );
    }

    #[test]
    fn click_selects_row() {
        let theme = Theme::get_by_name("Dark");
        let area = Rect::new(0, 0, 80, 30);
        let mut buf = Buffer::empty(area);
        let mut modal = SelectModal::new("Theme", themes(), None);
        modal.render(area, &mut buf, theme);

        let list = modal.last_list_area.unwrap();
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: list.x + 1,
            row: list.y + 1,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(
            modal.handle_mouse(click).unwrap(),
            Some(ModalResult::Confirmed(1))
        );
    }
}
