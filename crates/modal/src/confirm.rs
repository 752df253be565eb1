//! Yes/No dialog.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use capi_theme::Theme;

use crate::{centered_rect, contains, item_style, modal_width, render_frame, Modal, ModalResult};

const YES: &str = "[ Yes ]";
const NO: &str = "[ No ]";
const SPACING: u16 = 4;

#[derive(Debug)]
pub struct ConfirmModal {
    title: String,
    message: String,
    /// true = Yes
    selected: bool,
    last_buttons_area: Option<Rect>,
}

impl ConfirmModal {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            selected: true,
            last_buttons_area: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Modal for ConfirmModal {
    type Result = bool;

    fn render(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let message_lines = self.message.lines().count().max(1) as u16;
        let width = modal_width(
            self.message.lines().chain([self.title.as_str(), "[ Yes ]    [ No ]"]),
            area.width,
        );
        let modal_area = centered_rect(width, message_lines + 4, area);
        let inner = render_frame(modal_area, buf, theme, &self.title);

        let chunks = Layout::vertical([
            Constraint::Length(message_lines),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

        Paragraph::new(self.message.clone())
            .alignment(Alignment::Center)
            .style(Style::default().fg(theme.fg))
            .render(chunks[0], buf);

        let buttons = Line::from(vec![
            Span::styled(YES, item_style(theme, self.selected)),
            Span::raw(" ".repeat(SPACING as usize)),
            Span::styled(NO, item_style(theme, !self.selected)),
        ]);
        Paragraph::new(buttons)
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
        self.last_buttons_area = Some(chunks[2]);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<Option<ModalResult<bool>>> {
        Ok(match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                self.selected = !self.selected;
                None
            }
            KeyCode::Enter => Some(ModalResult::Confirmed(self.selected)),
            KeyCode::Esc => Some(ModalResult::Cancelled),
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(ModalResult::Confirmed(true)),
            KeyCode::Char('n') | KeyCode::Char('N') => Some(ModalResult::Confirmed(false)),
            _ => None,
        })
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<Option<ModalResult<bool>>> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Ok(None);
        }
        let Some(area) = self.last_buttons_area else {
            return Ok(None);
        };
        if !contains(area, mouse.column, mouse.row) {
            return Ok(None);
        }

        let total = (YES.len() + NO.len()) as u16 + SPACING;
        let yes_start = area.x + area.width.saturating_sub(total) / 2;
        let yes_end = yes_start + YES.len() as u16;
        let no_start = yes_end + SPACING;
        let no_end = no_start + NO.len() as u16;

        if (yes_start..yes_end).contains(&mouse.column) {
            Ok(Some(ModalResult::Confirmed(true)))
        } else if (no_start..no_end).contains(&mouse.column) {
            Ok(Some(ModalResult::Confirmed(false)))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_choose_answer() {
        let mut modal = ConfirmModal::new("Delete", "Delete main.py?");
        assert_eq!(modal.handle_key(key(KeyCode::Tab)).unwrap(), None);
        assert_eq!(
            modal.handle_key(key(KeyCode::Enter)).unwrap(),
            Some(ModalResult::Confirmed(false))
        );
        assert_eq!(
            modal.handle_key(key(KeyCode::Char('y'))).unwrap(),
            Some(ModalResult::Confirmed(true))
        );
        assert_eq!(
            modal.handle_key(key(KeyCode::Esc)).unwrap(),
            Some(ModalResult::Cancelled)
        );
    }

    #[test]
    fn renders_message_and_buttons() {
        let theme = Theme::get_by_name("Dark");
        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);
        let mut modal = ConfirmModal::new("Unsaved", "Close anyway?");
        modal.render(area, &mut buf, theme);

        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Close anyway?"));
        assert!(text.contains("[ Yes ]"));
        assert!(modal.last_buttons_area.is_some());
    }
}
