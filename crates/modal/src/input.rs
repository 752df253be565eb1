//! Single-line text prompt (go to line, save as, rename, open path).

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use capi_theme::Theme;

use crate::{centered_rect, item_style, modal_width, render_frame, Modal, ModalResult, TextInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Input,
    Buttons,
}

#[derive(Debug)]
pub struct InputModal {
    title: String,
    prompt: String,
    input: TextInput,
    focus: Focus,
    /// 0 = OK, 1 = Cancel
    selected_button: usize,
}

impl InputModal {
    pub fn new(title: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::with_default(title, prompt, "")
    }

    pub fn with_default(
        title: impl Into<String>,
        prompt: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            prompt: prompt.into(),
            input: TextInput::with_text(default),
            focus: Focus::Input,
            selected_button: 0,
        }
    }

    pub fn text(&self) -> &str {
        self.input.text()
    }

    /// Submit the current text; an empty field counts as cancel.
    fn submit(&self) -> ModalResult<String> {
        if self.input.is_empty() {
            ModalResult::Cancelled
        } else {
            ModalResult::Confirmed(self.input.text().to_string())
        }
    }

    fn edit(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.insert(c)
            }
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            _ => {}
        }
    }
}

impl Modal for InputModal {
    type Result = String;

    fn render(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let width = modal_width(
            [self.title.as_str(), self.prompt.as_str(), self.input.text()].into_iter(),
            area.width,
        )
        .max(40u16.min(area.width));
        let modal_area = centered_rect(width, 7, area);
        let inner = render_frame(modal_area, buf, theme, &self.title);

        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .horizontal_margin(1)
        .split(inner);

        buf.set_string(chunks[0].x, chunks[0].y, &self.prompt, Style::default().fg(theme.fg));

        // Input field: scroll so the cursor stays visible
        let field = chunks[2];
        let field_style = Style::default().fg(theme.fg).bg(theme.line_bg);
        buf.set_style(field, field_style);
        let before: String = self.input.text().chars().take(self.input.cursor()).collect();
        let skip = before.width().saturating_sub(field.width.saturating_sub(1) as usize);
        let visible: String = self.input.text().chars().skip(skip).collect();
        buf.set_stringn(field.x, field.y, &visible, field.width as usize, field_style);
        if self.focus == Focus::Input {
            let cursor_x = field.x + (before.width() - skip) as u16;
            if cursor_x < field.x + field.width {
                buf[(cursor_x, field.y)].set_style(field_style.add_modifier(Modifier::REVERSED));
            }
        }

        let buttons_focused = self.focus == Focus::Buttons;
        let buttons = Line::from(vec![
            Span::styled("[ OK ]", item_style(theme, buttons_focused && self.selected_button == 0)),
            Span::raw("    "),
            Span::styled(
                "[ Cancel ]",
                item_style(theme, buttons_focused && self.selected_button == 1),
            ),
        ]);
        Paragraph::new(buttons)
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<Option<ModalResult<String>>> {
        if key.code == KeyCode::Esc {
            return Ok(Some(ModalResult::Cancelled));
        }

        match self.focus {
            Focus::Input => match key.code {
                KeyCode::Enter => return Ok(Some(self.submit())),
                KeyCode::Down | KeyCode::Tab => self.focus = Focus::Buttons,
                _ => self.edit(key),
            },
            Focus::Buttons => match key.code {
                KeyCode::Left | KeyCode::Right => self.selected_button = 1 - self.selected_button,
                KeyCode::Up | KeyCode::Tab => self.focus = Focus::Input,
                KeyCode::Enter if self.selected_button == 0 => return Ok(Some(self.submit())),
                KeyCode::Enter => return Ok(Some(ModalResult::Cancelled)),
                _ => {
                    // Typing goes back to the field
                    self.focus = Focus::Input;
                    self.edit(key);
                }
            },
        }
        Ok(None)
    }
}
