//! Find/replace bar shown above the text area.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
};

use capi_modal::TextInput;
use capi_text_search::SearchOptions;
use capi_theme::Theme;

/// Rows taken by the bar.
pub const FIND_BAR_HEIGHT: u16 = 2;

const FIND_LABEL: &str = " Find:    ";
const REPLACE_LABEL: &str = " Replace: ";
const FIELD_WIDTH: u16 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindField {
    Find,
    Replace,
}

/// What the tab should do after a key in the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindAction {
    None,
    /// Query or options changed; recompute matches
    Refresh,
    Next,
    Prev,
    ReplaceCurrent,
    ReplaceAll,
    Close,
}

#[derive(Debug, Clone)]
pub struct FindBar {
    visible: bool,
    focused: bool,
    field: FindField,
    find: TextInput,
    replace: TextInput,
    options: SearchOptions,
}

impl Default for FindBar {
    fn default() -> Self {
        Self {
            visible: false,
            focused: false,
            field: FindField::Find,
            find: TextInput::new(),
            replace: TextInput::new(),
            options: SearchOptions::default(),
        }
    }
}

impl FindBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show and focus the bar; `initial` (the selected text) replaces the query.
    pub fn open(&mut self, initial: Option<&str>) {
        self.visible = true;
        self.focused = true;
        self.field = FindField::Find;
        if let Some(text) = initial.filter(|t| !t.is_empty() && !t.contains('\n')) {
            self.find = TextInput::with_text(text);
        }
    }

    pub fn close(&mut self) {
        self.visible = false;
        self.focused = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_focused(&self) -> bool {
        self.visible && self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn field(&self) -> FindField {
        self.field
    }

    pub fn query(&self) -> &str {
        self.find.text()
    }

    pub fn replacement(&self) -> &str {
        self.replace.text()
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    fn input_mut(&mut self) -> &mut TextInput {
        match self.field {
            FindField::Find => &mut self.find,
            FindField::Replace => &mut self.replace,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FindAction {
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        match key.code {
            KeyCode::Esc => return FindAction::Close,
            KeyCode::Tab | KeyCode::BackTab => {
                self.field = match self.field {
                    FindField::Find => FindField::Replace,
                    FindField::Replace => FindField::Find,
                };
                return FindAction::None;
            }
            KeyCode::Enter if self.field == FindField::Replace => return FindAction::ReplaceCurrent,
            KeyCode::Enter | KeyCode::Down => return FindAction::Next,
            KeyCode::F(3) if shift => return FindAction::Prev,
            KeyCode::F(3) => return FindAction::Next,
            KeyCode::Up => return FindAction::Prev,
            KeyCode::Char('a') if alt => return FindAction::ReplaceAll,
            KeyCode::Char('c') if alt => {
                self.options.case_sensitive = !self.options.case_sensitive;
                return FindAction::Refresh;
            }
            KeyCode::Char('r') if alt => {
                self.options.regex = !self.options.regex;
                return FindAction::Refresh;
            }
            KeyCode::Char('w') if alt => {
                self.options.whole_word = !self.options.whole_word;
                return FindAction::Refresh;
            }
            _ => {}
        }

        let before = self.find.text().to_string();
        let input = self.input_mut();
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) && !alt => {
                input.insert(c)
            }
            KeyCode::Backspace => input.backspace(),
            KeyCode::Delete => input.delete(),
            KeyCode::Left => input.move_left(),
            KeyCode::Right => input.move_right(),
            KeyCode::Home => input.move_home(),
            KeyCode::End => input.move_end(),
            _ => {}
        }
        if self.find.text() != before {
            FindAction::Refresh
        } else {
            FindAction::None
        }
    }

    /// Draw the bar; `status` is the match counter or pattern error.
    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme, status: &str) {
        let base = Style::default().bg(theme.window_bg).fg(theme.fg);
        buf.set_style(area, base);
        let dim = base.fg(theme.line_fg);

        let rows = [
            (FIND_LABEL, &self.find, FindField::Find),
            (REPLACE_LABEL, &self.replace, FindField::Replace),
        ];
        for (row, (label, input, field)) in rows.into_iter().enumerate() {
            let y = area.y + row as u16;
            if row as u16 >= area.height {
                break;
            }
            buf.set_string(area.x, y, label, dim);
            let field_x = area.x + label.len() as u16;
            let width = FIELD_WIDTH.min(area.width.saturating_sub(label.len() as u16));
            let field_area = Rect::new(field_x, y, width, 1);
            let field_style = Style::default().bg(theme.line_bg).fg(theme.fg);
            buf.set_style(field_area, field_style);

            let skip = input.cursor().saturating_sub(width.saturating_sub(1) as usize);
            let visible: String = input.text().chars().skip(skip).collect();
            buf.set_stringn(field_x, y, &visible, width as usize, field_style);
            if self.is_focused() && self.field == field {
                let cursor_x = field_x + (input.cursor() - skip) as u16;
                if cursor_x < field_x + width {
                    buf[(cursor_x, y)].set_style(field_style.add_modifier(Modifier::REVERSED));
                }
            }

            let info_x = field_x + width + 2;
            let info = match field {
                FindField::Find => {
                    let flag = |on: bool, name: &str| {
                        if on {
                            format!("[{}]", name)
                        } else {
                            format!(" {} ", name)
                        }
                    };
                    format!(
                        "{}{}{}  {}",
                        flag(self.options.case_sensitive, "Aa"),
                        flag(self.options.regex, ".*"),
                        flag(self.options.whole_word, "W"),
                        status
                    )
                }
                FindField::Replace => "Enter: replace  Alt+A: all  Esc: close".to_string(),
            };
            if info_x < area.x + area.width {
                let room = (area.x + area.width - info_x) as usize;
                buf.set_stringn(info_x, y, info, room, dim);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn alt(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::ALT)
    }

    #[test]
    fn typing_refreshes_query() {
        let mut bar = FindBar::new();
        bar.open(None);
        assert_eq!(bar.handle_key(key(KeyCode::Char('f'))), FindAction::Refresh);
        assert_eq!(bar.handle_key(key(KeyCode::Left)), FindAction::None);
        assert_eq!(bar.query(), "f");
        assert_eq!(bar.handle_key(key(KeyCode::Enter)), FindAction::Next);
        assert_eq!(bar.handle_key(key(KeyCode::Up)), FindAction::Prev);
    }

    #[test]
    fn replace_field() {
        let mut bar = FindBar::new();
        bar.open(Some("old"));
        bar.handle_key(key(KeyCode::Tab));
        assert_eq!(bar.field(), FindField::Replace);
        assert_eq!(bar.handle_key(key(KeyCode::Char('n'))), FindAction::None);
        assert_eq!(bar.replacement(), "n");
        assert_eq!(bar.query(), "old");
        assert_eq!(bar.handle_key(key(KeyCode::Enter)), FindAction::ReplaceCurrent);
        assert_eq!(bar.handle_key(alt('a')), FindAction::ReplaceAll);
    }

    #[test]
    fn option_toggles() {
        let mut bar = FindBar::new();
        bar.open(None);
        assert_eq!(bar.handle_key(alt('c')), FindAction::Refresh);
        assert_eq!(bar.handle_key(alt('r')), FindAction::Refresh);
        assert!(bar.options().case_sensitive);
        assert!(bar.options().regex);
        assert!(!bar.options().whole_word);
        assert_eq!(bar.handle_key(key(KeyCode::Esc)), FindAction::Close);
    }

    #[test]
    fn multiline_selection_is_not_a_query() {
        let mut bar = FindBar::new();
        bar.open(Some("a\nb"));
        assert_eq!(bar.query(), "");
        assert!(bar.is_focused());
        bar.close();
        assert!(!bar.is_focused());
    }
}
