use std::path::{Path, PathBuf};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
};
use unicode_width::UnicodeWidthStr;

use capi_core::{Panel, PanelEvent, RenderContext};
use capi_modal::TextInput;
use capi_runner::{OutputKind, Runner};
use capi_theme::Theme;

const WARNING_COLOR: Color = Color::Rgb(0xcc, 0xa7, 0x00);
const WHEEL_LINES: usize = 3;
const INPUT_PROMPT: &str = "> ";

/// Output of the running script with a one-line stdin prompt at the bottom.
pub struct RunnerPanel {
    runner: Runner,
    input: TextInput,
    /// Lines scrolled up from the bottom of the output
    scroll_back: usize,
}

impl RunnerPanel {
    pub fn new(python_command: impl Into<String>) -> Self {
        Self {
            runner: Runner::new(python_command),
            input: TextInput::new(),
            scroll_back: 0,
        }
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn run(&mut self, path: &Path) -> Result<()> {
        self.scroll_back = 0;
        self.runner.run(path)
    }

    pub fn stop(&mut self) {
        self.runner.stop();
    }

    pub fn set_working_dir(&mut self, dir: Option<PathBuf>) {
        self.runner.set_working_dir(dir);
    }

    /// Pump output; true when something changed.
    pub fn poll(&mut self) -> bool {
        self.runner.poll()
    }

    fn line_style(kind: OutputKind, theme: &Theme) -> Style {
        let style = Style::default().bg(theme.bg);
        match kind {
            OutputKind::Stdout => style.fg(theme.fg),
            OutputKind::Stderr => style.fg(theme.error),
            OutputKind::Input => style.fg(theme.success),
            OutputKind::Info => style.fg(theme.line_fg).add_modifier(Modifier::DIM),
            OutputKind::Warning => style.fg(WARNING_COLOR),
        }
    }

    fn send_input(&mut self) -> Vec<PanelEvent> {
        let line = self.input.text().to_string();
        self.input = TextInput::new();
        self.scroll_back = 0;
        match self.runner.send_input(&line) {
            Ok(()) => vec![PanelEvent::NeedsRedraw],
            Err(e) => vec![PanelEvent::SetStatus {
                message: format!("{:#}", e),
                is_error: true,
            }],
        }
    }
}

impl Panel for RunnerPanel {
    fn title(&self) -> String {
        match self.runner.working_dir() {
            Some(dir) => format!("TERMINAL  {}  ({})", self.runner.status_label(), dir.display()),
            None => format!("TERMINAL  {}", self.runner.status_label()),
        }
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer, ctx: &RenderContext) {
        if area.height < 2 || area.width == 0 {
            return;
        }
        let theme = ctx.theme;
        buf.set_style(area, Style::default().bg(theme.bg).fg(theme.fg));

        let header_style = Style::default()
            .bg(theme.window_bg)
            .fg(theme.fg)
            .add_modifier(Modifier::BOLD);
        buf.set_style(Rect::new(area.x, area.y, area.width, 1), header_style);
        buf.set_stringn(area.x + 1, area.y, self.title(), area.width.saturating_sub(1) as usize, header_style);

        let output_height = area.height.saturating_sub(2) as usize;
        let lines = self.runner.output().lines();
        let max_back = lines.len().saturating_sub(output_height);
        self.scroll_back = self.scroll_back.min(max_back);
        let end = lines.len() - self.scroll_back;
        let start = end.saturating_sub(output_height);

        for (row, line) in lines[start..end].iter().enumerate() {
            buf.set_stringn(
                area.x + 1,
                area.y + 1 + row as u16,
                &line.text,
                area.width.saturating_sub(1) as usize,
                Self::line_style(line.kind, theme),
            );
        }

        let input_y = area.bottom() - 1;
        let input_style = Style::default().bg(theme.line_bg).fg(theme.success);
        buf.set_style(Rect::new(area.x, input_y, area.width, 1), input_style);
        let text = format!("{}{}", INPUT_PROMPT, self.input.text());
        buf.set_stringn(area.x + 1, input_y, &text, area.width.saturating_sub(1) as usize, input_style);

        if ctx.is_focused {
            let before: String = self.input.text().chars().take(self.input.cursor()).collect();
            let x = area.x + 1 + (INPUT_PROMPT.width() + before.width()) as u16;
            if x < area.right() {
                let cell = &mut buf[(x, input_y)];
                let style = cell.style().add_modifier(Modifier::REVERSED);
                cell.set_style(style);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<PanelEvent> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => return self.send_input(),
            KeyCode::Char('l') if ctrl => self.runner.clear_output(),
            KeyCode::Char(c) if !ctrl => self.input.insert(c),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            KeyCode::PageUp => self.scroll_back += 10,
            KeyCode::PageDown => self.scroll_back = self.scroll_back.saturating_sub(10),
            _ => return vec![],
        }
        vec![PanelEvent::NeedsRedraw]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect) -> Vec<PanelEvent> {
        match event.kind {
            MouseEventKind::ScrollUp => self.scroll_back += WHEEL_LINES,
            MouseEventKind::ScrollDown => {
                self.scroll_back = self.scroll_back.saturating_sub(WHEEL_LINES)
            }
            _ => return vec![],
        }
        vec![PanelEvent::NeedsRedraw]
    }

    fn tick(&mut self) -> Vec<PanelEvent> {
        if self.poll() {
            vec![PanelEvent::NeedsRedraw]
        } else {
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    #[test]
    fn unknown_extension_warns_in_output() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.xyz");
        std::fs::write(&file, "").unwrap();

        let mut panel = RunnerPanel::new("python3");
        panel.run(&file).unwrap();

        let area = Rect::new(0, 0, 40, 5);
        let mut buf = Buffer::empty(area);
        let theme = Theme::get_by_name("Dark");
        panel.render(area, &mut buf, &RenderContext { theme, is_focused: false });
        assert!(row_text(&buf, 0).contains("Terminal idle"));
        assert!(row_text(&buf, 1).contains("Don't know how to run .xyz"));
        assert_eq!(buf[(1, 1)].fg, WARNING_COLOR);
    }

    #[test]
    fn input_without_program_is_an_error() {
        let mut panel = RunnerPanel::new("python3");
        panel.handle_key(key(KeyCode::Char('h')));
        panel.handle_key(key(KeyCode::Char('i')));
        assert_eq!(panel.input.text(), "hi");

        let events = panel.handle_key(key(KeyCode::Enter));
        assert!(matches!(&events[0], PanelEvent::SetStatus { is_error: true, .. }));
        assert!(panel.input.is_empty());
    }

    #[test]
    fn title_shows_working_dir() {
        let mut panel = RunnerPanel::new("python3");
        assert_eq!(panel.title(), "TERMINAL  Terminal idle");
        panel.set_working_dir(Some(PathBuf::from("/tmp/project")));
        assert!(panel.title().ends_with("(/tmp/project)"));
    }
}
