use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
};

use capi_core::{Panel, PanelEvent, RenderContext};
use capi_text_search::{result_labels, ProjectHit};

/// Results of "Find in Files". Enter or a click opens the hit at its line.
#[derive(Debug, Default)]
pub struct SearchPanel {
    query: String,
    hits: Vec<ProjectHit>,
    selected: usize,
    offset: usize,
}

impl SearchPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_results(&mut self, query: impl Into<String>, hits: Vec<ProjectHit>) {
        self.query = query.into();
        self.hits = hits;
        self.selected = 0;
        self.offset = 0;
    }

    pub fn hits(&self) -> &[ProjectHit] {
        &self.hits
    }

    fn open_selected(&self) -> Vec<PanelEvent> {
        match self.hits.get(self.selected) {
            Some(hit) => vec![PanelEvent::OpenFileAt {
                path: hit.path.clone(),
                line: hit.line,
            }],
            None => vec![],
        }
    }

    fn keep_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + height {
            self.offset = self.selected + 1 - height;
        }
    }
}

impl Panel for SearchPanel {
    fn title(&self) -> String {
        format!("SEARCH  '{}'  {} results", self.query, self.hits.len())
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer, ctx: &RenderContext) {
        if area.height < 2 || area.width == 0 {
            return;
        }
        let theme = ctx.theme;
        let base = Style::default().bg(theme.bg).fg(theme.fg);
        buf.set_style(area, base);

        let header = Style::default()
            .bg(theme.window_bg)
            .fg(theme.fg)
            .add_modifier(Modifier::BOLD);
        buf.set_style(Rect::new(area.x, area.y, area.width, 1), header);
        buf.set_stringn(area.x + 1, area.y, self.title(), area.width.saturating_sub(1) as usize, header);

        let height = area.height as usize - 1;
        self.keep_visible(height);
        let labels = result_labels(&self.hits);
        for (i, label) in labels.iter().enumerate().skip(self.offset).take(height) {
            let style = if i == self.selected && !self.hits.is_empty() {
                let bg = if ctx.is_focused { theme.select_bg } else { theme.line_bg };
                base.bg(bg)
            } else {
                base
            };
            let y = area.y + 1 + (i - self.offset) as u16;
            buf.set_style(Rect::new(area.x, y, area.width, 1), style);
            buf.set_stringn(area.x + 1, y, label, area.width.saturating_sub(1) as usize, style);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<PanelEvent> {
        let last = self.hits.len().saturating_sub(1);
        match key.code {
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => self.selected = (self.selected + 1).min(last),
            KeyCode::PageUp => self.selected = self.selected.saturating_sub(10),
            KeyCode::PageDown => self.selected = (self.selected + 10).min(last),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = last,
            KeyCode::Enter => return self.open_selected(),
            _ => return vec![],
        }
        vec![PanelEvent::NeedsRedraw]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect) -> Vec<PanelEvent> {
        match event.kind {
            MouseEventKind::ScrollUp => {
                self.offset = self.offset.saturating_sub(3);
                vec![PanelEvent::NeedsRedraw]
            }
            MouseEventKind::ScrollDown => {
                self.offset = (self.offset + 3).min(self.hits.len().saturating_sub(1));
                vec![PanelEvent::NeedsRedraw]
            }
            MouseEventKind::Down(MouseButton::Left) if event.row > area.y => {
                let index = self.offset + (event.row - area.y - 1) as usize;
                if index < self.hits.len() {
                    self.selected = index;
                    self.open_selected()
                } else {
                    vec![]
                }
            }
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capi_theme::Theme;
    use crossterm::event::KeyModifiers;
    use std::path::PathBuf;

    fn hit(line: usize) -> ProjectHit {
        ProjectHit {
            path: PathBuf::from("/p/src/app.py"),
            relative: "src/app.py".into(),
            line,
            preview: "def run():".into(),
        }
    }

    #[test]
    fn enter_opens_selected_hit() {
        let mut panel = SearchPanel::new();
        panel.set_results("run", vec![hit(3), hit(9)]);
        panel.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        assert_eq!(
            panel.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
            vec![PanelEvent::OpenFileAt {
                path: PathBuf::from("/p/src/app.py"),
                line: 9,
            }]
        );
    }

    #[test]
    fn empty_results_render_placeholder() {
        let mut panel = SearchPanel::new();
        panel.set_results("zzz", vec![]);
        let area = Rect::new(0, 0, 40, 3);
        let mut buf = Buffer::empty(area);
        let theme = Theme::get_by_name("Dark");
        panel.render(area, &mut buf, &RenderContext { theme, is_focused: true });
        let row: String = (0..40).map(|x| buf[(x, 1)].symbol()).collect();
        assert_eq!(row.trim(), "No results.");
        assert!(panel
            .handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
            .is_empty());
    }
}
