//! Screen layout and drawing.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Widget},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use capi_core::{Panel, RenderContext};
use capi_modal::{ActiveModal, Modal};
use capi_theme::Theme;

use super::App;
use crate::menu::{dropdown_rect, render_dropdown, render_menu_bar};
use crate::state::{BottomView, Focus};
use crate::status_bar::{render_status_bar, StatusBarParams};

const SIDEBAR_WIDTH: u16 = 30;
const BOTTOM_HEIGHT: u16 = 10;
const CLOSE_MARK: &str = "×";

/// Screen position of one tab in the tab bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TabSpan {
    pub x: u16,
    pub width: u16,
    pub close_x: u16,
}

/// Areas of the last drawn frame, used to route mouse events.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ScreenLayout {
    pub screen: Rect,
    pub menu: Rect,
    pub sidebar: Option<Rect>,
    pub tab_bar: Rect,
    pub editor: Rect,
    pub bottom: Option<Rect>,
    pub status: Rect,
    pub tabs: Vec<TabSpan>,
}

/// Split the screen: menu bar, sidebar with a splitter column, tab bar,
/// editor, optional bottom panel and the status bar.
pub(crate) fn compute_layout(area: Rect, show_sidebar: bool, show_bottom: bool) -> ScreenLayout {
    let menu = Rect::new(area.x, area.y, area.width, area.height.min(1));
    let status_y = area.bottom().saturating_sub(1).max(menu.bottom());
    let status = Rect::new(area.x, status_y, area.width, area.bottom().saturating_sub(status_y));
    let body = Rect::new(
        area.x,
        menu.bottom(),
        area.width,
        status.y.saturating_sub(menu.bottom()),
    );

    let mut main = body;
    let sidebar = if show_sidebar && body.width > 2 {
        let width = SIDEBAR_WIDTH.min(body.width / 2);
        main.x += width + 1;
        main.width = main.width.saturating_sub(width + 1);
        Some(Rect::new(body.x, body.y, width, body.height))
    } else {
        None
    };

    let tab_bar = Rect::new(main.x, main.y, main.width, main.height.min(1));
    let mut editor = Rect::new(
        main.x,
        tab_bar.bottom(),
        main.width,
        main.height.saturating_sub(tab_bar.height),
    );
    let bottom = if show_bottom && editor.height > 2 {
        let height = BOTTOM_HEIGHT.min(editor.height / 2);
        editor.height -= height;
        Some(Rect::new(main.x, editor.bottom(), main.width, height))
    } else {
        None
    };

    ScreenLayout {
        screen: area,
        menu,
        sidebar,
        tab_bar,
        editor,
        bottom,
        status,
        tabs: Vec::new(),
    }
}

impl App {
    pub(super) fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let theme = self.state.theme;
        let mut layout = compute_layout(area, self.state.show_sidebar, self.state.show_bottom);
        let buf = frame.buffer_mut();

        Block::default()
            .style(Style::default().bg(theme.bg))
            .render(area, buf);

        let overlay_open = self.modal.is_some() || self.state.menu.is_open();
        let focused = |part: Focus| !overlay_open && self.state.focus == part;
        let editor_focused = focused(Focus::Editor);
        let sidebar_focused = focused(Focus::Sidebar);
        let bottom_focused = focused(Focus::Bottom);

        layout.tabs = self.render_tab_bar(layout.tab_bar, buf, theme);

        if let Some(tab) = self.tabs.get_mut(self.active_tab) {
            let ctx = RenderContext {
                theme,
                is_focused: editor_focused,
            };
            tab.render(layout.editor, buf, &ctx);
        }

        if let Some(bottom) = layout.bottom {
            let ctx = RenderContext {
                theme,
                is_focused: bottom_focused,
            };
            match self.state.bottom_view {
                BottomView::Runner => self.runner.render(bottom, buf, &ctx),
                BottomView::Search => self.search.render(bottom, buf, &ctx),
            }
        }

        // Drawn after the editor so the context menu lies on top
        if let Some(sidebar) = layout.sidebar {
            let ctx = RenderContext {
                theme,
                is_focused: sidebar_focused,
            };
            self.sidebar.render(sidebar, buf, &ctx);
            render_splitter(sidebar, buf, theme);
        }

        let active = self.active_editor().filter(|t| !t.is_welcome());
        let params = StatusBarParams {
            theme,
            message: self.state.status_message.as_ref(),
            runner_label: self.runner.runner().status_label(),
            position: active.map(|t| t.position_label()),
            language: active.map(|t| t.language_label()),
            autosave: self.state.config.general.autosave,
        };
        render_status_bar(layout.status, buf, &params);

        let menus = self.menus();
        render_menu_bar(layout.menu, buf, &menus, &self.state.menu, theme);
        if let Some(dropdown) = dropdown_rect(&menus, &self.state.menu, layout.menu, area) {
            render_dropdown(dropdown, buf, &menus, &self.state.menu, theme);
        }

        if let Some(modal) = self.modal.as_mut() {
            match modal {
                ActiveModal::Confirm(m, _) => m.render(area, buf, theme),
                ActiveModal::Input(m, _) => m.render(area, buf, theme),
                ActiveModal::Select(m) => m.render(area, buf, theme),
                ActiveModal::Info(m) => m.render(area, buf, theme),
            }
        }

        self.layout = layout;
    }

    /// One entry per tab: " label × ". Tabs that no longer fit are not drawn.
    fn render_tab_bar(&self, area: Rect, buf: &mut Buffer, theme: &Theme) -> Vec<TabSpan> {
        if area.height == 0 {
            return Vec::new();
        }
        buf.set_style(area, Style::default().bg(theme.window_bg));

        let mut spans = Vec::new();
        let mut x = area.x;
        for (i, tab) in self.tabs.iter().enumerate() {
            let label = tab.tab_label();
            let text = format!(" {} {} ", label, CLOSE_MARK);
            let width = text.width() as u16;
            if x + width > area.right() {
                break;
            }
            let style = if i == self.active_tab {
                Style::default()
                    .bg(theme.bg)
                    .fg(theme.fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().bg(theme.window_bg).fg(theme.line_fg)
            };
            buf.set_string(x, area.y, &text, style);
            let close_x = x + width - 2;
            spans.push(TabSpan { x, width, close_x });
            x += width;
        }
        spans
    }
}

fn render_splitter(sidebar: Rect, buf: &mut Buffer, theme: &Theme) {
    let x = sidebar.right();
    if x >= buf.area.right() {
        return;
    }
    let style = Style::default().fg(theme.splitter).bg(theme.bg);
    for y in sidebar.top()..sidebar.bottom() {
        buf.set_string(x, y, "│", style);
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::app;
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn layout_with_everything_shown() {
        let layout = compute_layout(Rect::new(0, 0, 100, 40), true, true);
        assert_eq!(layout.menu, Rect::new(0, 0, 100, 1));
        assert_eq!(layout.status, Rect::new(0, 39, 100, 1));
        assert_eq!(layout.sidebar, Some(Rect::new(0, 1, 30, 38)));
        assert_eq!(layout.tab_bar, Rect::new(31, 1, 69, 1));
        assert_eq!(layout.editor, Rect::new(31, 2, 69, 27));
        assert_eq!(layout.bottom, Some(Rect::new(31, 29, 69, 10)));
    }

    #[test]
    fn hidden_parts_give_room_to_editor() {
        let layout = compute_layout(Rect::new(0, 0, 80, 24), false, false);
        assert_eq!(layout.sidebar, None);
        assert_eq!(layout.bottom, None);
        assert_eq!(layout.editor, Rect::new(0, 2, 80, 21));
    }

    #[test]
    fn tiny_screen_does_not_panic() {
        let layout = compute_layout(Rect::new(0, 0, 3, 2), true, true);
        assert_eq!(layout.bottom, None);
        let layout = compute_layout(Rect::new(0, 0, 0, 0), true, true);
        assert_eq!(layout.editor.height, 0);
    }

    #[test]
    fn frame_records_tab_positions() {
        let mut app = app();
        app.new_tab();
        app.new_tab();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();

        assert_eq!(app.layout.tabs.len(), 2);
        let first = app.layout.tabs[0];
        assert_eq!(first.x, app.layout.tab_bar.x);
        assert_eq!(app.layout.tabs[1].x, first.x + first.width);
        let buffer = terminal.backend().buffer();
        assert_eq!(buffer[(first.close_x, app.layout.tab_bar.y)].symbol(), CLOSE_MARK);
    }
}
