use anyhow::Result;
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use capi_core::Panel;

use super::App;
use crate::menu::{dropdown_rect, item_at, title_at};
use crate::panels::contains;
use crate::state::{BottomView, Focus};

impl App {
    /// Handle mouse event
    pub(super) fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<()> {
        if self.modal.is_some() {
            return self.handle_modal_mouse(mouse);
        }

        let (column, row) = (mouse.column, mouse.row);
        let is_down = matches!(mouse.kind, MouseEventKind::Down(_));

        if self.state.menu.is_open() {
            if is_down {
                self.handle_open_menu_click(column, row);
            }
            return Ok(());
        }

        if is_down && contains(self.layout.menu, column, row) {
            if let Some(index) = title_at(&self.menus(), column - self.layout.menu.x) {
                self.state.menu.open(index);
            }
            return Ok(());
        }

        if contains(self.layout.tab_bar, column, row) {
            self.handle_tab_bar_click(mouse);
            return Ok(());
        }

        let layout = self.layout.clone();
        let in_sidebar = layout.sidebar.is_some_and(|a| contains(a, column, row));
        let in_bottom = layout.bottom.is_some_and(|a| contains(a, column, row));
        let dragging = matches!(mouse.kind, MouseEventKind::Drag(_) | MouseEventKind::Up(_));

        let events = if self.sidebar.is_context_menu_open() || (in_sidebar && !dragging) {
            if is_down {
                self.state.focus = Focus::Sidebar;
            }
            let area = layout.sidebar.unwrap_or_default();
            self.sidebar.handle_mouse(mouse, area)
        } else if dragging && self.state.focus == Focus::Editor {
            match self.tabs.get_mut(self.active_tab) {
                Some(tab) => tab.handle_mouse(mouse, layout.editor),
                None => vec![],
            }
        } else if let (true, Some(area)) = (in_bottom, layout.bottom) {
            if is_down {
                self.state.focus = Focus::Bottom;
            }
            match self.state.bottom_view {
                BottomView::Runner => self.runner.handle_mouse(mouse, area),
                BottomView::Search => self.search.handle_mouse(mouse, area),
            }
        } else if contains(layout.editor, column, row) {
            if is_down {
                self.state.focus = Focus::Editor;
            }
            match self.tabs.get_mut(self.active_tab) {
                Some(tab) => tab.handle_mouse(mouse, layout.editor),
                None => vec![],
            }
        } else {
            vec![]
        };
        self.process_panel_events(events);
        Ok(())
    }

    /// Click while a drop-down is open: run the item, switch menus or close.
    fn handle_open_menu_click(&mut self, column: u16, row: u16) {
        let menus = self.menus();
        let bar = self.layout.menu;

        if let Some(dropdown) = dropdown_rect(&menus, &self.state.menu, bar, self.layout.screen) {
            if contains(dropdown, column, row) {
                let action = item_at(&menus, &self.state.menu, dropdown, column, row)
                    .and_then(|i| self.state.menu.open.map(|m| menus[m].items[i].action.clone()));
                if let Some(action) = action {
                    self.state.menu.close();
                    self.execute_menu_action(action);
                }
                return;
            }
        }

        if contains(bar, column, row) {
            match title_at(&menus, column - bar.x) {
                Some(index) if self.state.menu.open != Some(index) => self.state.menu.open(index),
                _ => self.state.menu.close(),
            }
            return;
        }
        self.state.menu.close();
    }

    fn handle_tab_bar_click(&mut self, mouse: MouseEvent) {
        let MouseEventKind::Down(button) = mouse.kind else {
            return;
        };
        let Some(index) = self
            .layout
            .tabs
            .iter()
            .position(|t| mouse.column >= t.x && mouse.column < t.x + t.width)
        else {
            return;
        };
        let on_close = self.layout.tabs[index].close_x == mouse.column;
        match button {
            MouseButton::Left if on_close => self.request_close_tab(index),
            MouseButton::Left => {
                self.active_tab = index;
                self.state.focus = Focus::Editor;
            }
            MouseButton::Middle => self.request_close_tab(index),
            MouseButton::Right => {}
        }
        self.state.needs_redraw = true;
    }
}
