//! Keyboard dispatch: modal, menu, window hotkeys, then the focused part.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use capi_core::Panel;

use super::App;
use crate::menu::MenuAction;
use crate::state::{BottomView, Focus};

/// Keys the window handles whatever has focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GlobalKey {
    Menu(MenuAction),
    OpenMenuBar,
    CycleFocus,
    NextTab,
    PrevTab,
}

/// Map a key to a window hotkey. Ctrl+Shift+letter arrives either as an
/// uppercase char or with the SHIFT modifier, depending on the terminal.
pub(crate) fn global_key(key: KeyEvent) -> Option<GlobalKey> {
    use MenuAction::*;

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::F(10) => return Some(GlobalKey::OpenMenuBar),
        KeyCode::F(6) => return Some(GlobalKey::CycleFocus),
        KeyCode::F(5) => return Some(GlobalKey::Menu(RunScript)),
        KeyCode::F(1) => return Some(GlobalKey::Menu(About)),
        KeyCode::PageDown if ctrl => return Some(GlobalKey::NextTab),
        KeyCode::PageUp if ctrl => return Some(GlobalKey::PrevTab),
        _ => {}
    }

    let KeyCode::Char(c) = key.code else {
        return None;
    };
    if !ctrl || key.modifiers.contains(KeyModifiers::ALT) {
        return None;
    }
    let shift = key.modifiers.contains(KeyModifiers::SHIFT) || c.is_ascii_uppercase();
    let action = match (c.to_ascii_lowercase(), shift) {
        ('n', false) => NewTab,
        ('n', true) => NewFolder,
        ('o', false) => OpenFile,
        ('s', false) => Save,
        ('s', true) => SaveAs,
        ('w', _) => CloseTab,
        ('q', _) => Quit,
        ('f', false) => Find,
        ('f', true) => FindInFiles,
        ('g', _) => GoToLine,
        ('j', _) => ShowTerminal,
        ('b', false) => ToggleSidebar,
        ('b', true) => Shortcuts,
        _ => return None,
    };
    Some(GlobalKey::Menu(action))
}

impl App {
    /// Handle keyboard event
    pub(super) fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        log::debug!("Key event: code={:?}, modifiers={:?}", key.code, key.modifiers);

        // Any key press dismisses the previous message
        if self.state.status_message.is_some() {
            self.state.clear_status();
        }

        if self.modal.is_some() {
            return self.handle_modal_key(key);
        }

        if self.state.menu.is_open() {
            self.handle_menu_key(key);
            return Ok(());
        }

        if let Some(global) = global_key(key) {
            self.handle_global_key(global);
            return Ok(());
        }

        let events = match self.state.focus {
            Focus::Sidebar if self.state.show_sidebar => {
                if key.code == KeyCode::Esc && !self.sidebar.is_context_menu_open() {
                    self.state.focus = Focus::Editor;
                    return Ok(());
                }
                self.sidebar.handle_key(key)
            }
            Focus::Bottom if self.state.show_bottom => {
                if key.code == KeyCode::Esc {
                    self.state.focus = Focus::Editor;
                    return Ok(());
                }
                match self.state.bottom_view {
                    BottomView::Runner => self.runner.handle_key(key),
                    BottomView::Search => self.search.handle_key(key),
                }
            }
            _ => match self.active_editor_mut() {
                Some(tab) => tab.handle_key(key),
                None => vec![],
            },
        };
        self.process_panel_events(events);
        Ok(())
    }

    fn handle_global_key(&mut self, global: GlobalKey) {
        match global {
            GlobalKey::Menu(action) => self.execute_menu_action(action),
            GlobalKey::OpenMenuBar => self.state.menu.open(0),
            GlobalKey::CycleFocus => self.state.focus = self.state.next_focus(),
            GlobalKey::NextTab => self.next_tab(),
            GlobalKey::PrevTab => self.prev_tab(),
        }
    }

    /// Navigation inside the open menu.
    fn handle_menu_key(&mut self, key: KeyEvent) {
        let menus = self.menus();
        let Some(open) = self.state.menu.open.filter(|&i| i < menus.len()) else {
            self.state.menu.close();
            return;
        };
        let count = menus[open].items.len();

        match key.code {
            KeyCode::Left => self.state.menu.prev_menu(menus.len()),
            KeyCode::Right => self.state.menu.next_menu(menus.len()),
            KeyCode::Up => self.state.menu.prev_item(count),
            KeyCode::Down => self.state.menu.next_item(count),
            KeyCode::Enter => {
                let action = menus[open]
                    .items
                    .get(self.state.menu.selected)
                    .map(|item| item.action.clone());
                self.state.menu.close();
                if let Some(action) = action {
                    self.execute_menu_action(action);
                }
            }
            KeyCode::Esc | KeyCode::F(10) => self.state.menu.close(),
            KeyCode::Char(c) => {
                // First letter jumps to a menu
                let upper = c.to_ascii_uppercase();
                if let Some(index) = menus.iter().position(|m| m.title.starts_with(upper)) {
                    self.state.menu.open(index);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::app;
    use super::*;

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn ctrl_shift_in_both_encodings() {
        assert_eq!(global_key(ctrl('s')), Some(GlobalKey::Menu(MenuAction::Save)));
        assert_eq!(global_key(ctrl('S')), Some(GlobalKey::Menu(MenuAction::SaveAs)));
        assert_eq!(
            global_key(KeyEvent::new(
                KeyCode::Char('f'),
                KeyModifiers::CONTROL | KeyModifiers::SHIFT
            )),
            Some(GlobalKey::Menu(MenuAction::FindInFiles))
        );
        assert_eq!(global_key(ctrl('B')), Some(GlobalKey::Menu(MenuAction::Shortcuts)));
        assert_eq!(global_key(ctrl('N')), Some(GlobalKey::Menu(MenuAction::NewFolder)));
    }

    #[test]
    fn editor_keys_are_not_global() {
        assert_eq!(global_key(ctrl('z')), None);
        assert_eq!(global_key(ctrl('c')), None);
        assert_eq!(global_key(key(KeyCode::Char('s'))), None);
        assert_eq!(global_key(key(KeyCode::F(5))), Some(GlobalKey::Menu(MenuAction::RunScript)));
        assert_eq!(
            global_key(KeyEvent::new(KeyCode::PageDown, KeyModifiers::CONTROL)),
            Some(GlobalKey::NextTab)
        );
    }

    #[test]
    fn menu_navigation_runs_action() {
        let mut app = app();
        app.ensure_tab();
        app.handle_key_event(key(KeyCode::F(10))).unwrap();
        assert_eq!(app.state.menu.open, Some(0));

        // File -> New Tab
        app.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(!app.state.menu.is_open());
        assert_eq!(app.tabs.len(), 1);
        assert_eq!(app.tabs[0].title(), "Untitled");
    }

    #[test]
    fn menu_letter_jumps() {
        let mut app = app();
        app.handle_key_event(key(KeyCode::F(10))).unwrap();
        app.handle_key_event(key(KeyCode::Char('h'))).unwrap();
        assert_eq!(app.state.menu.open, Some(6));
        app.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert!(!app.state.menu.is_open());
    }

    #[test]
    fn typing_reaches_the_editor() {
        let mut app = app();
        app.new_tab();
        app.handle_key_event(key(KeyCode::Char('a'))).unwrap();
        app.handle_key_event(key(KeyCode::Char('b'))).unwrap();
        assert_eq!(app.tabs[0].text(), "ab");
    }

    #[test]
    fn escape_returns_focus_to_editor() {
        let mut app = app();
        app.state.focus = Focus::Sidebar;
        app.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.state.focus, Focus::Editor);
    }
}
