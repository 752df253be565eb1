//! Menu action handlers.

use capi_core::{ConfirmAction, InputAction};
use capi_editor::EditorCommand;
use capi_modal::{ActiveModal, ConfirmModal, InfoModal, InputModal, SelectModal};
use capi_theme::Theme;

use super::App;
use crate::menu::{build_menus, Menu, MenuAction, MenuFlags};
use crate::panels::SidebarAction;
use crate::state::{BottomView, Focus};

/// Log lines shown by Help > Show Log.
const LOG_LINES_SHOWN: usize = 200;

const SHORTCUTS: &[(&str, &str)] = &[
    ("Ctrl+N", "New tab"),
    ("Ctrl+O", "Open file"),
    ("Ctrl+S", "Save"),
    ("Ctrl+Shift+S", "Save as"),
    ("Ctrl+W", "Close tab"),
    ("Ctrl+Q", "Quit"),
    ("Ctrl+Shift+N", "New folder"),
    ("Ctrl+Z / Ctrl+Y", "Undo / redo"),
    ("Ctrl+X / C / V", "Cut / copy / paste"),
    ("Ctrl+A", "Select all"),
    ("Ctrl+F", "Find and replace"),
    ("Ctrl+Shift+F", "Find in files"),
    ("Ctrl+G", "Go to line"),
    ("Ctrl+Space", "Show completions"),
    ("Alt+Up / Alt+Down", "Move line"),
    ("F5", "Run script"),
    ("Ctrl+J", "Show terminal"),
    ("Ctrl+B", "Toggle sidebar"),
    ("Ctrl+PgUp / PgDn", "Previous / next tab"),
    ("F6", "Cycle focus"),
    ("F10", "Menu"),
    ("F1", "About"),
];

impl App {
    /// Menus with check marks for the current settings.
    pub(crate) fn menus(&self) -> Vec<Menu> {
        let config = &self.state.config;
        build_menus(&MenuFlags {
            minimap: config.general.show_minimap,
            sidebar: self.state.show_sidebar,
            autosave: config.general.autosave,
            tab_size: config.editor.tab_size,
            theme: self.state.theme.name,
        })
    }

    pub(crate) fn execute_menu_action(&mut self, action: MenuAction) {
        log::debug!("Menu action {:?}", action);
        match action {
            MenuAction::NewTab => self.new_tab(),
            MenuAction::NewFile => self.sidebar_action(SidebarAction::NewFile),
            MenuAction::NewFolder => self.sidebar_action(SidebarAction::NewFolder),
            MenuAction::OpenProject => {
                let initial = self
                    .sidebar
                    .root()
                    .map(|p| p.display().to_string())
                    .or_else(|| {
                        std::env::current_dir()
                            .ok()
                            .map(|p| p.display().to_string())
                    })
                    .unwrap_or_default();
                self.show_input("Open Project", "Folder:", initial, InputAction::OpenProject);
            }
            MenuAction::OpenFile => {
                let initial = self
                    .sidebar
                    .tree()
                    .target_dir()
                    .map(|dir| format!("{}/", dir.display()))
                    .unwrap_or_default();
                self.show_input("Open File", "Path:", initial, InputAction::OpenFile);
            }
            MenuAction::Save => self.save_active(),
            MenuAction::SaveAs => self.prompt_save_as(),
            MenuAction::CloseTab => self.request_close_tab(self.active_tab),
            MenuAction::Quit => self.request_quit(),

            MenuAction::Undo => self.editor_command(EditorCommand::Undo),
            MenuAction::Redo => self.editor_command(EditorCommand::Redo),
            MenuAction::Cut => self.editor_command(EditorCommand::Cut),
            MenuAction::Copy => self.editor_command(EditorCommand::Copy),
            MenuAction::Paste => self.editor_command(EditorCommand::Paste),
            MenuAction::SelectAll => self.editor_command(EditorCommand::SelectAll),
            MenuAction::Find => {
                if let Some(tab) = self.active_editor_mut() {
                    tab.open_find();
                }
                self.state.focus = Focus::Editor;
            }
            MenuAction::FindInFiles => {
                let initial = self
                    .active_editor()
                    .and_then(|t| t.selected_text())
                    .filter(|s| !s.contains('\n'))
                    .unwrap_or_default();
                self.show_input("Find in Files", "Search for:", initial, InputAction::FindInFiles);
            }
            MenuAction::GoToLine => {
                let Some(tab) = self.active_editor() else {
                    return;
                };
                let prompt = format!("Line number (1-{}):", tab.text().lines().count().max(1));
                self.show_input("Go to Line", prompt, String::new(), InputAction::GoToLine);
            }

            MenuAction::ToggleMinimap => {
                let general = &mut self.state.config.general;
                general.show_minimap = !general.show_minimap;
                self.update_tab_options();
                self.save_config();
            }
            MenuAction::ToggleSidebar => {
                self.state.show_sidebar = !self.state.show_sidebar;
                if !self.state.show_sidebar && self.state.focus == Focus::Sidebar {
                    self.state.focus = Focus::Editor;
                }
            }
            MenuAction::ToggleAutosave => {
                let general = &mut self.state.config.general;
                general.autosave = !general.autosave;
                let message = if general.autosave { "Autosave on" } else { "Autosave off" };
                self.state.set_info(message);
                self.save_config();
            }
            MenuAction::TabWidth(size) => {
                self.state.config.editor.tab_size = size;
                self.update_tab_options();
                self.state.set_info(format!("Tab width: {}", size));
                self.save_config();
            }

            MenuAction::RunScript => self.run_active_script(),
            MenuAction::ShowTerminal => {
                if self.state.show_bottom && self.state.bottom_view == BottomView::Runner {
                    self.state.show_bottom = false;
                    self.state.focus = Focus::Editor;
                } else {
                    self.state.show_bottom_view(BottomView::Runner);
                }
            }
            MenuAction::StopScript => {
                if self.runner.runner().is_running() {
                    self.runner.stop();
                    self.state.set_info("Stopped");
                }
            }

            MenuAction::SetTheme(name) => self.apply_theme(&name),
            MenuAction::ChooseTheme => {
                self.theme_choices = Theme::available_theme_names();
                self.modal = Some(ActiveModal::Select(Box::new(SelectModal::new(
                    "Theme",
                    self.theme_choices.clone(),
                    Some(self.state.theme.name),
                ))));
            }

            MenuAction::Shortcuts => {
                self.modal = Some(ActiveModal::Info(Box::new(InfoModal::table(
                    "Keyboard Shortcuts",
                    SHORTCUTS,
                ))));
            }
            MenuAction::ShowLog => {
                let entries = capi_logger::entries();
                let text: Vec<String> = entries
                    .iter()
                    .rev()
                    .take(LOG_LINES_SHOWN)
                    .rev()
                    .map(|e| format!("{} {:<5} {}", e.timestamp, e.level.to_str(), e.message))
                    .collect();
                let text = if text.is_empty() {
                    "No log entries.".to_string()
                } else {
                    text.join("\n")
                };
                self.modal = Some(ActiveModal::Info(Box::new(InfoModal::new("Log", text))));
            }
            MenuAction::About => {
                let text = format!(
                    "Capi Editor {}\n\nA terminal code editor with syntax highlighting,\na minimap, a script runner and Python completion.",
                    env!("CARGO_PKG_VERSION")
                );
                self.modal = Some(ActiveModal::Info(Box::new(InfoModal::new("About", text))));
            }
        }
    }

    fn show_input(
        &mut self,
        title: &str,
        prompt: impl Into<String>,
        initial: String,
        action: InputAction,
    ) {
        self.modal = Some(ActiveModal::Input(
            Box::new(InputModal::with_default(title, prompt, initial)),
            action,
        ));
    }

    fn sidebar_action(&mut self, action: SidebarAction) {
        let events = self.sidebar.run_action(action);
        self.process_panel_events(events);
    }

    fn editor_command(&mut self, command: EditorCommand) {
        self.state.focus = Focus::Editor;
        let Some(tab) = self.active_editor_mut() else {
            return;
        };
        match tab.apply_command(command) {
            Ok(events) => self.process_panel_events(events),
            Err(e) => self.state.set_error(format!("{:#}", e)),
        }
    }

    pub(crate) fn apply_theme(&mut self, name: &str) {
        self.state.set_theme(name);
        self.state.set_info(format!("Theme: {}", self.state.theme.name));
        self.save_session();
    }

    fn save_config(&self) {
        if let Err(e) = self.state.config.save() {
            log::warn!("Could not save settings: {:#}", e);
        }
    }

    /// Quit, asking first when tabs have unsaved changes.
    pub(crate) fn request_quit(&mut self) {
        if self.has_unsaved_tabs() {
            self.modal = Some(ActiveModal::Confirm(
                Box::new(ConfirmModal::new(
                    "Quit",
                    "Some tabs have unsaved changes. Quit anyway?",
                )),
                ConfirmAction::Quit,
            ));
        } else {
            self.state.should_quit = true;
        }
    }

    /// Save the active file and run it in the runner panel.
    fn run_active_script(&mut self) {
        let Some(tab) = self.active_editor_mut() else {
            return;
        };
        if tab.is_welcome() {
            self.state.set_error("Nothing to run");
            return;
        }
        let Some(path) = tab.path().map(|p| p.to_path_buf()) else {
            self.state.set_error("Save the file before running it");
            return;
        };
        if tab.is_modified() {
            if let Err(e) = tab.save() {
                self.state.set_error(format!("{:#}", e));
                return;
            }
        }
        self.state.show_bottom_view(BottomView::Runner);
        if let Err(e) = self.runner.run(&path) {
            self.state.set_error(format!("{:#}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::app;
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn quit_with_unsaved_tabs_asks() {
        let mut app = app();
        app.execute_menu_action(MenuAction::Quit);
        assert!(app.state.should_quit);

        let mut app = super::super::tests::app();
        app.new_tab();
        app.tabs[0].apply_command(EditorCommand::InsertChar('x')).unwrap();
        app.execute_menu_action(MenuAction::Quit);
        assert!(!app.state.should_quit);
        assert!(matches!(app.modal, Some(ActiveModal::Confirm(_, ConfirmAction::Quit))));
    }

    #[test]
    fn sidebar_toggle_moves_focus() {
        let mut app = app();
        app.state.focus = Focus::Sidebar;
        app.execute_menu_action(MenuAction::ToggleSidebar);
        assert!(!app.state.show_sidebar);
        assert_eq!(app.state.focus, Focus::Editor);
    }

    #[test]
    fn terminal_toggle() {
        let mut app = app();
        app.execute_menu_action(MenuAction::ShowTerminal);
        assert!(app.state.show_bottom);
        assert_eq!(app.state.focus, Focus::Bottom);
        app.execute_menu_action(MenuAction::ShowTerminal);
        assert!(!app.state.show_bottom);
    }

    #[test]
    fn run_requires_a_saved_file() {
        let mut app = app();
        app.new_tab();
        app.execute_menu_action(MenuAction::RunScript);
        assert!(matches!(app.state.status_message, Some((_, true))));
        assert!(!app.state.show_bottom);
    }

    #[test]
    fn run_unknown_extension_shows_warning() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.xyz");
        fs::write(&file, "").unwrap();

        let mut app = app();
        app.open_file(&file).unwrap();
        app.execute_menu_action(MenuAction::RunScript);
        assert!(app.state.show_bottom);
        let lines = app.runner.runner().output().lines();
        assert_eq!(lines[0].text, "Don't know how to run .xyz");
    }

    #[test]
    fn edit_menu_drives_the_editor() {
        let mut app = app();
        app.new_tab();
        app.tabs[0].apply_command(EditorCommand::InsertChar('a')).unwrap();
        app.execute_menu_action(MenuAction::Undo);
        assert_eq!(app.tabs[0].text(), "");
        app.execute_menu_action(MenuAction::Redo);
        assert_eq!(app.tabs[0].text(), "a");
    }

    #[test]
    fn dialogs_from_menu() {
        let mut app = app();
        app.new_tab();
        app.execute_menu_action(MenuAction::GoToLine);
        assert!(matches!(app.modal, Some(ActiveModal::Input(_, InputAction::GoToLine))));

        app.execute_menu_action(MenuAction::Shortcuts);
        assert!(matches!(app.modal, Some(ActiveModal::Info(_))));
    }
}
