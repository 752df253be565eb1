//! Modal window handling: feeding input to the open dialog and carrying
//! out what it was opened for.

use anyhow::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use std::path::PathBuf;

use capi_core::{ConfirmAction, InputAction, PanelEvent};
use capi_file_tree::operations;
use capi_modal::{ActiveModal, Modal, ModalResult};
use capi_text_search::ProjectSearch;

use super::App;
use crate::state::BottomView;

enum ModalInput {
    Key(KeyEvent),
    Mouse(MouseEvent),
}

/// A closed dialog together with the action it carried.
enum ModalOutcome {
    Confirm(ModalResult<bool>, ConfirmAction),
    Input(ModalResult<String>, InputAction),
    Select(ModalResult<usize>),
    Info,
}

fn feed<M: Modal>(modal: &mut M, input: &ModalInput) -> Result<Option<ModalResult<M::Result>>> {
    match input {
        ModalInput::Key(key) => modal.handle_key(*key),
        ModalInput::Mouse(mouse) => modal.handle_mouse(*mouse),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(text: &str) -> PathBuf {
    match text.strip_prefix('~') {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
            None => PathBuf::from(text),
        },
        None => PathBuf::from(text),
    }
}

impl App {
    /// Handle keyboard event in modal window
    pub(super) fn handle_modal_key(&mut self, key: KeyEvent) -> Result<()> {
        self.feed_modal(ModalInput::Key(key))
    }

    pub(super) fn handle_modal_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        self.feed_modal(ModalInput::Mouse(mouse))
    }

    fn feed_modal(&mut self, input: ModalInput) -> Result<()> {
        let Some(modal) = self.modal.as_mut() else {
            return Ok(());
        };
        let outcome = match modal {
            ActiveModal::Confirm(m, action) => {
                feed(m.as_mut(), &input)?.map(|r| ModalOutcome::Confirm(r, action.clone()))
            }
            ActiveModal::Input(m, action) => {
                feed(m.as_mut(), &input)?.map(|r| ModalOutcome::Input(r, action.clone()))
            }
            ActiveModal::Select(m) => feed(m.as_mut(), &input)?.map(ModalOutcome::Select),
            ActiveModal::Info(m) => feed(m.as_mut(), &input)?.map(|_| ModalOutcome::Info),
        };

        if let Some(outcome) = outcome {
            self.modal = None;
            self.apply_modal_outcome(outcome);
        }
        Ok(())
    }

    fn apply_modal_outcome(&mut self, outcome: ModalOutcome) {
        match outcome {
            ModalOutcome::Confirm(ModalResult::Confirmed(true), action) => self.on_confirm(action),
            ModalOutcome::Input(ModalResult::Confirmed(text), action) => self.on_submit(action, text),
            ModalOutcome::Select(ModalResult::Confirmed(index)) => {
                if let Some(name) = self.theme_choices.get(index).cloned() {
                    self.apply_theme(&name);
                }
                self.theme_choices.clear();
            }
            ModalOutcome::Select(ModalResult::Cancelled) => self.theme_choices.clear(),
            _ => {}
        }
    }

    fn on_confirm(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::DeletePath(path) => match operations::delete(&path) {
                Ok(()) => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    self.state.set_info(format!("Deleted '{}'", name));
                    self.process_panel_events(vec![PanelEvent::PathDeleted(path)]);
                }
                Err(e) => self.state.set_error(format!("{:#}", e)),
            },
            ConfirmAction::OverwritePaste { target_dir } => {
                let events = self.sidebar.paste_into(target_dir, true);
                self.process_panel_events(events);
            }
            ConfirmAction::CloseTab(index) => self.close_tab(index),
            ConfirmAction::Quit => self.state.should_quit = true,
        }
    }

    /// Path typed into a dialog; relative paths are taken from the project.
    fn resolve_path(&self, text: &str) -> PathBuf {
        let path = expand_home(text.trim());
        match self.sidebar.root() {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }

    fn on_submit(&mut self, action: InputAction, text: String) {
        match action {
            InputAction::Rename { from } => match operations::rename(&from, &text) {
                Ok(to) => {
                    self.process_panel_events(vec![PanelEvent::PathMoved {
                        from,
                        to: to.clone(),
                    }]);
                    self.sidebar.reveal(&to);
                }
                Err(e) => self.state.set_error(format!("{:#}", e)),
            },
            InputAction::GoToLine => match text.trim().parse::<usize>() {
                Ok(line) if line > 0 => {
                    if let Some(tab) = self.active_editor_mut() {
                        tab.go_to_line(line);
                    }
                }
                _ => self
                    .state
                    .set_error(format!("Invalid line number: {}", text.trim())),
            },
            InputAction::SaveAs => {
                let path = self.resolve_path(&text);
                self.save_active_as(path);
            }
            InputAction::OpenFile => {
                let path = self.resolve_path(&text);
                if let Err(e) = self.open_file(&path) {
                    self.state.set_error(format!("{:#}", e));
                }
            }
            InputAction::OpenProject => {
                let path = expand_home(text.trim());
                self.open_project(path, true);
            }
            InputAction::FindInFiles => self.find_in_files(text.trim()),
        }
    }

    fn find_in_files(&mut self, query: &str) {
        let Some(root) = self.sidebar.root().map(|p| p.to_path_buf()) else {
            self.state.set_error("Open a project first");
            return;
        };
        let hits = ProjectSearch::default().search(&root, query);
        self.state
            .set_info(format!("{} results for '{}'", hits.len(), query));
        self.search.set_results(query, hits);
        self.state.show_bottom_view(BottomView::Search);
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::app;
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::fs;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key_event(key(KeyCode::Char(c))).unwrap();
        }
    }

    #[test]
    fn go_to_line_dialog() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("m.py");
        let text: String = (1..=20).map(|i| format!("v{}\n", i)).collect();
        fs::write(&file, text).unwrap();

        let mut app = app();
        app.open_file(&file).unwrap();
        app.process_panel_events(vec![PanelEvent::ShowInput {
            title: "Go to Line".into(),
            prompt: "Line:".into(),
            initial: String::new(),
            on_submit: InputAction::GoToLine,
        }]);
        type_text(&mut app, "15");
        app.handle_key_event(key(KeyCode::Enter)).unwrap();

        assert!(app.modal.is_none());
        assert_eq!(app.tabs[0].cursor().line, 14);
    }

    #[test]
    fn invalid_line_is_reported() {
        let mut app = app();
        app.new_tab();
        app.on_submit(InputAction::GoToLine, "abc".into());
        assert!(matches!(app.state.status_message, Some((_, true))));
    }

    #[test]
    fn rename_moves_open_tab() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("old.py");
        fs::write(&file, "").unwrap();

        let mut app = app();
        app.open_project(dir.path().to_path_buf(), false);
        app.open_file(&file).unwrap();
        app.on_submit(InputAction::Rename { from: file.clone() }, "new.py".into());

        let renamed = dir.path().join("new.py");
        assert!(renamed.exists());
        assert_eq!(app.tabs[0].path(), Some(renamed.as_path()));
    }

    #[test]
    fn confirmed_delete_closes_tab() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("gone.py");
        fs::write(&file, "").unwrap();

        let mut app = app();
        app.open_file(&file).unwrap();
        app.on_confirm(ConfirmAction::DeletePath(file.clone()));
        assert!(!file.exists());
        assert!(app.tabs.iter().all(|t| t.path() != Some(file.as_path())));
    }

    #[test]
    fn cancelled_confirm_does_nothing() {
        let mut app = app();
        app.process_panel_events(vec![PanelEvent::ShowConfirm {
            title: "Quit".into(),
            message: "Quit?".into(),
            on_confirm: ConfirmAction::Quit,
        }]);
        app.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert!(app.modal.is_none());
        assert!(!app.state.should_quit);
    }

    #[test]
    fn relative_paths_resolve_against_project() {
        let dir = TempDir::new().unwrap();
        let mut app = app();
        assert_eq!(app.resolve_path("a.py"), PathBuf::from("a.py"));
        app.open_project(dir.path().to_path_buf(), false);
        assert_eq!(app.resolve_path(" src/a.py "), dir.path().join("src/a.py"));
        assert_eq!(app.resolve_path("/abs/a.py"), PathBuf::from("/abs/a.py"));
    }

    #[test]
    fn find_in_files_fills_results() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "import os\nprint('hello')\n").unwrap();

        let mut app = app();
        app.find_in_files("hello");
        assert!(matches!(app.state.status_message, Some((_, true))));

        app.open_project(dir.path().to_path_buf(), false);
        app.find_in_files("HELLO");
        assert_eq!(app.search.hits().len(), 1);
        assert_eq!(app.state.bottom_view, BottomView::Search);
        assert!(app.state.show_bottom);
    }
}
