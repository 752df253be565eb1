//! Editor tab management: opening, closing, saving and following files
//! that moved on disk.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use capi_core::{ConfirmAction, InputAction};
use capi_editor::{EditorOptions, EditorTab};
use capi_modal::{ActiveModal, ConfirmModal, InputModal};

use super::App;
use crate::state::Focus;

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

impl App {
    pub(crate) fn editor_options(&self) -> EditorOptions {
        EditorOptions::from_config(&self.state.config)
    }

    pub(crate) fn active_editor(&self) -> Option<&EditorTab> {
        self.tabs.get(self.active_tab)
    }

    pub(crate) fn active_editor_mut(&mut self) -> Option<&mut EditorTab> {
        self.tabs.get_mut(self.active_tab)
    }

    /// Add a tab and focus it. Opening a real document drops the Home tab.
    fn push_tab(&mut self, tab: EditorTab) {
        if !tab.is_welcome() {
            self.tabs.retain(|t| !t.is_welcome());
        }
        self.tabs.push(tab);
        self.active_tab = self.tabs.len() - 1;
        self.state.focus = Focus::Editor;
    }

    /// Keep at least one tab: Home when enabled, else an empty document.
    pub(crate) fn ensure_tab(&mut self) {
        if !self.tabs.is_empty() {
            return;
        }
        let options = self.editor_options();
        let tab = if self.state.config.general.show_welcome {
            EditorTab::welcome(&self.state.config.welcome, options, self.keywords.clone())
        } else {
            EditorTab::untitled(options, self.keywords.clone())
        };
        self.tabs.push(tab);
        self.active_tab = 0;
    }

    pub(crate) fn new_tab(&mut self) {
        let tab = EditorTab::untitled(self.editor_options(), self.keywords.clone());
        self.push_tab(tab);
    }

    /// Focus the tab already showing `path`, or open it in a new one.
    pub(crate) fn open_file(&mut self, path: &Path) -> Result<()> {
        if let Some(index) = self
            .tabs
            .iter()
            .position(|t| t.path().is_some_and(|p| same_file(p, path)))
        {
            self.active_tab = index;
            self.state.focus = Focus::Editor;
            return Ok(());
        }
        let tab = EditorTab::open(path, self.editor_options(), self.keywords.clone())?;
        self.push_tab(tab);
        self.sidebar.reveal(path);
        Ok(())
    }

    /// Open `path` with the cursor on 1-based `line`.
    pub(crate) fn open_file_at(&mut self, path: &Path, line: usize) {
        match self.open_file(path) {
            Ok(()) => {
                if let Some(tab) = self.active_editor_mut() {
                    tab.go_to_line(line);
                }
            }
            Err(e) => self.state.set_error(format!("{:#}", e)),
        }
    }

    /// Close a tab, asking first when it has unsaved changes.
    pub(crate) fn request_close_tab(&mut self, index: usize) {
        let Some(tab) = self.tabs.get(index) else {
            return;
        };
        if tab.is_modified() {
            let message = format!("'{}' has unsaved changes. Close it anyway?", tab.title());
            self.modal = Some(ActiveModal::Confirm(
                Box::new(ConfirmModal::new("Close Tab", message)),
                ConfirmAction::CloseTab(index),
            ));
        } else {
            self.close_tab(index);
        }
    }

    pub(crate) fn close_tab(&mut self, index: usize) {
        if index >= self.tabs.len() {
            return;
        }
        let tab = self.tabs.remove(index);
        log::debug!("Closed tab {}", tab.title());
        if self.active_tab > index || self.active_tab >= self.tabs.len() {
            self.active_tab = self.active_tab.saturating_sub(1);
        }
        self.ensure_tab();
    }

    pub(crate) fn next_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.active_tab = (self.active_tab + 1) % self.tabs.len();
        }
    }

    pub(crate) fn prev_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.active_tab = (self.active_tab + self.tabs.len() - 1) % self.tabs.len();
        }
    }

    /// Save the active tab; a tab without a path asks for one.
    pub(crate) fn save_active(&mut self) {
        let Some(tab) = self.tabs.get_mut(self.active_tab) else {
            return;
        };
        if tab.is_welcome() {
            return;
        }
        if tab.path().is_none() {
            self.prompt_save_as();
            return;
        }
        match tab.save() {
            Ok(()) => {
                let title = tab.title();
                self.state.set_info(format!("Saved {}", title));
            }
            Err(e) => self.state.set_error(format!("{:#}", e)),
        }
    }

    pub(crate) fn prompt_save_as(&mut self) {
        let Some(tab) = self.active_editor() else {
            return;
        };
        if tab.is_welcome() {
            return;
        }
        let initial = match (tab.path(), self.sidebar.tree().target_dir()) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(dir)) => dir.join("untitled.py").display().to_string(),
            (None, None) => String::new(),
        };
        self.modal = Some(ActiveModal::Input(
            Box::new(InputModal::with_default("Save As", "Path:", initial)),
            InputAction::SaveAs,
        ));
    }

    pub(crate) fn save_active_as(&mut self, path: PathBuf) {
        let Some(tab) = self.tabs.get_mut(self.active_tab) else {
            return;
        };
        match tab.save_as(&path) {
            Ok(()) => {
                self.state.set_info(format!("Saved {}", path.display()));
                self.sidebar.refresh();
                self.sidebar.reveal(&path);
            }
            Err(e) => self.state.set_error(format!("{:#}", e)),
        }
    }

    /// Write every modified tab that has a path. Returns how many were saved.
    pub(crate) fn autosave(&mut self) -> usize {
        let mut saved = 0;
        for tab in self.tabs.iter_mut() {
            if tab.is_welcome() || tab.path().is_none() || !tab.is_modified() {
                continue;
            }
            match tab.save() {
                Ok(()) => saved += 1,
                Err(e) => log::error!("Autosave of {} failed: {:#}", tab.title(), e),
            }
        }
        if saved > 0 {
            log::debug!("Autosaved {} files", saved);
        }
        saved
    }

    pub(crate) fn has_unsaved_tabs(&self) -> bool {
        self.tabs.iter().any(|t| t.is_modified())
    }

    /// Point tabs at `to` after `from` (a file or a folder) moved.
    pub(crate) fn follow_moved(&mut self, from: &Path, to: &Path) {
        for tab in self.tabs.iter_mut() {
            let Some(path) = tab.path() else {
                continue;
            };
            if let Ok(rest) = path.strip_prefix(from) {
                let new_path = if rest.as_os_str().is_empty() {
                    to.to_path_buf()
                } else {
                    to.join(rest)
                };
                tab.set_path(new_path);
            }
        }
    }

    /// Close tabs showing `path` or anything below it, discarding edits.
    pub(crate) fn close_deleted(&mut self, path: &Path) {
        let active_path = self.active_editor().and_then(|t| t.path().map(Path::to_path_buf));
        let before = self.tabs.len();
        self.tabs
            .retain(|t| !t.path().is_some_and(|p| p.starts_with(path)));
        if self.tabs.len() == before {
            return;
        }
        self.active_tab = active_path
            .and_then(|p| self.tabs.iter().position(|t| t.path() == Some(p.as_path())))
            .unwrap_or(self.tabs.len().saturating_sub(1));
        self.ensure_tab();
    }

    /// Apply a settings change to every open tab.
    pub(crate) fn update_tab_options(&mut self) {
        let options = self.editor_options();
        for tab in self.tabs.iter_mut() {
            tab.set_tab_size(options.tab_size);
            tab.set_show_minimap(options.show_minimap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::app;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn home_tab_is_replaced_by_first_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.py");
        fs::write(&file, "x = 1\n").unwrap();

        let mut app = app();
        app.ensure_tab();
        assert!(app.tabs[0].is_welcome());

        app.open_file(&file).unwrap();
        assert_eq!(app.tabs.len(), 1);
        assert_eq!(app.tabs[0].path(), Some(file.as_path()));
    }

    #[test]
    fn opening_twice_focuses_existing_tab() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.py");
        let b = dir.path().join("b.py");
        fs::write(&a, "").unwrap();
        fs::write(&b, "").unwrap();

        let mut app = app();
        app.open_file(&a).unwrap();
        app.open_file(&b).unwrap();
        assert_eq!(app.active_tab, 1);

        app.open_file(&dir.path().join(".").join("a.py")).unwrap();
        assert_eq!(app.tabs.len(), 2);
        assert_eq!(app.active_tab, 0);
    }

    #[test]
    fn closing_modified_tab_asks_first() {
        let mut app = app();
        app.new_tab();
        app.tabs[0]
            .apply_command(capi_editor::EditorCommand::InsertChar('x'))
            .unwrap();

        app.request_close_tab(0);
        assert!(matches!(
            app.modal,
            Some(ActiveModal::Confirm(_, ConfirmAction::CloseTab(0)))
        ));
        assert_eq!(app.tabs.len(), 1);

        app.close_tab(0);
        assert_eq!(app.tabs.len(), 1);
        assert!(app.tabs[0].is_welcome());
    }

    #[test]
    fn autosave_writes_modified_files_only() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.py");
        fs::write(&file, "").unwrap();

        let mut app = app();
        app.open_file(&file).unwrap();
        app.new_tab();
        assert_eq!(app.autosave(), 0);

        app.tabs[0]
            .apply_command(capi_editor::EditorCommand::InsertChar('y'))
            .unwrap();
        app.tabs[1]
            .apply_command(capi_editor::EditorCommand::InsertChar('z'))
            .unwrap();
        assert_eq!(app.autosave(), 1);
        assert_eq!(fs::read_to_string(&file).unwrap(), "y");
        assert!(app.tabs[1].is_modified());
    }

    #[test]
    fn tabs_follow_moves_and_deletions() {
        let dir = TempDir::new().unwrap();
        let pkg = dir.path().join("pkg");
        fs::create_dir(&pkg).unwrap();
        let file = pkg.join("m.py");
        fs::write(&file, "").unwrap();
        let other = dir.path().join("other.py");
        fs::write(&other, "").unwrap();

        let mut app = app();
        app.open_file(&file).unwrap();
        app.open_file(&other).unwrap();

        let renamed = dir.path().join("lib");
        app.follow_moved(&pkg, &renamed);
        assert_eq!(app.tabs[0].path(), Some(renamed.join("m.py").as_path()));

        app.close_deleted(&renamed);
        assert_eq!(app.tabs.len(), 1);
        assert_eq!(app.tabs[0].path(), Some(other.as_path()));
        assert_eq!(app.active_tab, 0);
    }

    #[test]
    fn tab_cycling_wraps() {
        let mut app = app();
        app.new_tab();
        app.new_tab();
        app.new_tab();
        assert_eq!(app.active_tab, 2);
        app.next_tab();
        assert_eq!(app.active_tab, 0);
        app.prev_tab();
        assert_eq!(app.active_tab, 2);
    }
}
