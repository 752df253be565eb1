//! Main application module.
//!
//! Contains the App struct, the event loop and the handlers it dispatches to.

use anyhow::Result;
use ratatui::{backend::Backend, Terminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use capi_completion::KeywordDb;
use capi_config::Config;
use capi_core::{ConfirmAction, Event, EventHandler, InputAction};
use capi_editor::EditorTab;
use capi_modal::ActiveModal;
use capi_session::Session;
use capi_watcher::{ProjectWatcher, DEFAULT_DEBOUNCE_MS};

use crate::panels::{RunnerPanel, SearchPanel, SidebarPanel};
use crate::state::AppState;

mod event_handler;
mod key_handler;
mod menu_actions;
mod modal_handler;
mod mouse_handler;
mod render;
mod tabs;

use render::ScreenLayout;

/// Poll timeout of the event loop; also the granularity of completion
/// debouncing and output pumping.
const TICK_RATE_MS: u64 = 50;

/// Main application
pub struct App {
    state: AppState,
    tabs: Vec<EditorTab>,
    active_tab: usize,
    sidebar: SidebarPanel,
    runner: RunnerPanel,
    search: SearchPanel,
    modal: Option<ActiveModal<ConfirmAction, InputAction>>,
    /// Names offered by the open theme picker
    theme_choices: Vec<String>,
    keywords: Arc<KeywordDb>,
    watcher: Option<ProjectWatcher>,
    event_handler: EventHandler,
    layout: ScreenLayout,
}

impl App {
    pub fn new(config: Config, keywords: Arc<KeywordDb>) -> Self {
        let watcher = match ProjectWatcher::new(DEFAULT_DEBOUNCE_MS) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                log::error!("Failed to initialize filesystem watcher: {:#}", e);
                None
            }
        };
        let runner = RunnerPanel::new(config.completion.python_command.clone());

        Self {
            state: AppState::new(config),
            tabs: Vec::new(),
            active_tab: 0,
            sidebar: SidebarPanel::new(),
            runner,
            search: SearchPanel::new(),
            modal: None,
            theme_choices: Vec::new(),
            keywords,
            watcher,
            event_handler: EventHandler::new(Duration::from_millis(TICK_RATE_MS)),
            layout: ScreenLayout::default(),
        }
    }

    /// Reopen the project, theme and files of the last session.
    pub fn restore_session(&mut self) {
        let session = match Session::load() {
            Ok(session) => session,
            Err(e) => {
                log::warn!("Could not load session: {:#}", e);
                Session::default()
            }
        };

        if !session.theme.is_empty() {
            self.state.set_theme(&session.theme);
        }
        if let Some(root) = session.existing_root() {
            let root = root.to_path_buf();
            self.open_project(root, false);
        }

        let (files, active) = session.existing_files();
        for path in &files {
            if let Err(e) = self.open_file(path) {
                log::warn!("Could not reopen {}: {:#}", path.display(), e);
            }
        }
        if !self.tabs.is_empty() {
            self.active_tab = active.min(self.tabs.len() - 1);
        }
        self.ensure_tab();
        log::info!("Session restored with {} tabs", self.tabs.len());
    }

    /// Remember root, theme and open files for the next start.
    pub(crate) fn save_session(&self) {
        let with_path: Vec<(usize, PathBuf)> = self
            .tabs
            .iter()
            .enumerate()
            .filter_map(|(i, tab)| tab.path().map(|p| (i, p.to_path_buf())))
            .collect();
        let active_tab = with_path
            .iter()
            .position(|(i, _)| *i == self.active_tab)
            .unwrap_or(0);
        let session = Session {
            root: self.sidebar.root().map(|p| p.to_path_buf()),
            theme: self.state.theme.name.to_string(),
            open_files: with_path.into_iter().map(|(_, p)| p).collect(),
            active_tab,
        };
        if let Err(e) = session.save() {
            log::error!("Could not save session: {:#}", e);
        }
    }

    /// Show `root` in the sidebar and watch it for changes.
    pub(crate) fn open_project(&mut self, root: PathBuf, save: bool) {
        if !root.is_dir() {
            self.state
                .set_error(format!("Not a folder: {}", root.display()));
            return;
        }
        if let Err(e) = self.sidebar.set_root(Some(root.clone())) {
            self.state.set_error(format!("{:#}", e));
            return;
        }
        if let Some(watcher) = self.watcher.as_mut() {
            if let Err(e) = watcher.watch(&root) {
                log::warn!("{:#}", e);
            }
        }
        self.runner.set_working_dir(None);
        self.state.show_sidebar = true;
        self.state.set_info(format!("Project: {}", root.display()));
        log::info!("Opened project {}", root.display());
        if save {
            self.save_session();
        }
    }

    /// Run the main application loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        while !self.state.should_quit {
            if self.state.needs_redraw {
                terminal.draw(|frame| self.render(frame))?;
                self.state.needs_redraw = false;
            }

            match self.event_handler.next()? {
                Event::Key(key) => {
                    self.handle_key_event(key)?;
                    self.state.needs_redraw = true;
                }
                Event::Mouse(mouse) => {
                    self.handle_mouse_event(mouse)?;
                    self.state.needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    self.state.needs_redraw = true;
                }
                Event::Tick => self.on_tick(Instant::now()),
            }
        }
        self.shutdown();
        Ok(())
    }

    /// Background work between key presses.
    fn on_tick(&mut self, now: Instant) {
        if self.runner.poll() {
            self.state.needs_redraw = true;
        }

        if let Some(tab) = self.tabs.get_mut(self.active_tab) {
            if tab.poll_completion(now) {
                self.state.needs_redraw = true;
            }
        }

        if self.watcher.as_ref().is_some_and(|w| w.has_changes()) {
            self.sidebar.refresh();
            self.state.needs_redraw = true;
        }

        if self.state.autosave_due(now) {
            self.state.last_autosave = now;
            if self.autosave() > 0 {
                self.state.needs_redraw = true;
            }
        }
    }

    fn shutdown(&mut self) {
        self.runner.stop();
        self.save_session();
        log::info!("Application closed");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// App with default settings and no external completion process.
    pub(crate) fn app() -> App {
        let mut config = Config::default();
        config.completion.semantic_enabled = false;
        App::new(config, Arc::new(KeywordDb::embedded()))
    }

    #[test]
    fn starts_without_tabs_until_ensured() {
        let mut app = app();
        assert!(app.tabs.is_empty());
        app.ensure_tab();
        assert_eq!(app.tabs.len(), 1);
    }

    #[test]
    fn open_project_rejects_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("a.py");
        std::fs::write(&file, "").unwrap();

        let mut app = app();
        app.open_project(file, false);
        assert!(app.sidebar.root().is_none());
        assert!(matches!(app.state.status_message, Some((_, true))));

        app.open_project(dir.path().to_path_buf(), false);
        assert_eq!(app.sidebar.root(), Some(dir.path()));
    }
}
