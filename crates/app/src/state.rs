use std::time::{Duration, Instant};

use capi_config::Config;
use capi_theme::Theme;

use crate::menu::MenuState;

/// Which part of the window receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Editor,
    Bottom,
}

/// What the bottom panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BottomView {
    Runner,
    Search,
}

/// Application state
pub struct AppState {
    pub should_quit: bool,
    pub needs_redraw: bool,
    pub config: Config,
    pub theme: &'static Theme,
    pub focus: Focus,
    pub show_sidebar: bool,
    pub show_bottom: bool,
    pub bottom_view: BottomView,
    /// Status bar message and whether it is an error
    pub status_message: Option<(String, bool)>,
    pub menu: MenuState,
    pub last_autosave: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let theme = Theme::get_by_name(&config.general.theme);
        Self {
            should_quit: false,
            needs_redraw: true,
            config,
            theme,
            focus: Focus::Editor,
            show_sidebar: true,
            show_bottom: false,
            bottom_view: BottomView::Runner,
            status_message: None,
            menu: MenuState::default(),
            last_autosave: Instant::now(),
        }
    }

    pub fn set_info(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), false));
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{}", message);
        self.status_message = Some((message, true));
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    /// Switch theme and remember it in the config.
    pub fn set_theme(&mut self, name: &str) {
        self.theme = Theme::get_by_name(name);
        self.config.general.theme = self.theme.name.to_string();
        log::info!("Theme changed to {}", self.theme.name);
    }

    /// Show the bottom panel with `view` and focus it.
    pub fn show_bottom_view(&mut self, view: BottomView) {
        self.show_bottom = true;
        self.bottom_view = view;
        self.focus = Focus::Bottom;
    }

    /// Next focus target, skipping hidden parts.
    pub fn next_focus(&self) -> Focus {
        let order = [Focus::Sidebar, Focus::Editor, Focus::Bottom];
        let start = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        (1..=order.len())
            .map(|step| order[(start + step) % order.len()])
            .find(|f| match f {
                Focus::Sidebar => self.show_sidebar,
                Focus::Editor => true,
                Focus::Bottom => self.show_bottom,
            })
            .unwrap_or(Focus::Editor)
    }

    /// True once the autosave interval has elapsed since the last run.
    pub fn autosave_due(&self, now: Instant) -> bool {
        let general = &self.config.general;
        general.autosave
            && now.duration_since(self.last_autosave)
                >= Duration::from_secs(general.autosave_interval_secs.max(1))
    }
}
