//! Terminal events and the events panels emit.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};

/// Application event
#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// Poll timeout; drives debounce timers, autosave and output pumping
    Tick,
}

/// Polls crossterm with a fixed timeout.
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Wait for the next event, or a tick when nothing arrives in time.
    pub fn next(&self) -> Result<Event> {
        if !event::poll(self.tick_rate)? {
            return Ok(Event::Tick);
        }
        Ok(match event::read()? {
            // Kitty protocol terminals also report Release/Repeat
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
            CrosstermEvent::Mouse(mouse) => Event::Mouse(mouse),
            CrosstermEvent::Resize(width, height) => Event::Resize(width, height),
            _ => Event::Tick,
        })
    }
}

/// Events emitted by panels to communicate with the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    NeedsRedraw,

    /// Open a file in a tab (or focus the tab already showing it)
    OpenFile(PathBuf),

    /// Open a file and put the cursor on a 1-based line
    OpenFileAt { path: PathBuf, line: usize },

    /// Status bar message
    SetStatus { message: String, is_error: bool },

    ShowConfirm {
        title: String,
        message: String,
        on_confirm: ConfirmAction,
    },

    ShowInput {
        title: String,
        prompt: String,
        initial: String,
        on_submit: InputAction,
    },

    /// Set the runner's working directory and show the runner panel
    OpenInTerminal(PathBuf),

    /// A path was renamed or moved; tabs showing it follow
    PathMoved { from: PathBuf, to: PathBuf },

    /// A path was deleted; tabs showing it (or anything under it) close
    PathDeleted(PathBuf),
}

/// What a confirmed Yes/No dialog does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeletePath(PathBuf),
    /// Paste into this directory replacing the existing destination
    OverwritePaste { target_dir: PathBuf },
    /// Close the tab at this index discarding changes
    CloseTab(usize),
    /// Quit although some tabs have unsaved changes
    Quit,
}

/// What a submitted input dialog does with its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Rename { from: PathBuf },
    GoToLine,
    SaveAs,
    OpenFile,
    OpenProject,
    FindInFiles,
}
