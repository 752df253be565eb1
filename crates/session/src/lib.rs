//! Session persistence: project root, theme and open tabs, restored on the
//! next start.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use capi_config::get_data_dir;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Project root shown in the sidebar
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Theme name; empty means "use the configured theme"
    #[serde(default)]
    pub theme: String,
    /// Files open in tabs, in tab order
    #[serde(default)]
    pub open_files: Vec<PathBuf>,
    /// Index into `open_files` of the focused tab
    #[serde(default)]
    pub active_tab: usize,
}

impl Session {
    /// `<data_dir>/capi/session.toml`
    pub fn session_path() -> Result<PathBuf> {
        Ok(get_data_dir()?.join("session.toml"))
    }

    /// Load the session, or an empty one if none was saved yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::session_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse session file: {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::session_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create session directory: {}", dir.display())
            })?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize session")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write session file: {}", path.display()))?;
        log::debug!("Session saved to {}", path.display());
        Ok(())
    }

    /// Root directory if it still exists.
    pub fn existing_root(&self) -> Option<&Path> {
        self.root.as_deref().filter(|p| p.is_dir())
    }

    /// Open files that still exist, with the active index remapped onto
    /// the surviving list.
    pub fn existing_files(&self) -> (Vec<PathBuf>, usize) {
        let mut active = 0;
        let mut files = Vec::new();
        for (idx, path) in self.open_files.iter().enumerate() {
            if path.is_file() {
                if idx <= self.active_tab {
                    active = files.len();
                }
                files.push(path.clone());
            } else {
                log::info!("Skipping missing session file {}", path.display());
            }
        }
        (files, active)
    }
}
