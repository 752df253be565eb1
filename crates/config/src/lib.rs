//! Configuration management for capi.
//!
//! This crate provides configuration loading and saving in TOML format
//! following XDG directory conventions.

mod settings;
mod xdg;

pub use settings::{
    CompletionSettings, Config, EditorSettings, GeneralSettings, LoggingSettings, WelcomeSettings,
};
pub use xdg::{get_cache_dir, get_config_dir, get_data_dir};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Default values as constants
pub mod defaults {
    pub const THEME_NAME: &str = "Dark";
    pub const AUTOSAVE: bool = true;
    pub const AUTOSAVE_INTERVAL_SECS: u64 = 5;
    pub const SHOW_MINIMAP: bool = true;
    pub const SHOW_WELCOME: bool = true;
    pub const TAB_SIZE: usize = 4;
    pub const TAB_SIZES: &[usize] = &[2, 4, 8];
    pub const AUTO_CLOSE_BRACKETS: bool = true;
    pub const MINIMAP_WIDTH: u16 = 20;
    pub const MIN_PREFIX_LEN: usize = 2;
    pub const DEBOUNCE_MS: u64 = 150;
    pub const MAX_COMPLETION_ITEMS: usize = 50;
    pub const SEMANTIC_ENABLED: bool = true;
    #[cfg(windows)]
    pub const PYTHON_COMMAND: &str = "python";
    #[cfg(not(windows))]
    pub const PYTHON_COMMAND: &str = "python3";
    pub const MIN_LOG_LEVEL: &str = "info";
    pub const WELCOME_TITLE: &str = "Welcome to Capi Editor";
    pub const WELCOME_FEATURES: &[&str] = &[
        "Syntax highlighting for Python, JavaScript, HTML, CSS, PHP and more",
        "Keyword and Python (jedi) autocompletion",
        "Minimap, find/replace and search in files",
        "Run scripts with F5 in the built-in runner",
        "Four themes: Dark, Light, Monokai, Dracula",
    ];
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// On first run, creates the config file with default values
    /// and the user themes directory.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;
        let first_run = !config_path.exists();
        let config = Self::load_from(&config_path)?;
        if first_run {
            Self::ensure_themes_dir()?;
        }
        Ok(config)
    }

    /// Load configuration from an explicit path.
    ///
    /// Missing keys are filled with defaults and the file is rewritten
    /// when its normalized form differs from what is on disk.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let original_content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&original_content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let normalized_content = toml::to_string_pretty(&config)?;
        if original_content != normalized_content {
            config.save_to(path)?;
        }

        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Get path to config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(get_config_dir()?.join("config.toml"))
    }

    /// Get path to user themes directory.
    pub fn themes_dir() -> Result<PathBuf> {
        Ok(get_config_dir()?.join("themes"))
    }

    /// Get path to the optional keyword database override.
    pub fn keywords_file_path() -> Result<PathBuf> {
        Ok(get_config_dir()?.join("keywords.json"))
    }

    /// Check if path is the config file.
    pub fn is_config_file(path: &Path) -> bool {
        Self::config_file_path().map(|p| p == path).unwrap_or(false)
    }

    fn ensure_themes_dir() -> Result<()> {
        let themes_dir = Self::themes_dir()?;
        if !themes_dir.exists() {
            std::fs::create_dir_all(themes_dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.general.theme, defaults::THEME_NAME);
        assert_eq!(config.editor.tab_size, 4);
        assert_eq!(config.completion.debounce_ms, 150);
    }

    #[test]
    fn missing_keys_are_completed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\ntheme = \"Monokai\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.general.theme, "Monokai");
        assert!(config.general.autosave);

        let rewritten = std::fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("autosave_interval_secs"));
        assert!(rewritten.contains("[completion]"));
    }

    #[test]
    fn save_and_reload_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.editor.tab_size = 8;
        config.general.show_minimap = false;
        config.welcome.features = vec!["one".into()];
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.editor.tab_size, 8);
        assert!(!loaded.general.show_minimap);
        assert_eq!(loaded.welcome.features, vec!["one".to_string()]);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general\ntheme = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
