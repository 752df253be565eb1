//! Configuration structures for capi settings.

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Application configuration with nested sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General application settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// Editor settings
    #[serde(default)]
    pub editor: EditorSettings,

    /// Autocompletion settings
    #[serde(default)]
    pub completion: CompletionSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Home tab contents
    #[serde(default)]
    pub welcome: WelcomeSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Selected theme name
    #[serde(default = "default_theme_name")]
    pub theme: String,

    /// Periodically write modified tabs that have a path
    #[serde(default = "default_autosave")]
    pub autosave: bool,

    /// Autosave period in seconds
    #[serde(default = "default_autosave_interval_secs")]
    pub autosave_interval_secs: u64,

    /// Show the minimap next to the editor
    #[serde(default = "default_show_minimap")]
    pub show_minimap: bool,

    /// Open the Home tab when no file is open
    #[serde(default = "default_show_welcome")]
    pub show_welcome: bool,
}

/// Editor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Tab size (number of spaces)
    #[serde(default = "default_tab_size")]
    pub tab_size: usize,

    /// Insert the closing bracket or quote when typing an opening one
    #[serde(default = "default_auto_close_brackets")]
    pub auto_close_brackets: bool,

    /// Minimap width in columns
    #[serde(default = "default_minimap_width")]
    pub minimap_width: u16,
}

/// Autocompletion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionSettings {
    /// Minimum prefix length before keyword suggestions appear
    #[serde(default = "default_min_prefix_len")]
    pub min_prefix_len: usize,

    /// Delay before a semantic (jedi) request is sent
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Maximum number of items kept in the popup
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Python interpreter used for the jedi backend
    #[serde(default = "default_python_command")]
    pub python_command: String,

    /// Enable the jedi backend for Python files
    #[serde(default = "default_semantic_enabled")]
    pub semantic_enabled: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log file path (optional)
    #[serde(default)]
    pub file_path: Option<String>,

    /// Minimum log level (debug, info, warn, error)
    #[serde(default = "default_min_level")]
    pub min_level: String,
}

/// Home tab contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeSettings {
    #[serde(default = "default_welcome_title")]
    pub title: String,

    #[serde(default = "default_welcome_features")]
    pub features: Vec<String>,
}

fn default_theme_name() -> String {
    defaults::THEME_NAME.to_string()
}

fn default_autosave() -> bool {
    defaults::AUTOSAVE
}

fn default_autosave_interval_secs() -> u64 {
    defaults::AUTOSAVE_INTERVAL_SECS
}

fn default_show_minimap() -> bool {
    defaults::SHOW_MINIMAP
}

fn default_show_welcome() -> bool {
    defaults::SHOW_WELCOME
}

fn default_tab_size() -> usize {
    defaults::TAB_SIZE
}

fn default_auto_close_brackets() -> bool {
    defaults::AUTO_CLOSE_BRACKETS
}

fn default_minimap_width() -> u16 {
    defaults::MINIMAP_WIDTH
}

fn default_min_prefix_len() -> usize {
    defaults::MIN_PREFIX_LEN
}

fn default_debounce_ms() -> u64 {
    defaults::DEBOUNCE_MS
}

fn default_max_items() -> usize {
    defaults::MAX_COMPLETION_ITEMS
}

fn default_python_command() -> String {
    defaults::PYTHON_COMMAND.to_string()
}

fn default_semantic_enabled() -> bool {
    defaults::SEMANTIC_ENABLED
}

fn default_min_level() -> String {
    defaults::MIN_LOG_LEVEL.to_string()
}

fn default_welcome_title() -> String {
    defaults::WELCOME_TITLE.to_string()
}

fn default_welcome_features() -> Vec<String> {
    defaults::WELCOME_FEATURES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            theme: default_theme_name(),
            autosave: default_autosave(),
            autosave_interval_secs: default_autosave_interval_secs(),
            show_minimap: default_show_minimap(),
            show_welcome: default_show_welcome(),
        }
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            tab_size: default_tab_size(),
            auto_close_brackets: default_auto_close_brackets(),
            minimap_width: default_minimap_width(),
        }
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            min_prefix_len: default_min_prefix_len(),
            debounce_ms: default_debounce_ms(),
            max_items: default_max_items(),
            python_command: default_python_command(),
            semantic_enabled: default_semantic_enabled(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file_path: None,
            min_level: default_min_level(),
        }
    }
}

impl Default for WelcomeSettings {
    fn default() -> Self {
        Self {
            title: default_welcome_title(),
            features: default_welcome_features(),
        }
    }
}
