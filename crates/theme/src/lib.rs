//! Theme system for capi.
//!
//! Four built-in themes are embedded as TOML; users can add their own
//! files to the themes directory, which take precedence over built-ins.

mod colors;
mod loader;

pub use colors::{SyntaxColors, Theme, TokenKind};
pub use loader::{load_theme, load_theme_from_str};

use ratatui::style::Color;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

/// Theme used when none is configured or the configured name is unknown.
pub const DEFAULT_THEME: &str = "Dark";

const THEME_DARK_TOML: &str = include_str!("../themes/dark.toml");
const THEME_LIGHT_TOML: &str = include_str!("../themes/light.toml");
const THEME_MONOKAI_TOML: &str = include_str!("../themes/monokai.toml");
const THEME_DRACULA_TOML: &str = include_str!("../themes/dracula.toml");

static THEME_DARK: OnceLock<Theme> = OnceLock::new();
static THEME_LIGHT: OnceLock<Theme> = OnceLock::new();
static THEME_MONOKAI: OnceLock<Theme> = OnceLock::new();
static THEME_DRACULA: OnceLock<Theme> = OnceLock::new();

static USER_THEMES: OnceLock<Mutex<HashMap<String, &'static Theme>>> = OnceLock::new();

static THEMES_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Set the user themes directory (call once at startup).
pub fn set_themes_dir(path: PathBuf) {
    let _ = THEMES_DIR.set(path);
}

/// Used if an embedded theme fails to parse.
fn fallback_theme(name: &'static str) -> Theme {
    Theme {
        name,
        bg: Color::Black,
        window_bg: Color::Black,
        fg: Color::White,
        select_bg: Color::Blue,
        line_bg: Color::DarkGray,
        line_fg: Color::Gray,
        splitter: Color::DarkGray,
        error: Color::LightRed,
        success: Color::Cyan,
        syntax: SyntaxColors {
            keyword: Color::Blue,
            string: Color::Yellow,
            comment: Color::Green,
            function: Color::LightYellow,
            class: Color::Cyan,
            number: Color::LightGreen,
            builtin: Color::LightCyan,
            variable: Color::LightBlue,
            operator: Color::White,
            tag: Color::Blue,
            attribute: Color::LightBlue,
            decorator: Color::LightYellow,
            constant: Color::LightCyan,
        },
    }
}

fn builtin(cell: &'static OnceLock<Theme>, content: &str, name: &'static str) -> &'static Theme {
    cell.get_or_init(|| match load_theme_from_str(content, name) {
        Ok(theme) => theme,
        Err(e) => {
            eprintln!("Failed to parse built-in theme '{}': {}", name, e);
            fallback_theme(name)
        }
    })
}

fn try_load_user_theme(name: &str) -> Option<&'static Theme> {
    let cache = USER_THEMES.get_or_init(|| Mutex::new(HashMap::new()));

    if let Some(theme) = cache.lock().ok()?.get(name) {
        return Some(*theme);
    }

    let theme_path = THEMES_DIR.get()?.join(format!("{}.toml", name));
    if !theme_path.exists() {
        return None;
    }

    let theme = load_theme(&theme_path).ok()?;
    let static_theme: &'static Theme = Box::leak(Box::new(theme));

    if let Ok(mut cache_lock) = cache.lock() {
        cache_lock.insert(name.to_string(), static_theme);
    }

    Some(static_theme)
}

impl Theme {
    /// Get theme by name.
    ///
    /// User themes are looked up first, then the built-ins. Unknown names
    /// resolve to the default theme.
    pub fn get_by_name(name: &str) -> &'static Theme {
        if let Some(theme) = try_load_user_theme(name) {
            return theme;
        }

        match name {
            "Light" => builtin(&THEME_LIGHT, THEME_LIGHT_TOML, "Light"),
            "Monokai" => builtin(&THEME_MONOKAI, THEME_MONOKAI_TOML, "Monokai"),
            "Dracula" => builtin(&THEME_DRACULA, THEME_DRACULA_TOML, "Dracula"),
            _ => builtin(&THEME_DARK, THEME_DARK_TOML, "Dark"),
        }
    }

    /// Names of the built-in themes, in menu order.
    pub fn all_theme_names() -> &'static [&'static str] {
        &["Dark", "Light", "Monokai", "Dracula"]
    }

    /// Built-in names followed by the user theme files, sorted, without
    /// duplicates.
    pub fn available_theme_names() -> Vec<String> {
        let mut names: Vec<String> = Self::all_theme_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        let mut user = THEMES_DIR
            .get()
            .map(|dir| user_theme_names(dir))
            .unwrap_or_default();
        user.sort();
        for name in user {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

fn user_theme_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_parse_without_fallback() {
        for name in Theme::all_theme_names() {
            let theme = Theme::get_by_name(name);
            assert_eq!(theme.name, *name);
            assert_ne!(*theme, fallback_theme(theme.name));
        }
    }

    #[test]
    fn dark_palette_matches_embedded_file() {
        let dark = Theme::get_by_name("Dark");
        assert_eq!(dark.bg, Color::Rgb(0x1e, 0x1e, 0x1e));
        assert_eq!(dark.syntax.keyword, Color::Rgb(0x56, 0x9c, 0xd6));
        assert_eq!(dark.error, Color::Rgb(0xff, 0x6b, 0x6b));
        assert!(!dark.is_light());
        assert!(Theme::get_by_name("Light").is_light());
    }

    #[test]
    fn unknown_name_falls_back_to_default() {
        assert_eq!(Theme::get_by_name("Solarized").name, DEFAULT_THEME);
    }

    #[test]
    fn user_theme_files_are_listed_by_stem() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("Ocean.toml"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        assert_eq!(user_theme_names(dir.path()), vec!["Ocean".to_string()]);
        assert!(user_theme_names(&dir.path().join("missing")).is_empty());
    }

    #[test]
    fn token_styles() {
        use ratatui::style::Modifier;
        let theme = Theme::get_by_name("Monokai");
        let kw = theme.style_for(TokenKind::Keyword);
        assert_eq!(kw.fg, Some(theme.syntax.keyword));
        assert!(kw.add_modifier.contains(Modifier::BOLD));
        assert!(theme
            .style_for(TokenKind::Comment)
            .add_modifier
            .contains(Modifier::ITALIC));
        assert_eq!(theme.color_for(TokenKind::Plain), theme.fg);
    }
}
