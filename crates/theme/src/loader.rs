//! Theme loading from TOML files.

use anyhow::{bail, Result};
use ratatui::style::Color;
use serde::Deserialize;
use std::path::Path;

use crate::{SyntaxColors, Theme};

/// Color representation in TOML: `"#rrggbb"`, a named color, or `{ rgb = [r, g, b] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TomlColor {
    Named(String),
    Rgb { rgb: [u8; 3] },
}

impl TomlColor {
    fn to_color(&self) -> Result<Color> {
        match self {
            TomlColor::Named(name) if name.starts_with('#') => parse_hex(name),
            TomlColor::Named(name) => Ok(match name.as_str() {
                "Black" => Color::Black,
                "Red" => Color::Red,
                "Green" => Color::Green,
                "Yellow" => Color::Yellow,
                "Blue" => Color::Blue,
                "Magenta" => Color::Magenta,
                "Cyan" => Color::Cyan,
                "Gray" => Color::Gray,
                "DarkGray" => Color::DarkGray,
                "LightRed" => Color::LightRed,
                "LightGreen" => Color::LightGreen,
                "LightYellow" => Color::LightYellow,
                "LightBlue" => Color::LightBlue,
                "LightMagenta" => Color::LightMagenta,
                "LightCyan" => Color::LightCyan,
                "White" => Color::White,
                other => bail!("Unknown color name: {}", other),
            }),
            TomlColor::Rgb { rgb } => Ok(Color::Rgb(rgb[0], rgb[1], rgb[2])),
        }
    }
}

fn parse_hex(text: &str) -> Result<Color> {
    let hex = text.trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("Invalid hex color: {}", text);
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
    Ok(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[derive(Debug, Clone, Deserialize)]
struct TomlColors {
    bg: TomlColor,
    window_bg: TomlColor,
    fg: TomlColor,
    select_bg: TomlColor,
    line_bg: TomlColor,
    line_fg: TomlColor,
    splitter: TomlColor,
    error: TomlColor,
    success: TomlColor,
}

#[derive(Debug, Clone, Deserialize)]
struct TomlSyntax {
    keyword: TomlColor,
    string: TomlColor,
    comment: TomlColor,
    function: TomlColor,
    class: TomlColor,
    number: TomlColor,
    builtin: TomlColor,
    variable: TomlColor,
    operator: TomlColor,
    tag: TomlColor,
    attribute: TomlColor,
    decorator: TomlColor,
    constant: TomlColor,
}

#[derive(Debug, Clone, Deserialize)]
struct TomlTheme {
    name: String,
    colors: TomlColors,
    syntax: TomlSyntax,
}

impl TomlTheme {
    fn into_theme(self, name: &'static str) -> Result<Theme> {
        let c = &self.colors;
        let s = &self.syntax;
        Ok(Theme {
            name,
            bg: c.bg.to_color()?,
            window_bg: c.window_bg.to_color()?,
            fg: c.fg.to_color()?,
            select_bg: c.select_bg.to_color()?,
            line_bg: c.line_bg.to_color()?,
            line_fg: c.line_fg.to_color()?,
            splitter: c.splitter.to_color()?,
            error: c.error.to_color()?,
            success: c.success.to_color()?,
            syntax: SyntaxColors {
                keyword: s.keyword.to_color()?,
                string: s.string.to_color()?,
                comment: s.comment.to_color()?,
                function: s.function.to_color()?,
                class: s.class.to_color()?,
                number: s.number.to_color()?,
                builtin: s.builtin.to_color()?,
                variable: s.variable.to_color()?,
                operator: s.operator.to_color()?,
                tag: s.tag.to_color()?,
                attribute: s.attribute.to_color()?,
                decorator: s.decorator.to_color()?,
                constant: s.constant.to_color()?,
            },
        })
    }
}

/// Load theme from a TOML file.
///
/// The theme name is leaked to get a `'static` lifetime; user themes are
/// loaded once and cached for the process lifetime.
pub fn load_theme(path: &Path) -> Result<Theme> {
    let content = std::fs::read_to_string(path)?;
    let toml_theme: TomlTheme = toml::from_str(&content)?;
    let name: &'static str = Box::leak(toml_theme.name.clone().into_boxed_str());
    toml_theme.into_theme(name)
}

/// Load theme from TOML text with a static name.
pub fn load_theme_from_str(content: &str, name: &'static str) -> Result<Theme> {
    let toml_theme: TomlTheme = toml::from_str(content)?;
    toml_theme.into_theme(name)
}
