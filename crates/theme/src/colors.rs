//! Theme color definitions.

use ratatui::style::{Color, Modifier, Style};

/// Semantic token kinds a theme assigns colors to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Tag,
    Attribute,
    String,
    Builtin,
    Variable,
    Comment,
    Operator,
    Number,
    Function,
    Class,
    Decorator,
    Constant,
    /// Text without a token kind, drawn in the theme foreground
    Plain,
}

/// Colors for each token kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntaxColors {
    pub keyword: Color,
    pub string: Color,
    pub comment: Color,
    pub function: Color,
    pub class: Color,
    pub number: Color,
    pub builtin: Color,
    pub variable: Color,
    pub operator: Color,
    pub tag: Color,
    pub attribute: Color,
    pub decorator: Color,
    pub constant: Color,
}

/// Application theme.
///
/// UI regions:
/// - `bg` / `fg`: editor background and text
/// - `window_bg`: menu bar, sidebar, bottom panel, status bar
/// - `select_bg`: selection, popup and menu highlight
/// - `line_bg`: current line, tab bar, minimap viewport band
/// - `line_fg`: gutter line numbers, secondary text
/// - `splitter`: borders between panels
/// - `error` / `success`: runner stderr and echoed stdin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    /// Theme name for display
    pub name: &'static str,

    pub bg: Color,
    pub window_bg: Color,
    pub fg: Color,
    pub select_bg: Color,
    pub line_bg: Color,
    pub line_fg: Color,
    pub splitter: Color,
    pub error: Color,
    pub success: Color,

    pub syntax: SyntaxColors,
}

impl Theme {
    /// Foreground color for a token kind.
    pub fn color_for(&self, kind: TokenKind) -> Color {
        let s = &self.syntax;
        match kind {
            TokenKind::Keyword => s.keyword,
            TokenKind::Tag => s.tag,
            TokenKind::Attribute => s.attribute,
            TokenKind::String => s.string,
            TokenKind::Builtin => s.builtin,
            TokenKind::Variable => s.variable,
            TokenKind::Comment => s.comment,
            TokenKind::Operator => s.operator,
            TokenKind::Number => s.number,
            TokenKind::Function => s.function,
            TokenKind::Class => s.class,
            TokenKind::Decorator => s.decorator,
            TokenKind::Constant => s.constant,
            TokenKind::Plain => self.fg,
        }
    }

    /// Full style for a token kind. Keywords and classes are bold,
    /// comments italic.
    pub fn style_for(&self, kind: TokenKind) -> Style {
        let style = Style::default().fg(self.color_for(kind));
        match kind {
            TokenKind::Keyword | TokenKind::Class => style.add_modifier(Modifier::BOLD),
            TokenKind::Comment => style.add_modifier(Modifier::ITALIC),
            _ => style,
        }
    }

    /// Whether the editor background is light (used to dim minimap colors).
    pub fn is_light(&self) -> bool {
        match self.bg {
            Color::Rgb(r, g, b) => (r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000 > 128,
            Color::White | Color::Gray => true,
            _ => false,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        *Self::get_by_name(crate::DEFAULT_THEME)
    }
}
