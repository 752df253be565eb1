//! Syntax highlighting for capi using tree-sitter.
//!
//! Tokenization is delegated to tree-sitter grammars; capture names are
//! folded into the [`TokenKind`] set that themes assign colors to.

mod cache;
mod language;

pub use cache::{HighlightCache, Segment};
pub use capi_theme::TokenKind;
pub use language::{
    detect_language, display_name, language_from_alias, SUPPORTED_LANGUAGES,
};

use std::collections::HashMap;
use std::sync::OnceLock;
use tree_sitter_highlight::HighlightConfiguration;

static GLOBAL_HIGHLIGHTER: OnceLock<TreeSitterHighlighter> = OnceLock::new();

/// Shared highlighter; grammars are loaded on first use.
pub fn global_highlighter() -> &'static TreeSitterHighlighter {
    GLOBAL_HIGHLIGHTER.get_or_init(TreeSitterHighlighter::new)
}

/// Capture names recognized in highlight queries.
pub const HIGHLIGHT_NAMES: &[&str] = &[
    "attribute",
    "comment",
    "constant",
    "constant.builtin",
    "constructor",
    "embedded",
    "escape",
    "function",
    "function.builtin",
    "function.macro",
    "function.method",
    "keyword",
    "label",
    "module",
    "number",
    "operator",
    "property",
    "punctuation",
    "punctuation.bracket",
    "punctuation.delimiter",
    "punctuation.special",
    "string",
    "string.special",
    "tag",
    "type",
    "type.builtin",
    "variable",
    "variable.builtin",
    "variable.parameter",
];

/// Fold a capture name into a token kind.
///
/// `attribute` means a decorator in Python and an HTML/CSS attribute
/// everywhere else.
pub fn token_kind_for_capture(name: &str, language: &str) -> TokenKind {
    match name {
        "keyword" => TokenKind::Keyword,
        "string" | "string.special" | "escape" => TokenKind::String,
        "comment" => TokenKind::Comment,
        "number" => TokenKind::Number,
        "function" | "function.method" | "function.macro" => TokenKind::Function,
        "function.builtin" | "variable.builtin" => TokenKind::Builtin,
        "type" | "type.builtin" | "constructor" | "module" => TokenKind::Class,
        "constant" | "constant.builtin" => TokenKind::Constant,
        "variable" | "variable.parameter" => TokenKind::Variable,
        "property" => TokenKind::Attribute,
        "attribute" if language == "python" => TokenKind::Decorator,
        "attribute" => TokenKind::Attribute,
        "tag" => TokenKind::Tag,
        "operator" => TokenKind::Operator,
        _ => TokenKind::Plain,
    }
}

/// Grammar registry.
pub struct TreeSitterHighlighter {
    configs: HashMap<&'static str, HighlightConfiguration>,
}

impl TreeSitterHighlighter {
    pub fn new() -> Self {
        let mut configs = HashMap::new();
        let names: Vec<String> = HIGHLIGHT_NAMES.iter().map(|s| s.to_string()).collect();

        let mut load = |name: &'static str,
                        language: tree_sitter::Language,
                        highlights: &str,
                        injections: &str| {
            match HighlightConfiguration::new(language, name, highlights, injections, "") {
                Ok(mut config) => {
                    config.configure(&names);
                    configs.insert(name, config);
                }
                Err(e) => log::warn!("Failed to load {} grammar: {}", name, e),
            }
        };

        load(
            "python",
            tree_sitter_python::LANGUAGE.into(),
            tree_sitter_python::HIGHLIGHTS_QUERY,
            "",
        );
        load(
            "javascript",
            tree_sitter_javascript::LANGUAGE.into(),
            tree_sitter_javascript::HIGHLIGHT_QUERY,
            tree_sitter_javascript::INJECTIONS_QUERY,
        );
        load(
            "typescript",
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            tree_sitter_typescript::HIGHLIGHTS_QUERY,
            "",
        );
        load(
            "tsx",
            tree_sitter_typescript::LANGUAGE_TSX.into(),
            tree_sitter_typescript::HIGHLIGHTS_QUERY,
            "",
        );
        load(
            "html",
            tree_sitter_html::LANGUAGE.into(),
            tree_sitter_html::HIGHLIGHTS_QUERY,
            tree_sitter_html::INJECTIONS_QUERY,
        );
        load(
            "css",
            tree_sitter_css::LANGUAGE.into(),
            tree_sitter_css::HIGHLIGHTS_QUERY,
            "",
        );
        load(
            "php",
            tree_sitter_php::LANGUAGE_PHP.into(),
            tree_sitter_php::HIGHLIGHTS_QUERY,
            tree_sitter_php::INJECTIONS_QUERY,
        );
        load(
            "json",
            tree_sitter_json::LANGUAGE.into(),
            tree_sitter_json::HIGHLIGHTS_QUERY,
            "",
        );
        load(
            "bash",
            tree_sitter_bash::LANGUAGE.into(),
            tree_sitter_bash::HIGHLIGHT_QUERY,
            "",
        );
        load(
            "markdown",
            tree_sitter_md::LANGUAGE.into(),
            tree_sitter_md::HIGHLIGHT_QUERY_BLOCK,
            tree_sitter_md::INJECTION_QUERY_BLOCK,
        );
        load(
            "rust",
            tree_sitter_rust::LANGUAGE.into(),
            tree_sitter_rust::HIGHLIGHTS_QUERY,
            "",
        );
        load(
            "c",
            tree_sitter_c::LANGUAGE.into(),
            tree_sitter_c::HIGHLIGHT_QUERY,
            "",
        );
        load(
            "cpp",
            tree_sitter_cpp::LANGUAGE.into(),
            tree_sitter_cpp::HIGHLIGHT_QUERY,
            "",
        );
        load(
            "java",
            tree_sitter_java::LANGUAGE.into(),
            tree_sitter_java::HIGHLIGHTS_QUERY,
            "",
        );
        load(
            "go",
            tree_sitter_go::LANGUAGE.into(),
            tree_sitter_go::HIGHLIGHTS_QUERY,
            "",
        );
        load(
            "ruby",
            tree_sitter_ruby::LANGUAGE.into(),
            tree_sitter_ruby::HIGHLIGHTS_QUERY,
            "",
        );
        load(
            "toml",
            tree_sitter_toml_ng::LANGUAGE.into(),
            tree_sitter_toml_ng::HIGHLIGHTS_QUERY,
            "",
        );
        load(
            "yaml",
            tree_sitter_yaml::LANGUAGE.into(),
            tree_sitter_yaml::HIGHLIGHTS_QUERY,
            "",
        );

        Self { configs }
    }

    pub fn get_config(&self, language: &str) -> Option<&HighlightConfiguration> {
        self.configs.get(language)
    }

    pub fn supports(&self, language: &str) -> bool {
        self.configs.contains_key(language)
    }
}

impl Default for TreeSitterHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_folding() {
        assert_eq!(token_kind_for_capture("keyword", "php"), TokenKind::Keyword);
        assert_eq!(token_kind_for_capture("type.builtin", "rust"), TokenKind::Class);
        assert_eq!(
            token_kind_for_capture("function.builtin", "python"),
            TokenKind::Builtin
        );
        assert_eq!(
            token_kind_for_capture("attribute", "python"),
            TokenKind::Decorator
        );
        assert_eq!(token_kind_for_capture("attribute", "html"), TokenKind::Attribute);
        assert_eq!(
            token_kind_for_capture("punctuation.bracket", "css"),
            TokenKind::Plain
        );
    }

    #[test]
    fn core_grammars_load() {
        let hl = global_highlighter();
        for lang in ["python", "javascript", "html", "css", "php"] {
            assert!(hl.supports(lang), "{} grammar missing", lang);
        }
    }
}
