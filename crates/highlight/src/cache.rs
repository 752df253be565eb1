//! Line-based highlight cache.
//!
//! Lines are tokenized on demand when drawn; edits drop only the affected
//! entries.

use std::collections::HashMap;
use std::path::Path;
use tree_sitter_highlight::{HighlightEvent, Highlighter};

use crate::{detect_language, token_kind_for_capture, TokenKind, TreeSitterHighlighter, HIGHLIGHT_NAMES};

/// A run of text sharing one token kind.
pub type Segment = (String, TokenKind);

/// Maximum number of cached lines
const MAX_CACHE_SIZE: usize = 1000;

/// Opening tag put in front of PHP code lines, which are tokenized on
/// their own and would otherwise parse as HTML text.
const PHP_OPEN_TAG: &str = "<?php ";

/// Prefix needed to tokenize `line_text` as code of `language`.
fn inline_prefix(language: &str, line_text: &str) -> &'static str {
    let is_markup = line_text.contains("<?") || line_text.trim_start().starts_with('<');
    if language == "php" && !is_markup {
        PHP_OPEN_TAG
    } else {
        ""
    }
}

pub struct HighlightCache {
    /// line index -> (segments, last access tick)
    lines: HashMap<usize, (Vec<Segment>, u64)>,
    language: Option<&'static str>,
    syntax_highlighter: &'static TreeSitterHighlighter,
    access_counter: u64,
    /// Lines tokenized since creation (diagnostics and tests)
    tokenized: u64,
}

impl HighlightCache {
    pub fn new(syntax_highlighter: &'static TreeSitterHighlighter) -> Self {
        Self {
            lines: HashMap::new(),
            language: None,
            syntax_highlighter,
            access_counter: 0,
            tokenized: 0,
        }
    }

    /// Switch language; `None` or an unsupported name means plain text.
    pub fn set_language(&mut self, language: Option<&'static str>) {
        let language = language.filter(|l| self.syntax_highlighter.supports(l));
        if self.language != language {
            self.language = language;
            self.invalidate_all();
        }
    }

    pub fn set_language_from_path(&mut self, path: &Path) {
        self.set_language(detect_language(path));
    }

    pub fn language(&self) -> Option<&'static str> {
        self.language
    }

    pub fn has_syntax(&self) -> bool {
        self.language.is_some()
    }

    /// Segments for a line, tokenizing it if not cached.
    pub fn line_segments(&mut self, line_idx: usize, line_text: &str) -> &[Segment] {
        self.access_counter += 1;
        let tick = self.access_counter;

        if !self.lines.contains_key(&line_idx) {
            let segments = self.compute_line_segments(line_text);
            self.tokenized += 1;
            if self.lines.len() >= MAX_CACHE_SIZE {
                self.evict_lru();
            }
            self.lines.insert(line_idx, (segments, tick));
        }

        match self.lines.get_mut(&line_idx) {
            Some(entry) => {
                entry.1 = tick;
                &entry.0
            }
            None => &[],
        }
    }

    fn compute_line_segments(&self, line_text: &str) -> Vec<Segment> {
        let plain = || vec![(line_text.to_string(), TokenKind::Plain)];

        let Some(language) = self.language else {
            return plain();
        };
        let Some(config) = self.syntax_highlighter.get_config(language) else {
            return plain();
        };

        let registry = self.syntax_highlighter;
        let mut highlighter = Highlighter::new();
        let prefix = inline_prefix(language, line_text);
        let source = format!("{}{}", prefix, line_text);
        let source = source.as_bytes();
        let events = match highlighter.highlight(config, source, None, |injected| {
            registry.get_config(injected)
        }) {
            Ok(events) => events,
            Err(_) => return plain(),
        };

        let mut segments: Vec<Segment> = Vec::new();
        // Innermost capture wins
        let mut stack: Vec<TokenKind> = Vec::new();

        for event in events {
            match event {
                Ok(HighlightEvent::Source { start, end }) => {
                    let start = start.max(prefix.len());
                    if start >= end {
                        continue;
                    }
                    let kind = stack.last().copied().unwrap_or(TokenKind::Plain);
                    let Ok(text) = std::str::from_utf8(&source[start..end]) else {
                        continue;
                    };
                    match segments.last_mut() {
                        Some((last, last_kind)) if *last_kind == kind => last.push_str(text),
                        _ => segments.push((text.to_string(), kind)),
                    }
                }
                Ok(HighlightEvent::HighlightStart(h)) => {
                    let name = HIGHLIGHT_NAMES.get(h.0).copied().unwrap_or("");
                    let kind = token_kind_for_capture(name, language);
                    // Punctuation inside a string stays a string
                    let inherited = match (kind, stack.last()) {
                        (TokenKind::Plain, Some(outer)) => *outer,
                        _ => kind,
                    };
                    stack.push(inherited);
                }
                Ok(HighlightEvent::HighlightEnd) => {
                    stack.pop();
                }
                Err(_) => return plain(),
            }
        }

        if segments.is_empty() {
            plain()
        } else {
            segments
        }
    }

    fn evict_lru(&mut self) {
        let evict_count = MAX_CACHE_SIZE / 5;

        let mut entries: Vec<(usize, u64)> = self
            .lines
            .iter()
            .map(|(line_idx, (_, access_time))| (*line_idx, *access_time))
            .collect();
        entries.sort_by_key(|(_, access_time)| *access_time);

        for (line_idx, _) in entries.iter().take(evict_count) {
            self.lines.remove(line_idx);
        }
    }

    pub fn invalidate_line(&mut self, line_idx: usize) {
        self.lines.remove(&line_idx);
    }

    pub fn invalidate_range(&mut self, start_line: usize, end_line: usize) {
        self.lines.retain(|&l, _| l < start_line || l > end_line);
    }

    /// Drop `line` and everything after it (line indices shifted).
    pub fn invalidate_from(&mut self, line: usize) {
        self.lines.retain(|&l, _| l < line);
    }

    pub fn invalidate_all(&mut self) {
        self.lines.clear();
    }

    /// Apply the invalidation rule for an edit that touched
    /// `first_line..=last_line`.
    pub fn invalidate_edit(&mut self, first_line: usize, last_line: usize, line_count_changed: bool) {
        if line_count_changed {
            self.invalidate_from(first_line);
        } else {
            self.invalidate_range(first_line, last_line);
        }
    }

    pub fn cached_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn tokenized_count(&self) -> u64 {
        self.tokenized
    }
}
