//! Text search and replace for capi.
//!
//! Document search works on plain text and reports matches in char columns
//! so the editor can map them straight onto buffer cursors. Project search
//! lives in [`project`].

use anyhow::{Context, Result};
use regex::{NoExpand, Regex};

pub mod project;

pub use project::{result_labels, ProjectHit, ProjectSearch};

/// Search direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDirection {
    #[default]
    Forward,
    Backward,
}

/// A match location in text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Line number (0-indexed).
    pub line: usize,
    /// Column (character offset, 0-indexed).
    pub col: usize,
    /// Match length in characters.
    pub len: usize,
}

impl Match {
    pub fn end_col(&self) -> usize {
        self.col + self.len
    }
}

/// Search options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Case-sensitive search.
    pub case_sensitive: bool,
    /// Use regex pattern.
    pub regex: bool,
    /// Whole word only.
    pub whole_word: bool,
}

fn build_regex(pattern: &str, options: &SearchOptions) -> Result<Regex> {
    let mut source = if options.regex {
        pattern.to_string()
    } else {
        regex::escape(pattern)
    };
    if options.whole_word {
        source = format!(r"\b(?:{})\b", source);
    }
    if !options.case_sensitive {
        source = format!("(?i){}", source);
    }
    Regex::new(&source).with_context(|| format!("Invalid pattern '{}'", pattern))
}

/// Search in text and return all matches. Invalid patterns match nothing.
pub fn find_all(text: &str, pattern: &str, options: &SearchOptions) -> Vec<Match> {
    if pattern.is_empty() {
        return vec![];
    }
    match build_regex(pattern, options) {
        Ok(regex) => collect_matches(text, &regex),
        Err(_) => vec![],
    }
}

fn collect_matches(text: &str, regex: &Regex) -> Vec<Match> {
    let mut matches = Vec::new();
    for (line_idx, line) in text.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        for mat in regex.find_iter(line) {
            if mat.as_str().is_empty() {
                continue;
            }
            matches.push(Match {
                line: line_idx,
                col: line[..mat.start()].chars().count(),
                len: mat.as_str().chars().count(),
            });
        }
    }
    matches
}

/// Index of the nearest match from (`line`, `col`), wrapping around.
///
/// Forward takes the first match starting at or after the position;
/// backward takes the last match starting strictly before it.
pub fn find_closest(
    matches: &[Match],
    line: usize,
    col: usize,
    direction: SearchDirection,
) -> Option<usize> {
    if matches.is_empty() {
        return None;
    }

    match direction {
        SearchDirection::Forward => matches
            .iter()
            .position(|m| m.line > line || (m.line == line && m.col >= col))
            .or(Some(0)),
        SearchDirection::Backward => matches
            .iter()
            .rposition(|m| m.line < line || (m.line == line && m.col < col))
            .or(Some(matches.len() - 1)),
    }
}

/// Replace every match in `text`. Returns the new text and the number of
/// replacements. In regex mode `$1`-style group references are expanded.
pub fn replace_all(
    text: &str,
    pattern: &str,
    replacement: &str,
    options: &SearchOptions,
) -> Result<(String, usize)> {
    if pattern.is_empty() {
        return Ok((text.to_string(), 0));
    }
    let regex = build_regex(pattern, options)?;
    let count = collect_matches(text, &regex).len();

    let replaced: Vec<String> = text
        .split('\n')
        .map(|line| {
            if options.regex {
                regex.replace_all(line, replacement).into_owned()
            } else {
                regex.replace_all(line, NoExpand(replacement)).into_owned()
            }
        })
        .collect();
    Ok((replaced.join("\n"), count))
}

/// Find state of one editor: the query, its matches and the current one.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    query: String,
    options: SearchOptions,
    matches: Vec<Match>,
    current: Option<usize>,
    error: Option<String>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Change the query and recompute matches against `text`.
    pub fn set_query(&mut self, query: &str, text: &str) {
        self.query = query.to_string();
        self.refresh(text);
    }

    pub fn set_options(&mut self, options: SearchOptions, text: &str) {
        self.options = options;
        self.refresh(text);
    }

    /// Recompute matches after the document changed.
    pub fn refresh(&mut self, text: &str) {
        self.error = None;
        self.current = None;
        self.matches.clear();
        if self.query.is_empty() {
            return;
        }
        match build_regex(&self.query, &self.options) {
            Ok(regex) => self.matches = collect_matches(text, &regex),
            Err(e) => self.error = Some(format!("{:#}", e)),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn count(&self) -> usize {
        self.matches.len()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_match(&self) -> Option<Match> {
        self.current.and_then(|i| self.matches.get(i).copied())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Next match at or after the cursor, wrapping to the start.
    pub fn find_next(&mut self, line: usize, col: usize) -> Option<Match> {
        self.current = find_closest(&self.matches, line, col, SearchDirection::Forward);
        self.current_match()
    }

    /// Previous match before the cursor, wrapping to the end.
    pub fn find_prev(&mut self, line: usize, col: usize) -> Option<Match> {
        self.current = find_closest(&self.matches, line, col, SearchDirection::Backward);
        self.current_match()
    }

    /// Label for the find bar: `3 of 7`, `No matches` or the pattern error.
    pub fn status(&self) -> String {
        if let Some(error) = &self.error {
            return error.clone();
        }
        match (self.current, self.matches.len()) {
            (_, 0) if self.query.is_empty() => String::new(),
            (_, 0) => "No matches".to_string(),
            (Some(i), n) => format!("{} of {}", i + 1, n),
            (None, n) => format!("{} matches", n),
        }
    }
}
