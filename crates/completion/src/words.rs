//! Word scanning: document words, prefixes and the replacement range.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn word_regex() -> Option<&'static Regex> {
    static WORD: OnceLock<Option<Regex>> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"\b[a-zA-Z_]\w{2,}\b").ok())
        .as_ref()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Distinct identifiers of three or more characters in `text`, in order of
/// first appearance.
pub fn dynamic_words(text: &str) -> Vec<String> {
    let Some(re) = word_regex() else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    re.find_iter(text)
        .map(|m| m.as_str())
        .filter(|w| seen.insert(*w))
        .map(str::to_string)
        .collect()
}

/// Trailing `[A-Za-z0-9_]` run of the text before the cursor.
pub fn static_prefix(before_cursor: &str) -> &str {
    trailing(before_cursor, |c| c.is_ascii_alphanumeric() || c == '_')
}

/// Trailing `[A-Za-z0-9_.]` run, so `os.pa` stays one unit.
pub fn semantic_prefix(before_cursor: &str) -> &str {
    trailing(before_cursor, |c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Identifier part of a dotted prefix (`os.pa` -> `pa`, `os.` -> ``).
pub fn identifier_part(prefix: &str) -> &str {
    prefix.rsplit('.').next().unwrap_or(prefix)
}

fn trailing(text: &str, accept: impl Fn(char) -> bool) -> &str {
    let start = text
        .char_indices()
        .rev()
        .take_while(|(_, c)| accept(*c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[start..]
}

/// Column where the word ending at `column` starts (`line` given as chars).
pub fn word_start(line: &[char], column: usize) -> usize {
    let mut start = column.min(line.len());
    while start > 0 && is_word_char(line[start - 1]) {
        start -= 1;
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_unique_words() {
        let words = dynamic_words("def compute(total, x):\n    return total + compute_all");
        assert_eq!(words, vec!["def", "compute", "total", "return", "compute_all"]);
    }

    #[test]
    fn short_and_numeric_tokens_are_ignored() {
        assert!(dynamic_words("a b 12 ab 3abc").is_empty());
    }

    #[test]
    fn prefixes() {
        assert_eq!(static_prefix("    docu"), "docu");
        assert_eq!(static_prefix("foo("), "");
        assert_eq!(static_prefix("obj.na"), "na");
        assert_eq!(semantic_prefix("x = os.pa"), "os.pa");
        assert_eq!(identifier_part("os.pa"), "pa");
        assert_eq!(identifier_part("os."), "");
        assert_eq!(identifier_part("pri"), "pri");
    }

    #[test]
    fn word_start_scans_back() {
        let line: Vec<char> = "let my_var".chars().collect();
        assert_eq!(word_start(&line, 10), 4);
        assert_eq!(word_start(&line, 4), 4);
        assert_eq!(word_start(&line, 99), 4);
        assert_eq!(word_start(&line, 0), 0);
    }
}
