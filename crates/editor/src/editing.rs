//! Text rules applied while typing: bracket pairs and indentation.

use unicode_segmentation::UnicodeSegmentation;

/// Opening characters that insert their closer.
pub const AUTO_PAIRS: &[(char, char)] = &[('(', ')'), ('{', '}'), ('[', ']'), ('"', '"'), ('\'', '\'')];

/// Brackets that get an indented middle line on Enter.
const BLOCK_PAIRS: &[(char, char)] = &[('{', '}'), ('(', ')'), ('[', ']')];

pub fn closing_pair(c: char) -> Option<char> {
    AUTO_PAIRS.iter().find(|(open, _)| *open == c).map(|(_, close)| *close)
}

/// Leading spaces and tabs of `line`.
pub fn leading_indent(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    &line[..end]
}

/// Text inserted by Enter and where the cursor lands, relative to the
/// line the key was pressed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewlineEdit {
    pub text: String,
    /// Lines below the current one
    pub line_offset: usize,
    pub column: usize,
}

/// Enter at grapheme `column` of `line`.
///
/// The new line keeps the indentation; between an opening bracket and its
/// closer the closer moves down one more line and the cursor sits on an
/// extra-indented middle line.
pub fn newline_edit(line: &str, column: usize, tab_size: usize) -> NewlineEdit {
    let graphemes: Vec<&str> = line.graphemes(true).collect();
    let column = column.min(graphemes.len());
    let indent: String = leading_indent(line).chars().take(column).collect();
    let indent_width = indent.chars().count();

    let char_at = |idx: Option<usize>| -> Option<char> {
        let grapheme = graphemes.get(idx?)?;
        let mut chars = grapheme.chars();
        let c = chars.next()?;
        chars.next().is_none().then_some(c)
    };
    let before = char_at(column.checked_sub(1));
    let after = char_at(Some(column));
    let between_brackets = BLOCK_PAIRS
        .iter()
        .any(|(open, close)| before == Some(*open) && after == Some(*close));

    if between_brackets {
        let inner = format!("{}{}", indent, " ".repeat(tab_size));
        NewlineEdit {
            text: format!("\n{}\n{}", inner, indent),
            line_offset: 1,
            column: indent_width + tab_size,
        }
    } else {
        NewlineEdit {
            text: format!("\n{}", indent),
            line_offset: 1,
            column: indent_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs() {
        assert_eq!(closing_pair('('), Some(')'));
        assert_eq!(closing_pair('"'), Some('"'));
        assert_eq!(closing_pair('<'), None);
    }

    #[test]
    fn indent_is_kept() {
        assert_eq!(leading_indent("    x = 1"), "    ");
        assert_eq!(leading_indent("\tfoo"), "\t");
        assert_eq!(leading_indent("   "), "   ");

        let edit = newline_edit("    x = 1", 9, 4);
        assert_eq!(edit.text, "\n    ");
        assert_eq!((edit.line_offset, edit.column), (1, 4));
    }

    #[test]
    fn enter_inside_indent_takes_only_what_is_left_of_cursor() {
        let edit = newline_edit("        y", 2, 4);
        assert_eq!(edit.text, "\n  ");
        assert_eq!(edit.column, 2);
    }

    #[test]
    fn enter_between_brackets_opens_block() {
        let edit = newline_edit("  if (x) {}", 10, 4);
        assert_eq!(edit.text, "\n      \n  ");
        assert_eq!((edit.line_offset, edit.column), (1, 6));

        let edit = newline_edit("f()", 2, 2);
        assert_eq!(edit.text, "\n  \n");
        assert_eq!(edit.column, 2);
    }

    #[test]
    fn mismatched_brackets_are_plain() {
        let edit = newline_edit("(]", 1, 4);
        assert_eq!(edit.text, "\n");
    }
}
