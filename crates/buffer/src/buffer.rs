use anyhow::{bail, Context, Result};
use ropey::Rope;
use std::path::{Path, PathBuf};
use unicode_segmentation::UnicodeSegmentation;

use crate::{Action, Cursor, History, LineEnding};

/// Rope-backed document with undo history.
///
/// Text is held with `\n` line breaks only; CRLF files are converted on
/// load and written back with CRLF.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
    file_path: Option<PathBuf>,
    modified: bool,
    line_ending: LineEnding,
    history: History,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::from_text("")
    }

    /// Buffer without a backing file.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            file_path: None,
            modified: false,
            line_ending: LineEnding::LF,
            history: History::new(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let line_ending = if contents.contains("\r\n") {
            LineEnding::CRLF
        } else {
            LineEnding::LF
        };
        let normalized = match line_ending {
            LineEnding::CRLF => contents.replace("\r\n", "\n"),
            LineEnding::LF => contents,
        };

        Ok(Self {
            rope: Rope::from_str(&normalized),
            file_path: Some(path.to_path_buf()),
            modified: false,
            line_ending,
            history: History::new(),
        })
    }

    pub fn save(&mut self) -> Result<()> {
        match self.file_path.clone() {
            Some(path) => self.save_to(&path),
            None => bail!("No file path set"),
        }
    }

    /// Write to `path` and make it the buffer's file.
    pub fn save_to<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = self.rope.to_string();
        let contents = match self.line_ending {
            LineEnding::LF => text,
            LineEnding::CRLF => text.replace('\n', "\r\n"),
        };

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;

        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        self.history.commit_pending();
        Ok(())
    }

    /// Compare with the file on disk; used after undo/redo so that undoing
    /// back to the saved state clears the modified flag.
    fn differs_from_disk(&self) -> bool {
        let Some(path) = &self.file_path else {
            return true;
        };
        match std::fs::read_to_string(path) {
            Ok(on_disk) => on_disk.replace("\r\n", "\n") != self.rope.to_string(),
            Err(_) => self.modified,
        }
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Line text without its line break.
    pub fn line(&self, index: usize) -> Option<String> {
        if index >= self.line_count() {
            return None;
        }
        let mut line = self.rope.line(index).to_string();
        if line.ends_with('\n') {
            line.pop();
        }
        Some(line)
    }

    pub fn line_len_graphemes(&self, line_idx: usize) -> usize {
        self.line(line_idx)
            .map(|l| l.graphemes(true).count())
            .unwrap_or(0)
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Text between two positions.
    pub fn text_range(&self, start: &Cursor, end: &Cursor) -> Result<String> {
        let start_idx = self.cursor_to_char_idx(start)?;
        let end_idx = self.cursor_to_char_idx(end)?;
        if start_idx >= end_idx {
            return Ok(String::new());
        }
        Ok(self.rope.slice(start_idx..end_idx).to_string())
    }

    /// Position just past the last character.
    pub fn end_cursor(&self) -> Cursor {
        let last = self.line_count().saturating_sub(1);
        Cursor::at(last, self.line_len_graphemes(last))
    }

    /// Insert text, returning the cursor placed after it.
    pub fn insert(&mut self, cursor: &Cursor, text: &str) -> Result<Cursor> {
        if text.is_empty() {
            return Ok(*cursor);
        }
        let cursor = self.clamp(cursor);
        let char_idx = self.cursor_to_char_idx(&cursor)?;
        self.rope.insert(char_idx, text);
        self.modified = true;

        self.history.push(Action::Insert {
            position: cursor,
            text: text.to_string(),
        });

        Ok(advance_cursor(&cursor, text))
    }

    /// Delete the character under the cursor (Delete key).
    pub fn delete_char(&mut self, cursor: &Cursor) -> Result<bool> {
        let char_idx = self.cursor_to_char_idx(cursor)?;
        if char_idx >= self.rope.len_chars() {
            return Ok(false);
        }

        let end_idx = self.next_grapheme_char_idx(cursor, char_idx);
        let deleted = self.rope.slice(char_idx..end_idx).to_string();
        self.rope.remove(char_idx..end_idx);
        self.modified = true;

        self.history.commit_pending();
        self.history.push(Action::Delete {
            position: *cursor,
            text: deleted,
        });
        self.history.commit_pending();
        Ok(true)
    }

    /// Delete the grapheme before the cursor, returning the new cursor.
    pub fn backspace(&mut self, cursor: &Cursor) -> Result<Option<Cursor>> {
        let cursor = self.clamp(cursor);
        let char_idx = self.cursor_to_char_idx(&cursor)?;
        if char_idx == 0 {
            return Ok(None);
        }

        let new_cursor = if cursor.column > 0 {
            Cursor::at(cursor.line, cursor.column - 1)
        } else {
            Cursor::at(cursor.line - 1, self.line_len_graphemes(cursor.line - 1))
        };
        let start_idx = self.cursor_to_char_idx(&new_cursor)?;

        let deleted = self.rope.slice(start_idx..char_idx).to_string();
        self.rope.remove(start_idx..char_idx);
        self.modified = true;

        self.history.push(Action::Delete {
            position: new_cursor,
            text: deleted,
        });

        Ok(Some(new_cursor))
    }

    /// Delete a range and return the removed text.
    pub fn delete_range(&mut self, start: &Cursor, end: &Cursor) -> Result<String> {
        let start_idx = self.cursor_to_char_idx(start)?;
        let end_idx = self.cursor_to_char_idx(end)?;
        if start_idx >= end_idx {
            return Ok(String::new());
        }

        let deleted: String = self.rope.slice(start_idx..end_idx).to_string();
        self.rope.remove(start_idx..end_idx);
        self.modified = true;

        self.history.commit_pending();
        self.history.push(Action::Delete {
            position: self.char_idx_to_cursor(start_idx),
            text: deleted.clone(),
        });
        self.history.commit_pending();
        Ok(deleted)
    }

    /// Replace a range with `text` as one undo step; returns the cursor
    /// after the inserted text.
    pub fn replace_range(&mut self, start: &Cursor, end: &Cursor, text: &str) -> Result<Cursor> {
        let start_idx = self.cursor_to_char_idx(start)?;
        let end_idx = self.cursor_to_char_idx(end)?.max(start_idx);
        let position = self.char_idx_to_cursor(start_idx);

        let deleted = self.rope.slice(start_idx..end_idx).to_string();
        self.rope.remove(start_idx..end_idx);
        self.rope.insert(start_idx, text);
        self.modified = true;

        let mut actions = Vec::with_capacity(2);
        if !deleted.is_empty() {
            actions.push(Action::Delete {
                position,
                text: deleted,
            });
        }
        if !text.is_empty() {
            actions.push(Action::Insert {
                position,
                text: text.to_string(),
            });
        }
        self.history.push_group(actions);

        Ok(advance_cursor(&position, text))
    }

    /// Swap a line with the one above. Returns false at the top.
    pub fn move_line_up(&mut self, line: usize) -> Result<bool> {
        if line == 0 || line >= self.line_count() {
            return Ok(false);
        }
        let upper = self.line(line - 1).unwrap_or_default();
        let lower = self.line(line).unwrap_or_default();
        let end = Cursor::at(line, lower.graphemes(true).count());
        self.replace_range(&Cursor::at(line - 1, 0), &end, &format!("{}\n{}", lower, upper))?;
        Ok(true)
    }

    /// Swap a line with the one below. Returns false at the bottom.
    pub fn move_line_down(&mut self, line: usize) -> Result<bool> {
        if line + 1 >= self.line_count() {
            return Ok(false);
        }
        self.move_line_up(line + 1)
    }

    /// Convert a cursor to a char index; the column is clamped to the line.
    pub fn cursor_to_char_idx(&self, cursor: &Cursor) -> Result<usize> {
        if cursor.line >= self.line_count() {
            bail!("Line {} out of range", cursor.line);
        }

        let line_start = self.rope.line_to_char(cursor.line);
        let line = self.line(cursor.line).unwrap_or_default();
        let char_offset: usize = line
            .graphemes(true)
            .take(cursor.column)
            .map(|g| g.chars().count())
            .sum();
        Ok(line_start + char_offset)
    }

    /// Convert a char index to a cursor (clamped to the document end).
    pub fn char_idx_to_cursor(&self, char_idx: usize) -> Cursor {
        let char_idx = char_idx.min(self.rope.len_chars());
        let line = self.rope.char_to_line(char_idx);
        let line_start = self.rope.line_to_char(line);
        let prefix = self.rope.slice(line_start..char_idx).to_string();
        Cursor::at(line, prefix.graphemes(true).count())
    }

    /// Clamp a cursor into the document.
    pub fn clamp(&self, cursor: &Cursor) -> Cursor {
        let line = cursor.line.min(self.line_count().saturating_sub(1));
        Cursor::at(line, cursor.column.min(self.line_len_graphemes(line)))
    }

    fn next_grapheme_char_idx(&self, cursor: &Cursor, char_idx: usize) -> usize {
        let line = self.line(cursor.line).unwrap_or_default();
        match line.graphemes(true).nth(cursor.column) {
            Some(g) => char_idx + g.chars().count(),
            // At end of line: join with the next one
            None => char_idx + 1,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn set_file_path<P: AsRef<Path>>(&mut self, path: P) {
        self.file_path = Some(path.as_ref().to_path_buf());
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_path
            .as_ref()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// End the current typing run so the next edit is a separate undo step.
    pub fn commit_history(&mut self) {
        self.history.commit_pending();
    }

    pub fn undo(&mut self) -> Result<Option<Cursor>> {
        let Some(action) = self.history.undo() else {
            return Ok(None);
        };
        let cursor = self.apply_action(&action)?;
        self.modified = self.differs_from_disk();
        Ok(Some(cursor))
    }

    pub fn redo(&mut self) -> Result<Option<Cursor>> {
        let Some(action) = self.history.redo() else {
            return Ok(None);
        };
        let cursor = self.apply_action(&action)?;
        self.modified = self.differs_from_disk();
        Ok(Some(cursor))
    }

    fn apply_action(&mut self, action: &Action) -> Result<Cursor> {
        match action {
            Action::Insert { position, text } => {
                let char_idx = self.cursor_to_char_idx(position)?;
                self.rope.insert(char_idx, text);
                Ok(advance_cursor(position, text))
            }
            Action::Delete { position, text } => {
                let char_idx = self.cursor_to_char_idx(position)?;
                let end_idx = (char_idx + text.chars().count()).min(self.rope.len_chars());
                self.rope.remove(char_idx..end_idx);
                Ok(*position)
            }
            Action::Group { actions } => {
                let mut cursor = Cursor::new();
                for action in actions {
                    cursor = self.apply_action(action)?;
                }
                Ok(cursor)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor after inserting `text` at `cursor`.
fn advance_cursor(cursor: &Cursor, text: &str) -> Cursor {
    let mut parts = text.rsplit('\n');
    let last = parts.next().unwrap_or("");
    let newlines = text.matches('\n').count();
    let last_len = last.graphemes(true).count();
    if newlines == 0 {
        Cursor::at(cursor.line, cursor.column + last_len)
    } else {
        Cursor::at(cursor.line + newlines, last_len)
    }
}
