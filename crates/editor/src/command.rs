//! Key bindings of the text area.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Editor command for one key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    LineStart,
    LineEnd,
    PageUp,
    PageDown,
    DocumentStart,
    DocumentEnd,

    SelectUp,
    SelectDown,
    SelectLeft,
    SelectRight,
    SelectLineStart,
    SelectLineEnd,
    SelectPageUp,
    SelectPageDown,
    SelectDocumentStart,
    SelectDocumentEnd,
    SelectAll,

    InsertChar(char),
    InsertNewline,
    InsertTab,
    Backspace,
    Delete,

    Undo,
    Redo,
    Copy,
    Cut,
    Paste,
    MoveLineUp,
    MoveLineDown,
    TriggerCompletion,

    None,
}

impl EditorCommand {
    /// Map a key to a command. Editing keys map to `None` in read-only tabs.
    pub fn from_key_event(key: KeyEvent, read_only: bool) -> Self {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        let command = match key.code {
            KeyCode::Up if alt => Self::MoveLineUp,
            KeyCode::Down if alt => Self::MoveLineDown,
            KeyCode::Up if shift => Self::SelectUp,
            KeyCode::Down if shift => Self::SelectDown,
            KeyCode::Left if shift => Self::SelectLeft,
            KeyCode::Right if shift => Self::SelectRight,
            KeyCode::Home if ctrl && shift => Self::SelectDocumentStart,
            KeyCode::End if ctrl && shift => Self::SelectDocumentEnd,
            KeyCode::Home if shift => Self::SelectLineStart,
            KeyCode::End if shift => Self::SelectLineEnd,
            KeyCode::PageUp if shift => Self::SelectPageUp,
            KeyCode::PageDown if shift => Self::SelectPageDown,
            KeyCode::Home if ctrl => Self::DocumentStart,
            KeyCode::End if ctrl => Self::DocumentEnd,
            KeyCode::Up => Self::MoveUp,
            KeyCode::Down => Self::MoveDown,
            KeyCode::Left => Self::MoveLeft,
            KeyCode::Right => Self::MoveRight,
            KeyCode::Home => Self::LineStart,
            KeyCode::End => Self::LineEnd,
            KeyCode::PageUp => Self::PageUp,
            KeyCode::PageDown => Self::PageDown,

            KeyCode::Char(' ') if ctrl => Self::TriggerCompletion,
            KeyCode::Char('a') if ctrl => Self::SelectAll,
            KeyCode::Char('c') if ctrl => Self::Copy,
            KeyCode::Char('x') if ctrl => Self::Cut,
            KeyCode::Char('v') if ctrl => Self::Paste,
            KeyCode::Char('z') if ctrl => Self::Undo,
            KeyCode::Char('y') if ctrl => Self::Redo,
            KeyCode::Char(_) if ctrl || alt => Self::None,
            KeyCode::Char(c) => Self::InsertChar(c),
            KeyCode::Enter => Self::InsertNewline,
            KeyCode::Tab => Self::InsertTab,
            KeyCode::Backspace => Self::Backspace,
            KeyCode::Delete => Self::Delete,
            _ => Self::None,
        };

        if read_only && command.edits() {
            Self::None
        } else {
            command
        }
    }

    /// True for commands that change the text.
    pub fn edits(self) -> bool {
        matches!(
            self,
            Self::InsertChar(_)
                | Self::InsertNewline
                | Self::InsertTab
                | Self::Backspace
                | Self::Delete
                | Self::Undo
                | Self::Redo
                | Self::Cut
                | Self::Paste
                | Self::MoveLineUp
                | Self::MoveLineDown
                | Self::TriggerCompletion
        )
    }

    /// Shift-movement that extends the selection.
    pub fn selects(self) -> bool {
        matches!(
            self,
            Self::SelectUp
                | Self::SelectDown
                | Self::SelectLeft
                | Self::SelectRight
                | Self::SelectLineStart
                | Self::SelectLineEnd
                | Self::SelectPageUp
                | Self::SelectPageDown
                | Self::SelectDocumentStart
                | Self::SelectDocumentEnd
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn plain_keys() {
        assert_eq!(
            EditorCommand::from_key_event(key(KeyCode::Char('a'), KeyModifiers::NONE), false),
            EditorCommand::InsertChar('a')
        );
        assert_eq!(
            EditorCommand::from_key_event(key(KeyCode::Char('A'), KeyModifiers::SHIFT), false),
            EditorCommand::InsertChar('A')
        );
        assert_eq!(
            EditorCommand::from_key_event(key(KeyCode::Enter, KeyModifiers::NONE), false),
            EditorCommand::InsertNewline
        );
    }

    #[test]
    fn modifiers() {
        assert_eq!(
            EditorCommand::from_key_event(key(KeyCode::Char(' '), KeyModifiers::CONTROL), false),
            EditorCommand::TriggerCompletion
        );
        assert_eq!(
            EditorCommand::from_key_event(key(KeyCode::Up, KeyModifiers::ALT), false),
            EditorCommand::MoveLineUp
        );
        assert_eq!(
            EditorCommand::from_key_event(
                key(KeyCode::End, KeyModifiers::CONTROL | KeyModifiers::SHIFT),
                false
            ),
            EditorCommand::SelectDocumentEnd
        );
        assert_eq!(
            EditorCommand::from_key_event(key(KeyCode::Char('q'), KeyModifiers::CONTROL), false),
            EditorCommand::None
        );
    }

    #[test]
    fn read_only_blocks_edits_only() {
        let ro = |code, mods| EditorCommand::from_key_event(key(code, mods), true);
        assert_eq!(ro(KeyCode::Char('a'), KeyModifiers::NONE), EditorCommand::None);
        assert_eq!(ro(KeyCode::Char('v'), KeyModifiers::CONTROL), EditorCommand::None);
        assert_eq!(ro(KeyCode::Char('c'), KeyModifiers::CONTROL), EditorCommand::Copy);
        assert_eq!(ro(KeyCode::Down, KeyModifiers::SHIFT), EditorCommand::SelectDown);
    }
}
