use crate::Cursor;

/// Undoable edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Insert { position: Cursor, text: String },
    Delete { position: Cursor, text: String },
    /// Several edits undone and redone as one step (replace, move line).
    Group { actions: Vec<Action> },
}

fn is_single_char(text: &str) -> bool {
    let mut chars = text.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c != '\n')
}

impl Action {
    pub fn inverse(&self) -> Action {
        match self {
            Action::Insert { position, text } => Action::Delete {
                position: *position,
                text: text.clone(),
            },
            Action::Delete { position, text } => Action::Insert {
                position: *position,
                text: text.clone(),
            },
            Action::Group { actions } => Action::Group {
                actions: actions.iter().rev().map(Action::inverse).collect(),
            },
        }
    }

    /// Typing merges: a single character inserted right after the previous
    /// insertion, or deleted right before the previous backspace, on the
    /// same line.
    fn can_absorb(&self, next: &Action) -> bool {
        match (self, next) {
            (
                Action::Insert {
                    position: p1,
                    text: t1,
                },
                Action::Insert {
                    position: p2,
                    text: t2,
                },
            ) => {
                p1.line == p2.line
                    && is_single_char(t2)
                    && !t1.contains('\n')
                    && p2.column == p1.column + t1.chars().count()
            }
            (
                Action::Delete {
                    position: p1,
                    text: t1,
                },
                Action::Delete {
                    position: p2,
                    text: t2,
                },
            ) => {
                p1.line == p2.line
                    && is_single_char(t2)
                    && !t1.contains('\n')
                    && p2.column + 1 == p1.column
            }
            _ => false,
        }
    }

    fn absorb(&mut self, next: Action) {
        match (self, next) {
            (Action::Insert { text, .. }, Action::Insert { text: t2, .. }) => text.push_str(&t2),
            (
                Action::Delete { position, text },
                Action::Delete {
                    position: p2,
                    text: t2,
                },
            ) => {
                *position = p2;
                text.insert_str(0, &t2);
            }
            _ => {}
        }
    }
}

/// Undo/redo stacks with typing coalescing.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Action>,
    redo_stack: Vec<Action>,
    max_size: usize,
    /// Action still accepting merged keystrokes
    pending_action: Option<Action>,
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
            pending_action: None,
        }
    }

    /// Record an edit, merging it into the pending one when possible.
    pub fn push(&mut self, action: Action) {
        self.redo_stack.clear();

        if let Some(pending) = self.pending_action.as_mut() {
            if pending.can_absorb(&action) {
                pending.absorb(action);
                return;
            }
        }

        self.commit_pending();
        self.pending_action = Some(action);
    }

    /// Record several edits as a single undo step.
    pub fn push_group(&mut self, actions: Vec<Action>) {
        if actions.is_empty() {
            return;
        }
        self.redo_stack.clear();
        self.commit_pending();
        self.push_undo(Action::Group { actions });
    }

    /// Close the pending action so the next edit starts a new undo step.
    pub fn commit_pending(&mut self) {
        if let Some(action) = self.pending_action.take() {
            self.push_undo(action);
        }
    }

    fn push_undo(&mut self, action: Action) {
        self.undo_stack.push(action);
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
    }

    /// Returns the action that reverts the last edit.
    pub fn undo(&mut self) -> Option<Action> {
        self.commit_pending();
        let action = self.undo_stack.pop()?;
        let inverse = action.inverse();
        self.redo_stack.push(action);
        Some(inverse)
    }

    /// Returns the original action to re-apply.
    pub fn redo(&mut self) -> Option<Action> {
        self.commit_pending();
        let action = self.redo_stack.pop()?;
        self.undo_stack.push(action.clone());
        Some(action)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty() || self.pending_action.is_some()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.pending_action = None;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(line: usize, col: usize, text: &str) -> Action {
        Action::Insert {
            position: Cursor::at(line, col),
            text: text.to_string(),
        }
    }

    fn delete(line: usize, col: usize, text: &str) -> Action {
        Action::Delete {
            position: Cursor::at(line, col),
            text: text.to_string(),
        }
    }

    #[test]
    fn typing_becomes_one_undo_step() {
        let mut history = History::new();
        history.push(insert(0, 0, "d"));
        history.push(insert(0, 1, "e"));
        history.push(insert(0, 2, "f"));

        assert_eq!(history.undo(), Some(delete(0, 0, "def")));
        assert!(!history.can_undo());
        assert_eq!(history.redo(), Some(insert(0, 0, "def")));
    }

    #[test]
    fn backspaces_merge_leftwards() {
        let mut history = History::new();
        history.push(delete(2, 3, "c"));
        history.push(delete(2, 2, "b"));
        history.push(delete(2, 1, "a"));

        assert_eq!(history.undo(), Some(insert(2, 1, "abc")));
    }

    #[test]
    fn newline_and_jumps_break_merging() {
        let mut history = History::new();
        history.push(insert(0, 0, "x"));
        history.push(insert(0, 1, "\n"));
        history.push(insert(1, 0, "y"));
        history.push(insert(1, 5, "z"));
        history.commit_pending();
        assert_eq!(history.undo_stack.len(), 4);
    }

    #[test]
    fn non_ascii_single_char_still_merges() {
        let mut history = History::new();
        history.push(insert(0, 0, "ñ"));
        history.push(insert(0, 1, "é"));
        history.commit_pending();
        assert_eq!(history.undo_stack.len(), 1);
    }

    #[test]
    fn group_inverse_reverses_order() {
        let mut history = History::new();
        history.push(insert(0, 0, "a"));
        history.push_group(vec![delete(0, 0, "old"), insert(0, 0, "new")]);

        assert_eq!(
            history.undo(),
            Some(Action::Group {
                actions: vec![delete(0, 0, "new"), insert(0, 0, "old")]
            })
        );
        assert_eq!(history.undo(), Some(delete(0, 0, "a")));
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut history = History::new();
        history.push(insert(0, 0, "a"));
        history.undo();
        assert!(history.can_redo());
        history.push(insert(0, 0, "b"));
        assert!(!history.can_redo());
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut history = History::with_capacity(2);
        history.push_group(vec![insert(0, 0, "1")]);
        history.push_group(vec![insert(0, 0, "2")]);
        history.push_group(vec![insert(0, 0, "3")]);
        assert_eq!(history.undo_stack.len(), 2);
    }
}
