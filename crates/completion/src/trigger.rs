/// Characters that open static suggestions outside Python.
pub const TRIGGER_CHARS: &[char] = &['.', '#', '$', '@', '-', '_', '<', '/'];

/// A key the editor just applied, as seen by the trigger logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedKey {
    Char(char),
    /// Ctrl+Space
    Explicit,
    /// Backspace/Delete
    Erase,
    /// Cursor movement and anything else
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Restart the debounce timer for a semantic request
    ScheduleSemantic,
    /// Recompute keyword suggestions now
    ShowStatic,
    Hide,
}

/// Decide what a key means for completion.
///
/// `semantic` is true when the document is Python and the semantic backend
/// is usable; `popup_visible` keeps suggestions live while erasing.
pub fn decide(key: TypedKey, semantic: bool, popup_visible: bool) -> Trigger {
    match key {
        TypedKey::Explicit if semantic => Trigger::ScheduleSemantic,
        TypedKey::Explicit => Trigger::ShowStatic,
        TypedKey::Char(c) if semantic && (c.is_alphanumeric() || c == '.') => {
            Trigger::ScheduleSemantic
        }
        TypedKey::Char(c) if !semantic && (c.is_alphanumeric() || TRIGGER_CHARS.contains(&c)) => {
            Trigger::ShowStatic
        }
        TypedKey::Erase if popup_visible && semantic => Trigger::ScheduleSemantic,
        TypedKey::Erase if popup_visible => Trigger::ShowStatic,
        _ => Trigger::Hide,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_keys_schedule() {
        assert_eq!(decide(TypedKey::Char('a'), true, false), Trigger::ScheduleSemantic);
        assert_eq!(decide(TypedKey::Char('.'), true, false), Trigger::ScheduleSemantic);
        assert_eq!(decide(TypedKey::Explicit, true, false), Trigger::ScheduleSemantic);
        assert_eq!(decide(TypedKey::Char('('), true, true), Trigger::Hide);
    }

    #[test]
    fn static_keys_show() {
        assert_eq!(decide(TypedKey::Char('x'), false, false), Trigger::ShowStatic);
        assert_eq!(decide(TypedKey::Char('<'), false, false), Trigger::ShowStatic);
        assert_eq!(decide(TypedKey::Explicit, false, false), Trigger::ShowStatic);
        assert_eq!(decide(TypedKey::Char(' '), false, true), Trigger::Hide);
        assert_eq!(decide(TypedKey::Other, false, true), Trigger::Hide);
    }

    #[test]
    fn erasing_refreshes_only_open_popup() {
        assert_eq!(decide(TypedKey::Erase, false, true), Trigger::ShowStatic);
        assert_eq!(decide(TypedKey::Erase, false, false), Trigger::Hide);
        assert_eq!(decide(TypedKey::Erase, true, true), Trigger::ScheduleSemantic);
    }
}
