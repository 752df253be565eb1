use crate::item::CompletionItem;

/// Keys the popup reacts to while visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupKey {
    Tab,
    Enter,
    Esc,
    Up,
    Down,
    PageUp,
    PageDown,
    Other,
}

/// What the editor should do with a key after the popup saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupOutcome {
    /// Replace the word before the cursor with this item
    Insert(CompletionItem),
    /// Key handled, nothing else to do
    Consumed,
    /// Let the editor handle the key
    PassThrough,
}

/// Rows moved by PageUp/PageDown
pub const PAGE_SIZE: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct CompletionPopup {
    visible: bool,
    items: Vec<CompletionItem>,
    selected: Option<usize>,
}

impl CompletionPopup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `items` with nothing selected; an empty list hides the popup.
    pub fn show(&mut self, items: Vec<CompletionItem>) {
        if items.is_empty() {
            self.hide();
            return;
        }
        self.items = items;
        self.selected = None;
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.items.clear();
        self.selected = None;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn items(&self) -> &[CompletionItem] {
        &self.items
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&CompletionItem> {
        self.selected.and_then(|i| self.items.get(i))
    }

    fn move_by(&mut self, delta: isize) {
        let Some(last) = self.items.len().checked_sub(1) else {
            return;
        };
        let next = match self.selected {
            None if delta > 0 => (delta - 1) as usize,
            None => 0,
            Some(current) => current.saturating_add_signed(delta),
        };
        self.selected = Some(next.min(last));
    }

    pub fn handle_key(&mut self, key: PopupKey) -> PopupOutcome {
        if !self.visible {
            return PopupOutcome::PassThrough;
        }
        match key {
            PopupKey::Tab => {
                let item = self
                    .selected_item()
                    .or_else(|| self.items.first())
                    .cloned();
                self.hide();
                match item {
                    Some(item) => PopupOutcome::Insert(item),
                    None => PopupOutcome::Consumed,
                }
            }
            PopupKey::Enter => match self.selected_item().cloned() {
                Some(item) => {
                    self.hide();
                    PopupOutcome::Insert(item)
                }
                None => {
                    self.hide();
                    PopupOutcome::PassThrough
                }
            },
            PopupKey::Esc => {
                self.hide();
                PopupOutcome::Consumed
            }
            PopupKey::Up => {
                self.move_by(-1);
                PopupOutcome::Consumed
            }
            PopupKey::Down => {
                self.move_by(1);
                PopupOutcome::Consumed
            }
            PopupKey::PageUp => {
                self.move_by(-(PAGE_SIZE as isize));
                PopupOutcome::Consumed
            }
            PopupKey::PageDown => {
                self.move_by(PAGE_SIZE as isize);
                PopupOutcome::Consumed
            }
            PopupKey::Other => PopupOutcome::PassThrough,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;

    fn popup_with(labels: &[&str]) -> CompletionPopup {
        let mut popup = CompletionPopup::new();
        popup.show(
            labels
                .iter()
                .map(|l| CompletionItem::new(*l, ItemKind::Keyword))
                .collect(),
        );
        popup
    }

    #[test]
    fn tab_takes_first_when_nothing_selected() {
        let mut popup = popup_with(&["alpha", "beta"]);
        match popup.handle_key(PopupKey::Tab) {
            PopupOutcome::Insert(item) => assert_eq!(item.label, "alpha"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(!popup.is_visible());
    }

    #[test]
    fn enter_without_selection_falls_through() {
        let mut popup = popup_with(&["alpha"]);
        assert_eq!(popup.handle_key(PopupKey::Enter), PopupOutcome::PassThrough);
        assert!(!popup.is_visible());
    }

    #[test]
    fn enter_inserts_selected() {
        let mut popup = popup_with(&["alpha", "beta", "gamma"]);
        popup.handle_key(PopupKey::Down);
        popup.handle_key(PopupKey::Down);
        assert_eq!(popup.selected(), Some(1));
        match popup.handle_key(PopupKey::Enter) {
            PopupOutcome::Insert(item) => assert_eq!(item.label, "beta"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn navigation_is_clamped() {
        let mut popup = popup_with(&["a1", "a2", "a3"]);
        popup.handle_key(PopupKey::Up);
        assert_eq!(popup.selected(), Some(0));
        popup.handle_key(PopupKey::PageDown);
        assert_eq!(popup.selected(), Some(2));
        popup.handle_key(PopupKey::PageUp);
        assert_eq!(popup.selected(), Some(0));
    }

    #[test]
    fn esc_hides_and_other_keys_pass() {
        let mut popup = popup_with(&["a1"]);
        assert_eq!(popup.handle_key(PopupKey::Other), PopupOutcome::PassThrough);
        assert!(popup.is_visible());
        assert_eq!(popup.handle_key(PopupKey::Esc), PopupOutcome::Consumed);
        assert!(!popup.is_visible());
        assert_eq!(popup.handle_key(PopupKey::Tab), PopupOutcome::PassThrough);
    }

    #[test]
    fn empty_list_hides() {
        let mut popup = popup_with(&["a1"]);
        popup.show(Vec::new());
        assert!(!popup.is_visible());
    }
}
