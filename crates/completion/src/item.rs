/// Where a suggestion came from, shown as a marker in the popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Keyword list or a word already in the document
    Keyword,
    Function,
    Class,
    /// Any other semantic completion (variable, module, parameter, ...)
    Variable,
}

impl ItemKind {
    /// Map a jedi completion type.
    pub fn from_jedi_type(kind: &str) -> Self {
        match kind {
            "function" => ItemKind::Function,
            "class" => ItemKind::Class,
            _ => ItemKind::Variable,
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            ItemKind::Keyword => "[kw]",
            ItemKind::Function => "[ƒ]",
            ItemKind::Class => "[c]",
            ItemKind::Variable => "[v]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    /// Text inserted in place of the word being typed
    pub label: String,
    pub kind: ItemKind,
}

impl CompletionItem {
    pub fn new(label: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            label: label.into(),
            kind,
        }
    }
}
