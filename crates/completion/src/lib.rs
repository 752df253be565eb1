//! Autocompletion for capi.
//!
//! Two sources feed one popup: keyword lists plus words already in the
//! document (all languages), and jedi running in a Python helper process
//! (Python files). Keyword suggestions are computed synchronously on each
//! key; jedi requests are debounced and their answers arrive asynchronously,
//! tagged with a generation id so late answers never overwrite newer state.

pub mod debounce;
pub mod engine;
pub mod item;
pub mod keywords;
pub mod popup;
pub mod rank;
pub mod semantic;
pub mod service;
pub mod trigger;
pub mod words;

pub use engine::{CompletionEngine, DocumentContext, InsertionEdit};
pub use item::{CompletionItem, ItemKind};
pub use keywords::KeywordDb;
pub use popup::{CompletionPopup, PopupKey, PopupOutcome};
pub use semantic::{JediProvider, SemanticProvider, SemanticRequest, SemanticResponse};
pub use service::{SemanticClient, SemanticService};
pub use trigger::TypedKey;
