//! Per-document completion state.
//!
//! The editor reports every key it applied through [`CompletionEngine::after_key`],
//! calls [`CompletionEngine::tick`] on each frame and forwards keys to
//! [`CompletionEngine::handle_popup_key`] while the popup is open.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use capi_config::CompletionSettings;

use crate::debounce::Debouncer;
use crate::item::CompletionItem;
use crate::keywords::KeywordDb;
use crate::popup::{CompletionPopup, PopupKey, PopupOutcome};
use crate::rank::{rank_semantic, rank_static};
use crate::semantic::{SemanticProvider, SemanticRequest};
use crate::service::SemanticService;
use crate::trigger::{decide, Trigger, TypedKey};
use crate::words::{dynamic_words, identifier_part, semantic_prefix, static_prefix, word_start};

/// Snapshot of the document around the cursor.
#[derive(Debug, Clone, Copy)]
pub struct DocumentContext<'a> {
    /// Whole document
    pub text: &'a str,
    /// Current line up to the cursor
    pub before_cursor: &'a str,
    /// 0-based line of the cursor
    pub line: usize,
    /// 0-based column of the cursor, in chars
    pub column: usize,
    pub path: Option<&'a Path>,
}

/// Replace columns `start_col..end_col` of the cursor line with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionEdit {
    pub start_col: usize,
    pub end_col: usize,
    pub text: String,
}

pub struct CompletionEngine {
    settings: CompletionSettings,
    keywords: Arc<KeywordDb>,
    language: Option<&'static str>,
    popup: CompletionPopup,
    debouncer: Debouncer,
    semantic: &'static SemanticService,
    provider: Option<Box<dyn SemanticProvider>>,
    /// Id of the newest semantic request; older responses are stale
    generation: u64,
}

impl CompletionEngine {
    pub fn new(settings: CompletionSettings, keywords: Arc<KeywordDb>) -> Self {
        Self::with_service(settings, keywords, SemanticService::global())
    }

    /// Engine whose Python completions come from `semantic`.
    pub fn with_service(
        settings: CompletionSettings,
        keywords: Arc<KeywordDb>,
        semantic: &'static SemanticService,
    ) -> Self {
        let debouncer = Debouncer::new(Duration::from_millis(settings.debounce_ms));
        Self {
            settings,
            keywords,
            language: None,
            popup: CompletionPopup::new(),
            debouncer,
            semantic,
            provider: None,
            generation: 0,
        }
    }

    pub fn set_language(&mut self, language: Option<&'static str>) {
        if self.language != language {
            self.cancel();
            self.language = language;
        }
        if self.language == Some("python") && self.provider.is_none() && self.settings.semantic_enabled {
            if let Some(client) = self.semantic.connect(&self.settings.python_command) {
                self.provider = Some(Box::new(client));
            }
        }
    }

    pub fn language(&self) -> Option<&'static str> {
        self.language
    }

    /// Install a semantic backend in place of the jedi helper.
    pub fn set_provider(&mut self, provider: Box<dyn SemanticProvider>) {
        self.provider = Some(provider);
    }

    /// Python with a working semantic backend.
    pub fn semantic_active(&self) -> bool {
        self.language == Some("python")
            && self.provider.as_ref().is_some_and(|p| p.is_available())
    }

    pub fn popup(&self) -> &CompletionPopup {
        &self.popup
    }

    pub fn is_popup_visible(&self) -> bool {
        self.popup.is_visible()
    }

    /// React to a key the editor has just applied.
    pub fn after_key(&mut self, key: TypedKey, ctx: &DocumentContext<'_>, now: Instant) {
        match decide(key, self.semantic_active(), self.popup.is_visible()) {
            Trigger::ScheduleSemantic => self.debouncer.schedule(now),
            Trigger::ShowStatic => self.show_static(ctx),
            Trigger::Hide => self.cancel(),
        }
    }

    /// Keyword and document-word suggestions for the word before the cursor.
    pub fn show_static(&mut self, ctx: &DocumentContext<'_>) {
        let prefix = static_prefix(ctx.before_cursor);
        let base = self
            .keywords
            .base_keywords(self.language, !self.semantic_active());
        let dynamic = dynamic_words(ctx.text);
        let items = rank_static(
            prefix,
            &base,
            &dynamic,
            self.settings.min_prefix_len,
            self.settings.max_items,
        );
        self.popup.show(items);
    }

    /// True when the debounce timer fired and [`Self::request_semantic`]
    /// should be called with a fresh context.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.debouncer.fire_if_due(now)
    }

    /// Send a semantic request for the cursor position.
    pub fn request_semantic(&mut self, ctx: &DocumentContext<'_>) {
        if !self.semantic_active() {
            self.show_static(ctx);
            return;
        }
        self.generation += 1;
        let request = SemanticRequest {
            id: self.generation,
            source: ctx.text.to_string(),
            path: ctx.path.map(Path::to_path_buf),
            line: ctx.line + 1,
            column: ctx.column,
        };
        let sent = match self.provider.as_mut() {
            Some(provider) => provider.request(request),
            None => return,
        };
        if let Err(e) = sent {
            log::warn!("Semantic completion request failed: {:#}", e);
            self.show_static(ctx);
        }
    }

    /// Drain finished semantic responses. Returns true if the popup changed.
    pub fn poll_results(&mut self, before_cursor: &str) -> bool {
        let Some(provider) = self.provider.as_mut() else {
            return false;
        };
        let mut latest = None;
        while let Some(response) = provider.try_recv() {
            if response.id == self.generation {
                latest = Some(response);
            } else {
                log::debug!("Dropping stale completion response {}", response.id);
            }
        }
        let Some(response) = latest else {
            return false;
        };
        let prefix = identifier_part(semantic_prefix(before_cursor));
        let items = rank_semantic(&response.completions, prefix, self.settings.max_items);
        self.popup.show(items);
        true
    }

    pub fn handle_popup_key(&mut self, key: PopupKey) -> PopupOutcome {
        self.popup.handle_key(key)
    }

    /// Hide the popup, stop the timer and orphan in-flight requests.
    pub fn cancel(&mut self) {
        self.popup.hide();
        self.debouncer.cancel();
        self.generation += 1;
    }

    /// Edit that puts `item` in place of the word ending at `column`.
    pub fn insertion_edit(item: &CompletionItem, line: &str, column: usize) -> InsertionEdit {
        let chars: Vec<char> = line.chars().collect();
        let end_col = column.min(chars.len());
        InsertionEdit {
            start_col: word_start(&chars, end_col),
            end_col,
            text: item.label.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use crate::semantic::{SemanticCompletion, SemanticResponse};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Shared {
        requests: Vec<SemanticRequest>,
        responses: Vec<SemanticResponse>,
        available: bool,
    }

    struct FakeProvider(Arc<Mutex<Shared>>);

    impl SemanticProvider for FakeProvider {
        fn request(&mut self, request: SemanticRequest) -> anyhow::Result<()> {
            self.0.lock().unwrap().requests.push(request);
            Ok(())
        }

        fn try_recv(&mut self) -> Option<SemanticResponse> {
            let mut shared = self.0.lock().unwrap();
            if shared.responses.is_empty() {
                None
            } else {
                Some(shared.responses.remove(0))
            }
        }

        fn is_available(&self) -> bool {
            self.0.lock().unwrap().available
        }
    }

    fn keywords() -> Arc<KeywordDb> {
        Arc::new(
            KeywordDb::from_json(
                r#"{"javascript": ["function", "for", "const"], "python": ["def", "import", "lambda"]}"#,
            )
            .unwrap(),
        )
    }

    fn settings() -> CompletionSettings {
        CompletionSettings {
            semantic_enabled: false,
            ..CompletionSettings::default()
        }
    }

    fn python_engine() -> (CompletionEngine, Arc<Mutex<Shared>>) {
        let shared = Arc::new(Mutex::new(Shared {
            available: true,
            ..Shared::default()
        }));
        let mut engine = CompletionEngine::new(settings(), keywords());
        engine.set_provider(Box::new(FakeProvider(Arc::clone(&shared))));
        engine.set_language(Some("python"));
        (engine, shared)
    }

    fn ctx<'a>(text: &'a str, before: &'a str, line: usize) -> DocumentContext<'a> {
        DocumentContext {
            text,
            before_cursor: before,
            line,
            column: before.chars().count(),
            path: None,
        }
    }

    fn labels(engine: &CompletionEngine) -> Vec<String> {
        engine.popup().items().iter().map(|i| i.label.clone()).collect()
    }

    #[test]
    fn static_suggestions_mix_keywords_and_document_words() {
        let mut engine = CompletionEngine::new(settings(), keywords());
        engine.set_language(Some("javascript"));
        let text = "let format_value = 1;\nfo";
        engine.after_key(TypedKey::Char('o'), &ctx(text, "fo", 1), Instant::now());

        assert!(engine.is_popup_visible());
        assert_eq!(labels(&engine), vec!["for", "format_value", "function"]);
    }

    #[test]
    fn single_char_prefix_hides() {
        let mut engine = CompletionEngine::new(settings(), keywords());
        engine.set_language(Some("javascript"));
        engine.after_key(TypedKey::Char('f'), &ctx("f", "f", 0), Instant::now());
        assert!(!engine.is_popup_visible());
    }

    #[test]
    fn python_debounces_then_requests() {
        let (mut engine, shared) = python_engine();
        let start = Instant::now();
        let text = "import os\nos.pa";
        let c = ctx(text, "os.pa", 1);

        engine.after_key(TypedKey::Char('p'), &c, start);
        engine.after_key(TypedKey::Char('a'), &c, start + Duration::from_millis(100));
        assert!(!engine.tick(start + Duration::from_millis(200)));
        assert!(engine.tick(start + Duration::from_millis(260)));

        engine.request_semantic(&c);
        let request = shared.lock().unwrap().requests[0].clone();
        assert_eq!(request.line, 2);
        assert_eq!(request.column, 5);
        assert_eq!(request.source, text);
    }

    #[test]
    fn only_latest_response_is_shown() {
        let (mut engine, shared) = python_engine();
        let c = ctx("import os\nos.pa", "os.pa", 1);
        engine.request_semantic(&c);
        let stale = shared.lock().unwrap().requests[0].id;
        engine.request_semantic(&c);
        let fresh = shared.lock().unwrap().requests[1].id;

        shared.lock().unwrap().responses = vec![
            SemanticResponse {
                id: stale,
                completions: vec![SemanticCompletion::new("stale_name", "function")],
            },
            SemanticResponse {
                id: fresh,
                completions: vec![
                    SemanticCompletion::new("pathsep", "statement"),
                    SemanticCompletion::new("path", "module"),
                    SemanticCompletion::new("getcwd", "function"),
                ],
            },
        ];

        assert!(engine.poll_results("os.pa"));
        assert_eq!(labels(&engine), vec!["path", "pathsep"]);
        assert_eq!(engine.popup().items()[0].kind, ItemKind::Variable);
    }

    #[test]
    fn cancel_orphans_in_flight_request() {
        let (mut engine, shared) = python_engine();
        let c = ctx("os.", "os.", 0);
        engine.request_semantic(&c);
        let id = shared.lock().unwrap().requests[0].id;
        engine.cancel();

        shared.lock().unwrap().responses.push(SemanticResponse {
            id,
            completions: vec![SemanticCompletion::new("path", "module")],
        });
        assert!(!engine.poll_results("os."));
        assert!(!engine.is_popup_visible());
    }

    #[test]
    fn empty_semantic_result_hides() {
        let (mut engine, shared) = python_engine();
        let c = ctx("zzz", "zzz", 0);
        engine.request_semantic(&c);
        let id = shared.lock().unwrap().requests[0].id;
        shared.lock().unwrap().responses.push(SemanticResponse {
            id,
            completions: Vec::new(),
        });
        engine.poll_results("zzz");
        assert!(!engine.is_popup_visible());
    }

    #[test]
    fn python_without_backend_uses_keywords() {
        let mut engine = CompletionEngine::new(settings(), keywords());
        engine.set_language(Some("python"));
        assert!(!engine.semantic_active());

        engine.after_key(TypedKey::Char('a'), &ctx("x = la", "x = la", 0), Instant::now());
        assert_eq!(labels(&engine), vec!["lambda"]);
    }

    #[test]
    fn failed_backend_is_not_restarted_by_other_tabs() {
        let attempts = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&attempts);
        let service: &'static SemanticService = Box::leak(Box::new(SemanticService::new(move |_| {
            *counter.lock().unwrap() += 1;
            Err(anyhow::anyhow!("No such file or directory"))
        })));
        let enabled = CompletionSettings {
            semantic_enabled: true,
            ..CompletionSettings::default()
        };

        let mut first = CompletionEngine::with_service(enabled.clone(), keywords(), service);
        first.set_language(Some("python"));
        let mut second = CompletionEngine::with_service(enabled, keywords(), service);
        second.set_language(Some("python"));
        second.set_language(Some("python"));

        assert_eq!(*attempts.lock().unwrap(), 1);
        assert!(service.is_disabled());
        assert!(!first.semantic_active());
        assert!(!second.semantic_active());
    }

    #[test]
    fn python_tabs_share_the_backend() {
        let shared = Arc::new(Mutex::new(Shared {
            available: true,
            ..Shared::default()
        }));
        let backend = Arc::clone(&shared);
        let service: &'static SemanticService = Box::leak(Box::new(SemanticService::new(move |_| {
            Ok(Box::new(FakeProvider(Arc::clone(&backend))) as Box<dyn SemanticProvider>)
        })));
        let enabled = CompletionSettings {
            semantic_enabled: true,
            ..CompletionSettings::default()
        };

        let mut first = CompletionEngine::with_service(enabled.clone(), keywords(), service);
        first.set_language(Some("python"));
        let mut second = CompletionEngine::with_service(enabled, keywords(), service);
        second.set_language(Some("python"));
        assert_eq!(service.spawn_attempts(), 1);

        let c = ctx("import os\nos.pa", "os.pa", 1);
        first.request_semantic(&c);
        second.request_semantic(&c);
        let wire_ids: Vec<u64> = shared.lock().unwrap().requests.iter().map(|r| r.id).collect();
        assert_eq!(wire_ids.len(), 2);
        assert_ne!(wire_ids[0], wire_ids[1]);

        shared.lock().unwrap().responses.push(SemanticResponse {
            id: wire_ids[0],
            completions: vec![SemanticCompletion::new("path", "module")],
        });
        assert!(!second.poll_results("os.pa"));
        assert!(first.poll_results("os.pa"));
        assert_eq!(labels(&first), vec!["path"]);
    }

    #[test]
    fn insertion_replaces_word_before_cursor() {
        let item = CompletionItem::new("function", ItemKind::Keyword);
        let edit = CompletionEngine::insertion_edit(&item, "  fun(x)", 5);
        assert_eq!(
            edit,
            InsertionEdit {
                start_col: 2,
                end_col: 5,
                text: "function".to_string()
            }
        );
    }
}
