use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use unicode_segmentation::UnicodeSegmentation;

use capi_buffer::{Cursor, Selection, TextBuffer, Viewport};
use capi_completion::{
    CompletionEngine, CompletionItem, DocumentContext, KeywordDb, PopupKey, PopupOutcome, TypedKey,
};
use capi_config::{CompletionSettings, Config, WelcomeSettings};
use capi_core::{Panel, PanelEvent, RenderContext};
use capi_highlight::{detect_language, display_name, global_highlighter, HighlightCache};
use capi_text_search::{replace_all, Match, SearchState};

use crate::command::EditorCommand;
use crate::editing::{closing_pair, newline_edit, AUTO_PAIRS};
use crate::find_bar::{FindAction, FindBar};
use crate::minimap::MinimapLayout;

/// Lines moved per mouse wheel step.
const WHEEL_LINES: usize = 3;

/// Per-tab editing preferences, taken from the config.
#[derive(Debug, Clone)]
pub struct EditorOptions {
    pub tab_size: usize,
    pub auto_close_brackets: bool,
    pub show_minimap: bool,
    pub minimap_width: u16,
    pub completion: CompletionSettings,
}

impl EditorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tab_size: config.editor.tab_size.max(1),
            auto_close_brackets: config.editor.auto_close_brackets,
            show_minimap: config.general.show_minimap,
            minimap_width: config.editor.minimap_width,
            completion: config.completion.clone(),
        }
    }
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// One open document: text, cursor, highlighting, completion and find.
pub struct EditorTab {
    pub(crate) buffer: TextBuffer,
    pub(crate) cursor: Cursor,
    pub(crate) selection: Option<Selection>,
    pub(crate) viewport: Viewport,
    pub(crate) highlight: HighlightCache,
    pub(crate) completion: CompletionEngine,
    pub(crate) search: SearchState,
    pub(crate) find: FindBar,
    pub(crate) options: EditorOptions,
    language: Option<&'static str>,
    read_only: bool,
    welcome: bool,
    /// Column kept while moving through shorter lines
    preferred_column: Option<usize>,
    /// Line to center once the real viewport height is known
    pub(crate) pending_center: Option<usize>,
    /// Anchor of a mouse drag selection
    drag_anchor: Option<Cursor>,
    pub(crate) last_text_area: Option<Rect>,
    pub(crate) last_minimap_area: Option<Rect>,
    pub(crate) last_find_area: Option<Rect>,
}

impl EditorTab {
    fn with_buffer(buffer: TextBuffer, options: EditorOptions, keywords: Arc<KeywordDb>) -> Self {
        let completion = CompletionEngine::new(options.completion.clone(), keywords);
        Self {
            buffer,
            cursor: Cursor::new(),
            selection: None,
            viewport: Viewport::default(),
            highlight: HighlightCache::new(global_highlighter()),
            completion,
            search: SearchState::new(),
            find: FindBar::new(),
            options,
            language: None,
            read_only: false,
            welcome: false,
            preferred_column: None,
            pending_center: None,
            drag_anchor: None,
            last_text_area: None,
            last_minimap_area: None,
            last_find_area: None,
        }
    }

    /// Empty document without a path.
    pub fn untitled(options: EditorOptions, keywords: Arc<KeywordDb>) -> Self {
        Self::with_buffer(TextBuffer::new(), options, keywords)
    }

    /// Open `path`; the language comes from its extension.
    pub fn open(path: &Path, options: EditorOptions, keywords: Arc<KeywordDb>) -> Result<Self> {
        let buffer = TextBuffer::from_file(path)?;
        let mut tab = Self::with_buffer(buffer, options, keywords);
        tab.set_language(detect_language(path));
        log::info!("Opened {}", path.display());
        Ok(tab)
    }

    /// Read-only Home tab listing the editor's features.
    pub fn welcome(
        settings: &WelcomeSettings,
        options: EditorOptions,
        keywords: Arc<KeywordDb>,
    ) -> Self {
        let mut text = settings.title.clone();
        text.push_str("\n\n");
        for feature in &settings.features {
            text.push_str("  ");
            text.push_str(feature);
            text.push('\n');
        }
        let mut tab = Self::with_buffer(TextBuffer::from_text(&text), options, keywords);
        tab.read_only = true;
        tab.welcome = true;
        tab
    }

    pub fn set_language(&mut self, language: Option<&'static str>) {
        self.language = language;
        self.highlight.set_language(language);
        self.completion.set_language(language);
    }

    pub fn language(&self) -> Option<&'static str> {
        self.language
    }

    /// Status bar label such as `PYTHON` or `TEXT`.
    pub fn language_label(&self) -> String {
        display_name(self.language)
    }

    pub fn title(&self) -> String {
        if self.welcome {
            return "Home".to_string();
        }
        self.buffer
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "Untitled".to_string())
    }

    /// Tab bar label: modified documents get a `*` prefix.
    pub fn tab_label(&self) -> String {
        if self.is_modified() {
            format!("*{}", self.title())
        } else {
            self.title()
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.buffer.file_path()
    }

    pub fn is_modified(&self) -> bool {
        !self.welcome && self.buffer.is_modified()
    }

    pub fn is_welcome(&self) -> bool {
        self.welcome
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection.filter(|s| !s.is_empty())
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// `Ln 12, Col 5` (1-based).
    pub fn position_label(&self) -> String {
        format!("Ln {}, Col {}", self.cursor.line + 1, self.cursor.column + 1)
    }

    pub fn save(&mut self) -> Result<()> {
        if self.welcome {
            return Ok(());
        }
        self.buffer.save()?;
        self.buffer.commit_history();
        Ok(())
    }

    /// Write to `path` and adopt it as the document path.
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        self.buffer.save_to(path)?;
        self.buffer.commit_history();
        self.set_language(detect_language(path));
        log::info!("Saved as {}", path.display());
        Ok(())
    }

    /// Follow a rename or move of the file on disk.
    pub fn set_path(&mut self, path: PathBuf) {
        self.set_language(detect_language(&path));
        self.buffer.set_file_path(path);
    }

    pub fn set_tab_size(&mut self, tab_size: usize) {
        self.options.tab_size = tab_size.max(1);
    }

    pub fn set_show_minimap(&mut self, show: bool) {
        self.options.show_minimap = show;
    }

    /// Move to 1-based `line`, clamped to the document, and center it.
    pub fn go_to_line(&mut self, line: usize) {
        let total = self.buffer.line_count();
        let target = line.clamp(1, total.max(1)) - 1;
        self.cursor = Cursor::at(target, 0);
        self.selection = None;
        self.preferred_column = None;
        self.completion.cancel();
        self.viewport.center_on(target, total);
        self.pending_center = Some(target);
    }

    pub fn selected_text(&self) -> Option<String> {
        let selection = self.selection()?;
        self.buffer
            .text_range(&selection.start(), &selection.end())
            .ok()
    }

    /// Show the find bar, seeded with a single-line selection.
    pub fn open_find(&mut self) {
        let seed = self.selected_text();
        self.find.open(seed.as_deref());
        self.completion.cancel();
        self.refresh_search(true);
    }

    pub fn close_find(&mut self) {
        self.find.close();
        self.search.clear();
    }

    pub fn is_find_visible(&self) -> bool {
        self.find.is_visible()
    }

    pub fn is_completion_visible(&self) -> bool {
        self.completion.is_popup_visible()
    }

    /// Run one editor command.
    pub fn apply_command(&mut self, command: EditorCommand) -> Result<Vec<PanelEvent>> {
        if self.read_only && command.edits() {
            return Ok(vec![]);
        }
        let mut events = Vec::new();

        if let Some(motion) = motion_of(command) {
            self.apply_motion(motion, command.selects());
        } else {
            let typing = matches!(command, EditorCommand::InsertChar(_));
            if !typing {
                self.buffer.commit_history();
            }
            match command {
                EditorCommand::SelectAll => {
                    let end = self.buffer.end_cursor();
                    self.selection = Some(Selection::new(Cursor::new(), end));
                    self.cursor = end;
                }
                EditorCommand::InsertChar(c) => self.insert_char(c)?,
                EditorCommand::InsertNewline => self.insert_newline()?,
                EditorCommand::InsertTab => self.insert_tab()?,
                EditorCommand::Backspace => self.backspace()?,
                EditorCommand::Delete => self.delete()?,
                EditorCommand::Undo => self.undo_redo(true)?,
                EditorCommand::Redo => self.undo_redo(false)?,
                EditorCommand::Copy => {
                    if let Some(text) = self.selected_text() {
                        capi_clipboard::copy(&text)?;
                    }
                }
                EditorCommand::Cut => {
                    if let Some(text) = self.selected_text() {
                        capi_clipboard::copy(&text)?;
                        self.delete_selection()?;
                    }
                }
                EditorCommand::Paste => {
                    if let Some(text) = capi_clipboard::paste() {
                        self.insert_text(&text.replace("\r\n", "\n"))?;
                    }
                }
                EditorCommand::MoveLineUp => self.move_line(true)?,
                EditorCommand::MoveLineDown => self.move_line(false)?,
                _ => {}
            }
            if !typing {
                self.buffer.commit_history();
            }
        }

        self.viewport
            .ensure_cursor_visible(&self.cursor, self.buffer.line_count());

        if !self.read_only {
            let typed = typed_key(command);
            self.with_context(|engine, ctx| engine.after_key(typed, ctx, Instant::now()));
        }
        events.push(PanelEvent::NeedsRedraw);
        Ok(events)
    }

    fn apply_motion(&mut self, motion: EditorCommand, selecting: bool) {
        let anchor = self.selection.map(|s| s.anchor).unwrap_or(self.cursor);

        if !selecting {
            if let Some(selection) = self.selection.take() {
                if !selection.is_empty() {
                    match motion {
                        EditorCommand::MoveLeft => {
                            self.cursor = selection.start();
                            self.preferred_column = None;
                            return;
                        }
                        EditorCommand::MoveRight => {
                            self.cursor = selection.end();
                            self.preferred_column = None;
                            return;
                        }
                        _ => {}
                    }
                }
            }
        }

        let last_line = self.buffer.line_count().saturating_sub(1);
        let page = self.viewport.height.max(1);
        match motion {
            EditorCommand::MoveUp => self.move_vertical(-1),
            EditorCommand::MoveDown => self.move_vertical(1),
            EditorCommand::PageUp => self.move_vertical(-(page as isize)),
            EditorCommand::PageDown => self.move_vertical(page as isize),
            EditorCommand::MoveLeft => {
                self.cursor.move_left();
                self.clamp_cursor();
                self.preferred_column = None;
            }
            EditorCommand::MoveRight => {
                let len = self.buffer.line_len_graphemes(self.cursor.line);
                self.cursor.move_right(len, last_line);
                self.preferred_column = None;
            }
            EditorCommand::LineStart => {
                self.cursor.column = 0;
                self.preferred_column = None;
            }
            EditorCommand::LineEnd => {
                self.cursor.column = self.buffer.line_len_graphemes(self.cursor.line);
                self.preferred_column = None;
            }
            EditorCommand::DocumentStart => {
                self.cursor = Cursor::new();
                self.preferred_column = None;
            }
            EditorCommand::DocumentEnd => {
                self.cursor = self.buffer.end_cursor();
                self.preferred_column = None;
            }
            _ => {}
        }

        self.selection = if selecting {
            Some(Selection::new(anchor, self.cursor))
        } else {
            None
        };
    }

    fn move_vertical(&mut self, delta: isize) {
        let last_line = self.buffer.line_count().saturating_sub(1);
        let desired = self.preferred_column.unwrap_or(self.cursor.column);
        let line = if delta < 0 {
            self.cursor.line.saturating_sub(delta.unsigned_abs())
        } else {
            (self.cursor.line + delta as usize).min(last_line)
        };
        let len = self.buffer.line_len_graphemes(line);
        self.cursor = Cursor::at(line, desired.min(len));
        self.preferred_column = Some(desired);
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.buffer.clamp(&self.cursor);
    }

    /// Remove the selected text. Returns true if anything was selected.
    fn delete_selection(&mut self) -> Result<bool> {
        let Some(selection) = self.selection.take().filter(|s| !s.is_empty()) else {
            return Ok(false);
        };
        let lines_before = self.buffer.line_count();
        let (start, end) = (selection.start(), selection.end());
        self.buffer.delete_range(&start, &end)?;
        self.cursor = start;
        self.after_edit(start.line, end.line, lines_before);
        Ok(true)
    }

    fn insert_text(&mut self, text: &str) -> Result<()> {
        self.delete_selection()?;
        let lines_before = self.buffer.line_count();
        let start = self.cursor;
        self.cursor = self.buffer.insert(&start, text)?;
        self.after_edit(start.line, self.cursor.line, lines_before);
        Ok(())
    }

    fn char_after_cursor(&self) -> Option<char> {
        let line = self.buffer.line(self.cursor.line)?;
        line.graphemes(true)
            .nth(self.cursor.column)
            .and_then(|g| g.chars().next())
    }

    fn insert_char(&mut self, c: char) -> Result<()> {
        let has_selection = self.selection().is_some();
        if self.options.auto_close_brackets && !has_selection {
            let is_closer = AUTO_PAIRS.iter().any(|(_, close)| *close == c);
            if is_closer && self.char_after_cursor() == Some(c) {
                self.cursor.column += 1;
                self.preferred_column = None;
                return Ok(());
            }
            if let Some(close) = closing_pair(c) {
                let line = self.cursor.line;
                let pair: String = [c, close].iter().collect();
                let start = self.cursor;
                self.buffer.insert(&start, &pair)?;
                self.cursor = Cursor::at(start.line, start.column + 1);
                self.after_edit(line, line, self.buffer.line_count());
                self.preferred_column = None;
                return Ok(());
            }
        }
        self.insert_text(c.encode_utf8(&mut [0; 4]))?;
        self.preferred_column = None;
        Ok(())
    }

    fn insert_newline(&mut self) -> Result<()> {
        self.delete_selection()?;
        let line_text = self.buffer.line(self.cursor.line).unwrap_or_default();
        let edit = newline_edit(&line_text, self.cursor.column, self.options.tab_size);
        let lines_before = self.buffer.line_count();
        let start = self.cursor;
        self.buffer.insert(&start, &edit.text)?;
        self.cursor = Cursor::at(start.line + edit.line_offset, edit.column);
        self.after_edit(start.line, self.cursor.line + 1, lines_before);
        self.preferred_column = None;
        Ok(())
    }

    fn insert_tab(&mut self) -> Result<()> {
        let indent = " ".repeat(self.options.tab_size);
        match self.selection() {
            Some(selection) if selection.start().line != selection.end().line => {
                let (first, last) = (selection.start().line, selection.end().line);
                let last = if selection.end().column == 0 { last - 1 } else { last };
                for line in first..=last {
                    self.buffer.insert(&Cursor::at(line, 0), &indent)?;
                }
                self.buffer.commit_history();
                let shift = |c: Cursor| {
                    if c.line >= first && c.line <= last && (c.column > 0 || c.line == first) {
                        Cursor::at(c.line, c.column + indent.len())
                    } else {
                        c
                    }
                };
                self.selection = Some(Selection::new(
                    shift(selection.anchor),
                    shift(selection.active),
                ));
                self.cursor = shift(self.cursor);
                self.highlight.invalidate_range(first, last);
                self.refresh_search(false);
            }
            _ => self.insert_text(&indent)?,
        }
        self.preferred_column = None;
        Ok(())
    }

    fn backspace(&mut self) -> Result<()> {
        if self.delete_selection()? {
            return Ok(());
        }
        let lines_before = self.buffer.line_count();
        if let Some(cursor) = self.buffer.backspace(&self.cursor)? {
            self.cursor = cursor;
            self.after_edit(cursor.line, cursor.line + 1, lines_before);
        }
        self.preferred_column = None;
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        if self.delete_selection()? {
            return Ok(());
        }
        let lines_before = self.buffer.line_count();
        let cursor = self.buffer.clamp(&self.cursor);
        if self.buffer.delete_char(&cursor)? {
            self.cursor = cursor;
            self.after_edit(cursor.line, cursor.line + 1, lines_before);
        }
        Ok(())
    }

    fn undo_redo(&mut self, undo: bool) -> Result<()> {
        self.buffer.commit_history();
        let cursor = if undo {
            self.buffer.undo()?
        } else {
            self.buffer.redo()?
        };
        if let Some(cursor) = cursor {
            self.cursor = self.buffer.clamp(&cursor);
            self.selection = None;
            self.highlight.invalidate_all();
            self.refresh_search(false);
        }
        Ok(())
    }

    fn move_line(&mut self, up: bool) -> Result<()> {
        let line = self.cursor.line;
        let moved = if up {
            self.buffer.move_line_up(line)?
        } else {
            self.buffer.move_line_down(line)?
        };
        if moved {
            let target = if up { line - 1 } else { line + 1 };
            self.cursor.line = target;
            self.selection = None;
            self.highlight
                .invalidate_range(line.min(target), line.max(target));
            self.refresh_search(false);
        }
        Ok(())
    }

    fn after_edit(&mut self, first_line: usize, last_line: usize, lines_before: usize) {
        let changed = lines_before != self.buffer.line_count();
        self.highlight.invalidate_edit(first_line, last_line, changed);
        self.refresh_search(false);
    }

    /// Recompute matches when the find bar is open. `jump` selects the
    /// first match at or after the current position.
    fn refresh_search(&mut self, jump: bool) {
        if !self.find.is_visible() {
            return;
        }
        let text = self.buffer.text();
        self.search.set_options(self.find.options().clone(), &text);
        self.search.set_query(self.find.query(), &text);
        if jump {
            let from = self
                .selection()
                .map(|s| s.start())
                .unwrap_or(self.cursor);
            if let Some(m) = self.search.find_next(from.line, from.column) {
                self.select_match(m);
            }
        }
    }

    fn select_match(&mut self, m: Match) {
        let start = Cursor::at(m.line, m.col);
        let end = Cursor::at(m.line, m.end_col());
        self.selection = Some(Selection::new(start, end));
        self.cursor = end;
        self.preferred_column = None;
        let total = self.buffer.line_count();
        if !self.viewport.is_line_visible(m.line) {
            self.viewport.center_on(m.line, total);
        }
        self.viewport.ensure_cursor_visible(&self.cursor, total);
    }

    /// Whether the selection is exactly the current match.
    fn selection_is_current_match(&self) -> Option<Match> {
        let m = self.search.current_match()?;
        let selection = self.selection()?;
        (selection.start() == Cursor::at(m.line, m.col)
            && selection.end() == Cursor::at(m.line, m.end_col()))
        .then_some(m)
    }

    pub fn find_next(&mut self) {
        if let Some(m) = self.search.find_next(self.cursor.line, self.cursor.column) {
            self.select_match(m);
        }
    }

    pub fn find_prev(&mut self) {
        let from = self
            .selection()
            .map(|s| s.start())
            .unwrap_or(self.cursor);
        if let Some(m) = self.search.find_prev(from.line, from.column) {
            self.select_match(m);
        }
    }

    /// Replace the current match and move to the next one.
    pub fn replace_current(&mut self) -> Result<()> {
        if self.read_only {
            return Ok(());
        }
        let Some(m) = self.selection_is_current_match() else {
            self.find_next();
            return Ok(());
        };
        let start = Cursor::at(m.line, m.col);
        let end = Cursor::at(m.line, m.end_col());
        let matched = self.buffer.text_range(&start, &end)?;
        let (replacement, _) = replace_all(
            &matched,
            self.find.query(),
            self.find.replacement(),
            self.find.options(),
        )?;
        let lines_before = self.buffer.line_count();
        self.cursor = self.buffer.replace_range(&start, &end, &replacement)?;
        self.buffer.commit_history();
        self.selection = None;
        self.after_edit(start.line, self.cursor.line, lines_before);
        self.find_next();
        Ok(())
    }

    /// Replace every match as one undo step. Returns the count.
    pub fn replace_all(&mut self) -> Result<usize> {
        if self.read_only {
            return Ok(0);
        }
        let text = self.buffer.text();
        let (replaced, count) = replace_all(
            &text,
            self.find.query(),
            self.find.replacement(),
            self.find.options(),
        )?;
        if count == 0 {
            return Ok(0);
        }
        let end = self.buffer.end_cursor();
        self.buffer.replace_range(&Cursor::new(), &end, &replaced)?;
        self.buffer.commit_history();
        self.selection = None;
        self.clamp_cursor();
        self.highlight.invalidate_all();
        self.refresh_search(false);
        log::info!("Replaced {} occurrences", count);
        Ok(count)
    }

    fn handle_find_key(&mut self, key: KeyEvent) -> Result<Vec<PanelEvent>> {
        let mut events = vec![PanelEvent::NeedsRedraw];
        match self.find.handle_key(key) {
            FindAction::None => {}
            FindAction::Refresh => self.refresh_search(true),
            FindAction::Next => self.find_next(),
            FindAction::Prev => self.find_prev(),
            FindAction::ReplaceCurrent => self.replace_current()?,
            FindAction::ReplaceAll => {
                let count = self.replace_all()?;
                events.push(PanelEvent::SetStatus {
                    message: format!("Replaced {} occurrences", count),
                    is_error: false,
                });
            }
            FindAction::Close => self.close_find(),
        }
        Ok(events)
    }

    /// Current line up to the cursor, as the completion engine sees it.
    fn before_cursor(&self) -> String {
        let line = self.buffer.line(self.cursor.line).unwrap_or_default();
        line.graphemes(true).take(self.cursor.column).collect()
    }

    fn with_context<R>(
        &mut self,
        f: impl FnOnce(&mut CompletionEngine, &DocumentContext<'_>) -> R,
    ) -> R {
        let text = self.buffer.text();
        let before = self.before_cursor();
        let ctx = DocumentContext {
            text: &text,
            before_cursor: &before,
            line: self.cursor.line,
            column: before.chars().count(),
            path: self.buffer.file_path(),
        };
        f(&mut self.completion, &ctx)
    }

    fn accept_completion(&mut self, item: &CompletionItem) -> Result<()> {
        let line_text = self.buffer.line(self.cursor.line).unwrap_or_default();
        let column = self.before_cursor().chars().count();
        let edit = CompletionEngine::insertion_edit(item, &line_text, column);
        let line = self.cursor.line;
        let lines_before = self.buffer.line_count();
        let start = self.buffer.char_idx_to_cursor(
            self.buffer.cursor_to_char_idx(&Cursor::at(line, 0))? + edit.start_col,
        );
        let end = self.buffer.char_idx_to_cursor(
            self.buffer.cursor_to_char_idx(&Cursor::at(line, 0))? + edit.end_col,
        );
        self.cursor = self.buffer.replace_range(&start, &end, &edit.text)?;
        self.buffer.commit_history();
        self.selection = None;
        self.completion.cancel();
        self.after_edit(line, line, lines_before);
        self.viewport
            .ensure_cursor_visible(&self.cursor, self.buffer.line_count());
        Ok(())
    }

    fn handle_key_inner(&mut self, key: KeyEvent) -> Result<Vec<PanelEvent>> {
        if self.find.is_focused() {
            return self.handle_find_key(key);
        }

        if self.completion.is_popup_visible() {
            match self.completion.handle_popup_key(popup_key(key)) {
                PopupOutcome::Insert(item) => {
                    self.accept_completion(&item)?;
                    return Ok(vec![PanelEvent::NeedsRedraw]);
                }
                PopupOutcome::Consumed => return Ok(vec![PanelEvent::NeedsRedraw]),
                PopupOutcome::PassThrough => {}
            }
        }

        if key.code == KeyCode::Esc && self.find.is_visible() {
            self.close_find();
            return Ok(vec![PanelEvent::NeedsRedraw]);
        }

        let command = EditorCommand::from_key_event(key, self.read_only);
        if command == EditorCommand::None {
            return Ok(vec![]);
        }
        self.apply_command(command)
    }

    /// Debounce timer and semantic results. True when a redraw is due.
    pub fn poll_completion(&mut self, now: Instant) -> bool {
        if self.read_only {
            return false;
        }
        let mut changed = false;
        if self.completion.tick(now) {
            self.with_context(|engine, ctx| engine.request_semantic(ctx));
            changed = true;
        }
        let before = self.before_cursor();
        if self.completion.poll_results(&before) {
            changed = true;
        }
        changed
    }

    /// Scroll so that `line` is the first one shown by the minimap row.
    fn jump_from_minimap(&mut self, row: usize, height: usize) {
        let total = self.buffer.line_count();
        let layout = MinimapLayout::new(
            total,
            height,
            self.viewport.top_line,
            self.viewport.height,
        );
        let line = layout.line_for_row(row, total);
        self.go_to_line(line + 1);
    }

    fn text_position(&self, area: Rect, column: u16, row: u16) -> Cursor {
        let row = (row - area.y) as usize;
        let col = (column - area.x) as usize;
        let target = self.viewport.position_at(row, col);
        let last_line = self.buffer.line_count().saturating_sub(1);
        let line = target.line.min(last_line);
        let text = self.buffer.line(line).unwrap_or_default();
        // Screen cells to grapheme column
        let mut width = 0;
        let mut column = self.viewport.left_column;
        for g in text.graphemes(true).skip(self.viewport.left_column) {
            let w = unicode_width::UnicodeWidthStr::width(g).max(1);
            if width + w > col {
                break;
            }
            width += w;
            column += 1;
        }
        Cursor::at(line, column.min(text.graphemes(true).count()))
    }

    fn handle_mouse_inner(&mut self, event: MouseEvent) -> Vec<PanelEvent> {
        let (col, row) = (event.column, event.row);
        let total = self.buffer.line_count();
        match event.kind {
            MouseEventKind::ScrollUp => {
                self.viewport.scroll_up(WHEEL_LINES);
                return vec![PanelEvent::NeedsRedraw];
            }
            MouseEventKind::ScrollDown => {
                self.viewport.scroll_down(WHEEL_LINES, total);
                return vec![PanelEvent::NeedsRedraw];
            }
            _ => {}
        }

        if let Some(area) = self.last_find_area {
            if contains(area, col, row) {
                if let MouseEventKind::Down(MouseButton::Left) = event.kind {
                    self.find.set_focused(true);
                    return vec![PanelEvent::NeedsRedraw];
                }
                return vec![];
            }
        }

        if let Some(area) = self.last_minimap_area {
            if contains(area, col, row) {
                if let MouseEventKind::Down(MouseButton::Left) | MouseEventKind::Drag(MouseButton::Left) =
                    event.kind
                {
                    self.jump_from_minimap((row - area.y) as usize, area.height as usize);
                    return vec![PanelEvent::NeedsRedraw];
                }
                return vec![];
            }
        }

        let Some(area) = self.last_text_area else {
            return vec![];
        };
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) if contains(area, col, row) => {
                let position = self.text_position(area, col, row);
                self.find.set_focused(false);
                self.completion.cancel();
                self.buffer.commit_history();
                if event.modifiers.contains(KeyModifiers::SHIFT) {
                    let anchor = self.selection.map(|s| s.anchor).unwrap_or(self.cursor);
                    self.selection = Some(Selection::new(anchor, position));
                    self.drag_anchor = Some(anchor);
                } else {
                    self.selection = None;
                    self.drag_anchor = Some(position);
                }
                self.cursor = position;
                self.preferred_column = None;
                vec![PanelEvent::NeedsRedraw]
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let Some(anchor) = self.drag_anchor else {
                    return vec![];
                };
                let col = col.clamp(area.x, area.right().saturating_sub(1));
                let row = row.clamp(area.y, area.bottom().saturating_sub(1));
                let position = self.text_position(area, col, row);
                self.cursor = position;
                self.selection = Some(Selection::new(anchor, position));
                self.viewport.ensure_cursor_visible(&self.cursor, total);
                vec![PanelEvent::NeedsRedraw]
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.drag_anchor = None;
                vec![]
            }
            _ => vec![],
        }
    }
}

fn contains(area: Rect, col: u16, row: u16) -> bool {
    col >= area.x && col < area.right() && row >= area.y && row < area.bottom()
}

/// Movement behind a move or select command.
fn motion_of(command: EditorCommand) -> Option<EditorCommand> {
    use EditorCommand::*;
    let motion = match command {
        MoveUp | SelectUp => MoveUp,
        MoveDown | SelectDown => MoveDown,
        MoveLeft | SelectLeft => MoveLeft,
        MoveRight | SelectRight => MoveRight,
        LineStart | SelectLineStart => LineStart,
        LineEnd | SelectLineEnd => LineEnd,
        PageUp | SelectPageUp => PageUp,
        PageDown | SelectPageDown => PageDown,
        DocumentStart | SelectDocumentStart => DocumentStart,
        DocumentEnd | SelectDocumentEnd => DocumentEnd,
        _ => return Option::None,
    };
    Some(motion)
}

fn typed_key(command: EditorCommand) -> TypedKey {
    match command {
        EditorCommand::InsertChar(c) => TypedKey::Char(c),
        EditorCommand::Backspace | EditorCommand::Delete => TypedKey::Erase,
        EditorCommand::TriggerCompletion => TypedKey::Explicit,
        _ => TypedKey::Other,
    }
}

fn popup_key(key: KeyEvent) -> PopupKey {
    if !key.modifiers.is_empty() {
        return PopupKey::Other;
    }
    match key.code {
        KeyCode::Tab => PopupKey::Tab,
        KeyCode::Enter => PopupKey::Enter,
        KeyCode::Esc => PopupKey::Esc,
        KeyCode::Up => PopupKey::Up,
        KeyCode::Down => PopupKey::Down,
        KeyCode::PageUp => PopupKey::PageUp,
        KeyCode::PageDown => PopupKey::PageDown,
        _ => PopupKey::Other,
    }
}

impl Panel for EditorTab {
    fn title(&self) -> String {
        self.tab_label()
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer, ctx: &RenderContext) {
        self.draw(area, buf, ctx.theme, ctx.is_focused);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<PanelEvent> {
        match self.handle_key_inner(key).context("Edit failed") {
            Ok(events) => events,
            Err(e) => {
                log::error!("{:#}", e);
                vec![PanelEvent::SetStatus {
                    message: format!("{:#}", e),
                    is_error: true,
                }]
            }
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect) -> Vec<PanelEvent> {
        self.handle_mouse_inner(event)
    }

    fn tick(&mut self) -> Vec<PanelEvent> {
        if self.poll_completion(Instant::now()) {
            vec![PanelEvent::NeedsRedraw]
        } else {
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn options() -> EditorOptions {
        let mut options = EditorOptions::default();
        options.completion.semantic_enabled = false;
        options.tab_size = 4;
        options
    }

    fn tab_with(text: &str) -> EditorTab {
        let mut tab = EditorTab::untitled(options(), Arc::new(KeywordDb::embedded()));
        tab.buffer = TextBuffer::from_text(text);
        tab
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(tab: &mut EditorTab, text: &str) {
        for c in text.chars() {
            tab.apply_command(EditorCommand::InsertChar(c)).unwrap();
        }
    }

    #[test]
    fn brackets_close_and_type_over() {
        let mut tab = tab_with("");
        type_str(&mut tab, "f(");
        assert_eq!(tab.text(), "f()");
        assert_eq!(tab.cursor(), Cursor::at(0, 2));
        type_str(&mut tab, "x)");
        assert_eq!(tab.text(), "f(x)");
        assert_eq!(tab.cursor(), Cursor::at(0, 4));
    }

    #[test]
    fn auto_close_can_be_disabled() {
        let mut tab = tab_with("");
        tab.options.auto_close_brackets = false;
        type_str(&mut tab, "[");
        assert_eq!(tab.text(), "[");
    }

    #[test]
    fn newline_keeps_indent_and_opens_blocks() {
        let mut tab = tab_with("    x = 1");
        tab.apply_command(EditorCommand::LineEnd).unwrap();
        tab.apply_command(EditorCommand::InsertNewline).unwrap();
        assert_eq!(tab.text(), "    x = 1\n    ");
        assert_eq!(tab.cursor(), Cursor::at(1, 4));

        let mut tab = tab_with("");
        type_str(&mut tab, "{");
        tab.apply_command(EditorCommand::InsertNewline).unwrap();
        assert_eq!(tab.text(), "{\n    \n}");
        assert_eq!(tab.cursor(), Cursor::at(1, 4));
    }

    #[test]
    fn tab_inserts_spaces_or_indents_lines() {
        let mut tab = tab_with("a\nb");
        tab.apply_command(EditorCommand::InsertTab).unwrap();
        assert_eq!(tab.text(), "    a\nb");

        tab.apply_command(EditorCommand::SelectAll).unwrap();
        tab.apply_command(EditorCommand::InsertTab).unwrap();
        assert_eq!(tab.text(), "        a\n    b");
    }

    #[test]
    fn selection_and_typing_replaces() {
        let mut tab = tab_with("hello world");
        tab.apply_command(EditorCommand::SelectRight).unwrap();
        tab.apply_command(EditorCommand::SelectRight).unwrap();
        assert_eq!(tab.selected_text().as_deref(), Some("he"));
        type_str(&mut tab, "J");
        assert_eq!(tab.text(), "Jllo world");
        assert!(tab.selection().is_none());
    }

    #[test]
    fn vertical_motion_remembers_column() {
        let mut tab = tab_with("long line\nx\nanother line");
        tab.apply_command(EditorCommand::LineEnd).unwrap();
        tab.apply_command(EditorCommand::MoveDown).unwrap();
        assert_eq!(tab.cursor(), Cursor::at(1, 1));
        tab.apply_command(EditorCommand::MoveDown).unwrap();
        assert_eq!(tab.cursor(), Cursor::at(2, 9));
    }

    #[test]
    fn left_right_collapse_selection() {
        let mut tab = tab_with("abcdef");
        tab.apply_command(EditorCommand::MoveRight).unwrap();
        tab.apply_command(EditorCommand::SelectRight).unwrap();
        tab.apply_command(EditorCommand::SelectRight).unwrap();
        tab.apply_command(EditorCommand::MoveLeft).unwrap();
        assert_eq!(tab.cursor(), Cursor::at(0, 1));
        assert!(tab.selection().is_none());
    }

    #[test]
    fn undo_restores_text() {
        let mut tab = tab_with("");
        type_str(&mut tab, "abc");
        tab.apply_command(EditorCommand::InsertNewline).unwrap();
        tab.apply_command(EditorCommand::Undo).unwrap();
        assert_eq!(tab.text(), "abc");
        tab.apply_command(EditorCommand::Undo).unwrap();
        assert_eq!(tab.text(), "");
        tab.apply_command(EditorCommand::Redo).unwrap();
        assert_eq!(tab.text(), "abc");
    }

    #[test]
    fn move_line_down_keeps_cursor_on_it() {
        let mut tab = tab_with("one\ntwo\nthree");
        tab.apply_command(EditorCommand::MoveLineDown).unwrap();
        assert_eq!(tab.text(), "two\none\nthree");
        assert_eq!(tab.cursor().line, 1);
    }

    #[test]
    fn welcome_tab_is_read_only() {
        let settings = WelcomeSettings {
            title: "Welcome".to_string(),
            features: vec!["Syntax highlighting".to_string()],
        };
        let mut tab = EditorTab::welcome(&settings, options(), Arc::new(KeywordDb::embedded()));
        assert_eq!(tab.title(), "Home");
        assert!(tab.text().contains("Syntax highlighting"));
        let before = tab.text();
        tab.handle_key(key(KeyCode::Char('x')));
        tab.apply_command(EditorCommand::Backspace).unwrap();
        assert_eq!(tab.text(), before);
        assert!(!tab.is_modified());
    }

    #[test]
    fn open_save_and_labels() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.py");
        fs::write(&path, "print(1)\n").unwrap();

        let mut tab =
            EditorTab::open(&path, options(), Arc::new(KeywordDb::embedded())).unwrap();
        assert_eq!(tab.language(), Some("python"));
        assert_eq!(tab.language_label(), "PYTHON");
        assert_eq!(tab.tab_label(), "main.py");

        tab.apply_command(EditorCommand::DocumentEnd).unwrap();
        type_str(&mut tab, "x");
        assert_eq!(tab.tab_label(), "*main.py");
        tab.save().unwrap();
        assert_eq!(tab.tab_label(), "main.py");
        assert_eq!(fs::read_to_string(&path).unwrap(), "print(1)\nx");

        let other = dir.path().join("notes.txt");
        tab.save_as(&other).unwrap();
        assert_eq!(tab.language_label(), "TEXT");
        assert_eq!(tab.title(), "notes.txt");
    }

    #[test]
    fn untitled_title_and_position() {
        let mut tab = tab_with("a\nbc");
        assert_eq!(tab.title(), "Untitled");
        tab.apply_command(EditorCommand::DocumentEnd).unwrap();
        assert_eq!(tab.position_label(), "Ln 2, Col 3");
    }

    #[test]
    fn go_to_line_clamps() {
        let mut tab = tab_with("a\nb\nc");
        tab.go_to_line(99);
        assert_eq!(tab.cursor(), Cursor::at(2, 0));
        tab.go_to_line(0);
        assert_eq!(tab.cursor(), Cursor::at(0, 0));
    }

    #[test]
    fn find_and_replace_through_the_bar() {
        let mut tab = tab_with("foo bar foo\nfoo");
        tab.open_find();
        for c in "foo".chars() {
            tab.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(tab.search.count(), 3);
        assert_eq!(tab.selected_text().as_deref(), Some("foo"));

        tab.find_next();
        assert_eq!(tab.cursor(), Cursor::at(0, 11));

        tab.find.handle_key(key(KeyCode::Tab));
        for c in "baz".chars() {
            tab.handle_key(key(KeyCode::Char(c)));
        }
        tab.replace_current().unwrap();
        assert_eq!(tab.text(), "foo bar baz\nfoo");
        assert_eq!(tab.search.count(), 2);

        assert_eq!(tab.replace_all().unwrap(), 2);
        assert_eq!(tab.text(), "baz bar baz\nbaz");
        tab.apply_command(EditorCommand::Undo).unwrap();
        assert_eq!(tab.text(), "foo bar baz\nfoo");
    }

    #[test]
    fn escape_closes_find_when_editor_has_focus() {
        let mut tab = tab_with("abc");
        tab.open_find();
        tab.find.set_focused(false);
        tab.handle_key(key(KeyCode::Esc));
        assert!(!tab.is_find_visible());
    }

    #[test]
    fn explicit_completion_inserts_selected_word() {
        let mut tab = tab_with("counter = 1\n");
        tab.set_language(None);
        tab.apply_command(EditorCommand::DocumentEnd).unwrap();
        type_str(&mut tab, "cou");
        tab.apply_command(EditorCommand::TriggerCompletion).unwrap();
        assert!(tab.is_completion_visible());

        // The typed word itself is offered first
        tab.handle_key(key(KeyCode::Down));
        tab.handle_key(key(KeyCode::Down));
        tab.handle_key(key(KeyCode::Enter));
        assert_eq!(tab.text(), "counter = 1\ncounter");
        assert_eq!(tab.cursor(), Cursor::at(1, 7));
        assert!(!tab.is_completion_visible());
    }

    #[test]
    fn movement_hides_completion() {
        let mut tab = tab_with("counter = 1\n");
        tab.apply_command(EditorCommand::DocumentEnd).unwrap();
        type_str(&mut tab, "cou");
        tab.apply_command(EditorCommand::TriggerCompletion).unwrap();
        tab.handle_key(key(KeyCode::Left));
        assert!(!tab.is_completion_visible());
    }
}
