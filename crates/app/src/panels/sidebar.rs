use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, Widget},
};

use capi_core::{ConfirmAction, InputAction, Panel, PanelEvent, RenderContext};
use capi_file_tree::{operations, Activation, ClipMode, FileClipboard, FileTree, PasteOutcome};
use capi_theme::Theme;

use super::contains;

/// Two clicks on the same row within this window activate it.
const DOUBLE_CLICK: Duration = Duration::from_millis(400);
const WHEEL_ROWS: usize = 3;
const NO_PROJECT: &str = "Open Project...";

/// Context menu entries of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarAction {
    NewFile,
    NewFolder,
    Rename,
    Delete,
    Copy,
    Cut,
    Paste,
    CopyPath,
    OpenInTerminal,
}

const CONTEXT_ITEMS: &[(SidebarAction, &str)] = &[
    (SidebarAction::NewFile, "New File"),
    (SidebarAction::NewFolder, "New Folder"),
    (SidebarAction::Rename, "Rename        F2"),
    (SidebarAction::Delete, "Delete       Del"),
    (SidebarAction::Copy, "Copy      Ctrl+C"),
    (SidebarAction::Cut, "Cut       Ctrl+X"),
    (SidebarAction::Paste, "Paste     Ctrl+V"),
    (SidebarAction::CopyPath, "Copy Path"),
    (SidebarAction::OpenInTerminal, "Open in Terminal"),
];

#[derive(Debug, Clone, Copy)]
struct ContextMenu {
    selected: usize,
    x: u16,
    y: u16,
}

impl ContextMenu {
    fn rect(&self, screen: Rect) -> Rect {
        let width = CONTEXT_ITEMS
            .iter()
            .map(|(_, label)| label.len() as u16 + 4)
            .max()
            .unwrap_or(0)
            .min(screen.width);
        let height = (CONTEXT_ITEMS.len() as u16 + 2).min(screen.height);
        let x = self.x.min(screen.right().saturating_sub(width));
        let y = self.y.min(screen.bottom().saturating_sub(height));
        Rect::new(x, y, width, height)
    }
}

/// Project tree in the left sidebar.
///
/// The first row is the project button; clicking it asks for a new root.
/// File operations report back through [`PanelEvent`]s so open tabs can
/// follow renames and deletions.
pub struct SidebarPanel {
    tree: FileTree,
    clipboard: FileClipboard,
    context_menu: Option<ContextMenu>,
    /// Buffer area of the last frame, for clamping the context menu
    screen: Rect,
    offset: usize,
    last_click: Option<(usize, Instant)>,
}

impl Default for SidebarPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl SidebarPanel {
    pub fn new() -> Self {
        Self {
            tree: FileTree::new(),
            clipboard: FileClipboard::new(),
            context_menu: None,
            screen: Rect::default(),
            offset: 0,
            last_click: None,
        }
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn root(&self) -> Option<&Path> {
        self.tree.root()
    }

    pub fn set_root(&mut self, root: Option<PathBuf>) -> Result<()> {
        self.context_menu = None;
        self.offset = 0;
        self.tree.set_root(root)
    }

    /// Re-read the tree after an outside change.
    pub fn refresh(&mut self) {
        if let Err(e) = self.tree.refresh() {
            log::warn!("Could not refresh the project tree: {:#}", e);
        }
    }

    /// Select the row of `path` if it lies in the project.
    pub fn reveal(&mut self, path: &Path) -> bool {
        self.tree.select_path(path)
    }

    pub fn is_context_menu_open(&self) -> bool {
        self.context_menu.is_some()
    }

    fn status(message: impl Into<String>, is_error: bool) -> PanelEvent {
        PanelEvent::SetStatus {
            message: message.into(),
            is_error,
        }
    }

    fn rename_prompt(path: &Path) -> PanelEvent {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        PanelEvent::ShowInput {
            title: "Rename".into(),
            prompt: "New name:".into(),
            initial: name,
            on_submit: InputAction::Rename {
                from: path.to_path_buf(),
            },
        }
    }

    /// Run a tree action on the selected row.
    pub fn run_action(&mut self, action: SidebarAction) -> Vec<PanelEvent> {
        self.context_menu = None;
        let selected = self.tree.selected_row().cloned();

        match action {
            SidebarAction::NewFile | SidebarAction::NewFolder => {
                let Some(dir) = self.tree.target_dir() else {
                    return vec![Self::status("Open a project first", true)];
                };
                let created = if action == SidebarAction::NewFile {
                    operations::create_file(&dir)
                } else {
                    operations::create_folder(&dir)
                };
                match created {
                    Ok(path) => {
                        self.refresh();
                        self.tree.select_path(&path);
                        vec![Self::rename_prompt(&path)]
                    }
                    Err(e) => vec![Self::status(format!("{:#}", e), true)],
                }
            }
            SidebarAction::Rename => match selected {
                Some(row) => vec![Self::rename_prompt(&row.path)],
                None => vec![],
            },
            SidebarAction::Delete => match selected {
                Some(row) => vec![PanelEvent::ShowConfirm {
                    title: "Delete".into(),
                    message: format!("Delete '{}'?", row.name),
                    on_confirm: ConfirmAction::DeletePath(row.path),
                }],
                None => vec![],
            },
            SidebarAction::Copy | SidebarAction::Cut => {
                let Some(row) = selected else {
                    return vec![];
                };
                if action == SidebarAction::Copy {
                    self.clipboard.copy(&row.path);
                    vec![Self::status(format!("Copied '{}'", row.name), false)]
                } else {
                    self.clipboard.cut(&row.path);
                    vec![Self::status(format!("Cut '{}'", row.name), false)]
                }
            }
            SidebarAction::Paste => match self.tree.target_dir() {
                Some(target) => self.paste_into(target, false),
                None => vec![Self::status("Open a project first", true)],
            },
            SidebarAction::CopyPath => {
                let Some(row) = selected else {
                    return vec![];
                };
                match capi_clipboard::copy(&row.path.display().to_string()) {
                    Ok(()) => vec![Self::status("Path copied", false)],
                    Err(e) => vec![Self::status(format!("{:#}", e), true)],
                }
            }
            SidebarAction::OpenInTerminal => {
                let dir = match selected {
                    Some(row) if row.is_dir => Some(row.path),
                    Some(row) => row.path.parent().map(Path::to_path_buf),
                    None => self.tree.root().map(Path::to_path_buf),
                };
                dir.map(PanelEvent::OpenInTerminal).into_iter().collect()
            }
        }
    }

    /// Paste the internal clipboard into `target`. Without `overwrite` an
    /// existing destination turns into a confirmation.
    pub fn paste_into(&mut self, target: PathBuf, overwrite: bool) -> Vec<PanelEvent> {
        let source = self
            .clipboard
            .entry()
            .map(|(path, mode)| (path.to_path_buf(), mode));

        match self.clipboard.paste(&target, overwrite) {
            Ok(PasteOutcome::Pasted(destination)) => {
                self.refresh();
                self.tree.select_path(&destination);
                let mut events = vec![Self::status("Pasted", false)];
                if let Some((from, ClipMode::Cut)) = source {
                    if from != destination {
                        events.push(PanelEvent::PathMoved {
                            from,
                            to: destination,
                        });
                    }
                }
                events
            }
            Ok(PasteOutcome::NeedsOverwrite(destination)) => {
                let name = destination
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                vec![PanelEvent::ShowConfirm {
                    title: "Overwrite".into(),
                    message: format!("'{}' already exists. Replace it?", name),
                    on_confirm: ConfirmAction::OverwritePaste { target_dir: target },
                }]
            }
            Ok(PasteOutcome::Empty) => vec![Self::status("Nothing to paste", false)],
            Err(e) => vec![Self::status(format!("{:#}", e), true)],
        }
    }

    fn activate(&mut self) -> Vec<PanelEvent> {
        match self.tree.activate() {
            Ok(Activation::OpenFile(path)) => vec![PanelEvent::OpenFile(path)],
            Ok(Activation::Toggled) => vec![PanelEvent::NeedsRedraw],
            Ok(Activation::Nothing) => vec![],
            Err(e) => vec![Self::status(format!("{:#}", e), true)],
        }
    }

    fn open_project_prompt(&self) -> PanelEvent {
        PanelEvent::ShowInput {
            title: "Open Project".into(),
            prompt: "Folder:".into(),
            initial: self
                .tree
                .root()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            on_submit: InputAction::OpenProject,
        }
    }

    fn handle_context_key(&mut self, key: KeyEvent) -> Vec<PanelEvent> {
        let Some(menu) = self.context_menu.as_mut() else {
            return vec![];
        };
        match key.code {
            KeyCode::Up => menu.selected = (menu.selected + CONTEXT_ITEMS.len() - 1) % CONTEXT_ITEMS.len(),
            KeyCode::Down => menu.selected = (menu.selected + 1) % CONTEXT_ITEMS.len(),
            KeyCode::Enter => {
                let action = CONTEXT_ITEMS[menu.selected].0;
                return self.run_action(action);
            }
            KeyCode::Esc => self.context_menu = None,
            _ => {}
        }
        vec![PanelEvent::NeedsRedraw]
    }

    fn open_context_menu(&mut self, x: u16, y: u16) {
        self.context_menu = Some(ContextMenu { selected: 0, x, y });
    }

    fn render_context_menu(&self, buf: &mut Buffer, theme: &Theme) {
        let Some(menu) = self.context_menu else {
            return;
        };
        let area = menu.rect(self.screen);
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.splitter).bg(theme.window_bg))
            .style(Style::default().bg(theme.window_bg).fg(theme.fg));
        let inner = block.inner(area);
        block.render(area, buf);
        for (i, (_, label)) in CONTEXT_ITEMS.iter().enumerate().take(inner.height as usize) {
            let style = if i == menu.selected {
                Style::default().bg(theme.select_bg).fg(theme.fg)
            } else {
                Style::default().bg(theme.window_bg).fg(theme.fg)
            };
            let y = inner.y + i as u16;
            buf.set_style(Rect::new(inner.x, y, inner.width, 1), style);
            buf.set_stringn(inner.x + 1, y, label, inner.width.saturating_sub(1) as usize, style);
        }
    }

    /// Tree row under a screen row, given the panel area.
    fn row_at(&self, area: Rect, row: u16) -> Option<usize> {
        if row <= area.y || row >= area.bottom() {
            return None;
        }
        let index = self.offset + (row - area.y - 1) as usize;
        (index < self.tree.rows().len()).then_some(index)
    }
}

impl Panel for SidebarPanel {
    fn title(&self) -> String {
        self.tree.root_label(NO_PROJECT)
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer, ctx: &RenderContext) {
        self.screen = buf.area;
        if area.width == 0 || area.height == 0 {
            return;
        }
        let theme = ctx.theme;
        let base = Style::default().bg(theme.window_bg).fg(theme.fg);
        buf.set_style(area, base);

        let header = format!(" 📁 {}", self.title());
        buf.set_stringn(
            area.x,
            area.y,
            header,
            area.width as usize,
            base.add_modifier(Modifier::BOLD),
        );

        let height = area.height.saturating_sub(1) as usize;
        self.offset = self.tree.scroll_offset(height);
        let selected = self.tree.selected();

        for (i, row) in self.tree.rows().iter().enumerate().skip(self.offset).take(height) {
            let y = area.y + 1 + (i - self.offset) as u16;
            let style = if i == selected {
                let bg = if ctx.is_focused { theme.select_bg } else { theme.line_bg };
                base.bg(bg)
            } else {
                base
            };
            buf.set_style(Rect::new(area.x, y, area.width, 1), style);

            let arrow = match (row.is_dir, row.expanded) {
                (true, true) => "▾ ",
                (true, false) => "▸ ",
                (false, _) => "  ",
            };
            let text = format!(
                " {}{}{} {}",
                "  ".repeat(row.depth),
                arrow,
                row.icon(),
                row.name
            );
            buf.set_stringn(area.x, y, text, area.width as usize, style);
        }

        self.render_context_menu(buf, theme);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<PanelEvent> {
        if self.context_menu.is_some() {
            return self.handle_context_key(key);
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let result = match key.code {
            KeyCode::Up => {
                self.tree.move_up();
                Ok(())
            }
            KeyCode::Down => {
                self.tree.move_down();
                Ok(())
            }
            KeyCode::Home => {
                self.tree.select(0);
                Ok(())
            }
            KeyCode::End => {
                self.tree.select(usize::MAX);
                Ok(())
            }
            KeyCode::PageUp => {
                self.tree.select(self.tree.selected().saturating_sub(10));
                Ok(())
            }
            KeyCode::PageDown => {
                self.tree.select(self.tree.selected() + 10);
                Ok(())
            }
            KeyCode::Right => self.tree.expand(),
            KeyCode::Left => self.tree.collapse_or_parent(),
            KeyCode::Enter => return self.activate(),
            KeyCode::F(2) => return self.run_action(SidebarAction::Rename),
            KeyCode::Delete => return self.run_action(SidebarAction::Delete),
            KeyCode::Char('c') if ctrl => return self.run_action(SidebarAction::Copy),
            KeyCode::Char('x') if ctrl => return self.run_action(SidebarAction::Cut),
            KeyCode::Char('v') if ctrl => return self.run_action(SidebarAction::Paste),
            KeyCode::Menu | KeyCode::Char('m') => {
                let y = self.screen.y + 1 + (self.tree.selected().saturating_sub(self.offset)) as u16;
                self.open_context_menu(self.screen.x + 2, y + 1);
                Ok(())
            }
            _ => return vec![],
        };
        match result {
            Ok(()) => vec![PanelEvent::NeedsRedraw],
            Err(e) => vec![Self::status(format!("{:#}", e), true)],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect) -> Vec<PanelEvent> {
        let (column, row) = (event.column, event.row);

        if let Some(menu) = self.context_menu {
            let rect = menu.rect(self.screen);
            if let MouseEventKind::Down(_) = event.kind {
                let inner_row = row.checked_sub(rect.y + 1).map(usize::from);
                return match inner_row {
                    Some(i) if contains(rect, column, row) && i < CONTEXT_ITEMS.len() => {
                        self.run_action(CONTEXT_ITEMS[i].0)
                    }
                    _ => {
                        self.context_menu = None;
                        vec![PanelEvent::NeedsRedraw]
                    }
                };
            }
            return vec![];
        }

        match event.kind {
            MouseEventKind::ScrollUp => {
                for _ in 0..WHEEL_ROWS {
                    self.tree.move_up();
                }
                vec![PanelEvent::NeedsRedraw]
            }
            MouseEventKind::ScrollDown => {
                for _ in 0..WHEEL_ROWS {
                    self.tree.move_down();
                }
                vec![PanelEvent::NeedsRedraw]
            }
            MouseEventKind::Down(button) => {
                if row == area.y {
                    return if button == MouseButton::Left {
                        vec![self.open_project_prompt()]
                    } else {
                        vec![]
                    };
                }
                let Some(index) = self.row_at(area, row) else {
                    return vec![];
                };
                self.tree.select(index);

                match button {
                    MouseButton::Right => {
                        self.open_context_menu(column, row);
                        vec![PanelEvent::NeedsRedraw]
                    }
                    MouseButton::Left => {
                        let now = Instant::now();
                        let double = self.last_click.is_some_and(|(last, at)| {
                            last == index && now.duration_since(at) < DOUBLE_CLICK
                        });
                        self.last_click = Some((index, now));
                        let is_dir = self.tree.selected_row().is_some_and(|r| r.is_dir);
                        if double || is_dir {
                            self.last_click = None;
                            self.activate()
                        } else {
                            vec![PanelEvent::NeedsRedraw]
                        }
                    }
                    MouseButton::Middle => vec![],
                }
            }
            _ => vec![],
        }
    }
}
