//! Menu bar and drop-down menus.
//!
//! Menus are rebuilt from [`MenuFlags`] on every use so check marks always
//! reflect the current settings.

use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use capi_config::defaults::TAB_SIZES;
use capi_theme::Theme;

/// Leading blank before the first menu title.
const BAR_PADDING: u16 = 1;
/// Gap between menu titles.
const TITLE_GAP: u16 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    NewTab,
    NewFile,
    NewFolder,
    OpenProject,
    OpenFile,
    Save,
    SaveAs,
    CloseTab,
    Quit,

    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
    SelectAll,
    Find,
    FindInFiles,
    GoToLine,

    ToggleMinimap,
    ToggleSidebar,

    ToggleAutosave,
    TabWidth(usize),

    RunScript,
    ShowTerminal,
    StopScript,

    SetTheme(String),
    /// Picker over built-in and user themes
    ChooseTheme,

    Shortcuts,
    ShowLog,
    About,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub shortcut: &'static str,
    pub action: MenuAction,
    /// Some for toggles and radio entries
    pub checked: Option<bool>,
}

impl MenuItem {
    fn new(label: impl Into<String>, shortcut: &'static str, action: MenuAction) -> Self {
        Self {
            label: label.into(),
            shortcut,
            action,
            checked: None,
        }
    }

    fn checked(mut self, on: bool) -> Self {
        self.checked = Some(on);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub title: &'static str,
    pub items: Vec<MenuItem>,
}

/// Settings shown as check marks.
#[derive(Debug, Clone, Copy)]
pub struct MenuFlags<'a> {
    pub minimap: bool,
    pub sidebar: bool,
    pub autosave: bool,
    pub tab_size: usize,
    pub theme: &'a str,
}

pub fn build_menus(flags: &MenuFlags) -> Vec<Menu> {
    use MenuAction::*;

    let file = vec![
        MenuItem::new("New Tab", "Ctrl+N", NewTab),
        MenuItem::new("New File", "", NewFile),
        MenuItem::new("New Folder", "Ctrl+Shift+N", NewFolder),
        MenuItem::new("Open Project...", "", OpenProject),
        MenuItem::new("Open File...", "Ctrl+O", OpenFile),
        MenuItem::new("Save", "Ctrl+S", Save),
        MenuItem::new("Save As...", "Ctrl+Shift+S", SaveAs),
        MenuItem::new("Close Tab", "Ctrl+W", CloseTab),
        MenuItem::new("Quit", "Ctrl+Q", Quit),
    ];
    let edit = vec![
        MenuItem::new("Undo", "Ctrl+Z", Undo),
        MenuItem::new("Redo", "Ctrl+Y", Redo),
        MenuItem::new("Cut", "Ctrl+X", Cut),
        MenuItem::new("Copy", "Ctrl+C", Copy),
        MenuItem::new("Paste", "Ctrl+V", Paste),
        MenuItem::new("Select All", "Ctrl+A", SelectAll),
        MenuItem::new("Find / Replace", "Ctrl+F", Find),
        MenuItem::new("Find in Files", "Ctrl+Shift+F", FindInFiles),
        MenuItem::new("Go to Line", "Ctrl+G", GoToLine),
    ];
    let view = vec![
        MenuItem::new("Minimap", "", ToggleMinimap).checked(flags.minimap),
        MenuItem::new("Sidebar", "Ctrl+B", ToggleSidebar).checked(flags.sidebar),
    ];
    let mut settings = vec![MenuItem::new("Autosave", "", ToggleAutosave).checked(flags.autosave)];
    settings.extend(TAB_SIZES.iter().map(|&size| {
        MenuItem::new(format!("Tab Width: {}", size), "", TabWidth(size))
            .checked(flags.tab_size == size)
    }));
    let run = vec![
        MenuItem::new("Run Script", "F5", RunScript),
        MenuItem::new("Show Terminal", "Ctrl+J", ShowTerminal),
        MenuItem::new("Stop", "", StopScript),
    ];
    let mut theme: Vec<MenuItem> = Theme::all_theme_names()
        .iter()
        .map(|name| {
            MenuItem::new(*name, "", SetTheme(name.to_string())).checked(flags.theme == *name)
        })
        .collect();
    theme.push(MenuItem::new("More Themes...", "", ChooseTheme));
    let help = vec![
        MenuItem::new("Shortcuts", "Ctrl+Shift+B", Shortcuts),
        MenuItem::new("Show Log", "", ShowLog),
        MenuItem::new("About", "F1", About),
    ];

    vec![
        Menu { title: "File", items: file },
        Menu { title: "Edit", items: edit },
        Menu { title: "View", items: view },
        Menu { title: "Settings", items: settings },
        Menu { title: "Run", items: run },
        Menu { title: "Theme", items: theme },
        Menu { title: "Help", items: help },
    ]
}

/// Open drop-down and highlighted entry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MenuState {
    pub open: Option<usize>,
    pub selected: usize,
}

impl MenuState {
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn open(&mut self, menu: usize) {
        self.open = Some(menu);
        self.selected = 0;
    }

    pub fn close(&mut self) {
        self.open = None;
        self.selected = 0;
    }

    pub fn next_menu(&mut self, count: usize) {
        if let Some(menu) = self.open {
            self.open((menu + 1) % count.max(1));
        }
    }

    pub fn prev_menu(&mut self, count: usize) {
        if let Some(menu) = self.open {
            let count = count.max(1);
            self.open((menu + count - 1) % count);
        }
    }

    pub fn next_item(&mut self, count: usize) {
        if count > 0 {
            self.selected = (self.selected + 1) % count;
        }
    }

    pub fn prev_item(&mut self, count: usize) {
        if count > 0 {
            self.selected = (self.selected + count - 1) % count;
        }
    }
}

/// Start column and width of each title, relative to the bar.
pub fn title_spans(menus: &[Menu]) -> Vec<(u16, u16)> {
    let mut x = BAR_PADDING;
    menus
        .iter()
        .map(|menu| {
            let width = menu.title.width() as u16;
            let span = (x, width);
            x += width + TITLE_GAP;
            span
        })
        .collect()
}

/// Menu whose title covers column `x` of the bar.
pub fn title_at(menus: &[Menu], x: u16) -> Option<usize> {
    title_spans(menus)
        .iter()
        .position(|&(start, width)| x >= start && x < start + width)
}

/// Render the menu bar: titles with an accented first letter, the clock on
/// the right.
pub fn render_menu_bar(area: Rect, buf: &mut Buffer, menus: &[Menu], state: &MenuState, theme: &Theme) {
    if area.height == 0 {
        return;
    }
    let bar_style = Style::default().bg(theme.window_bg).fg(theme.fg);
    let mut spans = vec![Span::styled(" ".repeat(BAR_PADDING as usize), bar_style)];

    for (i, menu) in menus.iter().enumerate() {
        let (base, accent) = if state.open == Some(i) {
            let style = Style::default()
                .bg(theme.select_bg)
                .fg(theme.fg)
                .add_modifier(Modifier::BOLD);
            (style, style)
        } else {
            (
                bar_style,
                bar_style.fg(theme.syntax.keyword).add_modifier(Modifier::BOLD),
            )
        };
        let mut chars = menu.title.chars();
        if let Some(first) = chars.next() {
            spans.push(Span::styled(first.to_string(), accent));
            spans.push(Span::styled(chars.as_str(), base));
        }
        spans.push(Span::styled(" ".repeat(TITLE_GAP as usize), bar_style));
    }

    let hint = if state.is_open() { "Esc close " } else { "F10 menu " };
    let clock = format!(" {} ", Local::now().format("%H:%M"));
    let used: usize = spans.iter().map(|s| s.width()).sum();
    let remaining = (area.width as usize).saturating_sub(used + hint.width() + clock.width());
    spans.push(Span::styled(" ".repeat(remaining), bar_style));
    spans.push(Span::styled(hint, bar_style.fg(theme.line_fg)));
    spans.push(Span::styled(clock, bar_style.add_modifier(Modifier::BOLD)));

    Paragraph::new(Line::from(spans))
        .style(bar_style)
        .render(area, buf);
}

fn item_text(item: &MenuItem, label_width: usize, shortcut_width: usize) -> String {
    let mark = match item.checked {
        Some(true) => "✓ ",
        _ => "  ",
    };
    let label_pad = label_width.saturating_sub(item.label.width());
    let shortcut_pad = shortcut_width.saturating_sub(item.shortcut.width());
    format!(
        "{}{}{}  {}{} ",
        mark,
        item.label,
        " ".repeat(label_pad),
        " ".repeat(shortcut_pad),
        item.shortcut
    )
}

fn column_widths(menu: &Menu) -> (usize, usize) {
    let label = menu.items.iter().map(|i| i.label.width()).max().unwrap_or(0);
    let shortcut = menu.items.iter().map(|i| i.shortcut.width()).max().unwrap_or(0);
    (label, shortcut)
}

/// Screen rectangle of the open drop-down, directly under its title.
pub fn dropdown_rect(menus: &[Menu], state: &MenuState, bar: Rect, screen: Rect) -> Option<Rect> {
    let index = state.open?;
    let menu = menus.get(index)?;
    let (start, _) = *title_spans(menus).get(index)?;
    let (label, shortcut) = column_widths(menu);
    // check mark, gaps and borders
    let width = ((label + shortcut + 5 + 2) as u16).min(screen.width);
    let height = ((menu.items.len() + 2) as u16).min(screen.height.saturating_sub(1));
    let x = (bar.x + start.saturating_sub(1)).min(screen.right().saturating_sub(width));
    Some(Rect::new(x, bar.y + 1, width, height))
}

/// Item under a screen position inside the drop-down.
pub fn item_at(menus: &[Menu], state: &MenuState, dropdown: Rect, column: u16, row: u16) -> Option<usize> {
    let menu = menus.get(state.open?)?;
    let inside = column > dropdown.x
        && column + 1 < dropdown.right()
        && row > dropdown.y
        && row + 1 < dropdown.bottom();
    if !inside {
        return None;
    }
    let index = (row - dropdown.y - 1) as usize;
    (index < menu.items.len()).then_some(index)
}

pub fn render_dropdown(area: Rect, buf: &mut Buffer, menus: &[Menu], state: &MenuState, theme: &Theme) {
    let Some(menu) = state.open.and_then(|i| menus.get(i)) else {
        return;
    };
    Clear.render(area, buf);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.splitter).bg(theme.window_bg))
        .style(Style::default().bg(theme.window_bg).fg(theme.fg));
    let inner = block.inner(area);
    block.render(area, buf);

    let (label, shortcut) = column_widths(menu);
    for (row, item) in menu.items.iter().enumerate().take(inner.height as usize) {
        let style = if row == state.selected {
            Style::default()
                .bg(theme.select_bg)
                .fg(theme.fg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().bg(theme.window_bg).fg(theme.fg)
        };
        let y = inner.y + row as u16;
        buf.set_style(Rect::new(inner.x, y, inner.width, 1), style);
        buf.set_stringn(
            inner.x,
            y,
            item_text(item, label, shortcut),
            inner.width as usize,
            style,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags() -> MenuFlags<'static> {
        MenuFlags {
            minimap: true,
            sidebar: false,
            autosave: true,
            tab_size: 4,
            theme: "Dracula",
        }
    }

    #[test]
    fn menus_reflect_settings() {
        let menus = build_menus(&flags());
        let titles: Vec<&str> = menus.iter().map(|m| m.title).collect();
        assert_eq!(titles, ["File", "Edit", "View", "Settings", "Run", "Theme", "Help"]);

        let view = &menus[2];
        assert_eq!(view.items[0].checked, Some(true));
        assert_eq!(view.items[1].checked, Some(false));

        let settings = &menus[3];
        let checked: Vec<&MenuAction> = settings
            .items
            .iter()
            .filter(|i| i.checked == Some(true))
            .map(|i| &i.action)
            .collect();
        assert_eq!(checked, [&MenuAction::ToggleAutosave, &MenuAction::TabWidth(4)]);

        let theme = &menus[5];
        let current = theme.items.iter().find(|i| i.checked == Some(true)).unwrap();
        assert_eq!(current.action, MenuAction::SetTheme("Dracula".into()));
        assert_eq!(theme.items.last().unwrap().action, MenuAction::ChooseTheme);
    }

    #[test]
    fn title_hit_testing() {
        let menus = build_menus(&flags());
        // " File  Edit  ..."
        assert_eq!(title_at(&menus, 0), None);
        assert_eq!(title_at(&menus, 1), Some(0));
        assert_eq!(title_at(&menus, 4), Some(0));
        assert_eq!(title_at(&menus, 5), None);
        assert_eq!(title_at(&menus, 7), Some(1));
    }

    #[test]
    fn navigation_wraps() {
        let mut state = MenuState::default();
        state.next_menu(7);
        assert_eq!(state.open, None);

        state.open(0);
        state.prev_menu(7);
        assert_eq!(state.open, Some(6));
        state.next_menu(7);
        assert_eq!(state.open, Some(0));

        state.prev_item(3);
        assert_eq!(state.selected, 2);
        state.next_item(3);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn dropdown_hit_testing() {
        let menus = build_menus(&flags());
        let mut state = MenuState::default();
        state.open(1);
        let screen = Rect::new(0, 0, 100, 40);
        let rect = dropdown_rect(&menus, &state, Rect::new(0, 0, 100, 1), screen).unwrap();
        assert_eq!(rect.y, 1);
        assert_eq!(rect.height, menus[1].items.len() as u16 + 2);

        assert_eq!(item_at(&menus, &state, rect, rect.x + 1, rect.y + 1), Some(0));
        assert_eq!(item_at(&menus, &state, rect, rect.x + 1, rect.y), None);
        assert_eq!(item_at(&menus, &state, rect, rect.x, rect.y + 2), None);
    }

    #[test]
    fn bar_shows_titles() {
        let menus = build_menus(&flags());
        let area = Rect::new(0, 0, 80, 1);
        let mut buf = Buffer::empty(area);
        render_menu_bar(area, &mut buf, &menus, &MenuState::default(), Theme::get_by_name("Dark"));
        let text: String = (0..80).map(|x| buf[(x, 0)].symbol()).collect();
        assert!(text.starts_with(" File  Edit  View"));
        assert!(text.contains("F10 menu"));
    }
}
