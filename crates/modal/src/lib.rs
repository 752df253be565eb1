//! Modal dialog system for capi.
//!
//! Dialogs are drawn centered over the whole screen with the theme's window
//! background and report their outcome through [`ModalResult`].

use anyhow::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Clear, Widget},
};
use unicode_width::UnicodeWidthStr;

use capi_theme::Theme;

pub mod confirm;
pub mod info;
pub mod input;
pub mod select;
mod text_input;

pub use confirm::ConfirmModal;
pub use info::InfoModal;
pub use input::InputModal;
pub use select::SelectModal;
pub use text_input::TextInput;

/// Minimum modal width.
pub const MIN_WIDTH: u16 = 30;
/// Maximum width as a fraction of the screen.
pub const MAX_WIDTH_FRACTION: f32 = 0.75;
/// Border plus inner margin on both sides.
const PADDING: u16 = 6;

/// Modal window result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalResult<T> {
    Confirmed(T),
    Cancelled,
}

/// Trait for all modal windows.
pub trait Modal {
    type Result;

    fn render(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme);

    /// Returns Some(result) when the modal should close.
    fn handle_key(&mut self, key: KeyEvent) -> Result<Option<ModalResult<Self::Result>>>;

    fn handle_mouse(&mut self, _mouse: MouseEvent) -> Result<Option<ModalResult<Self::Result>>> {
        Ok(None)
    }
}

/// Rectangle of `width` x `height` centered in `r` (clamped to `r`).
pub fn centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    Rect::new(
        r.x + (r.width - width) / 2,
        r.y + (r.height - height) / 2,
        width,
        height,
    )
}

/// Width that fits the widest content line within screen limits.
pub fn modal_width<'a>(content: impl Iterator<Item = &'a str>, screen_width: u16) -> u16 {
    let widest = content.map(|s| s.width()).max().unwrap_or(0) as u16;
    let max_width = (screen_width as f32 * MAX_WIDTH_FRACTION) as u16;
    (widest + PADDING).max(MIN_WIDTH).min(max_width).min(screen_width)
}

/// Clear `area` and draw the titled frame; returns the inner area.
pub(crate) fn render_frame(area: Rect, buf: &mut Buffer, theme: &Theme, title: &str) -> Rect {
    Clear.render(area, buf);
    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.splitter))
        .style(Style::default().bg(theme.window_bg).fg(theme.fg));
    let inner = block.inner(area);
    block.render(area, buf);
    inner
}

/// Style of a button or list row, highlighted when selected.
pub(crate) fn item_style(theme: &Theme, selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(theme.fg)
            .bg(theme.select_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.fg)
    }
}

pub(crate) fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height
}

/// The modal currently shown, if any.
#[derive(Debug)]
pub enum ActiveModal<C, I> {
    Confirm(Box<ConfirmModal>, C),
    Input(Box<InputModal>, I),
    /// Theme picker
    Select(Box<SelectModal>),
    Info(Box<InfoModal>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_centers_and_clamps() {
        let r = centered_rect(40, 10, Rect::new(0, 0, 100, 50));
        assert_eq!(r, Rect::new(30, 20, 40, 10));

        let r = centered_rect(40, 10, Rect::new(10, 5, 100, 50));
        assert_eq!((r.x, r.y), (40, 25));

        let r = centered_rect(50, 25, Rect::new(0, 0, 30, 20));
        assert_eq!((r.width, r.height), (30, 20));
    }

    #[test]
    fn width_respects_limits() {
        assert_eq!(modal_width(["short"].into_iter(), 200), MIN_WIDTH);
        assert_eq!(modal_width(["x".repeat(50).as_str()].into_iter(), 200), 56);
        assert_eq!(modal_width(["x".repeat(300).as_str()].into_iter(), 100), 75);
    }
}
