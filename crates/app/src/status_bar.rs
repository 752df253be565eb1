use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
};
use unicode_width::UnicodeWidthStr;

use capi_theme::Theme;

/// What the status bar shows, gathered from the app state.
pub struct StatusBarParams<'a> {
    pub theme: &'a Theme,
    /// Status message (message, is_error)
    pub message: Option<&'a (String, bool)>,
    /// Runner state, shown when there is no message
    pub runner_label: String,
    /// `Ln X, Col Y` of the active editor
    pub position: Option<String>,
    /// Language of the active editor, uppercase
    pub language: Option<String>,
    pub autosave: bool,
}

pub fn render_status_bar(area: Rect, buf: &mut Buffer, params: &StatusBarParams<'_>) {
    if area.height == 0 {
        return;
    }
    let theme = params.theme;
    let base = Style::default().bg(theme.window_bg).fg(theme.fg);
    buf.set_style(area, base);

    let mut right = Vec::new();
    if let Some(position) = &params.position {
        right.push(position.clone());
    }
    if let Some(language) = &params.language {
        right.push(language.clone());
    }
    if params.autosave {
        right.push("Autosave".to_string());
    }
    let right = format!(" {} ", right.join("  |  "));
    let right_width = right.width() as u16;

    let left_width = area.width.saturating_sub(right_width) as usize;
    let (left, left_style) = match params.message {
        Some((message, true)) => (
            format!(" {}", message),
            base.fg(theme.error).add_modifier(Modifier::BOLD),
        ),
        Some((message, false)) => (format!(" {}", message), base.fg(theme.success)),
        None => (format!(" {}", params.runner_label), base.fg(theme.line_fg)),
    };
    buf.set_stringn(area.x, area.y, left, left_width, left_style);

    if right_width <= area.width {
        buf.set_string(area.right() - right_width, area.y, right, base);
    }
}
