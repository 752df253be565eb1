use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{buffer::Buffer, layout::Rect};

use capi_theme::Theme;

use crate::PanelEvent;

/// Render context passed to panels.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub theme: &'a Theme,
    pub is_focused: bool,
}

/// Trait for all capi panels.
///
/// Panels communicate with the application through `PanelEvent`s
/// instead of modifying application state.
pub trait Panel {
    /// Title shown in the panel header or tab.
    fn title(&self) -> String;

    fn render(&mut self, area: Rect, buf: &mut Buffer, ctx: &RenderContext);

    fn handle_key(&mut self, key: KeyEvent) -> Vec<PanelEvent>;

    /// `area` is the panel's last rendered area, for coordinate translation.
    fn handle_mouse(&mut self, event: MouseEvent, area: Rect) -> Vec<PanelEvent> {
        let _ = (event, area);
        vec![]
    }

    /// Periodic work between key presses.
    fn tick(&mut self) -> Vec<PanelEvent> {
        vec![]
    }
}
