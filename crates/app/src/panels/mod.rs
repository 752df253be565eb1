//! Panels around the editor: project sidebar, runner output and project
//! search results.

mod runner_panel;
mod search_panel;
mod sidebar;

pub use runner_panel::RunnerPanel;
pub use search_panel::SearchPanel;
pub use sidebar::{SidebarAction, SidebarPanel};

use ratatui::layout::Rect;

pub(crate) fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.right() && row >= area.y && row < area.bottom()
}
