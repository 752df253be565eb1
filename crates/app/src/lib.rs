//! Application shell for capi.
//!
//! Owns the window layout (menu bar, sidebar, tab bar, editor, bottom panel
//! and status bar), routes input to the focused part and applies the
//! [`capi_core::PanelEvent`]s the panels emit.

mod app;
pub mod menu;
pub mod panels;
pub mod state;
pub mod status_bar;

pub use app::App;
pub use state::{AppState, BottomView, Focus};
