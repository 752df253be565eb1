//! Core types and traits for capi panels.
//!
//! Panels (sidebar, editor tabs, runner, search results) never touch the
//! application state directly; they return [`PanelEvent`]s that the app
//! applies.

pub mod event;
pub mod panel;

pub use event::{ConfirmAction, Event, EventHandler, InputAction, PanelEvent};
pub use panel::{Panel, RenderContext};

pub use capi_theme::Theme;
