//! Applying the events panels emit.

use capi_core::PanelEvent;
use capi_modal::{ActiveModal, ConfirmModal, InputModal};

use super::App;
use crate::state::BottomView;

impl App {
    pub(crate) fn process_panel_events(&mut self, events: Vec<PanelEvent>) {
        for event in events {
            match event {
                PanelEvent::NeedsRedraw => {}
                PanelEvent::OpenFile(path) => {
                    if let Err(e) = self.open_file(&path) {
                        self.state.set_error(format!("{:#}", e));
                    }
                }
                PanelEvent::OpenFileAt { path, line } => self.open_file_at(&path, line),
                PanelEvent::SetStatus { message, is_error } => {
                    if is_error {
                        self.state.set_error(message);
                    } else {
                        self.state.set_info(message);
                    }
                }
                PanelEvent::ShowConfirm {
                    title,
                    message,
                    on_confirm,
                } => {
                    self.modal = Some(ActiveModal::Confirm(
                        Box::new(ConfirmModal::new(title, message)),
                        on_confirm,
                    ));
                }
                PanelEvent::ShowInput {
                    title,
                    prompt,
                    initial,
                    on_submit,
                } => {
                    self.modal = Some(ActiveModal::Input(
                        Box::new(InputModal::with_default(title, prompt, initial)),
                        on_submit,
                    ));
                }
                PanelEvent::OpenInTerminal(dir) => {
                    self.state
                        .set_info(format!("Terminal directory: {}", dir.display()));
                    self.runner.set_working_dir(Some(dir));
                    self.state.show_bottom_view(BottomView::Runner);
                }
                PanelEvent::PathMoved { from, to } => {
                    self.follow_moved(&from, &to);
                    self.sidebar.refresh();
                }
                PanelEvent::PathDeleted(path) => {
                    self.close_deleted(&path);
                    self.sidebar.refresh();
                }
            }
        }
        self.state.needs_redraw = true;
    }
}
