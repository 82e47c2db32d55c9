//! Confirmation prompts and form requests.
//!
//! # Architecture
//!
//! The confirmation slot is a small MVI state machine:
//! - `state.rs` - Idle, or a prompt waiting for an answer
//! - `intent.rs` - Prompt, Confirm, Cancel
//! - `reducer.rs` - State transitions (pure, no side effects)
//!
//! The store around it defers the confirmed action and emits events.

mod intent;
mod reducer;
mod state;

pub use intent::ConfirmationIntent;
pub use reducer::ConfirmationReducer;
pub use state::ConfirmationState;

use crate::flux::{reduce_in_place, Action, Effects};

/// Which creation form a view should open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Channel,
    FeatureSet,
    Feature,
    Alias,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    ShowConfirmation(String),
    ConfirmationClosed,
    OpenForm(FormKind),
}

#[derive(Debug, Default)]
pub struct WorkflowStore {
    confirmation: ConfirmationState,
}

impl WorkflowStore {
    pub fn confirmation(&self) -> &ConfirmationState {
        &self.confirmation
    }

    pub fn handle(&mut self, action: &Action, fx: &mut Effects) {
        match action {
            Action::PromptConfirmation { prompt, on_confirm } => {
                if let ConfirmationState::Pending { prompt: old, .. } = &self.confirmation {
                    tracing::debug!(replaced = %old, "confirmation prompt replaced");
                }
                reduce_in_place!(
                    self,
                    confirmation,
                    ConfirmationReducer,
                    ConfirmationIntent::Prompt {
                        prompt: prompt.clone(),
                        on_confirm: (**on_confirm).clone(),
                    }
                );
                fx.emit(WorkflowEvent::ShowConfirmation(prompt.clone()));
            }
            Action::Confirm => {
                if let ConfirmationState::Pending { on_confirm, .. } = &self.confirmation {
                    fx.defer(on_confirm.clone());
                }
                reduce_in_place!(self, confirmation, ConfirmationReducer, ConfirmationIntent::Confirm);
                fx.emit(WorkflowEvent::ConfirmationClosed);
            }
            Action::Cancel => {
                reduce_in_place!(self, confirmation, ConfirmationReducer, ConfirmationIntent::Cancel);
                fx.emit(WorkflowEvent::ConfirmationClosed);
            }
            Action::OpenForm(kind) => fx.emit(WorkflowEvent::OpenForm(*kind)),
            _ => {}
        }
    }
}
