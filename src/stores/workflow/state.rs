//! State of the confirmation slot.

use crate::flux::{Action, UiState};

/// At most one confirmation is pending at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConfirmationState {
    #[default]
    Idle,
    /// Waiting for the user to confirm or cancel.
    Pending { prompt: String, on_confirm: Action },
}

impl ConfirmationState {
    pub fn is_pending(&self) -> bool {
        matches!(self, ConfirmationState::Pending { .. })
    }

    pub fn prompt(&self) -> Option<&str> {
        match self {
            ConfirmationState::Pending { prompt, .. } => Some(prompt),
            ConfirmationState::Idle => None,
        }
    }
}

impl UiState for ConfirmationState {}
