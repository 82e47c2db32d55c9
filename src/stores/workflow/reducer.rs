//! Reducer for the confirmation slot.

use crate::flux::Reducer;

use super::intent::ConfirmationIntent;
use super::state::ConfirmationState;

/// Pure transitions. Running the confirmed action is up to the store.
pub struct ConfirmationReducer;

impl Reducer for ConfirmationReducer {
    type State = ConfirmationState;
    type Intent = ConfirmationIntent;

    fn reduce(_state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            ConfirmationIntent::Prompt { prompt, on_confirm } => {
                ConfirmationState::Pending { prompt, on_confirm }
            }
            ConfirmationIntent::Confirm | ConfirmationIntent::Cancel => ConfirmationState::Idle,
        }
    }
}
