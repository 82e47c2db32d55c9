//! Intents for the confirmation slot.

use crate::flux::{Action, Intent};

#[derive(Debug)]
pub enum ConfirmationIntent {
    /// Ask for confirmation. Replaces any prompt already showing.
    Prompt { prompt: String, on_confirm: Action },
    Confirm,
    Cancel,
}

impl Intent for ConfirmationIntent {}
