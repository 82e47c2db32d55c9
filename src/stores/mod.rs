//! Application stores.
//!
//! Each store owns one slice of state, reacts to dispatched actions and to
//! the completion of the network calls it started. Stores report back
//! through [`Effects`](crate::flux::Effects) only.

mod alias;
mod diff;
mod feature_set;
mod selection;
mod workflow;
mod write_buffer;

pub use alias::{AliasCompletion, AliasEvent, AliasStore};
pub use diff::{DiffCompletion, DiffEvent, DiffSlot, DiffWorkspace, InvariantViolation, Migration};
pub use feature_set::{FeatureSetCompletion, FeatureSetEvent, FeatureSetStore};
pub use selection::{SelectionCompletion, SelectionEvent, SelectionStore};
pub use workflow::{
    ConfirmationIntent, ConfirmationReducer, ConfirmationState, FormKind, WorkflowEvent,
    WorkflowStore,
};

/// Message shown when a write lost a version race and the data is reloaded.
pub const OUT_OF_DATE_MESSAGE: &str = "This data was out of date. Refreshing";

/// Result of a network call, routed back to the store that issued it.
#[derive(Debug)]
pub enum Completion {
    Selection(SelectionCompletion),
    FeatureSet(FeatureSetCompletion),
    Alias(AliasCompletion),
    Diff(DiffCompletion),
}

/// Change notification from one of the stores.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Selection(SelectionEvent),
    FeatureSet(FeatureSetEvent),
    Alias(AliasEvent),
    Diff(DiffEvent),
    Workflow(WorkflowEvent),
}

impl StoreEvent {
    /// User-facing message carried by the event, if any.
    pub fn notification(&self) -> Option<&str> {
        match self {
            StoreEvent::Selection(SelectionEvent::Notify(text))
            | StoreEvent::FeatureSet(FeatureSetEvent::Notify(text))
            | StoreEvent::Alias(AliasEvent::Notify(text))
            | StoreEvent::Diff(DiffEvent::Notify(text)) => Some(text.as_str()),
            _ => None,
        }
    }
}

macro_rules! impl_store_event_from {
    ($($variant:ident($event:ty)),* $(,)?) => {
        $(
            impl From<$event> for StoreEvent {
                fn from(event: $event) -> Self {
                    StoreEvent::$variant(event)
                }
            }
        )*
    };
}

impl_store_event_from!(
    Selection(SelectionEvent),
    FeatureSet(FeatureSetEvent),
    Alias(AliasEvent),
    Diff(DiffEvent),
    Workflow(WorkflowEvent),
);
