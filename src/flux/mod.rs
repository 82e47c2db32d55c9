//! Unidirectional data flow: actions go through one dispatcher, stores
//! react, listeners are told afterwards.

mod action;
mod dispatcher;
mod effects;
mod emitter;
mod mvi;

pub use action::Action;
pub use dispatcher::{DispatchCycle, DispatchError, DispatchToken, Dispatcher};
pub use effects::{Effects, PendingOp};
pub use emitter::{Emitter, Subscription};
pub use mvi::{Intent, Reducer, UiState};
pub(crate) use mvi::reduce_in_place;
