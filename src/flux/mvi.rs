//! Model-View-Intent primitives for stores whose state is a small closed
//! state machine.
//!
//! ```text
//! Intent ──→ Reducer ──→ State ──→ listeners
//!    ↑                                  │
//!    └──────────────────────────────────┘
//! ```
//!
//! The reducer is the only place the state changes. Side effects (deferring
//! actions, emitting events) stay in the owning store.

/// Marker trait for state owned by a reducer.
///
/// States are cloneable and comparable so listeners can detect changes, and
/// have a `Default` so the reducer can take them by value.
pub trait UiState: Clone + PartialEq + Default + 'static {}

/// Marker trait for inputs to a reducer.
pub trait Intent: 'static {}

/// Pure transition function: `(State, Intent) -> State`.
pub trait Reducer {
    type State: UiState;
    type Intent: Intent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State;
}

/// Take the current state out of `$self.$field`, run the reducer and store
/// the result.
macro_rules! reduce_in_place {
    ($self:expr, $field:ident, $reducer:ty, $intent:expr) => {
        $self.$field = <$reducer as $crate::flux::Reducer>::reduce(
            std::mem::take(&mut $self.$field),
            $intent,
        );
    };
}

pub(crate) use reduce_in_place;
