//! Flipdeck: client-side state for a remote feature-flag store.
//!
//! Feature flags live in feature-sets, grouped into channels. The remote
//! store hands out a version token with every read and write; every update
//! is conditional on the last token seen, and a lost race is resolved by
//! reloading.

pub mod api;
pub mod app;
pub mod config;
pub mod flux;
pub mod logging;
pub mod model;
pub mod stores;

pub use api::{ApiError, ResourceClient};
pub use app::{App, StoreEmitters};
pub use config::Config;
pub use flux::{Action, DispatchError};
