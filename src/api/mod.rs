//! Client for the remote feature-flag resource API.
//!
//! Every call resolves to one of three outcomes: success with the data and
//! the server's version token, a conflict, or some other failure. No call is
//! retried here; the stores decide what a conflict means.

mod client;
mod error;
mod types;

pub use client::ResourceClient;
pub use error::ApiError;
pub use types::{VersionToken, Versioned};
