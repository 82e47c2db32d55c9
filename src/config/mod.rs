//! Configuration: endpoint, credential and request tuning.

mod credentials;
mod loader;
mod types;

pub use credentials::{CredentialStatus, SecureString, API_KEY_ENV, API_KEY_HEADER};
pub use loader::ConfigError;
pub use types::{Config, Defaults, EndpointConfig};
