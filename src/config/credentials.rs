//! Credential handling.
//!
//! The API key is the only secret the editor holds. It is wrapped so that it
//! never ends up in logs or debug output.

use serde::{Deserialize, Serialize};

/// Header carrying the static credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "FLIPDECK_API_KEY";

/// Wrapper for sensitive strings that prevents accidental logging.
///
/// The inner value is never exposed via Debug or Display traits.
/// Use `expose()` to access the actual value when needed for API calls.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecureString(String);

impl SecureString {
    /// Create a new secure string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the inner value.
    ///
    /// Use sparingly and only when actually sending to APIs.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString(••••••••)")
    }
}

impl std::fmt::Display for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "••••••••")
    }
}

/// Status of credential resolution.
#[derive(Debug, Clone)]
pub enum CredentialStatus {
    /// API key present and non-empty.
    Configured(SecureString),
    /// No key; requests go out without the credential header.
    Anonymous,
}

impl CredentialStatus {
    pub fn resolve(key: Option<&SecureString>) -> Self {
        match key {
            Some(key) if !key.is_empty() => CredentialStatus::Configured(key.clone()),
            _ => CredentialStatus::Anonymous,
        }
    }

    /// Header name and value to attach, if any.
    pub fn header(&self) -> Option<(&'static str, &str)> {
        match self {
            CredentialStatus::Configured(key) => Some((API_KEY_HEADER, key.expose())),
            CredentialStatus::Anonymous => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_string_does_not_leak() {
        let secret = SecureString::new("my-secret-key");

        let debug_output = format!("{:?}", secret);
        assert!(!debug_output.contains("my-secret-key"));
        assert!(debug_output.contains("••••••••"));

        let display_output = format!("{}", secret);
        assert!(!display_output.contains("my-secret-key"));

        assert_eq!(secret.expose(), "my-secret-key");
    }

    #[test]
    fn test_empty_key_is_anonymous() {
        let empty = SecureString::new("");
        assert!(matches!(
            CredentialStatus::resolve(Some(&empty)),
            CredentialStatus::Anonymous
        ));
        assert!(CredentialStatus::resolve(None).header().is_none());
    }

    #[test]
    fn test_configured_key_header() {
        let key = SecureString::new("k-123");
        let status = CredentialStatus::resolve(Some(&key));
        assert_eq!(status.header(), Some(("x-api-key", "k-123")));
    }
}
