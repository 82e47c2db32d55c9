use serde::{Deserialize, Serialize};

use super::credentials::SecureString;

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub defaults: Defaults,
}

/// Where the feature-flag store lives and how to authenticate against it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the resource API (e.g., "https://flipper.example.com/prod").
    /// Absent means the client is not ready.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Static credential sent as `x-api-key` on every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecureString>,
}

/// Request tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Connection timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
}

fn default_timeout() -> u32 {
    30
}

fn default_connect_timeout() -> u32 {
    5
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl EndpointConfig {
    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }
}
