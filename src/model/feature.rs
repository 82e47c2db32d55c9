use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Schema version written by the remote store for feature-set documents.
pub const DOCUMENT_VERSION: u32 = 1;

/// Name of the feature-set seeded into every newly created channel.
pub const DEFAULT_SET: &str = "default";

/// Data attached to a single feature flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureData {
    #[serde(default)]
    pub description: String,
    /// Fraction of users the flag is rolled out to, in `[0, 1]`.
    #[serde(rename = "pctUsers", default)]
    pub pct_users: f64,
}

impl Default for FeatureData {
    fn default() -> Self {
        Self {
            description: String::new(),
            pct_users: 0.0,
        }
    }
}

/// Features keyed by name. Ordered so iteration is always ascending by name.
pub type FeatureMap = BTreeMap<String, FeatureData>;

/// Body of a feature-set resource as stored remotely.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureSetDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default)]
    pub features: FeatureMap,
}

impl FeatureSetDoc {
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }
}

/// Global identifier of a feature-set: `<channel>-<set>`.
///
/// The set name never contains a dash, so the last dash-delimited segment
/// of a listing entry is the set and everything before it is the channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SetId {
    channel: String,
    set: String,
}

impl SetId {
    pub fn new(channel: impl Into<String>, set: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            set: set.into(),
        }
    }

    /// Split a `channel-set` listing entry. Returns `None` when either side is empty.
    pub fn parse(entry: &str) -> Option<Self> {
        let (channel, set) = entry.rsplit_once('-')?;
        if channel.is_empty() || set.is_empty() {
            return None;
        }
        Some(Self::new(channel, set))
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn set(&self) -> &str {
        &self.set
    }
}

impl fmt::Display for SetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.channel, self.set)
    }
}
