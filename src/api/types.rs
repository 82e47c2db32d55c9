//! Wire types for the resource API.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque optimistic-concurrency token issued by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Successful result paired with the token the server returned, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub data: T,
    pub token: Option<VersionToken>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeatureSetListing {
    #[serde(rename = "featureSets", default)]
    pub feature_sets: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AliasListing {
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateFeatureSetRequest<'a> {
    #[serde(rename = "channelSet")]
    pub channel_set: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateAliasRequest<'a> {
    pub alias_id: &'a str,
}

/// Field some deployments echo the token in, alongside or instead of the header.
pub(crate) const BODY_TOKEN_FIELD: &str = "ETag";
