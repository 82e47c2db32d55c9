use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::header::{HeaderMap, ACCEPT, ETAG, IF_MATCH};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::{
    AliasListing, CreateAliasRequest, CreateFeatureSetRequest, FeatureSetListing, VersionToken,
    Versioned, BODY_TOKEN_FIELD,
};
use crate::config::{Config, CredentialStatus};
use crate::model::{FeatureSetDoc, SetId, DOCUMENT_VERSION};

/// Typed client for the feature-flag resource API.
///
/// Keeps the last version token seen for every feature-set. Updates are
/// conditional on the token the caller read its document with; deletes use
/// the cached one. Cloning is cheap and clones share the token cache.
#[derive(Clone)]
pub struct ResourceClient {
    http: Client,
    base_url: Option<String>,
    credential: CredentialStatus,
    tokens: Arc<Mutex<HashMap<SetId, VersionToken>>>,
}

impl ResourceClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.defaults.timeout_seconds as u64))
            .connect_timeout(Duration::from_secs(
                config.defaults.connect_timeout_seconds as u64,
            ))
            .build()
            .map_err(ApiError::Build)?;

        Ok(Self {
            http,
            base_url: config.endpoint.base_url().map(str::to_string),
            credential: CredentialStatus::resolve(config.endpoint.api_key.as_ref()),
            tokens: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Whether an endpoint is configured.
    pub fn ready(&self) -> bool {
        self.base_url.is_some()
    }

    /// Last token captured for `id`.
    pub fn token(&self, id: &SetId) -> Option<VersionToken> {
        self.tokens.lock().get(id).cloned()
    }

    pub async fn list_feature_sets(&self) -> Result<Vec<String>, ApiError> {
        let resource = "GET /sets".to_string();
        let response = self.send(Method::GET, "/sets", None, None, &resource).await?;
        let listing: FeatureSetListing = decode(response, &resource).await?;
        Ok(listing.feature_sets)
    }

    pub async fn get_feature_set(&self, id: &SetId) -> Result<Versioned<FeatureSetDoc>, ApiError> {
        let path = format!("/set/{}", id);
        let resource = format!("GET {}", path);
        let response = self.send(Method::GET, &path, None, None, &resource).await?;

        let headers = response.headers().clone();
        let mut body: Value = decode(response, &resource).await?;
        let token = extract_token(&headers, &mut body);
        let data: FeatureSetDoc =
            serde_json::from_value(body).map_err(|e| ApiError::InvalidResponse {
                resource: resource.clone(),
                message: e.to_string(),
            })?;

        self.record(id, token.as_ref());
        Ok(Versioned { data, token })
    }

    /// Create an empty feature-set. A 409 means the name is already taken.
    pub async fn create_feature_set(&self, id: &SetId) -> Result<Versioned<()>, ApiError> {
        let resource = format!("POST /set {}", id);
        let channel_set = id.to_string();
        let body = serde_json::to_value(CreateFeatureSetRequest {
            channel_set: &channel_set,
        })
        .map_err(|e| invalid(&resource, e))?;

        let response = self
            .send(Method::POST, "/set", None, Some(body), &resource)
            .await?;
        let token = response_token(response, &resource).await?;
        self.record(id, token.as_ref());
        Ok(Versioned { data: (), token })
    }

    /// Conditional update. `if_match` must be the token `doc` was read or
    /// last written with, not whatever the cache holds now.
    pub async fn update_feature_set(
        &self,
        id: &SetId,
        doc: &FeatureSetDoc,
        if_match: Option<&VersionToken>,
    ) -> Result<Versioned<FeatureSetDoc>, ApiError> {
        let path = format!("/set/{}", id);
        let resource = format!("PUT {}", path);
        let mut doc = doc.clone();
        doc.version = Some(DOCUMENT_VERSION);
        let body = serde_json::to_value(&doc).map_err(|e| invalid(&resource, e))?;

        let response = self
            .send(Method::PUT, &path, if_match.cloned(), Some(body), &resource)
            .await?;
        let token = response_token(response, &resource).await?;
        self.record(id, token.as_ref());
        Ok(Versioned { data: doc, token })
    }

    /// Conditional delete using the cached token for `id`.
    pub async fn delete_feature_set(&self, id: &SetId) -> Result<(), ApiError> {
        let path = format!("/set/{}", id);
        let resource = format!("DELETE {}", path);
        let if_match = self.token(id);
        self.send(Method::DELETE, &path, if_match, None, &resource)
            .await?;
        self.tokens.lock().remove(id);
        Ok(())
    }

    pub async fn list_aliases(&self, id: &SetId) -> Result<Vec<String>, ApiError> {
        let path = format!("/set/{}/aliases", id);
        let resource = format!("GET {}", path);
        let response = self.send(Method::GET, &path, None, None, &resource).await?;
        let listing: AliasListing = decode(response, &resource).await?;
        Ok(listing.aliases)
    }

    /// Bind `alias` to `id`. A 409 means the alias is bound to another set.
    pub async fn create_alias(&self, id: &SetId, alias: &str) -> Result<(), ApiError> {
        let path = format!("/set/{}/aliases", id);
        let resource = format!("POST {}", path);
        let body = serde_json::to_value(CreateAliasRequest { alias_id: alias })
            .map_err(|e| invalid(&resource, e))?;
        self.send(Method::POST, &path, None, Some(body), &resource)
            .await?;
        Ok(())
    }

    pub async fn delete_alias(&self, alias: &str) -> Result<(), ApiError> {
        let path = format!("/alias/{}", alias);
        let resource = format!("DELETE {}", path);
        self.send(Method::DELETE, &path, None, None, &resource)
            .await?;
        Ok(())
    }

    /// Replace the cached token. A response without a token leaves the cache alone.
    fn record(&self, id: &SetId, token: Option<&VersionToken>) {
        if let Some(token) = token {
            tracing::trace!(set_id = %id, token = %token, "version token captured");
            self.tokens.lock().insert(id.clone(), token.clone());
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        if_match: Option<VersionToken>,
        body: Option<Value>,
        resource: &str,
    ) -> Result<Response, ApiError> {
        let base_url = self.base_url.as_deref().ok_or(ApiError::NotConfigured)?;
        let url = format!("{}{}", base_url, path);

        let mut builder = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json");

        if let Some((name, value)) = self.credential.header() {
            builder = builder.header(name, value);
        }
        if let Some(token) = if_match {
            builder = builder.header(IF_MATCH, token.as_str());
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        tracing::debug!(resource = %resource, "request");

        let response = builder.send().await.map_err(|e| ApiError::Connection {
            resource: resource.to_string(),
            source: e,
        })?;

        let status = response.status();
        if status.as_u16() == 409 || status.as_u16() == 412 {
            tracing::warn!(resource = %resource, status = status.as_u16(), "conflict");
            return Err(ApiError::Conflict {
                resource: resource.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(resource = %resource, status = status.as_u16(), "request failed");
            return Err(ApiError::Status {
                resource: resource.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(response: Response, resource: &str) -> Result<T, ApiError> {
    let bytes = response.bytes().await.map_err(|e| ApiError::Connection {
        resource: resource.to_string(),
        source: e,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| invalid(resource, e))
}

/// Token from a mutation response: header first, then the body field.
/// Mutations may legitimately return an empty body.
async fn response_token(
    response: Response,
    resource: &str,
) -> Result<Option<VersionToken>, ApiError> {
    let headers = response.headers().clone();
    let bytes = response.bytes().await.map_err(|e| ApiError::Connection {
        resource: resource.to_string(),
        source: e,
    })?;
    let mut body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Ok(extract_token(&headers, &mut body))
}

/// Read the token from the `ETag` header, falling back to an `ETag` body
/// field. The body field is always removed so it never leaks into the data.
fn extract_token(headers: &HeaderMap, body: &mut Value) -> Option<VersionToken> {
    let from_body = body
        .as_object_mut()
        .and_then(|obj| obj.remove(BODY_TOKEN_FIELD))
        .and_then(|v| match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

    headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or(from_body)
        .map(VersionToken::new)
}

fn invalid(resource: &str, err: serde_json::Error) -> ApiError {
    ApiError::InvalidResponse {
        resource: resource.to_string(),
        message: err.to_string(),
    }
}
