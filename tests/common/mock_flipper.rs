//! In-process fake of the remote flag store.
//!
//! Keeps feature-sets in insertion order with a numeric ETag each, enforces
//! `If-Match` on updates and deletes, and records every request.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Response};
use axum::routing::any;
use axum::Router;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// A captured request for assertions.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone)]
struct StoredSet {
    id: String,
    etag: u64,
    features: Map<String, Value>,
}

#[derive(Debug)]
struct InjectedFailure {
    method: String,
    path_prefix: String,
    status: u16,
}

#[derive(Default)]
struct Store {
    sets: Vec<StoredSet>,
    /// Listing entries with no backing document.
    raw_entries: Vec<String>,
    aliases: BTreeMap<String, String>,
    failures: VecDeque<InjectedFailure>,
}

impl Store {
    fn find(&self, id: &str) -> Option<&StoredSet> {
        self.sets.iter().find(|s| s.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut StoredSet> {
        self.sets.iter_mut().find(|s| s.id == id)
    }

    fn take_failure(&mut self, method: &str, path: &str) -> Option<u16> {
        let index = self
            .failures
            .iter()
            .position(|f| f.method == method && path.starts_with(&f.path_prefix))?;
        self.failures.remove(index).map(|f| f.status)
    }
}

#[derive(Clone)]
struct MockState {
    store: Arc<Mutex<Store>>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// Fake flag store listening on a random local port.
pub struct MockFlipper {
    pub addr: SocketAddr,
    state: MockState,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl MockFlipper {
    pub async fn start() -> Self {
        let state = MockState {
            store: Arc::new(Mutex::new(Store::default())),
            requests: Arc::new(Mutex::new(Vec::new())),
        };

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

        let app = Router::new()
            .route("/{*path}", any(handle_request))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .ok();
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr,
            state,
            shutdown: shutdown_tx,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Add a feature-set with `(name, description, pct_users)` features.
    pub async fn seed_set(&self, id: &str, features: &[(&str, &str, f64)]) {
        let features = features
            .iter()
            .map(|(name, description, pct)| {
                (
                    name.to_string(),
                    json!({"description": description, "pctUsers": pct}),
                )
            })
            .collect();
        self.state.store.lock().await.sets.push(StoredSet {
            id: id.to_string(),
            etag: 1,
            features,
        });
    }

    /// Add a listing entry that has no document behind it.
    pub async fn seed_raw_entry(&self, entry: &str) {
        self.state.store.lock().await.raw_entries.push(entry.to_string());
    }

    pub async fn seed_alias(&self, alias: &str, set_id: &str) {
        self.state
            .store
            .lock()
            .await
            .aliases
            .insert(alias.to_string(), set_id.to_string());
    }

    /// Simulate a write by another client: bumps the ETag.
    pub async fn touch(&self, id: &str) {
        if let Some(set) = self.state.store.lock().await.find_mut(id) {
            set.etag += 1;
        }
    }

    /// Simulate another client adding a feature.
    pub async fn add_feature_out_of_band(&self, id: &str, name: &str) {
        if let Some(set) = self.state.store.lock().await.find_mut(id) {
            set.features.insert(
                name.to_string(),
                json!({"description": "", "pctUsers": 0.0}),
            );
            set.etag += 1;
        }
    }

    /// Make the next `method` request whose path starts with `path_prefix`
    /// fail with `status`.
    pub async fn fail_next(&self, method: &str, path_prefix: &str, status: u16) {
        self.state
            .store
            .lock()
            .await
            .failures
            .push_back(InjectedFailure {
                method: method.to_string(),
                path_prefix: path_prefix.to_string(),
                status,
            });
    }

    pub async fn etag(&self, id: &str) -> Option<String> {
        self.state
            .store
            .lock()
            .await
            .find(id)
            .map(|s| s.etag.to_string())
    }

    pub async fn has_set(&self, id: &str) -> bool {
        self.state.store.lock().await.find(id).is_some()
    }

    pub async fn feature_names(&self, id: &str) -> Vec<String> {
        let store = self.state.store.lock().await;
        let mut names: Vec<String> = store
            .find(id)
            .map(|s| s.features.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub async fn feature(&self, id: &str, name: &str) -> Option<Value> {
        let store = self.state.store.lock().await;
        store.find(id).and_then(|s| s.features.get(name).cloned())
    }

    pub async fn aliases_of(&self, id: &str) -> Vec<String> {
        self.state
            .store
            .lock()
            .await
            .aliases
            .iter()
            .filter(|(_, set)| set.as_str() == id)
            .map(|(alias, _)| alias.clone())
            .collect()
    }

    pub async fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().await.clone()
    }

    /// Captured requests with this method and exact path.
    pub async fn requests_to(&self, method: &str, path: &str) -> Vec<CapturedRequest> {
        self.state
            .requests
            .lock()
            .await
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    pub async fn count_method(&self, method: &str) -> usize {
        self.state
            .requests
            .lock()
            .await
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    pub async fn clear_requests(&self) {
        self.state.requests.lock().await.clear();
    }
}

impl Drop for MockFlipper {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn handle_request(State(state): State<MockState>, req: Request<Body>) -> Response<Body> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
        .collect();
    let body = axum::body::to_bytes(req.into_body(), 1024 * 1024)
        .await
        .unwrap_or_default()
        .to_vec();

    let captured = CapturedRequest {
        method: method.clone(),
        path: path.clone(),
        headers,
        body,
    };
    state.requests.lock().await.push(captured.clone());

    let mut store = state.store.lock().await;
    if let Some(status) = store.take_failure(&method, &path) {
        return respond(status, json!({"message": "injected failure"}), None);
    }

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let if_match = captured.header("if-match").map(str::to_string);

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["sets"]) => {
            let mut entries: Vec<String> = store.sets.iter().map(|s| s.id.clone()).collect();
            entries.extend(store.raw_entries.iter().cloned());
            respond(200, json!({ "featureSets": entries }), None)
        }
        ("GET", ["set", id]) => match store.find(id) {
            Some(set) => respond(
                200,
                json!({"version": 1, "features": set.features}),
                Some(set.etag),
            ),
            None => respond(404, json!({"message": "not found"}), None),
        },
        ("POST", ["set"]) => {
            let Some(id) = captured.json()["channelSet"].as_str().map(str::to_string) else {
                return respond(400, json!({"message": "channelSet required"}), None);
            };
            if store.find(&id).is_some() {
                return respond(409, json!({"message": "exists"}), None);
            }
            store.sets.push(StoredSet {
                id,
                etag: 1,
                features: Map::new(),
            });
            respond(200, Value::Null, None)
        }
        ("PUT", ["set", id]) => {
            let Some(expected) = if_match else {
                return respond(400, json!({"message": "If-Match required"}), None);
            };
            let Some(set) = store.find_mut(id) else {
                return respond(409, json!({"message": "missing"}), None);
            };
            if set.etag.to_string() != expected {
                return respond(409, json!({"message": "stale"}), None);
            }
            let features = captured.json()["features"]
                .as_object()
                .cloned()
                .unwrap_or_default();
            set.features = features;
            set.etag += 1;
            respond(200, json!({"ETag": set.etag.to_string()}), None)
        }
        ("DELETE", ["set", id]) => {
            let Some(expected) = if_match else {
                return respond(400, json!({"message": "If-Match required"}), None);
            };
            let id = id.to_string();
            let current = store.find(&id).map(|s| s.etag.to_string());
            if current.as_deref() != Some(expected.as_str()) {
                return respond(409, json!({"message": "stale"}), None);
            }
            store.sets.retain(|s| s.id != id);
            store.aliases.retain(|_, set| *set != id);
            respond(200, Value::Null, None)
        }
        ("GET", ["set", id, "aliases"]) => {
            let aliases: Vec<&String> = store
                .aliases
                .iter()
                .filter(|(_, set)| set.as_str() == *id)
                .map(|(alias, _)| alias)
                .collect();
            respond(200, json!({ "aliases": aliases }), None)
        }
        ("POST", ["set", id, "aliases"]) => {
            let id = id.to_string();
            let Some(alias) = captured.json()["alias_id"].as_str().map(str::to_string) else {
                return respond(400, json!({"message": "alias_id required"}), None);
            };
            if store.find(&id).is_none() {
                return respond(404, json!({"message": "no such set"}), None);
            }
            if store.aliases.contains_key(&alias) {
                return respond(409, json!({"message": "alias taken"}), None);
            }
            store.aliases.insert(alias, id);
            respond(200, Value::Null, None)
        }
        ("DELETE", ["alias", alias]) => {
            store.aliases.remove(*alias);
            respond(200, Value::Null, None)
        }
        _ => respond(404, json!({"message": "no route"}), None),
    }
}

fn respond(status: u16, body: Value, etag: Option<u64>) -> Response<Body> {
    let mut builder = Response::builder()
        .status(status)
        .header("content-type", "application/json");
    if let Some(etag) = etag {
        builder = builder.header("etag", etag.to_string());
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
