//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_flipper;

use flipdeck::config::{Config, SecureString};
use flipdeck::flux::Subscription;
use flipdeck::{App, ResourceClient};
use mock_flipper::MockFlipper;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

pub const TEST_API_KEY: &str = "test-key";

/// Config pointing at `base_url`, with a test API key.
pub fn config_for(base_url: &str) -> Config {
    let mut config = Config::default();
    config.endpoint.url = Some(base_url.to_string());
    config.endpoint.api_key = Some(SecureString::new(TEST_API_KEY));
    config.defaults.timeout_seconds = 5;
    config.defaults.connect_timeout_seconds = 2;
    config
}

pub fn client_for(mock: &MockFlipper) -> ResourceClient {
    ResourceClient::new(&config_for(&mock.base_url())).expect("Failed to build client")
}

pub fn app_for(mock: &MockFlipper) -> App {
    App::new(client_for(mock))
}

/// App with the channel listing fetched and the first set loaded.
pub async fn loaded_app(mock: &MockFlipper) -> App {
    let app = app_for(mock);
    app.fetch_channels().unwrap();
    app.settle().await.unwrap();
    app
}

/// Two channels; `prod-svc` has `default` and `beta`.
pub async fn seed_standard(mock: &MockFlipper) {
    mock.seed_set(
        "prod-svc-default",
        &[
            ("checkout_v2", "new checkout", 0.5),
            ("dark_mode", "", 1.0),
        ],
    )
    .await;
    mock.seed_set(
        "prod-svc-beta",
        &[("dark_mode", "", 1.0), ("search_v3", "", 0.1)],
    )
    .await;
    mock.seed_set("staging-svc-default", &[("new_onboarding", "", 0.0)])
        .await;
}

/// Collects notification texts emitted by any store.
pub struct Notifications {
    messages: Rc<RefCell<Vec<String>>>,
    _subscription: Subscription,
}

impl Notifications {
    pub fn all(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.messages.borrow().iter().any(|m| m == text)
    }

    pub fn clear(&self) {
        self.messages.borrow_mut().clear();
    }
}

pub fn record_notifications(app: &App) -> Notifications {
    let messages = Rc::new(RefCell::new(Vec::new()));
    let sink = messages.clone();
    let subscription = app.events().all.subscribe(move |event| {
        if let Some(text) = event.notification() {
            sink.borrow_mut().push(text.to_string());
        }
    });
    Notifications {
        messages,
        _subscription: subscription,
    }
}

/// Create a temporary config file with the given content.
pub fn temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}
