//! Channel listing, selection and channel/set lifecycle through the App.

mod common;

use common::mock_flipper::MockFlipper;
use common::*;
use flipdeck::model::SetId;

#[tokio::test]
async fn test_fetch_selects_smallest_channel_and_first_set() {
    let mock = MockFlipper::start().await;
    seed_standard(&mock).await;
    let app = loaded_app(&mock).await;

    let selection = app.selection();
    let channels: Vec<&str> = selection.channel_names().collect();
    assert_eq!(channels, vec!["prod-svc", "staging-svc"]);
    assert_eq!(selection.channels()["prod-svc"], vec!["default", "beta"]);
    assert_eq!(selection.current_channel(), Some("prod-svc"));
    assert_eq!(selection.current_set(), Some("default"));
    assert_eq!(selection.feature_sets(), vec!["beta", "default"]);
    drop(selection);

    // Dependent stores loaded the selected set.
    assert_eq!(
        app.feature_set().resource(),
        Some(&SetId::new("prod-svc", "default"))
    );
    assert!(app.feature_set().snapshot().is_some());
}

#[tokio::test]
async fn test_malformed_listing_entries_are_skipped() {
    let mock = MockFlipper::start().await;
    seed_standard(&mock).await;
    mock.seed_raw_entry("nodash").await;
    mock.seed_raw_entry("trailing-").await;
    let app = loaded_app(&mock).await;

    let channels: Vec<String> = app
        .selection()
        .channel_names()
        .map(str::to_string)
        .collect();
    assert_eq!(channels, vec!["prod-svc", "staging-svc"]);
}

#[tokio::test]
async fn test_empty_listing_clears_selection() {
    let mock = MockFlipper::start().await;
    let app = loaded_app(&mock).await;

    assert!(app.selection().channels().is_empty());
    assert!(app.selection().current_channel().is_none());
    assert!(app.selection().current_set().is_none());
    assert!(app.feature_set().resource().is_none());
}

#[tokio::test]
async fn test_select_channel_loads_its_first_set() {
    let mock = MockFlipper::start().await;
    seed_standard(&mock).await;
    let app = loaded_app(&mock).await;

    app.select_channel("staging-svc").unwrap();
    assert_eq!(app.selection().current_set(), Some("default"));
    app.settle().await.unwrap();

    let store = app.feature_set();
    assert_eq!(
        store.resource(),
        Some(&SetId::new("staging-svc", "default"))
    );
    let names: Vec<&str> = store.snapshot().unwrap().feature_names().collect();
    assert_eq!(names, vec!["new_onboarding"]);
}

#[tokio::test]
async fn test_selecting_unknown_channel_or_set_is_ignored() {
    let mock = MockFlipper::start().await;
    seed_standard(&mock).await;
    let app = loaded_app(&mock).await;

    app.select_channel("nope-svc").unwrap();
    app.select_set("missing").unwrap();
    app.settle().await.unwrap();

    assert_eq!(app.selection().current_channel(), Some("prod-svc"));
    assert_eq!(app.selection().current_set(), Some("default"));
}

#[tokio::test]
async fn test_invalid_channel_name_never_reaches_server() {
    let mock = MockFlipper::start().await;
    seed_standard(&mock).await;
    let app = loaded_app(&mock).await;
    let notes = record_notifications(&app);

    app.create_channel("no dash allowed").unwrap();
    app.settle().await.unwrap();

    assert_eq!(mock.count_method("POST").await, 0);
    assert_eq!(notes.all().len(), 1);
    assert!(notes.all()[0].contains("invalid channel name"));
}

#[tokio::test]
async fn test_create_channel_selects_it() {
    let mock = MockFlipper::start().await;
    seed_standard(&mock).await;
    let app = loaded_app(&mock).await;
    let notes = record_notifications(&app);

    app.create_channel("dev-svc").unwrap();
    app.settle().await.unwrap();

    assert!(mock.has_set("dev-svc-default").await);
    assert_eq!(app.selection().current_channel(), Some("dev-svc"));
    assert_eq!(app.selection().current_set(), Some("default"));
    assert!(notes.contains("Created channel dev-svc"));
}

#[tokio::test]
async fn test_create_channel_conflict_is_reported() {
    let mock = MockFlipper::start().await;
    seed_standard(&mock).await;
    // Exists remotely but not in the listing this client has seen.
    let app = loaded_app(&mock).await;
    mock.seed_set("qa-svc-default", &[]).await;
    let notes = record_notifications(&app);

    app.create_channel("qa-svc").unwrap();
    app.settle().await.unwrap();

    assert!(notes.contains("Channel qa-svc already exists"));
    assert_eq!(app.selection().current_channel(), Some("prod-svc"));
}

#[tokio::test]
async fn test_create_feature_set_selects_it() {
    let mock = MockFlipper::start().await;
    seed_standard(&mock).await;
    let app = loaded_app(&mock).await;
    let notes = record_notifications(&app);

    app.create_feature_set("canary").unwrap();
    app.settle().await.unwrap();

    assert!(mock.has_set("prod-svc-canary").await);
    assert_eq!(app.selection().current_set(), Some("canary"));
    assert_eq!(
        app.feature_set().resource(),
        Some(&SetId::new("prod-svc", "canary"))
    );
    assert!(notes.contains("Created feature set canary"));
}

#[tokio::test]
async fn test_duplicate_set_name_is_rejected_locally() {
    let mock = MockFlipper::start().await;
    seed_standard(&mock).await;
    let app = loaded_app(&mock).await;
    let notes = record_notifications(&app);

    app.create_feature_set("beta").unwrap();
    app.settle().await.unwrap();

    assert_eq!(mock.count_method("POST").await, 0);
    assert!(notes.contains("beta already exists"));
}

#[tokio::test]
async fn test_delete_set_moves_to_next_remaining() {
    let mock = MockFlipper::start().await;
    seed_standard(&mock).await;
    let app = loaded_app(&mock).await;
    let notes = record_notifications(&app);

    app.delete_feature_set().unwrap();
    app.settle().await.unwrap();

    assert!(!mock.has_set("prod-svc-default").await);
    assert_eq!(app.selection().current_set(), Some("beta"));
    assert_eq!(app.selection().feature_sets(), vec!["beta"]);
    assert_eq!(
        app.feature_set().resource(),
        Some(&SetId::new("prod-svc", "beta"))
    );
    assert!(notes.contains("Deleted feature set default"));

    let deletes = mock.requests_to("DELETE", "/set/prod-svc-default").await;
    assert_eq!(deletes[0].header("if-match"), Some("1"));
}

#[tokio::test]
async fn test_deleting_last_set_refetches_channels() {
    let mock = MockFlipper::start().await;
    seed_standard(&mock).await;
    let app = loaded_app(&mock).await;

    app.select_channel("staging-svc").unwrap();
    app.settle().await.unwrap();
    mock.clear_requests().await;

    app.delete_feature_set().unwrap();
    app.settle().await.unwrap();

    assert_eq!(mock.requests_to("GET", "/sets").await.len(), 1);
    let channels: Vec<String> = app
        .selection()
        .channel_names()
        .map(str::to_string)
        .collect();
    assert_eq!(channels, vec!["prod-svc"]);
    assert_eq!(app.selection().current_channel(), Some("prod-svc"));
}

#[tokio::test]
async fn test_stale_delete_reports_and_reloads() {
    let mock = MockFlipper::start().await;
    seed_standard(&mock).await;
    let app = loaded_app(&mock).await;
    let notes = record_notifications(&app);
    mock.touch("prod-svc-default").await;
    mock.clear_requests().await;

    app.delete_feature_set().unwrap();
    app.settle().await.unwrap();

    assert!(mock.has_set("prod-svc-default").await);
    assert!(notes.contains("This data was out of date. Refreshing"));
    assert_eq!(app.selection().current_set(), Some("default"));
    assert_eq!(mock.requests_to("GET", "/set/prod-svc-default").await.len(), 2);
}
