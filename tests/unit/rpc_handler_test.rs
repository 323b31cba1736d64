//! Unit tests for the message handler: every message kind dispatched by
//! `handle_message`, through the same code path used by the
//! `privacy-guard-rpc` binary.

#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;

use privacy_guard::app::Collector;
use privacy_guard::rpc_handler::handle_message;
use privacy_guard::types::settings::GuardSettings;
use serde_json::{json, Value};
use support::{Reply, StubServer};

fn setup_with(base_url: &str) -> Arc<Collector> {
    let settings = GuardSettings {
        api_base_url: base_url.to_string(),
        poll_interval_secs: 60,
        request_timeout_secs: 1,
        ..GuardSettings::default()
    };
    Arc::new(Collector::new(settings).unwrap())
}

fn setup() -> Arc<Collector> {
    setup_with("http://127.0.0.1:9")
}

async fn send(collector: &Arc<Collector>, tab: Option<i64>, message: Value) -> Value {
    handle_message(collector, tab, &message).await
}

// ─── Protocol errors ───

#[tokio::test]
async fn test_unknown_message_type() {
    let collector = setup();
    let res = send(&collector, None, json!({"type": "PING"})).await;
    assert_eq!(res, json!({"error": "unknown message type"}));
}

#[tokio::test]
async fn test_missing_type_is_unknown() {
    let collector = setup();
    let res = send(&collector, None, json!({"hostname": "example.com"})).await;
    assert_eq!(res, json!({"error": "unknown message type"}));
}

#[tokio::test]
async fn test_malformed_payload() {
    let collector = setup();
    let res = send(&collector, None, json!({"type": "UPDATE_BADGE", "count": "many"})).await;
    assert!(res["error"].as_str().unwrap().starts_with("malformed message"));

    let res = send(&collector, None, json!("GET_TAB_STATS")).await;
    assert!(res["error"].as_str().unwrap().starts_with("malformed message"));
}

// ─── GET_SESSION_ID ───

#[tokio::test]
async fn test_get_session_id() {
    let collector = setup();
    let res = send(&collector, None, json!({"type": "GET_SESSION_ID", "hostname": "example.com"})).await;
    assert_eq!(res, json!({"sessionId": null}));

    send(
        &collector,
        None,
        json!({"type": "TAB_UPDATED", "tab_id": 1, "url": "https://www.example.com/", "status": "complete"}),
    )
    .await;
    let res = send(&collector, None, json!({"type": "GET_SESSION_ID", "hostname": "www.example.com"})).await;
    assert!(res["sessionId"].as_str().is_some_and(|s| !s.is_empty()));
}

// ─── GET_PRIVACY_DATA ───

#[tokio::test]
async fn test_get_privacy_data_success() {
    let stub = StubServer::start(Reply::Json(json!({"tracker": 2, "pii": 1, "pii_types": ["email"]}))).await;
    let collector = setup_with(&stub.base_url);

    let res = send(&collector, None, json!({"type": "GET_PRIVACY_DATA", "hostname": "www.shop.test"})).await;

    assert_eq!(res["success"], true);
    assert_eq!(res["data"]["tracker"], 2);
    assert_eq!(res["data"]["pii_types"], json!(["email"]));
    assert_eq!(stub.requests()[0].path, "/current/shop.test");
}

#[tokio::test]
async fn test_get_privacy_data_failure() {
    let stub = StubServer::start(Reply::Status(500)).await;
    let collector = setup_with(&stub.base_url);

    let res = send(&collector, None, json!({"type": "GET_PRIVACY_DATA", "hostname": "shop.test"})).await;

    assert_eq!(res, json!({"success": false, "error": "API returned 500"}));
}

// ─── UPDATE_BADGE / GET_TAB_STATS ───

#[tokio::test]
async fn test_update_badge_and_tab_stats() {
    let collector = setup();
    send(
        &collector,
        None,
        json!({"type": "TAB_UPDATED", "tab_id": 4, "url": "https://example.com/", "status": "complete"}),
    )
    .await;

    let res = send(&collector, Some(4), json!({"type": "UPDATE_BADGE", "count": 6})).await;
    assert_eq!(res, json!({"success": true}));
    assert_eq!(collector.badge(4).unwrap().text, "6");

    let res = send(&collector, Some(4), json!({"type": "GET_TAB_STATS"})).await;
    assert_eq!(res["count"], 6);
    assert!(res["session_id"].is_string());
}

#[tokio::test]
async fn test_tab_stats_without_sender() {
    let collector = setup();
    let res = send(&collector, None, json!({"type": "GET_TAB_STATS"})).await;
    assert_eq!(res, json!({"count": 0, "session_id": null}));
}

// ─── Tab events ───

#[tokio::test]
async fn test_tab_lifecycle_messages() {
    let collector = setup();

    let res = send(
        &collector,
        None,
        json!({"type": "TAB_UPDATED", "tab_id": 2, "url": "https://example.com/", "status": "complete"}),
    )
    .await;
    assert_eq!(res["monitoring"], true);
    assert_eq!(res["tab"]["site"], "example.com");

    let res = send(&collector, None, json!({"type": "TAB_ACTIVATED", "tab_id": 2, "url": "https://example.com/"})).await;
    assert_eq!(res["tab"]["tab_id"], 2);

    let res = send(&collector, None, json!({"type": "TAB_REMOVED", "tab_id": 2})).await;
    assert_eq!(res, json!({"success": true}));

    let res = send(&collector, None, json!({"type": "TAB_REMOVED", "tab_id": 2})).await;
    assert_eq!(res, json!({"error": "Tab not found: 2"}));
}

#[tokio::test]
async fn test_non_http_tab_is_not_monitored() {
    let collector = setup();
    let res = send(
        &collector,
        None,
        json!({"type": "TAB_UPDATED", "tab_id": 3, "url": "about:newtab", "status": "complete"}),
    )
    .await;
    assert_eq!(res, json!({"monitoring": false}));
}

// ─── DETECTION / CLEAR_SESSION ───

#[tokio::test]
async fn test_detection_and_clear_session() {
    let collector = setup();
    send(
        &collector,
        None,
        json!({"type": "TAB_UPDATED", "tab_id": 8, "url": "https://example.com/", "status": "complete"}),
    )
    .await;

    let detection = json!({
        "type": "DETECTION",
        "category": "fingerprinting",
        "detail": "navigator.userAgent accessed",
        "attributes": {"api": "navigator.userAgent"}
    });
    let res = send(&collector, Some(8), detection.clone()).await;
    assert_eq!(res, json!({"accepted": true, "total": 1, "alert": false}));

    let res = send(&collector, None, detection.clone()).await;
    assert_eq!(res, json!({"error": "message DETECTION requires a sender tab"}));

    let res = send(&collector, None, json!({"type": "CLEAR_SESSION", "hostname": "www.example.com"})).await;
    assert_eq!(res, json!({"success": true, "cleared": true}));
    assert_eq!(collector.snapshot(8).unwrap().counts.total(), 0);

    let res = send(&collector, Some(8), detection).await;
    assert_eq!(res, json!({"accepted": false}));
}

// ─── BEFORE_REQUEST ───

#[tokio::test]
async fn test_before_request() {
    let collector = setup();
    let res = send(
        &collector,
        None,
        json!({"type": "BEFORE_REQUEST", "tab_id": 1, "url": "https://stats.doubleclick.net/p"}),
    )
    .await;
    assert_eq!(res, json!({"cancel": true}));

    let res = send(
        &collector,
        None,
        json!({"type": "BEFORE_REQUEST", "tab_id": 1, "url": "https://example.com/"}),
    )
    .await;
    assert_eq!(res, json!({"cancel": false}));
}
