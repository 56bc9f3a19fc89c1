//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle through the router.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use transport_cache::cache::{ManualClock, AVAILABILITY_TTL};
use transport_cache::{api::create_router, AppState, CacheManager, ManagerConfig};

// == Helper Functions ==

fn create_test_app() -> (Router, ManualClock) {
    let clock = ManualClock::new(1_755_000_000_000);
    let manager = CacheManager::new(ManagerConfig::default(), Arc::new(clock.clone()));
    let state = AppState::new(Arc::new(manager), Duration::from_millis(10));
    (create_router(state), clock)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn pricing_key(service_id: &str, date: &str) -> Value {
    json!({
        "service_id": service_id,
        "service_type": "tier",
        "duration_hours": 4,
        "date": date,
        "membership_level": "community"
    })
}

fn with_value(mut key: Value, value: Value) -> Value {
    key["value"] = value;
    key
}

// == Pricing ==

#[tokio::test]
async fn test_pricing_set_and_lookup() {
    let (app, _) = create_test_app();

    let (status, json) = send(
        &app,
        "PUT",
        "/pricing",
        Some(with_value(pricing_key("executive", "2025-08-21T10:00:00Z"), json!({"total": 240}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("successfully"));

    // Different time of day, same date
    let (status, json) = send(
        &app,
        "POST",
        "/pricing/lookup",
        Some(pricing_key("executive", "2025-08-21T18:30:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"]["total"], 240);
}

#[tokio::test]
async fn test_pricing_lookup_miss() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "POST", "/pricing/lookup", Some(pricing_key("vip", "2025-08-21"))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_pricing_invalid_request() {
    let (app, _) = create_test_app();

    let (status, _) = send(
        &app,
        "PUT",
        "/pricing",
        Some(with_value(pricing_key("", "2025-08-21"), json!(1))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pricing_ttl_expiry() {
    let (app, clock) = create_test_app();
    let mut body = with_value(pricing_key("executive", "2025-08-21"), json!(99));
    body["ttl"] = json!(60);

    send(&app, "PUT", "/pricing", Some(body)).await;
    clock.advance(Duration::from_secs(61));

    let (status, _) = send(&app, "POST", "/pricing/lookup", Some(pricing_key("executive", "2025-08-21"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalidate_pricing_service() {
    let (app, _) = create_test_app();
    for (service, date) in [("executive", "2025-08-21"), ("executive", "2025-08-22"), ("standard", "2025-08-21")] {
        send(&app, "PUT", "/pricing", Some(with_value(pricing_key(service, date), json!(1)))).await;
    }

    let (status, json) = send(&app, "DELETE", "/pricing/service/executive", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 2);

    let (status, _) = send(&app, "POST", "/pricing/lookup", Some(pricing_key("executive", "2025-08-22"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "POST", "/pricing/lookup", Some(pricing_key("standard", "2025-08-21"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalidate_pricing_date() {
    let (app, _) = create_test_app();
    for (service, date) in [("executive", "2025-08-21"), ("standard", "2025-08-21"), ("standard", "2025-08-22")] {
        send(&app, "PUT", "/pricing", Some(with_value(pricing_key(service, date), json!(1)))).await;
    }

    let (_, json) = send(&app, "DELETE", "/pricing/date/2025-08-21", None).await;

    assert_eq!(json["removed"], 2);
}

// == Availability ==

#[tokio::test]
async fn test_availability_roundtrip_and_date_invalidation() {
    let (app, _) = create_test_app();
    let key = json!({"date": "2025-08-21", "service_id": "vip", "time_slot": "10:00"});

    let (status, _) = send(&app, "PUT", "/availability", Some(with_value(key.clone(), json!({"free": 2})))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, "POST", "/availability/lookup", Some(key.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"]["free"], 2);

    let (_, json) = send(&app, "DELETE", "/availability/date/2025-08-21", None).await;
    assert_eq!(json["removed"], 1);

    let (status, _) = send(&app, "POST", "/availability/lookup", Some(key)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// == Form State ==

#[tokio::test]
async fn test_form_state_sessions() {
    let (app, _) = create_test_app();

    send(&app, "PUT", "/form-state/booking", Some(json!({"value": {"step": 1}}))).await;
    send(
        &app,
        "PUT",
        "/form-state/booking",
        Some(json!({"session_id": "abc", "value": {"step": 3}})),
    )
    .await;

    let (status, json) = send(&app, "GET", "/form-state/booking?session_id=abc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"]["step"], 3);

    let (_, json) = send(&app, "DELETE", "/form-state/booking?session_id=abc", None).await;
    assert_eq!(json["removed"], 1);

    let (status, json) = send(&app, "GET", "/form-state/booking", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"]["step"], 1);
}

// == Maintenance ==

#[tokio::test]
async fn test_stats_reflect_writes_and_lookups() {
    let (app, _) = create_test_app();
    send(&app, "PUT", "/pricing", Some(with_value(pricing_key("executive", "2025-08-21"), json!(1)))).await;
    send(&app, "POST", "/pricing/lookup", Some(pricing_key("executive", "2025-08-21"))).await;
    send(&app, "POST", "/pricing/lookup", Some(pricing_key("standard", "2025-08-21"))).await;

    let (status, json) = send(&app, "GET", "/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["state"], "running");
    assert_eq!(json["pricing"]["hits"], 1);
    assert_eq!(json["pricing"]["misses"], 1);
    assert_eq!(json["pricing"]["hit_rate"], 0.5);
    assert_eq!(json["pricing"]["max_size"], 500);
}

#[tokio::test]
async fn test_cleanup_endpoint_sweeps_expired() {
    let (app, clock) = create_test_app();
    send(&app, "PUT", "/availability", Some(json!({"date": "2025-08-21", "value": []}))).await;
    send(&app, "PUT", "/pricing", Some(with_value(pricing_key("executive", "2025-08-21"), json!(1)))).await;

    clock.advance(AVAILABILITY_TTL + Duration::from_secs(1));
    let (status, json) = send(&app, "POST", "/cleanup", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["availability"], 1);
    assert_eq!(json["pricing"], 0);

    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["total_entries"], 1);
}

#[tokio::test]
async fn test_clear_all() {
    let (app, _) = create_test_app();
    send(&app, "PUT", "/pricing", Some(with_value(pricing_key("executive", "2025-08-21"), json!(1)))).await;
    send(&app, "PUT", "/form-state/booking", Some(json!({"value": {}}))).await;

    let (status, _) = send(&app, "DELETE", "/cache", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["total_entries"], 0);
}

#[tokio::test]
async fn test_metrics_record_lookups() {
    let (app, _) = create_test_app();
    send(&app, "POST", "/pricing/lookup", Some(pricing_key("executive", "2025-08-21"))).await;

    let (status, json) = send(&app, "GET", "/metrics", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pricing_lookup"]["count"], 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app();

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}
