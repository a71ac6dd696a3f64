//! Integration tests for the HTTP API.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Event streams are read from the response body
//! one frame at a time.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::{Body, BodyDataStream};
use axum::http::{Method, Request, StatusCode};
use chrono::NaiveDate;
use futures::StreamExt;
use serde_json::Value;
use sunfleet_core::catalog::PlantCatalog;
use sunfleet_core::config::BroadcastConfig;
use sunfleet_core::simulator::FleetSimulator;
use sunfleet_observer::router::build_router;
use sunfleet_observer::state::AppState;
use tower::ServiceExt;

fn make_test_state() -> Arc<AppState> {
    let simulator = FleetSimulator::new(PlantCatalog::builtin(), 48)
        .with_today(NaiveDate::from_ymd_opt(2025, 10, 15).unwrap());
    Arc::new(AppState::new(simulator, &BroadcastConfig::default()))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(state: &Arc<AppState>, uri: &str) -> axum::response::Response {
    build_router(Arc::clone(state))
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post(state: &Arc<AppState>, uri: &str) -> axum::response::Response {
    build_router(Arc::clone(state))
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Read the next `data:` event from an event stream and parse its JSON.
async fn next_event(stream: &mut BodyDataStream) -> Value {
    loop {
        let chunk = stream.next().await.unwrap().unwrap();
        let text = std::str::from_utf8(&chunk).unwrap();
        // Skip keep-alive comments.
        if let Some(data) = text.strip_prefix("data: ") {
            return serde_json::from_str(data.trim_end()).unwrap();
        }
    }
}

// =========================================================================
// Streams
// =========================================================================

#[tokio::test]
async fn test_dashboard_stream_headers_and_initial_event() {
    let state = make_test_state();
    let response = get(&state, "/api/stream/dashboard").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("text/event-stream"));
    let cache_control = response
        .headers()
        .get("cache-control")
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(cache_control, "no-cache");
    assert_eq!(state.broadcaster.subscriber_count(), 1);

    let mut stream = response.into_body().into_data_stream();
    let initial = next_event(&mut stream).await;
    assert_eq!(initial["type"], "initial");
    assert_eq!(initial["data"]["tick"], 0);
    assert_eq!(initial["data"]["plants"].as_array().unwrap().len(), 10);
    assert!(initial["data"]["kpis"].is_object());
}

#[tokio::test]
async fn test_dashboard_stream_receives_updates() {
    let state = make_test_state();
    let response = get(&state, "/api/stream/dashboard").await;
    let mut stream = response.into_body().into_data_stream();
    let _ = next_event(&mut stream).await;

    let report = state.broadcaster.run_cycle().unwrap();
    assert_eq!(report.delivered, 1);
    let update = next_event(&mut stream).await;
    assert_eq!(update["type"], "update");
    assert_eq!(update["data"]["tick"], 1);

    state.broadcaster.run_cycle().unwrap();
    let update = next_event(&mut stream).await;
    assert_eq!(update["data"]["tick"], 2);
}

#[tokio::test]
async fn test_dropping_stream_unsubscribes() {
    let state = make_test_state();
    let response = get(&state, "/api/stream/dashboard").await;
    assert_eq!(state.broadcaster.subscriber_count(), 1);

    drop(response);
    assert_eq!(state.broadcaster.subscriber_count(), 0);

    let report = state.broadcaster.run_cycle().unwrap();
    assert_eq!(report.visited, 0);
}

#[tokio::test]
async fn test_plant_stream_carries_entity() {
    let state = make_test_state();
    let response = get(&state, "/api/stream/plant/7").await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut stream = response.into_body().into_data_stream();
    let initial = next_event(&mut stream).await;
    assert_eq!(initial["type"], "initial");
    assert_eq!(initial["data"]["entity"]["plant"]["id"], 7);
    assert!(initial["data"]["entity"]["kpis"]["avgPR"].is_number());

    state.broadcaster.run_cycle().unwrap();
    let update = next_event(&mut stream).await;
    assert_eq!(update["data"]["tick"], 1);
    assert_eq!(update["data"]["entity"]["plant"]["id"], 7);
}

#[tokio::test]
async fn test_plant_stream_unknown_plant_stays_open() {
    let state = make_test_state();
    let response = get(&state, "/api/stream/plant/99").await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut stream = response.into_body().into_data_stream();
    let initial = next_event(&mut stream).await;
    assert_eq!(initial["type"], "initial");
    assert!(initial["data"].get("entity").is_none());

    let report = state.broadcaster.run_cycle().unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(state.broadcaster.subscriber_count(), 1);
}

#[tokio::test]
async fn test_plant_stream_invalid_id() {
    let state = make_test_state();
    let response = get(&state, "/api/stream/plant/abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.broadcaster.subscriber_count(), 0);
}

#[tokio::test]
async fn test_mixed_scopes_share_tick() {
    let state = make_test_state();
    let mut fleet = get(&state, "/api/stream/dashboard")
        .await
        .into_body()
        .into_data_stream();
    let mut plant = get(&state, "/api/stream/plant/3")
        .await
        .into_body()
        .into_data_stream();
    let _ = next_event(&mut fleet).await;
    let _ = next_event(&mut plant).await;

    state.broadcaster.run_cycle().unwrap();
    let a = next_event(&mut fleet).await;
    let b = next_event(&mut plant).await;
    assert_eq!(a["data"]["tick"], b["data"]["tick"]);
}

// =========================================================================
// REST
// =========================================================================

#[tokio::test]
async fn test_list_plants() {
    let state = make_test_state();
    let response = get(&state, "/api/plants").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let plants = json.as_array().unwrap();
    assert_eq!(plants.len(), 10);
    assert_eq!(plants[0]["name"], "Sunfield Alpha");
    assert!(plants[0]["daysLeft"].is_string());
}

#[tokio::test]
async fn test_get_plant() {
    let state = make_test_state();
    let response = get(&state, "/api/plants/4").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["id"], 4);
    assert_eq!(json["name"], "Helios Delta");
}

#[tokio::test]
async fn test_get_plant_not_found() {
    let state = make_test_state();
    let response = get(&state, "/api/plants/42").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_get_plant_invalid_id() {
    let state = make_test_state();
    let response = get(&state, "/api/plants/not-a-number").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().contains("invalid plant id"));
}

#[tokio::test]
async fn test_plant_kpis() {
    let state = make_test_state();
    let response = get(&state, "/api/plants/1/kpis").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["avgPR"].is_number());
    assert!(json["actualPower"].is_number());

    let response = get(&state, "/api/plants/77/kpis").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fleet_kpis() {
    let state = make_test_state();
    let response = get(&state, "/api/kpis").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["activePlants"], 10);
}

#[tokio::test]
async fn test_dashboard_reports_current_tick() {
    let state = make_test_state();
    state.broadcaster.advance_tick();
    state.broadcaster.advance_tick();

    let response = get(&state, "/api/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["tick"], 2);
    assert_eq!(json["plants"].as_array().unwrap().len(), 10);
    assert_eq!(json["kpis"]["activePlants"], 10);
    assert_eq!(json.as_object().unwrap().len(), 3);
}

#[tokio::test]
async fn test_plant_overview() {
    let state = make_test_state();
    let response = get(&state, "/api/plant-overview/2").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["plant"]["id"], 2);
    assert!(json["kpis"].is_object());
    assert_eq!(json["powerChart"].as_array().unwrap().len(), 30);
    assert_eq!(json["prChart"].as_array().unwrap().len(), 15);
    assert_eq!(json["soilingChart"]["chartData"].as_array().unwrap().len(), 23);
    assert!(json["soilingChart"]["stats"].is_object());
    assert_eq!(json["cleaningEvents"].as_array().unwrap().len(), 7);
    assert_eq!(json["tick"], 0);

    state.broadcaster.advance_tick();
    let json = body_to_json(get(&state, "/api/plant-overview/2").await.into_body()).await;
    assert_eq!(json["tick"], 1);

    let response = get(&state, "/api/plant-overview/0").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_charts() {
    let state = make_test_state();

    let json = body_to_json(get(&state, "/api/charts/power").await.into_body()).await;
    assert_eq!(json.as_array().unwrap().len(), 30);

    let json = body_to_json(get(&state, "/api/charts/performance-ratio").await.into_body()).await;
    assert_eq!(json.as_array().unwrap().len(), 15);

    let json = body_to_json(get(&state, "/api/charts/soiling").await.into_body()).await;
    assert_eq!(json["chartData"].as_array().unwrap().len(), 23);
    assert!(json["stats"].is_object());
}

#[tokio::test]
async fn test_cleaning_events() {
    let state = make_test_state();
    let response = get(&state, "/api/cleaning-events").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.as_array().unwrap().len(), 7);
}

// =========================================================================
// Control
// =========================================================================

#[tokio::test]
async fn test_advance_and_reset() {
    let state = make_test_state();

    let json = body_to_json(post(&state, "/api/simulation/advance").await.into_body()).await;
    assert_eq!(json["tick"], 1);
    let json = body_to_json(post(&state, "/api/simulation/advance").await.into_body()).await;
    assert_eq!(json["tick"], 2);
    assert_eq!(state.broadcaster.current_tick(), 2);

    let json = body_to_json(post(&state, "/api/simulation/reset").await.into_body()).await;
    assert_eq!(json["tick"], 0);
    assert!(json["message"].is_string());
    assert_eq!(state.broadcaster.current_tick(), 0);
}

#[tokio::test]
async fn test_status() {
    let state = make_test_state();
    let stream = get(&state, "/api/stream/dashboard").await;
    state.broadcaster.run_cycle().unwrap();

    let json = body_to_json(get(&state, "/api/simulation/status").await.into_body()).await;
    assert_eq!(json["tick"], 1);
    assert_eq!(json["clients"], 1);
    assert_eq!(json["phase"], "idle");
    assert_eq!(json["tick_interval_ms"], 3000);
    assert_eq!(json["cycles"], 1);
    drop(stream);
}

#[tokio::test]
async fn test_advance_requires_post() {
    let state = make_test_state();
    let response = get(&state, "/api/simulation/advance").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_nonexistent_route_returns_404() {
    let state = make_test_state();
    let response = get(&state, "/api/nonexistent").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
