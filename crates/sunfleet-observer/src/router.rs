//! Axum router construction for the HTTP API.
//!
//! Assembles all routes (REST, streams, control) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{control, handlers, sse};

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /api/stream/dashboard` -- fleet-wide event stream
/// - `GET /api/stream/plant/{id}` -- single-plant event stream
/// - `GET /api/plants`, `/api/plants/{id}`, `/api/plants/{id}/kpis`
/// - `GET /api/kpis`, `/api/dashboard`, `/api/plant-overview/{id}`
/// - `GET /api/charts/power`, `/api/charts/performance-ratio`,
///   `/api/charts/soiling`, `/api/cleaning-events`
/// - `POST /api/simulation/advance`, `/api/simulation/reset`
/// - `GET /api/simulation/status`
///
/// CORS allows any origin so the charting UI can run on its own port.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Streams
        .route("/api/stream/dashboard", get(sse::stream_dashboard))
        .route("/api/stream/plant/{id}", get(sse::stream_plant))
        // REST API
        .route("/api/plants", get(handlers::list_plants))
        .route("/api/plants/{id}", get(handlers::get_plant))
        .route("/api/plants/{id}/kpis", get(handlers::get_plant_kpis))
        .route("/api/kpis", get(handlers::get_fleet_kpis))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/plant-overview/{id}", get(handlers::get_plant_overview))
        .route("/api/charts/power", get(handlers::power_chart))
        .route("/api/charts/performance-ratio", get(handlers::performance_ratio_chart))
        .route("/api/charts/soiling", get(handlers::soiling_chart))
        .route("/api/cleaning-events", get(handlers::cleaning_events))
        // Simulation control
        .route("/api/simulation/advance", post(control::advance))
        .route("/api/simulation/reset", post(control::reset))
        .route("/api/simulation/status", get(control::status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
