//! REST API endpoint handlers.
//!
//! Every read is computed on demand from the [`FleetSimulator`] at the
//! current tick. Values are noisy: two reads at the same tick return
//! different numbers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/plants` | Live view of every plant |
//! | `GET` | `/api/plants/{id}` | Live view of one plant |
//! | `GET` | `/api/plants/{id}/kpis` | KPIs for one plant |
//! | `GET` | `/api/kpis` | Fleet KPIs |
//! | `GET` | `/api/dashboard` | Plants, fleet KPIs, and tick |
//! | `GET` | `/api/plant-overview/{id}` | Plant detail, trend charts, cleaning events, and tick |
//! | `GET` | `/api/charts/power` | Actual vs expected power |
//! | `GET` | `/api/charts/performance-ratio` | 15-day performance-ratio trend |
//! | `GET` | `/api/charts/soiling` | Soiling trend and cleaning stats |
//! | `GET` | `/api/cleaning-events` | Historical cleaning events |
//!
//! [`FleetSimulator`]: sunfleet_core::simulator::FleetSimulator

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use serde::Serialize;
use sunfleet_core::simulator::SnapshotSource;
use sunfleet_types::{FleetView, PlantId, PlantOverview};

use crate::error::ObserverError;
use crate::state::AppState;

/// Parse a plant id from a path segment.
///
/// # Errors
///
/// Returns [`ObserverError::InvalidQuery`] if `raw` is not a non-negative
/// integer.
pub fn parse_plant_id(raw: &str) -> Result<PlantId, ObserverError> {
    raw.parse()
        .map_err(|e| ObserverError::InvalidQuery(format!("invalid plant id {raw:?}: {e}")))
}

fn not_found(id: PlantId) -> ObserverError {
    ObserverError::NotFound(format!("plant {id}"))
}

// ---------------------------------------------------------------------------
// Plants
// ---------------------------------------------------------------------------

/// Live view of every plant.
pub async fn list_plants(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.simulator.plants(state.tick()))
}

/// Live view of a single plant.
pub async fn get_plant(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let id = parse_plant_id(&id_str)?;
    let view = state.simulator.plant(state.tick(), id).ok_or_else(|| not_found(id))?;
    Ok(Json(view))
}

/// KPIs for a single plant.
pub async fn get_plant_kpis(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let id = parse_plant_id(&id_str)?;
    let kpis = state
        .simulator
        .plant_kpis(state.tick(), id)
        .ok_or_else(|| not_found(id))?;
    Ok(Json(kpis))
}

/// Everything the plant overview page shows, in one response.
pub async fn get_plant_overview(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let id = parse_plant_id(&id_str)?;
    let tick = state.tick();
    let detail = state
        .simulator
        .entity_snapshot(tick, id)
        .ok_or_else(|| not_found(id))?;
    Ok(Json(PlantOverview {
        detail,
        pr_chart: state.simulator.performance_ratio_chart(tick),
        soiling_chart: state.simulator.soiling_chart(tick),
        cleaning_events: state.simulator.cleaning_events(),
        tick,
    }))
}

// ---------------------------------------------------------------------------
// Fleet
// ---------------------------------------------------------------------------

/// Fleet KPIs.
pub async fn get_fleet_kpis(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.simulator.fleet_kpis(state.tick()))
}

/// Response body for `GET /api/dashboard`.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// Plants and fleet KPIs.
    #[serde(flatten)]
    pub view: FleetView,
    /// Tick the snapshot belongs to.
    pub tick: u64,
}

/// Plants and fleet KPIs from one snapshot, with the tick they belong to.
pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tick = state.tick();
    Json(DashboardResponse {
        view: state.simulator.fleet_snapshot(tick),
        tick,
    })
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// Actual vs expected power, 30-minute samples.
pub async fn power_chart(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.simulator.power_chart())
}

/// 15-day performance-ratio trend.
pub async fn performance_ratio_chart(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.simulator.performance_ratio_chart(state.tick()))
}

/// Soiling trend with cleaning-cost stats.
pub async fn soiling_chart(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.simulator.soiling_chart(state.tick()))
}

/// Historical cleaning events, most recent first.
pub async fn cleaning_events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.simulator.cleaning_events())
}
