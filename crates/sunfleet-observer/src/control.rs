//! Simulation control endpoints.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/simulation/advance` | Advance the tick by one |
//! | `POST` | `/api/simulation/reset` | Reset the tick to 0 |
//! | `GET` | `/api/simulation/status` | Tick, subscribers, and cycle stats |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use sunfleet_types::BroadcastPhase;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Response for tick-changing commands.
#[derive(Debug, serde::Serialize)]
pub struct TickResponse {
    /// Tick after the command.
    pub tick: u64,
    /// Human-readable message.
    pub message: String,
}

/// Response for `GET /api/simulation/status`.
#[derive(Debug, serde::Serialize)]
pub struct SimulationStatus {
    /// Current tick.
    pub tick: u64,
    /// Open streams.
    pub clients: usize,
    /// Whether a broadcast cycle is running.
    pub phase: BroadcastPhase,
    /// Configured broadcast period.
    pub tick_interval_ms: u64,
    /// Broadcast cycles completed since start.
    pub cycles: u64,
    /// Duration of the most recent cycle.
    pub last_cycle_ms: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Advance the tick without broadcasting. The next cycle continues from it.
pub async fn advance(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tick = state.broadcaster.advance_tick();
    Json(TickResponse {
        tick,
        message: format!("Advanced to tick {tick}"),
    })
}

/// Reset the tick to 0. Open streams keep receiving updates from there.
pub async fn reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tick = state.broadcaster.reset_tick();
    Json(TickResponse {
        tick,
        message: "Simulation reset".to_owned(),
    })
}

/// Current tick, subscriber count, and broadcast statistics.
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let broadcaster = &state.broadcaster;
    Json(SimulationStatus {
        tick: broadcaster.current_tick(),
        clients: broadcaster.subscriber_count(),
        phase: broadcaster.phase(),
        tick_interval_ms: state.tick_interval_ms,
        cycles: broadcaster.cycles_completed(),
        last_cycle_ms: u64::try_from(broadcaster.last_cycle_duration().as_millis())
            .unwrap_or(u64::MAX),
    })
}
