//! Server-Sent Events endpoints for live plant telemetry.
//!
//! Each request opens one subscription on the [`Broadcaster`]: a bounded
//! channel whose sender is registered with the requested [`Scope`] and
//! whose receiver feeds the response body. The first event is the
//! `initial` envelope; every broadcast cycle adds an `update`.
//!
//! When the client goes away Axum drops the body stream, which drops the
//! [`SubscriptionGuard`] and unregisters the subscriber. A cycle that runs
//! before the drop sees the closed channel and removes it instead; both
//! paths end in the same idempotent removal.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use sunfleet_core::broadcaster::Broadcaster;
use sunfleet_core::registry::Frame;
use sunfleet_types::{Scope, SubscriberId};
use tokio::sync::mpsc;

use crate::error::ObserverError;
use crate::handlers::parse_plant_id;
use crate::state::AppState;

/// Unregisters a subscriber when the response body is dropped.
#[derive(Debug)]
pub struct SubscriptionGuard {
    broadcaster: Arc<Broadcaster>,
    id: SubscriberId,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.broadcaster.unsubscribe(self.id);
    }
}

/// Register a subscriber for `scope` and turn its channel into an event
/// stream.
///
/// # Errors
///
/// Returns [`ObserverError::Internal`] if the initial frame could not be
/// written.
pub fn open_stream(
    state: &AppState,
    scope: Scope,
) -> Result<impl Stream<Item = Result<Event, Infallible>> + Send + use<>, ObserverError> {
    let (tx, rx) = mpsc::channel::<Frame>(state.channel_capacity.max(1));
    let id = state
        .broadcaster
        .subscribe(scope, Box::new(tx))
        .map_err(|e| ObserverError::Internal(e.to_string()))?;
    let guard = SubscriptionGuard {
        broadcaster: Arc::clone(&state.broadcaster),
        id,
    };

    Ok(futures::stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let frame = rx.recv().await?;
        Some((Ok(Event::default().data(frame)), (rx, guard)))
    }))
}

// ---------------------------------------------------------------------------
// GET /api/stream/dashboard
// ---------------------------------------------------------------------------

/// Fleet-wide stream: every plant plus company KPIs.
pub async fn stream_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ObserverError> {
    let stream = open_stream(&state, Scope::AllPlants)?;
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

// ---------------------------------------------------------------------------
// GET /api/stream/plant/{id}
// ---------------------------------------------------------------------------

/// Single-plant stream.
///
/// Unknown plants are accepted: the initial event carries no `entity`
/// and no updates are sent until the plant exists.
pub async fn stream_plant(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ObserverError> {
    let plant = parse_plant_id(&id_str)?;
    let stream = open_stream(&state, Scope::Plant(plant))?;
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
