//! Shared application state for the HTTP API.
//!
//! [`AppState`] owns the [`Broadcaster`] (and through it the tick clock
//! and subscriber registry) plus the [`FleetSimulator`] that REST reads are
//! computed from. REST handlers and stream handlers see the same clock.

use std::sync::Arc;

use sunfleet_core::broadcaster::Broadcaster;
use sunfleet_core::clock::TickClock;
use sunfleet_core::config::BroadcastConfig;
use sunfleet_core::registry::SubscriberRegistry;
use sunfleet_core::simulator::{FleetSimulator, SnapshotSource};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Tick owner and live fan-out.
    pub broadcaster: Arc<Broadcaster>,
    /// Snapshot producer backing REST reads.
    pub simulator: Arc<FleetSimulator>,
    /// Configured broadcast period, reported by the status endpoint.
    pub tick_interval_ms: u64,
    /// Per-stream frame buffer.
    pub channel_capacity: usize,
}

impl AppState {
    /// Wire a fresh clock, registry, and broadcaster around `simulator`.
    pub fn new(simulator: FleetSimulator, settings: &BroadcastConfig) -> Self {
        let simulator = Arc::new(simulator);
        let broadcaster = Broadcaster::new(
            Arc::new(TickClock::new()),
            Arc::new(SubscriberRegistry::new()),
            Arc::clone(&simulator) as Arc<dyn SnapshotSource>,
        );
        Self {
            broadcaster: Arc::new(broadcaster),
            simulator,
            tick_interval_ms: u64::try_from(settings.tick_interval().as_millis())
                .unwrap_or(u64::MAX),
            channel_capacity: settings.channel_capacity.max(1),
        }
    }

    /// Current tick.
    pub fn tick(&self) -> u64 {
        self.broadcaster.current_tick()
    }
}
