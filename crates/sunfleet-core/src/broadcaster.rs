//! Live-update fan-out.
//!
//! The [`Broadcaster`] advances the [`TickClock`], asks the
//! [`SnapshotSource`] for the fleet view (once) and for each subscribed
//! plant's view (at most once per plant), and writes a scope-specific
//! envelope to every registered subscriber.
//!
//! # Cycle state machine
//!
//! `Idle -> Broadcasting` when a cycle starts, back to `Idle` once every
//! subscriber has been visited. The driver is expected to space cycles
//! further apart than a cycle takes; a cycle attempted while another is
//! running is logged and skipped rather than interleaved.
//!
//! # Failure isolation
//!
//! - Closed channel: the subscriber is removed; the cycle continues.
//! - Full channel: this frame is dropped for that subscriber only.
//! - Unknown plant: the subscriber is skipped this cycle and stays
//!   registered, since the plant may come back.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use sunfleet_types::{BroadcastPhase, EnvelopeKind, PlantId, Scope, SubscriberId};
use tracing::{debug, info, warn};

use crate::clock::TickClock;
use crate::envelope::Envelope;
use crate::registry::{
    DeliveryError, Frame, Subscriber, SubscriberChannel, SubscriberRegistry,
};
use crate::simulator::SnapshotSource;

/// Errors returned when opening a subscription.
#[derive(Debug, thiserror::Error)]
pub enum SubscribeError {
    /// The channel was already closed when the initial frame was written.
    #[error("subscriber channel closed before the initial frame was delivered")]
    ChannelClosed,

    /// The initial envelope could not be serialized.
    #[error("failed to encode initial frame: {source}")]
    Encode {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

/// Outcome of one broadcast cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Tick broadcast by this cycle.
    pub tick: u64,
    /// Subscribers visited.
    pub visited: usize,
    /// Frames accepted by a channel.
    pub delivered: usize,
    /// Subscribers skipped because their plant is unknown.
    pub skipped: usize,
    /// Subscribers whose `initial` frame already carried this tick.
    pub up_to_date: usize,
    /// Frames dropped because a channel was full.
    pub lagged: usize,
    /// Subscribers removed after their channel closed.
    pub removed: usize,
    /// Distinct plants whose snapshot was computed.
    pub plants_computed: usize,
    /// Wall-clock duration of the cycle.
    pub elapsed: Duration,
}

/// Sets the phase flag for the lifetime of a cycle.
struct PhaseGuard<'a>(&'a AtomicBool);

impl<'a> PhaseGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Periodic fan-out of simulation snapshots to streaming subscribers.
pub struct Broadcaster {
    clock: Arc<TickClock>,
    registry: Arc<SubscriberRegistry>,
    source: Arc<dyn SnapshotSource>,
    broadcasting: AtomicBool,
    cycles: AtomicU64,
    last_cycle_micros: AtomicU64,
}

impl Broadcaster {
    /// Create a broadcaster over shared clock, registry, and snapshot source.
    pub const fn new(
        clock: Arc<TickClock>,
        registry: Arc<SubscriberRegistry>,
        source: Arc<dyn SnapshotSource>,
    ) -> Self {
        Self {
            clock,
            registry,
            source,
            broadcasting: AtomicBool::new(false),
            cycles: AtomicU64::new(0),
            last_cycle_micros: AtomicU64::new(0),
        }
    }

    // -----------------------------------------------------------------------
    // Control surface
    // -----------------------------------------------------------------------

    /// Advance the clock by one tick without broadcasting.
    pub fn advance_tick(&self) -> u64 {
        let tick = self.clock.advance();
        info!(tick, "Tick advanced manually");
        tick
    }

    /// Reset the clock to 0.
    pub fn reset_tick(&self) -> u64 {
        let tick = self.clock.reset();
        info!("Tick reset");
        tick
    }

    /// Current tick.
    pub fn current_tick(&self) -> u64 {
        self.clock.current()
    }

    /// Whether a cycle is in progress.
    pub fn phase(&self) -> BroadcastPhase {
        if self.broadcasting.load(Ordering::Acquire) {
            BroadcastPhase::Broadcasting
        } else {
            BroadcastPhase::Idle
        }
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of cycles completed since start.
    pub fn cycles_completed(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }

    /// Duration of the most recent completed cycle.
    pub fn last_cycle_duration(&self) -> Duration {
        Duration::from_micros(self.last_cycle_micros.load(Ordering::Acquire))
    }

    // -----------------------------------------------------------------------
    // Subscription
    // -----------------------------------------------------------------------

    /// Open a subscription.
    ///
    /// Writes one `initial` envelope built from the current tick to
    /// `channel`, then registers the subscriber so it receives every
    /// subsequent cycle.
    ///
    /// Reading the tick and registering are not atomic with respect to a
    /// running cycle: a cycle may advance the clock, this call may build
    /// its `initial` frame from the new tick, and the cycle may then visit
    /// the new subscriber. The subscriber records its initial tick so that
    /// cycle skips it instead of repeating the tick.
    ///
    /// # Errors
    ///
    /// [`SubscribeError::ChannelClosed`] if the channel rejected the
    /// initial frame because it is closed; the subscriber is not registered.
    pub fn subscribe(
        &self,
        scope: Scope,
        channel: Box<dyn SubscriberChannel>,
    ) -> Result<SubscriberId, SubscribeError> {
        let tick = self.clock.current();
        let frame = match scope {
            Scope::AllPlants => {
                let fleet = self.source.fleet_snapshot(tick);
                Envelope::fleet(EnvelopeKind::Initial, tick, &fleet).encode()?
            }
            Scope::Plant(plant) => {
                let detail = self.source.entity_snapshot(tick, plant);
                if detail.is_none() {
                    debug!(%plant, "Subscription to unknown plant");
                }
                Envelope::plant(EnvelopeKind::Initial, tick, detail.as_ref()).encode()?
            }
        };

        let subscriber = Subscriber::new(scope, channel).with_initial_tick(tick);
        match subscriber.deliver(frame) {
            Ok(()) => {}
            Err(DeliveryError::Full) => {
                debug!(subscriber = %subscriber.id(), "Initial frame dropped, channel full");
            }
            Err(DeliveryError::Closed) => return Err(SubscribeError::ChannelClosed),
        }

        let id = self.registry.add(subscriber);
        info!(
            subscriber = %id,
            ?scope,
            tick,
            subscribers = self.registry.len(),
            "Subscriber connected"
        );
        Ok(id)
    }

    /// Close a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        if self.registry.remove(id) {
            info!(subscriber = %id, subscribers = self.registry.len(), "Subscriber disconnected");
        }
    }

    // -----------------------------------------------------------------------
    // Cycle
    // -----------------------------------------------------------------------

    /// Run one broadcast cycle.
    ///
    /// Returns `None` without advancing the clock if another cycle is
    /// still in progress.
    pub fn run_cycle(&self) -> Option<CycleReport> {
        let Some(_phase) = PhaseGuard::enter(&self.broadcasting) else {
            warn!(
                tick = self.clock.current(),
                "Broadcast cycle overlap: previous cycle still running, skipping"
            );
            return None;
        };

        let started = Instant::now();
        let tick = self.clock.advance();
        let fleet = self.source.fleet_snapshot(tick);
        let fleet_frame = encode_frame(&Envelope::fleet(EnvelopeKind::Update, tick, &fleet));
        let mut plant_frames: HashMap<PlantId, Option<Frame>> = HashMap::new();
        let mut report = CycleReport {
            tick,
            ..CycleReport::default()
        };

        self.registry.for_each(|subscriber| {
            report.visited = report.visited.saturating_add(1);

            if subscriber.take_initial_tick() == Some(tick) {
                report.up_to_date = report.up_to_date.saturating_add(1);
                debug!(subscriber = %subscriber.id(), tick, "Initial frame already at this tick");
                return;
            }

            let frame = match subscriber.scope() {
                Scope::AllPlants => fleet_frame.clone(),
                Scope::Plant(plant) => plant_frames
                    .entry(plant)
                    .or_insert_with(|| self.plant_frame(tick, plant))
                    .clone(),
            };

            let Some(frame) = frame else {
                report.skipped = report.skipped.saturating_add(1);
                debug!(
                    subscriber = %subscriber.id(),
                    tick,
                    "No snapshot for subscriber scope, skipping"
                );
                return;
            };

            match subscriber.deliver(frame) {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(DeliveryError::Full) => {
                    report.lagged = report.lagged.saturating_add(1);
                    debug!(
                        subscriber = %subscriber.id(),
                        tick,
                        "Subscriber lagging, frame dropped"
                    );
                }
                Err(DeliveryError::Closed) => {
                    self.registry.remove(subscriber.id());
                    report.removed = report.removed.saturating_add(1);
                    info!(
                        subscriber = %subscriber.id(),
                        tick,
                        "Subscriber channel closed, removed"
                    );
                }
            }
        });

        report.plants_computed = plant_frames.len();
        report.elapsed = started.elapsed();
        self.cycles.fetch_add(1, Ordering::AcqRel);
        self.last_cycle_micros.store(
            u64::try_from(report.elapsed.as_micros()).unwrap_or(u64::MAX),
            Ordering::Release,
        );

        debug!(
            tick,
            visited = report.visited,
            delivered = report.delivered,
            skipped = report.skipped,
            up_to_date = report.up_to_date,
            lagged = report.lagged,
            removed = report.removed,
            elapsed_us = report.elapsed.as_micros(),
            "Broadcast cycle complete"
        );
        Some(report)
    }

    fn plant_frame(&self, tick: u64, plant: PlantId) -> Option<Frame> {
        let detail = self.source.entity_snapshot(tick, plant)?;
        encode_frame(&Envelope::plant(EnvelopeKind::Update, tick, Some(&detail)))
    }
}

impl core::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("tick", &self.clock.current())
            .field("subscribers", &self.registry.len())
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

fn encode_frame(envelope: &Envelope<'_>) -> Option<Frame> {
    envelope
        .encode()
        .inspect_err(|e| warn!(tick = envelope.tick(), error = %e, "Failed to encode envelope"))
        .ok()
}
