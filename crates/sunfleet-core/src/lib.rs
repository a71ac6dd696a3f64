//! Tick clock, snapshot production, and live fan-out for the sunfleet
//! telemetry simulator.
//!
//! Each broadcast cycle advances the shared tick, computes the fleet view
//! once, computes each subscribed plant's view at most once, and writes a
//! typed JSON envelope to every open stream.
//!
//! # Modules
//!
//! - [`clock`] -- Monotonic shared tick counter.
//! - [`catalog`] -- Validated plant catalog and cleaning history.
//! - [`simulator`] -- [`SnapshotSource`] trait and the noisy
//!   [`FleetSimulator`] that produces plant views, KPIs, and charts.
//! - [`registry`] -- Subscribers, their output channels, and the
//!   concurrent [`SubscriberRegistry`].
//! - [`envelope`] -- `initial` / `update` wire envelopes.
//! - [`broadcaster`] -- The broadcast cycle and subscription lifecycle.
//! - [`runner`] -- Periodic driver for broadcast cycles.
//! - [`config`] -- Configuration loading from `sunfleet-config.yaml`.
//!
//! [`SnapshotSource`]: simulator::SnapshotSource
//! [`FleetSimulator`]: simulator::FleetSimulator
//! [`SubscriberRegistry`]: registry::SubscriberRegistry

pub mod broadcaster;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod envelope;
pub mod registry;
pub mod runner;
pub mod simulator;

pub use broadcaster::{Broadcaster, CycleReport, SubscribeError};
pub use catalog::{CatalogError, PlantCatalog};
pub use clock::TickClock;
pub use config::{ConfigError, FleetConfig};
pub use registry::{DeliveryError, Frame, Subscriber, SubscriberChannel, SubscriberRegistry};
pub use runner::{LoopSummary, run_broadcast_loop};
pub use simulator::{FleetSimulator, SnapshotSource};
