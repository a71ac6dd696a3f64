//! HTTP API for the sunfleet telemetry simulator.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Server-Sent Events** (`/api/stream/dashboard`,
//!   `/api/stream/plant/{id}`) fed by the core broadcaster, one
//!   subscription per open response
//! - **REST endpoints** for plant views, KPIs, charts, and cleaning history
//! - **Control endpoints** to advance, reset, and inspect the tick
//!
//! # Architecture
//!
//! Streams and REST reads share one [`AppState`]: the broadcaster owns the
//! tick clock and subscriber registry, the simulator computes every view
//! on demand. Stream lifetime is tied to the response body; dropping it
//! unregisters the subscriber.

pub mod control;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod sse;
pub mod startup;
pub mod state;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::ServerError;
pub use startup::{StartupError, spawn_observer};
pub use state::AppState;
