//! Server binary for the sunfleet telemetry simulator.
//!
//! Wires together the plant catalog, snapshot producer, broadcaster, and
//! HTTP API, then drives broadcast cycles until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `sunfleet-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the plant catalog and simulator
//! 4. Create the shared application state (clock, registry, broadcaster)
//! 5. Start the HTTP server on a background task
//! 6. Run the broadcast loop until `Ctrl-C`
//! 7. Stop the HTTP server

mod error;

use std::path::Path;
use std::sync::Arc;

use sunfleet_core::config::{FleetConfig, LoggingConfig};
use sunfleet_core::runner::run_broadcast_loop;
use sunfleet_core::simulator::FleetSimulator;
use sunfleet_observer::state::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

const CONFIG_PATH: &str = "sunfleet-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the catalog, or the HTTP listener
/// cannot be set up.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, from_file) = load_config(Path::new(CONFIG_PATH))?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("sunfleet-engine starting");
    if from_file {
        info!(path = CONFIG_PATH, "Configuration loaded");
    } else {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }

    // 3-4. Catalog, simulator, shared state.
    let state = build_state(&config)?;
    info!(
        plants = state.simulator.catalog().len(),
        ticks_per_day = state.simulator.ticks_per_day(),
        tick_interval_ms = state.tick_interval_ms,
        channel_capacity = state.channel_capacity,
        "Simulator initialized"
    );

    // 5. HTTP server.
    let server = sunfleet_observer::spawn_observer(&config.server, Arc::clone(&state)).await?;

    // 6. Broadcast loop.
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
        }
        info!("Shutdown signal received");
    };
    let summary =
        run_broadcast_loop(&state.broadcaster, config.simulation.tick_interval(), shutdown).await;

    // 7. Stop serving. Open event streams would otherwise keep it alive.
    server.abort();

    info!(
        cycles = summary.cycles,
        overruns = summary.overruns,
        skipped = summary.skipped,
        "sunfleet-engine shutdown complete"
    );
    Ok(())
}

/// Load `path`, or defaults when it does not exist.
///
/// Returns the config and whether it came from the file.
fn load_config(path: &Path) -> Result<(FleetConfig, bool), EngineError> {
    if path.exists() {
        Ok((FleetConfig::from_file(path)?, true))
    } else {
        let mut config = FleetConfig::default();
        config.apply_env_overrides();
        Ok((config, false))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Build the catalog and simulator and wire them into the shared state.
fn build_state(config: &FleetConfig) -> Result<Arc<AppState>, EngineError> {
    let catalog = config.catalog()?;
    let simulator = FleetSimulator::new(catalog, config.simulation.ticks_per_day);
    Ok(Arc::new(AppState::new(simulator, &config.simulation)))
}
