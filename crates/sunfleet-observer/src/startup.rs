//! Server startup helper for embedding in the engine binary.
//!
//! [`spawn_observer`] binds the listener eagerly, so a busy port fails
//! startup, then serves on a background Tokio task alongside the
//! broadcast loop.

use std::sync::Arc;

use sunfleet_core::config::ServerConfig;
use tokio::task::JoinHandle;

use crate::server::{self, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the HTTP server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Bind `config.host:config.port` and serve the API on a background task.
///
/// Returns the task handle; abort it to stop serving. Open event streams
/// never end on their own, so the caller should not wait for the task.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address cannot be bound.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, StartupError> {
    let listener = server::bind(config).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state).await {
            tracing::error!(error = %e, "HTTP server exited with error");
        }
    });

    tracing::info!(
        host = %config.host,
        port = config.port,
        "HTTP server spawned on background task"
    );

    Ok(handle)
}
