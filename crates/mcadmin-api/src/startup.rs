//! Data API startup helper for embedding in the host process.
//!
//! [`spawn_api`] binds the listener eagerly, so a port conflict is
//! reported to the caller, and then serves on a background Tokio task.
//! The returned [`ApiHandle`] stops the server gracefully.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mcadmin_api::startup::spawn_api;
//!
//! let api = spawn_api(&server_config, state).await?;
//! // ... simulation runs ...
//! api.stop().await;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the Data API server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Handle to a running Data API server.
#[derive(Debug)]
pub struct ApiHandle {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl ApiHandle {
    /// The address the listener is bound to.
    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn stop(self) {
        // The server task may already have exited on its own.
        let _ = self.shutdown.send(());
        if let Err(e) = self.join.await {
            error!(error = %e, "Data API task failed");
        }
    }
}

/// Bind the Data API listener and serve it on a background task.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address is invalid or the
/// port cannot be bound. Nothing is spawned in that case.
pub async fn spawn_api(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<ApiHandle, StartupError> {
    let requested = config.socket_addr()?;
    let listener = server::bind(config).await?;
    // Differs from `requested` when binding port 0.
    let addr = listener.local_addr().unwrap_or(requested);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let join = tokio::spawn(async move {
        let shutdown = async move {
            // A dropped handle stops the server as well.
            let _ = shutdown_rx.await;
        };
        if let Err(e) = server::serve(listener, state, shutdown).await {
            error!(error = %e, "Data API server exited with error");
        }
    });

    info!(%addr, "Data API server spawned on background task");

    Ok(ApiHandle {
        addr,
        shutdown: shutdown_tx,
        join,
    })
}
