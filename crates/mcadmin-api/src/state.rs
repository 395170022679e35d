//! Shared application state for the Data API server.
//!
//! [`AppState`] is built once at startup and injected into handlers via
//! Axum's `State` extractor. Nothing in it changes after construction:
//! the secret is fixed and every snapshot is fetched fresh through the
//! [`SnapshotSource`].

use std::sync::Arc;

use mcadmin_core::{DataApiConfig, SnapshotSource};

use crate::auth::AuthContext;

/// Shared state for the Axum application.
#[derive(Clone)]
pub struct AppState {
    /// The shared secret requests are checked against.
    pub auth: AuthContext,
    /// Where participant snapshots come from.
    pub source: Arc<dyn SnapshotSource>,
    /// Log each accepted players request with its remote address.
    pub log_requests: bool,
    /// Pretty-print JSON bodies.
    pub pretty_json: bool,
}

impl AppState {
    /// State with request logging off and pretty printing on.
    pub fn new(auth: AuthContext, source: Arc<dyn SnapshotSource>) -> Self {
        Self {
            auth,
            source,
            log_requests: false,
            pretty_json: true,
        }
    }

    /// State configured from the loaded configuration file.
    pub fn from_config(config: &DataApiConfig, source: Arc<dyn SnapshotSource>) -> Self {
        Self {
            auth: AuthContext::new(config.api_key.clone()),
            source,
            log_requests: config.log_requests,
            pretty_json: config.pretty_json,
        }
    }
}

impl core::fmt::Debug for AppState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppState")
            .field("auth", &self.auth)
            .field("log_requests", &self.log_requests)
            .field("pretty_json", &self.pretty_json)
            .finish_non_exhaustive()
    }
}
