//! REST endpoint handlers for the Data API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/players` | Snapshot of every online participant (key required) |
//! | `GET` | `/api/health` | Liveness probe, no key required |
//!
//! `OPTIONS` on any path is answered by the CORS middleware before these
//! handlers run.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{Method, StatusCode};
use axum::response::Response;
use mcadmin_types::{HealthStatus, UNKNOWN_ADDRESS};
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, json_response};
use crate::state::AppState;

/// Name reported by the health endpoint.
pub const PLUGIN_NAME: &str = "MCAdmin-DataAPI";

// ---------------------------------------------------------------------------
// /api/players
// ---------------------------------------------------------------------------

/// Serve a fresh snapshot batch of every online participant.
///
/// The key is checked before the method, so an unauthenticated caller
/// learns nothing about which methods exist. Collection runs on the
/// authority thread; any failure there becomes a generic 500.
pub async fn list_players(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, ApiError> {
    state.auth.authorize(request.headers())?;

    if request.method() != Method::GET {
        return Err(ApiError::MethodNotAllowed);
    }

    if state.log_requests {
        info!(
            remote = %remote_address(&request),
            path = request.uri().path(),
            "Players request"
        );
    }

    let batch = state.source.snapshot().await?;
    let body = to_json(&batch, state.pretty_json)?;
    Ok(json_response(StatusCode::OK, body))
}

// ---------------------------------------------------------------------------
// /api/health
// ---------------------------------------------------------------------------

/// Report that the listener is up.
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let status = HealthStatus {
        status: String::from("ok"),
        plugin: String::from(PLUGIN_NAME),
        version: String::from(env!("CARGO_PKG_VERSION")),
    };
    let body = to_json(&status, state.pretty_json)?;
    Ok(json_response(StatusCode::OK, body))
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// Answer paths no route matched.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<Vec<u8>, ApiError> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    Ok(bytes)
}

/// Peer IP of the connection, or `unknown` when the server was not
/// started with connect info.
fn remote_address(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(
            || String::from(UNKNOWN_ADDRESS),
            |ConnectInfo(addr)| addr.ip().to_string(),
        )
}
