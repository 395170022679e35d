//! Axum router construction for the Data API.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{any, get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::cors::cors_middleware;
use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the Data API.
///
/// The router includes:
/// - `/api/players` (and any path below it) -- participant snapshots,
///   routed for every method so the handler can apply its own
///   authentication and method gates
/// - `GET /api/health` -- liveness probe
/// - anything else -- `404 {"error":"Not found"}`
///
/// Requests pass through tracing first, then CORS, so preflights are
/// traced too.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/players", any(handlers::list_players))
        .route("/api/players/{*rest}", any(handlers::list_players))
        .route("/api/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(cors_middleware)),
        )
        .with_state(state)
}
