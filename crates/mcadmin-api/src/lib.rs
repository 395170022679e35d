//! Read-only HTTP API exposing live participant snapshots.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`GET /api/players`** -- a fresh [`SnapshotBatch`] of every online
//!   participant, guarded by the `X-API-Key` shared secret
//! - **`GET /api/health`** -- an unauthenticated liveness probe
//!
//! # Architecture
//!
//! Handlers never read simulation state themselves. Each players request
//! asks a [`SnapshotSource`] for a batch; in production that source is an
//! authority handle which runs the collector on the simulation's own
//! thread and hands the finished batch back under a timeout. A slow or
//! stuck simulation therefore costs a request its time budget and a 500,
//! never a blocked worker.
//!
//! [`SnapshotBatch`]: mcadmin_types::SnapshotBatch
//! [`SnapshotSource`]: mcadmin_core::SnapshotSource

pub mod auth;
pub mod cors;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;

// Re-export primary types for convenience.
pub use auth::AuthContext;
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError};
pub use startup::{ApiHandle, StartupError, spawn_api};
pub use state::AppState;
