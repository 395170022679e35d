//! Authority thread, cross-context bridge and snapshot collection for the
//! MCAdmin Data API.
//!
//! The simulation lives on a single authority thread. Async request tasks
//! never touch it directly: they submit closures through an
//! [`AuthorityHandle`] and wait for the result on a completion channel.
//!
//! # Modules
//!
//! - [`authority`] -- The tick loop that owns the simulation and serves jobs.
//! - [`bridge`] -- [`AuthorityHandle::run_on_authority_thread`] and its errors.
//! - [`collector`] -- Builds participant snapshots with per-section fault
//!   isolation.
//! - [`config`] -- Loading `config.yml` into strongly-typed structs.
//! - [`registry`] -- Read-only traits the collector sees the simulation
//!   through.
//! - [`source`] -- [`SnapshotSource`], the seam the HTTP layer depends on.
//! - [`world`] -- The in-memory demo simulation.
//!
//! [`AuthorityHandle`]: bridge::AuthorityHandle
//! [`AuthorityHandle::run_on_authority_thread`]: bridge::AuthorityHandle::run_on_authority_thread
//! [`SnapshotSource`]: source::SnapshotSource

pub mod authority;
pub mod bridge;
pub mod collector;
pub mod config;
pub mod registry;
pub mod source;
pub mod world;

pub use authority::{AuthorityConfig, AuthorityError, AuthorityThread, Simulation};
pub use bridge::{AuthorityHandle, BridgeError};
pub use config::{ApiKey, ConfigError, DataApiConfig, SimulationConfig};
pub use source::SnapshotSource;
pub use world::World;
