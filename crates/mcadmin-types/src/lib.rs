//! Shared wire types for the MCAdmin Data API.
//!
//! The HTTP layer serializes these structures verbatim, and the collector
//! on the simulation's authority thread produces them. Keeping them in one
//! crate pins the JSON field names the dashboard depends on.
//!
//! # Modules
//!
//! - [`enums`] -- Game mode, statistic keys and snapshot section names
//! - [`structs`] -- Participant snapshots, item entries and response bodies

pub mod enums;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{GameMode, SnapshotSection, Statistic};
pub use structs::{
    AchievementSummary, ConnectionSnapshot, EnvironmentSnapshot, ErrorBody, HealthStatus,
    ItemEntry, LocationSnapshot, ModeSnapshot, PARTIAL_FAILURE_MARKER, ParticipantSnapshot,
    SnapshotBatch, UNKNOWN_ADDRESS, VitalsSnapshot,
};
