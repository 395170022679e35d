//! Enumeration types shared between the simulation and the Data API.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Game mode
// ---------------------------------------------------------------------------

/// The game mode a participant is currently playing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameMode {
    /// Regular play with health, hunger and resource gathering.
    Survival,
    /// Unlimited resources and flight, no damage.
    Creative,
    /// Survival rules without block breaking or placing.
    Adventure,
    /// Invisible, non-interacting observer.
    Spectator,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// A named per-participant counter reported in the `statistics` mapping.
///
/// Serialized as the camelCase key the dashboard expects (`playTime`,
/// `mobKills`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Statistic {
    /// Ticks spent online.
    PlayTime,
    /// Number of deaths.
    Deaths,
    /// Hostile and passive mobs killed.
    MobKills,
    /// Other participants killed.
    PlayerKills,
    /// Jumps performed.
    Jumps,
    /// Distance walked, in centimetres.
    DistanceWalked,
    /// Distance flown, in centimetres.
    DistanceFlown,
}

impl Statistic {
    /// Every statistic the collector samples, in reporting order.
    pub const ALL: [Self; 7] = [
        Self::PlayTime,
        Self::Deaths,
        Self::MobKills,
        Self::PlayerKills,
        Self::Jumps,
        Self::DistanceWalked,
        Self::DistanceFlown,
    ];
}

// ---------------------------------------------------------------------------
// Snapshot sections
// ---------------------------------------------------------------------------

/// A structured sub-section of a participant snapshot that is collected
/// independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapshotSection {
    /// Position, world and view angles.
    Location,
    /// Health, hunger and experience.
    Vitals,
    /// Game mode and flight flags.
    Mode,
    /// Fire and air counters.
    Environment,
    /// Inventory contents.
    Inventory,
    /// Named statistic counters.
    Statistics,
    /// Completed achievements.
    Achievements,
    /// Ping and remote address.
    Connection,
}

impl core::fmt::Display for SnapshotSection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Location => "location",
            Self::Vitals => "vitals",
            Self::Mode => "mode",
            Self::Environment => "environment",
            Self::Inventory => "inventory",
            Self::Statistics => "statistics",
            Self::Achievements => "achievements",
            Self::Connection => "connection",
        };
        f.write_str(name)
    }
}
