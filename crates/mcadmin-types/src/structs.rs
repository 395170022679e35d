//! Snapshot structures served by `GET /api/players`.
//!
//! Field names follow the JSON payload the MCAdmin dashboard consumes, so
//! every struct is serialized in camelCase. Sections that can fail
//! independently are `Option`s: a `None` section is left out of the payload
//! entirely rather than being emitted with placeholder values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{GameMode, SnapshotSection, Statistic};

/// Marker placed in the `error` field when any section of a participant
/// snapshot could not be collected.
pub const PARTIAL_FAILURE_MARKER: &str = "Partial data collection failed";

/// Remote address reported when the participant's address is not known.
pub const UNKNOWN_ADDRESS: &str = "unknown";

// ---------------------------------------------------------------------------
// Participant snapshot
// ---------------------------------------------------------------------------

/// Point-in-time view of one online participant.
///
/// Produced on the authority thread once per request and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSnapshot {
    /// Stable participant identity.
    pub uuid: Uuid,
    /// Account name.
    pub name: String,
    /// Name as shown in chat and the tab list.
    pub display_name: String,
    /// Position and view direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationSnapshot>,
    /// Health, hunger and experience.
    #[serde(flatten)]
    pub vitals: Option<VitalsSnapshot>,
    /// Game mode and movement flags.
    #[serde(flatten)]
    pub mode: Option<ModeSnapshot>,
    /// Fire and air counters.
    #[serde(flatten)]
    pub environment: Option<EnvironmentSnapshot>,
    /// Occupied, non-air inventory slots in slot order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Vec<ItemEntry>>,
    /// Best-effort statistic counters. Unavailable counters are absent.
    #[serde(default)]
    pub statistics: BTreeMap<Statistic, i64>,
    /// Completed achievement summary.
    #[serde(flatten)]
    pub achievements: AchievementSummary,
    /// Ping and remote address.
    #[serde(flatten)]
    pub connection: Option<ConnectionSnapshot>,
    /// Set to [`PARTIAL_FAILURE_MARKER`] when any section failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The sections that failed, in collection order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_sections: Vec<SnapshotSection>,
}

impl ParticipantSnapshot {
    /// Whether every section was collected.
    pub fn is_complete(&self) -> bool {
        self.failed_sections.is_empty()
    }
}

/// Position of a participant. Coordinates carry two decimals, angles one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    /// East/west coordinate.
    pub x: f64,
    /// Height.
    pub y: f64,
    /// North/south coordinate.
    pub z: f64,
    /// Name of the world the participant is in.
    pub world: String,
    /// Vertical view angle.
    pub pitch: f64,
    /// Horizontal view angle.
    pub yaw: f64,
}

/// Health, hunger and experience values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalsSnapshot {
    /// Current health, one decimal.
    pub health: f64,
    /// Maximum health.
    pub max_health: f64,
    /// Hunger bar, 0 to 20.
    pub food_level: i32,
    /// Saturation, one decimal.
    pub saturation: f64,
    /// Experience level.
    pub level: i32,
    /// Progress towards the next level, 0.0 to 1.0 with two decimals.
    pub exp: f64,
    /// Lifetime experience points.
    pub total_experience: i32,
}

/// Game mode and movement flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeSnapshot {
    /// Current game mode.
    pub game_mode: GameMode,
    /// Whether the participant is flying right now.
    pub is_flying: bool,
    /// Whether flight is permitted.
    pub allow_flight: bool,
    /// Walk speed multiplier.
    pub walk_speed: f32,
    /// Fly speed multiplier.
    pub fly_speed: f32,
}

/// Environmental counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSnapshot {
    /// Remaining ticks of burning.
    pub fire_ticks: i32,
    /// Remaining air ticks.
    pub remaining_air: i32,
    /// Air capacity in ticks.
    pub maximum_air: i32,
}

/// One occupied inventory slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemEntry {
    /// Slot index within the participant's inventory.
    pub slot: usize,
    /// Material name, e.g. `DIAMOND_SWORD`.
    #[serde(rename = "type")]
    pub item_type: String,
    /// Stack size.
    pub amount: i32,
    /// Damage taken by the item.
    pub durability: i32,
    /// Custom display name, if the item was renamed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Enchantments as `key:level` strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enchantments: Option<Vec<String>>,
}

/// Completed achievements for one participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementSummary {
    /// Total number of completed achievements.
    pub advancement_count: usize,
    /// The first completed achievement ids, in catalogue order.
    pub achievements: Vec<String>,
    /// True when `achievements` holds fewer ids than `advancement_count`.
    pub achievements_truncated: bool,
}

/// Network details of a participant's connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    /// Round-trip latency in milliseconds.
    pub ping: i32,
    /// Remote IP address, or [`UNKNOWN_ADDRESS`].
    pub address: String,
}

// ---------------------------------------------------------------------------
// Response envelopes
// ---------------------------------------------------------------------------

/// Body of a successful `GET /api/players` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotBatch {
    /// One snapshot per online participant, in registry order.
    pub players: Vec<ParticipantSnapshot>,
    /// Always equal to `players.len()`.
    pub count: usize,
    /// Collection instant in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Identifier of the server the batch was collected from.
    pub server: String,
}

impl SnapshotBatch {
    /// Build a batch, deriving `count` from the snapshots.
    pub fn new(players: Vec<ParticipantSnapshot>, timestamp: i64, server: String) -> Self {
        Self {
            count: players.len(),
            players,
            timestamp,
            server,
        }
    }
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always `ok` while the listener is serving.
    pub status: String,
    /// Plugin name.
    pub plugin: String,
    /// Plugin version.
    pub version: String,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Caller-facing error message.
    pub error: String,
}
