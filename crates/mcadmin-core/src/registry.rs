//! Read-only view of the simulation's participant registry.
//!
//! The collector only ever sees the simulation through these traits.
//! Neither requires `Sync`: implementations hand out plain references into
//! live simulation state, and every call happens on the authority thread
//! that owns that state.
//!
//! Accessors for structured sections return `Result` so an implementation
//! can report a section as unavailable without failing the whole
//! participant.

use std::net::IpAddr;

use mcadmin_types::{GameMode, Statistic};
use uuid::Uuid;

/// Failure reading one piece of participant state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// The participant disconnected while being read.
    #[error("participant is no longer online")]
    Offline,

    /// The requested counter is not tracked for this participant.
    #[error("statistic {0:?} is not tracked")]
    Untracked(Statistic),

    /// The state exists but cannot be read right now.
    #[error("state unavailable: {0}")]
    Unavailable(String),
}

/// Raw position of a participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    /// East/west coordinate.
    pub x: f64,
    /// Height.
    pub y: f64,
    /// North/south coordinate.
    pub z: f64,
    /// Name of the containing world.
    pub world: String,
    /// Vertical view angle in degrees.
    pub pitch: f32,
    /// Horizontal view angle in degrees.
    pub yaw: f32,
}

/// Raw health, hunger and experience values.
#[derive(Debug, Clone, PartialEq)]
pub struct Vitals {
    /// Current health.
    pub health: f64,
    /// Maximum health.
    pub max_health: f64,
    /// Hunger bar, 0 to 20.
    pub food_level: i32,
    /// Saturation.
    pub saturation: f32,
    /// Experience level.
    pub level: i32,
    /// Progress towards the next level, 0.0 to 1.0.
    pub exp_progress: f32,
    /// Lifetime experience points.
    pub total_experience: i32,
}

/// Game mode and movement flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Movement {
    /// Current game mode.
    pub game_mode: GameMode,
    /// Whether the participant is flying.
    pub flying: bool,
    /// Whether flight is permitted.
    pub allow_flight: bool,
    /// Walk speed multiplier.
    pub walk_speed: f32,
    /// Fly speed multiplier.
    pub fly_speed: f32,
}

/// Fire and air counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentCounters {
    /// Remaining ticks of burning.
    pub fire_ticks: i32,
    /// Remaining air ticks.
    pub remaining_air: i32,
    /// Air capacity in ticks.
    pub maximum_air: i32,
}

/// Contents of a single inventory slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStack {
    /// Material name, e.g. `IRON_PICKAXE`.
    pub material: String,
    /// Stack size.
    pub amount: i32,
    /// Damage taken.
    pub durability: i16,
    /// Custom name, if renamed.
    pub display_name: Option<String>,
    /// Enchantment keys and levels, in application order.
    pub enchantments: Vec<(String, u32)>,
}

impl ItemStack {
    /// A plain stack with no metadata.
    pub fn new(material: impl Into<String>, amount: i32) -> Self {
        Self {
            material: material.into(),
            amount,
            durability: 0,
            display_name: None,
            enchantments: Vec::new(),
        }
    }

    /// Whether the stack is one of the air materials.
    pub fn is_air(&self) -> bool {
        matches!(self.material.as_str(), "AIR" | "CAVE_AIR" | "VOID_AIR")
    }
}

/// One online participant, read on the authority thread.
pub trait Participant {
    /// Stable identity.
    fn id(&self) -> Uuid;

    /// Account name.
    fn name(&self) -> &str;

    /// Name as shown in chat.
    fn display_name(&self) -> &str;

    /// Position and view direction.
    fn position(&self) -> Result<Position, AccessError>;

    /// Health, hunger and experience.
    fn vitals(&self) -> Result<Vitals, AccessError>;

    /// Game mode and movement flags.
    fn movement(&self) -> Result<Movement, AccessError>;

    /// Fire and air counters.
    fn environment(&self) -> Result<EnvironmentCounters, AccessError>;

    /// Every inventory slot in index order; `None` for an empty slot.
    fn inventory(&self) -> Result<Vec<Option<ItemStack>>, AccessError>;

    /// Current value of one statistic counter.
    fn statistic(&self, statistic: Statistic) -> Result<i64, AccessError>;

    /// Whether the given achievement has been completed.
    fn has_completed(&self, achievement: &str) -> Result<bool, AccessError>;

    /// Round-trip latency in milliseconds.
    fn ping(&self) -> Result<i32, AccessError>;

    /// Remote address, when known.
    fn address(&self) -> Option<IpAddr>;
}

/// The set of online participants plus server-wide catalogues.
pub trait ParticipantRegistry {
    /// Participant type stored in the registry.
    type Participant: Participant;

    /// Identifier reported in every snapshot batch.
    fn server_name(&self) -> &str;

    /// Online participants in registry order.
    fn online(&self) -> Box<dyn Iterator<Item = &Self::Participant> + '_>;

    /// Every achievement id the server knows, in catalogue order.
    fn achievements(&self) -> Box<dyn Iterator<Item = &str> + '_>;
}
