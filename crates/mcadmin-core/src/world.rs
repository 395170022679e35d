//! In-memory simulation standing in for the game server.
//!
//! [`World`] keeps the online participants in join order together with
//! the server's achievement catalogue. Every tick it nudges participants
//! around, burns food, decays fire and air counters and advances the
//! statistic counters. All randomness comes from a seeded [`StdRng`] so a
//! world built from the same seed evolves identically.

use std::collections::{BTreeMap, BTreeSet};
use std::net::{IpAddr, Ipv4Addr};

use mcadmin_types::{GameMode, Statistic};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::authority::Simulation;
use crate::registry::{
    AccessError, EnvironmentCounters, ItemStack, Movement, Participant, ParticipantRegistry,
    Position, Vitals,
};

/// Number of slots in a participant inventory.
pub const INVENTORY_SIZE: usize = 36;

/// Ticks per simulated second.
const TICKS_PER_SECOND: u64 = 20;

/// Air ticks a participant can hold.
const MAXIMUM_AIR: i32 = 300;

/// Achievement ids every demo world knows about.
pub const DEFAULT_ACHIEVEMENTS: &[&str] = &[
    "story/root",
    "story/mine_stone",
    "story/upgrade_tools",
    "story/smelt_iron",
    "story/obtain_armor",
    "story/lava_bucket",
    "story/iron_tools",
    "story/deflect_arrow",
    "story/form_obsidian",
    "story/mine_diamond",
    "story/enter_the_nether",
    "story/shiny_gear",
    "story/enchant_item",
    "story/cure_zombie_villager",
    "story/follow_ender_eye",
    "story/enter_the_end",
    "nether/root",
    "nether/find_fortress",
    "nether/obtain_blaze_rod",
    "end/root",
    "end/kill_dragon",
    "adventure/root",
    "adventure/kill_a_mob",
    "adventure/trade",
    "adventure/sleep_in_bed",
    "husbandry/root",
    "husbandry/plant_seed",
    "husbandry/breed_an_animal",
    "husbandry/tame_an_animal",
    "husbandry/fishy_business",
];

const DEMO_NAMES: &[&str] = &["Steve", "Alex", "Notch", "Jeb", "Dinnerbone", "Grumm"];

/// Mutable state of one online participant.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    /// Stable identity.
    pub id: Uuid,
    /// Account name.
    pub name: String,
    /// Chat name.
    pub display_name: String,
    /// Position and view direction.
    pub position: Position,
    /// Health, hunger and experience.
    pub vitals: Vitals,
    /// Game mode and movement flags.
    pub movement: Movement,
    /// Fire and air counters.
    pub environment: EnvironmentCounters,
    /// Inventory slots; `None` is an empty slot.
    pub inventory: Vec<Option<ItemStack>>,
    /// Statistic counters, or `None` when statistics tracking is disabled
    /// for this participant.
    pub statistics: Option<BTreeMap<Statistic, i64>>,
    /// Completed achievement ids.
    pub completed: BTreeSet<String>,
    /// Round-trip latency in milliseconds.
    pub ping: i32,
    /// Remote address, when known.
    pub address: Option<IpAddr>,
}

impl PlayerState {
    /// A freshly joined survival participant at spawn.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            display_name: name.clone(),
            name,
            position: Position {
                x: 0.5,
                y: 64.0,
                z: 0.5,
                world: "world".to_owned(),
                pitch: 0.0,
                yaw: 0.0,
            },
            vitals: Vitals {
                health: 20.0,
                max_health: 20.0,
                food_level: 20,
                saturation: 5.0,
                level: 0,
                exp_progress: 0.0,
                total_experience: 0,
            },
            movement: Movement {
                game_mode: GameMode::Survival,
                flying: false,
                allow_flight: false,
                walk_speed: 0.2,
                fly_speed: 0.1,
            },
            environment: EnvironmentCounters {
                fire_ticks: 0,
                remaining_air: MAXIMUM_AIR,
                maximum_air: MAXIMUM_AIR,
            },
            inventory: vec![None; INVENTORY_SIZE],
            statistics: Some(Statistic::ALL.iter().map(|s| (*s, 0)).collect()),
            completed: BTreeSet::new(),
            ping: 0,
            address: None,
        }
    }

    /// Put `stack` into `slot`, ignoring slots outside the inventory.
    pub fn set_slot(&mut self, slot: usize, stack: ItemStack) {
        if let Some(entry) = self.inventory.get_mut(slot) {
            *entry = Some(stack);
        }
    }

    fn bump(&mut self, statistic: Statistic, by: i64) {
        if let Some(value) = self
            .statistics
            .as_mut()
            .and_then(|stats| stats.get_mut(&statistic))
        {
            *value = value.saturating_add(by);
        }
    }
}

impl Participant for PlayerState {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn position(&self) -> Result<Position, AccessError> {
        Ok(self.position.clone())
    }

    fn vitals(&self) -> Result<Vitals, AccessError> {
        Ok(self.vitals.clone())
    }

    fn movement(&self) -> Result<Movement, AccessError> {
        Ok(self.movement.clone())
    }

    fn environment(&self) -> Result<EnvironmentCounters, AccessError> {
        Ok(self.environment)
    }

    fn inventory(&self) -> Result<Vec<Option<ItemStack>>, AccessError> {
        Ok(self.inventory.clone())
    }

    fn statistic(&self, statistic: Statistic) -> Result<i64, AccessError> {
        self.statistics
            .as_ref()
            .and_then(|stats| stats.get(&statistic).copied())
            .ok_or(AccessError::Untracked(statistic))
    }

    fn has_completed(&self, achievement: &str) -> Result<bool, AccessError> {
        Ok(self.completed.contains(achievement))
    }

    fn ping(&self) -> Result<i32, AccessError> {
        Ok(self.ping)
    }

    fn address(&self) -> Option<IpAddr> {
        self.address
    }
}

/// The demo simulation: participants plus server-wide catalogues.
#[derive(Debug, Clone)]
pub struct World {
    server_name: String,
    players: Vec<PlayerState>,
    achievements: Vec<String>,
    rng: StdRng,
}

impl World {
    /// An empty world using [`DEFAULT_ACHIEVEMENTS`].
    pub fn new(server_name: impl Into<String>, seed: u64) -> Self {
        Self {
            server_name: server_name.into(),
            players: Vec::new(),
            achievements: DEFAULT_ACHIEVEMENTS.iter().map(|&id| id.to_owned()).collect(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A world pre-populated with `count` demo participants.
    pub fn populated(server_name: impl Into<String>, seed: u64, count: u32) -> Self {
        let mut world = Self::new(server_name, seed);
        for index in 0..count {
            let player = world.demo_player(index);
            world.join(player);
        }
        world
    }

    /// Replace the achievement catalogue.
    #[must_use]
    pub fn with_achievements<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.achievements = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Add a participant at the end of the registry.
    pub fn join(&mut self, player: PlayerState) {
        self.players.push(player);
    }

    /// Remove a participant; returns it if it was online.
    pub fn leave(&mut self, id: Uuid) -> Option<PlayerState> {
        let index = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.remove(index))
    }

    /// Online participants in join order.
    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    /// Mutable access to one participant.
    pub fn player_mut(&mut self, id: Uuid) -> Option<&mut PlayerState> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    fn demo_player(&mut self, index: u32) -> PlayerState {
        let roster = usize::try_from(index)
            .ok()
            .and_then(|i| Some((i, *DEMO_NAMES.get(i.checked_rem(DEMO_NAMES.len())?)?)));
        let name = match roster {
            Some((i, base)) if i < DEMO_NAMES.len() => base.to_owned(),
            Some((_, base)) => format!("{base}{index}"),
            None => format!("Player{index}"),
        };

        let mut player = PlayerState::new(name);
        player.position.x = self.rng.random_range(-200.0..200.0);
        player.position.z = self.rng.random_range(-200.0..200.0);
        player.position.yaw = self.rng.random_range(-180.0..180.0);
        player.ping = self.rng.random_range(5..120);
        player.address = Some(IpAddr::V4(Ipv4Addr::new(
            192,
            168,
            1,
            self.rng.random_range(2..250),
        )));

        let mut sword = ItemStack::new("IRON_SWORD", 1);
        sword.durability = self.rng.random_range(0..120);
        sword.enchantments = vec![("sharpness".to_owned(), 2)];
        player.set_slot(0, sword);
        player.set_slot(1, ItemStack::new("COBBLESTONE", self.rng.random_range(1..=64)));
        player.set_slot(8, ItemStack::new("BREAD", self.rng.random_range(1..=16)));

        let unlocked = self.rng.random_range(1..=self.achievements.len().max(1));
        player.completed = self.achievements.iter().take(unlocked).cloned().collect();

        // Every third demo participant runs with statistics tracking off.
        if index % 3 == 2 {
            player.statistics = None;
        }
        player
    }

    fn advance(player: &mut PlayerState, rng: &mut StdRng, tick: u64) {
        let dx: f64 = rng.random_range(-0.3..0.3);
        let dz: f64 = rng.random_range(-0.3..0.3);
        player.position.x += dx;
        player.position.z += dz;
        let turn: f32 = rng.random_range(-4.0..4.0);
        player.position.yaw = wrap_degrees(player.position.yaw + turn);
        let tilt: f32 = rng.random_range(-2.0..2.0);
        player.position.pitch = (player.position.pitch + tilt).clamp(-90.0, 90.0);

        // Bounded by the step size above, so the conversion cannot saturate.
        #[allow(clippy::cast_possible_truncation)]
        let walked_cm = ((dx * dx + dz * dz).sqrt() * 100.0).round() as i64;
        player.bump(Statistic::DistanceWalked, walked_cm);
        player.bump(Statistic::PlayTime, 1);
        if rng.random_bool(0.02) {
            player.bump(Statistic::Jumps, 1);
        }

        if tick % TICKS_PER_SECOND == 0 {
            let vitals = &mut player.vitals;
            if vitals.saturation > 0.0 {
                vitals.saturation = (vitals.saturation - 0.1).max(0.0);
            } else if rng.random_bool(0.05) {
                vitals.food_level = vitals.food_level.saturating_sub(1).max(0);
            }
            vitals.exp_progress += 0.01;
            if vitals.exp_progress >= 1.0 {
                vitals.exp_progress = 0.0;
                vitals.level = vitals.level.saturating_add(1);
            }
            vitals.total_experience = vitals.total_experience.saturating_add(1);
        }

        let environment = &mut player.environment;
        environment.fire_ticks = environment.fire_ticks.saturating_sub(1).max(0);
        environment.remaining_air = environment
            .remaining_air
            .saturating_add(4)
            .min(environment.maximum_air);

        if tick % TICKS_PER_SECOND == 0 {
            let jitter: i32 = rng.random_range(-3..=3);
            player.ping = player.ping.saturating_add(jitter).clamp(1, 500);
        }
    }
}

fn wrap_degrees(angle: f32) -> f32 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

impl Simulation for World {
    fn tick(&mut self, tick: u64) {
        let rng = &mut self.rng;
        for player in &mut self.players {
            Self::advance(player, rng, tick);
        }
    }
}

impl ParticipantRegistry for World {
    type Participant = PlayerState;

    fn server_name(&self) -> &str {
        &self.server_name
    }

    fn online(&self) -> Box<dyn Iterator<Item = &PlayerState> + '_> {
        Box::new(self.players.iter())
    }

    fn achievements(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.achievements.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp)]

    use super::*;
    use crate::collector::collect_batch;

    #[test]
    fn populated_world_has_requested_participants() {
        let world = World::populated("CraftBukkit", 7, 4);
        assert_eq!(world.players().len(), 4);
        assert_eq!(world.players()[0].name, "Steve");
        assert!(world.players()[2].statistics.is_none());
        assert!(world.players()[3].statistics.is_some());
    }

    #[test]
    fn demo_names_get_suffixes_past_the_roster() {
        let world = World::populated("CraftBukkit", 7, 8);
        assert_eq!(world.players()[6].name, "Steve6");
        assert_eq!(world.players()[7].name, "Alex7");
    }

    #[test]
    fn same_seed_evolves_identically() {
        let mut a = World::populated("CraftBukkit", 99, 2);
        let mut b = World::populated("CraftBukkit", 99, 2);
        for tick in 1..=40 {
            a.tick(tick);
            b.tick(tick);
        }
        assert_eq!(a.players()[0].position.x, b.players()[0].position.x);
        assert_eq!(a.players()[1].vitals.saturation, b.players()[1].vitals.saturation);
    }

    #[test]
    fn ticking_advances_play_time() {
        let mut world = World::populated("CraftBukkit", 1, 1);
        for tick in 1..=25 {
            world.tick(tick);
        }
        let player = &world.players()[0];
        assert_eq!(player.statistic(Statistic::PlayTime).unwrap(), 25);
        assert!(player.position.pitch >= -90.0 && player.position.pitch <= 90.0);
        assert!(player.position.yaw >= -180.0 && player.position.yaw < 180.0);
    }

    #[test]
    fn disabled_statistics_are_untracked() {
        let mut player = PlayerState::new("Alex");
        player.statistics = None;
        assert_eq!(
            player.statistic(Statistic::Deaths),
            Err(AccessError::Untracked(Statistic::Deaths))
        );
    }

    #[test]
    fn join_and_leave_keep_registry_order() {
        let mut world = World::new("CraftBukkit", 3);
        let first = PlayerState::new("First");
        let second = PlayerState::new("Second");
        let third = PlayerState::new("Third");
        let second_id = second.id;
        world.join(first);
        world.join(second);
        world.join(third);

        assert!(world.leave(second_id).is_some());
        assert!(world.leave(second_id).is_none());

        let names: Vec<&str> = world.online().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["First", "Third"]);
    }

    #[test]
    fn collector_reads_the_demo_world() {
        let mut world = World::populated("Paper", 11, 3);
        world.tick(1);
        let batch = collect_batch(&world);

        assert_eq!(batch.server, "Paper");
        assert_eq!(batch.count, 3);
        for snapshot in &batch.players {
            assert!(snapshot.is_complete());
            let inventory = snapshot.inventory.as_ref().unwrap();
            assert_eq!(inventory.len(), 3);
            assert_eq!(inventory[0].item_type, "IRON_SWORD");
            assert!(snapshot.achievements.advancement_count >= 1);
        }
        // Statistics tracking is off for the third participant.
        assert!(batch.players[2].statistics.is_empty());
        assert!(batch.players[2].error.is_none());
    }

    #[test]
    fn custom_catalogue_replaces_defaults() {
        let world = World::new("CraftBukkit", 0).with_achievements(["a/one", "a/two"]);
        assert_eq!(world.achievements().count(), 2);
    }

    #[test]
    fn slots_outside_inventory_are_ignored() {
        let mut player = PlayerState::new("Alex");
        player.set_slot(INVENTORY_SIZE, ItemStack::new("STONE", 1));
        assert!(player.inventory.iter().all(Option::is_none));
    }
}
