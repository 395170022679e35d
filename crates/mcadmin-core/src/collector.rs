//! Snapshot collection for online participants.
//!
//! Everything in this module reads live simulation state without
//! synchronization and must therefore run on the authority thread. The
//! [`bridge`](crate::bridge) is the only code that schedules it there.
//!
//! Each structured section of a [`ParticipantSnapshot`] is gathered on its
//! own and reported as a [`SectionOutcome`]. A failed section is left out
//! of the snapshot and flagged; it never aborts the participant, and one
//! participant never aborts the batch.
//!
//! # Rounding
//!
//! Values are rounded half-up towards positive infinity, computed as
//! `floor(value * scale + 0.5) / scale`. Coordinates and experience
//! progress keep two decimals; pitch, yaw, health and saturation keep one.

use std::collections::BTreeMap;

use chrono::Utc;
use mcadmin_types::{
    AchievementSummary, ConnectionSnapshot, EnvironmentSnapshot, ItemEntry, LocationSnapshot,
    ModeSnapshot, PARTIAL_FAILURE_MARKER, ParticipantSnapshot, SnapshotBatch, SnapshotSection,
    Statistic, UNKNOWN_ADDRESS, VitalsSnapshot,
};
use tracing::{debug, warn};

use crate::registry::{AccessError, ItemStack, Participant, ParticipantRegistry};

/// Maximum number of achievement ids listed per participant.
pub const MAX_LISTED_ACHIEVEMENTS: usize = 50;

/// Decimals kept for x/y/z and experience progress.
const COORDINATE_DECIMALS: i32 = 2;

/// Decimals kept for pitch, yaw, health and saturation.
const ANGLE_DECIMALS: i32 = 1;

/// Result of collecting one snapshot section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionOutcome<T> {
    /// Every value in the section was read.
    Complete(T),
    /// Some values were read before `AccessError` stopped collection.
    Partial(T, AccessError),
    /// Nothing usable was read.
    Failed(AccessError),
}

impl<T> From<Result<T, AccessError>> for SectionOutcome<T> {
    fn from(result: Result<T, AccessError>) -> Self {
        match result {
            Ok(value) => Self::Complete(value),
            Err(e) => Self::Failed(e),
        }
    }
}

/// Round `value` half-up to `decimals` places.
pub fn round_half_up(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale + 0.5).floor() / scale
}

/// Collect every online participant, in registry order.
///
/// Must run on the authority thread.
pub fn collect_batch<R>(registry: &R) -> SnapshotBatch
where
    R: ParticipantRegistry + ?Sized,
{
    let players = registry
        .online()
        .map(|participant| collect(registry, participant))
        .collect();

    SnapshotBatch::new(
        players,
        Utc::now().timestamp_millis(),
        registry.server_name().to_owned(),
    )
}

/// Collect a single participant.
///
/// Must run on the authority thread.
pub fn collect<R>(registry: &R, participant: &R::Participant) -> ParticipantSnapshot
where
    R: ParticipantRegistry + ?Sized,
{
    let mut sections = SectionLog::new(participant.name());

    let location = sections.required(SnapshotSection::Location, collect_location(participant));
    let vitals = sections.required(SnapshotSection::Vitals, collect_vitals(participant));
    let mode = sections.required(SnapshotSection::Mode, collect_mode(participant));
    let environment =
        sections.required(SnapshotSection::Environment, collect_environment(participant));
    let inventory = sections.required(SnapshotSection::Inventory, collect_inventory(participant));
    let statistics = sections
        .best_effort(SnapshotSection::Statistics, collect_statistics(participant))
        .unwrap_or_default();
    let achievements = sections
        .best_effort(
            SnapshotSection::Achievements,
            collect_achievements(registry, participant),
        )
        .unwrap_or_default();
    let connection =
        sections.required(SnapshotSection::Connection, collect_connection(participant));

    let error = sections.marker();
    ParticipantSnapshot {
        uuid: participant.id(),
        name: participant.name().to_owned(),
        display_name: participant.display_name().to_owned(),
        location,
        vitals,
        mode,
        environment,
        inventory,
        statistics,
        achievements,
        connection,
        error,
        failed_sections: sections.failed,
    }
}

// ---------------------------------------------------------------------------
// Outcome bookkeeping
// ---------------------------------------------------------------------------

/// Tracks which sections failed for one participant.
struct SectionLog<'a> {
    participant: &'a str,
    failed: Vec<SnapshotSection>,
}

impl<'a> SectionLog<'a> {
    const fn new(participant: &'a str) -> Self {
        Self {
            participant,
            failed: Vec::new(),
        }
    }

    /// A section whose failure is flagged in the snapshot.
    fn required<T>(&mut self, section: SnapshotSection, outcome: SectionOutcome<T>) -> Option<T> {
        match outcome {
            SectionOutcome::Complete(value) => Some(value),
            SectionOutcome::Partial(value, e) => {
                debug!(
                    participant = self.participant,
                    %section,
                    error = %e,
                    "snapshot section incomplete",
                );
                Some(value)
            }
            SectionOutcome::Failed(e) => {
                warn!(
                    participant = self.participant,
                    %section,
                    error = %e,
                    "snapshot section failed",
                );
                self.failed.push(section);
                None
            }
        }
    }

    /// A section that degrades silently to whatever could be read.
    fn best_effort<T>(&self, section: SnapshotSection, outcome: SectionOutcome<T>) -> Option<T> {
        match outcome {
            SectionOutcome::Complete(value) => Some(value),
            SectionOutcome::Partial(value, e) => {
                debug!(
                    participant = self.participant,
                    %section,
                    error = %e,
                    "best-effort section incomplete",
                );
                Some(value)
            }
            SectionOutcome::Failed(e) => {
                debug!(
                    participant = self.participant,
                    %section,
                    error = %e,
                    "best-effort section unavailable",
                );
                None
            }
        }
    }

    fn marker(&self) -> Option<String> {
        (!self.failed.is_empty()).then(|| PARTIAL_FAILURE_MARKER.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn collect_location<P: Participant + ?Sized>(participant: &P) -> SectionOutcome<LocationSnapshot> {
    participant
        .position()
        .map(|pos| LocationSnapshot {
            x: round_half_up(pos.x, COORDINATE_DECIMALS),
            y: round_half_up(pos.y, COORDINATE_DECIMALS),
            z: round_half_up(pos.z, COORDINATE_DECIMALS),
            world: pos.world,
            pitch: round_half_up(f64::from(pos.pitch), ANGLE_DECIMALS),
            yaw: round_half_up(f64::from(pos.yaw), ANGLE_DECIMALS),
        })
        .into()
}

fn collect_vitals<P: Participant + ?Sized>(participant: &P) -> SectionOutcome<VitalsSnapshot> {
    participant
        .vitals()
        .map(|v| VitalsSnapshot {
            health: round_half_up(v.health, ANGLE_DECIMALS),
            max_health: v.max_health,
            food_level: v.food_level,
            saturation: round_half_up(f64::from(v.saturation), ANGLE_DECIMALS),
            level: v.level,
            exp: round_half_up(f64::from(v.exp_progress), COORDINATE_DECIMALS),
            total_experience: v.total_experience,
        })
        .into()
}

fn collect_mode<P: Participant + ?Sized>(participant: &P) -> SectionOutcome<ModeSnapshot> {
    participant
        .movement()
        .map(|m| ModeSnapshot {
            game_mode: m.game_mode,
            is_flying: m.flying,
            allow_flight: m.allow_flight,
            walk_speed: m.walk_speed,
            fly_speed: m.fly_speed,
        })
        .into()
}

fn collect_environment<P: Participant + ?Sized>(
    participant: &P,
) -> SectionOutcome<EnvironmentSnapshot> {
    participant
        .environment()
        .map(|e| EnvironmentSnapshot {
            fire_ticks: e.fire_ticks,
            remaining_air: e.remaining_air,
            maximum_air: e.maximum_air,
        })
        .into()
}

fn collect_inventory<P: Participant + ?Sized>(participant: &P) -> SectionOutcome<Vec<ItemEntry>> {
    participant
        .inventory()
        .map(|slots| {
            slots
                .into_iter()
                .enumerate()
                .filter_map(|(slot, stack)| stack.and_then(|stack| item_entry(slot, stack)))
                .collect()
        })
        .into()
}

/// Convert an occupied slot; air and empty stacks yield `None`.
fn item_entry(slot: usize, stack: ItemStack) -> Option<ItemEntry> {
    if stack.is_air() || stack.amount <= 0 {
        return None;
    }
    let enchantments = (!stack.enchantments.is_empty()).then(|| {
        stack
            .enchantments
            .iter()
            .map(|(key, level)| format!("{key}:{level}"))
            .collect()
    });
    Some(ItemEntry {
        slot,
        item_type: stack.material,
        amount: stack.amount,
        durability: i32::from(stack.durability),
        display_name: stack.display_name,
        enchantments,
    })
}

fn collect_statistics<P: Participant + ?Sized>(
    participant: &P,
) -> SectionOutcome<BTreeMap<Statistic, i64>> {
    let mut counters = BTreeMap::new();
    let mut first_error = None;

    for statistic in Statistic::ALL {
        match participant.statistic(statistic) {
            Ok(value) => {
                counters.insert(statistic, value);
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        None => SectionOutcome::Complete(counters),
        Some(e) => SectionOutcome::Partial(counters, e),
    }
}

fn collect_achievements<R>(
    registry: &R,
    participant: &R::Participant,
) -> SectionOutcome<AchievementSummary>
where
    R: ParticipantRegistry + ?Sized,
{
    let mut summary = AchievementSummary::default();

    for id in registry.achievements() {
        match participant.has_completed(id) {
            Ok(true) => {
                summary.advancement_count = summary.advancement_count.saturating_add(1);
                if summary.achievements.len() < MAX_LISTED_ACHIEVEMENTS {
                    summary.achievements.push(id.to_owned());
                }
            }
            Ok(false) => {}
            Err(e) => {
                summary.achievements_truncated =
                    summary.advancement_count > summary.achievements.len();
                return SectionOutcome::Partial(summary, e);
            }
        }
    }

    summary.achievements_truncated = summary.advancement_count > summary.achievements.len();
    SectionOutcome::Complete(summary)
}

fn collect_connection<P: Participant + ?Sized>(
    participant: &P,
) -> SectionOutcome<ConnectionSnapshot> {
    participant
        .ping()
        .map(|ping| ConnectionSnapshot {
            ping,
            address: participant
                .address()
                .map_or_else(|| UNKNOWN_ADDRESS.to_owned(), |ip| ip.to_string()),
        })
        .into()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp)]

    use std::collections::BTreeSet;
    use std::net::{IpAddr, Ipv4Addr};

    use mcadmin_types::GameMode;
    use uuid::Uuid;

    use super::*;
    use crate::registry::{EnvironmentCounters, Movement, Position, Vitals};

    // -----------------------------------------------------------------------
    // Test registry
    // -----------------------------------------------------------------------

    struct FakeParticipant {
        id: Uuid,
        name: String,
        position: Position,
        slots: Vec<Option<ItemStack>>,
        completed: BTreeSet<String>,
        failing: BTreeSet<SnapshotSection>,
        untracked: Vec<Statistic>,
        achievement_error_at: Option<String>,
        address: Option<IpAddr>,
    }

    impl FakeParticipant {
        fn named(name: &str) -> Self {
            Self {
                id: Uuid::new_v4(),
                name: name.to_owned(),
                position: Position {
                    x: 12.345_67,
                    y: 64.0,
                    z: -3.004,
                    world: "world".to_owned(),
                    pitch: 45.06,
                    yaw: -90.04,
                },
                slots: Vec::new(),
                completed: BTreeSet::new(),
                failing: BTreeSet::new(),
                untracked: Vec::new(),
                achievement_error_at: None,
                address: Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7))),
            }
        }

        fn check(&self, section: SnapshotSection) -> Result<(), AccessError> {
            if self.failing.contains(&section) {
                Err(AccessError::Unavailable(format!("{section} is broken")))
            } else {
                Ok(())
            }
        }
    }

    impl Participant for FakeParticipant {
        fn id(&self) -> Uuid {
            self.id
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn display_name(&self) -> &str {
            &self.name
        }

        fn position(&self) -> Result<Position, AccessError> {
            self.check(SnapshotSection::Location)?;
            Ok(self.position.clone())
        }

        fn vitals(&self) -> Result<Vitals, AccessError> {
            self.check(SnapshotSection::Vitals)?;
            Ok(Vitals {
                health: 19.95,
                max_health: 20.0,
                food_level: 17,
                saturation: 2.25,
                level: 7,
                exp_progress: 0.456,
                total_experience: 160,
            })
        }

        fn movement(&self) -> Result<Movement, AccessError> {
            self.check(SnapshotSection::Mode)?;
            Ok(Movement {
                game_mode: GameMode::Survival,
                flying: false,
                allow_flight: false,
                walk_speed: 0.2,
                fly_speed: 0.1,
            })
        }

        fn environment(&self) -> Result<EnvironmentCounters, AccessError> {
            self.check(SnapshotSection::Environment)?;
            Ok(EnvironmentCounters {
                fire_ticks: 0,
                remaining_air: 300,
                maximum_air: 300,
            })
        }

        fn inventory(&self) -> Result<Vec<Option<ItemStack>>, AccessError> {
            self.check(SnapshotSection::Inventory)?;
            Ok(self.slots.clone())
        }

        fn statistic(&self, statistic: Statistic) -> Result<i64, AccessError> {
            self.check(SnapshotSection::Statistics)?;
            if self.untracked.contains(&statistic) {
                return Err(AccessError::Untracked(statistic));
            }
            Ok(10)
        }

        fn has_completed(&self, achievement: &str) -> Result<bool, AccessError> {
            if self.achievement_error_at.as_deref() == Some(achievement) {
                return Err(AccessError::Unavailable("advancement data".to_owned()));
            }
            Ok(self.completed.contains(achievement))
        }

        fn ping(&self) -> Result<i32, AccessError> {
            self.check(SnapshotSection::Connection)?;
            Ok(35)
        }

        fn address(&self) -> Option<IpAddr> {
            self.address
        }
    }

    struct FakeRegistry {
        participants: Vec<FakeParticipant>,
        catalogue: Vec<String>,
    }

    impl FakeRegistry {
        fn with(participants: Vec<FakeParticipant>) -> Self {
            Self {
                participants,
                catalogue: Vec::new(),
            }
        }
    }

    impl ParticipantRegistry for FakeRegistry {
        type Participant = FakeParticipant;

        fn server_name(&self) -> &str {
            "TestServer"
        }

        fn online(&self) -> Box<dyn Iterator<Item = &FakeParticipant> + '_> {
            Box::new(self.participants.iter())
        }

        fn achievements(&self) -> Box<dyn Iterator<Item = &str> + '_> {
            Box::new(self.catalogue.iter().map(String::as_str))
        }
    }

    fn catalogue(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("story/step_{i:03}")).collect()
    }

    // -----------------------------------------------------------------------
    // Rounding
    // -----------------------------------------------------------------------

    #[test]
    fn coordinates_round_to_two_decimals() {
        assert_eq!(round_half_up(12.345_67, 2), 12.35);
        assert_eq!(round_half_up(-3.004, 2), -3.0);
    }

    #[test]
    fn angles_round_to_one_decimal() {
        assert_eq!(round_half_up(45.06, 1), 45.1);
        assert_eq!(round_half_up(f64::from(45.06_f32), 1), 45.1);
    }

    #[test]
    fn ties_round_towards_positive_infinity() {
        assert_eq!(round_half_up(0.25, 1), 0.3);
        assert_eq!(round_half_up(-0.25, 1), -0.2);
        assert_eq!(round_half_up(2.5, 0), 3.0);
        assert_eq!(round_half_up(-2.5, 0), -2.0);
    }

    #[test]
    fn snapshot_applies_rounding_rules() {
        let registry = FakeRegistry::with(vec![FakeParticipant::named("Alex")]);
        let batch = collect_batch(&registry);
        let snap = &batch.players[0];

        let location = snap.location.as_ref().unwrap();
        assert_eq!(location.x, 12.35);
        assert_eq!(location.pitch, 45.1);
        assert_eq!(location.yaw, -90.0);

        let vitals = snap.vitals.as_ref().unwrap();
        assert_eq!(vitals.exp, 0.46);
        assert_eq!(vitals.max_health, 20.0);
    }

    // -----------------------------------------------------------------------
    // Achievements
    // -----------------------------------------------------------------------

    #[test]
    fn achievements_are_truncated_but_counted() {
        let mut participant = FakeParticipant::named("Alex");
        let ids = catalogue(80);
        participant.completed = ids.iter().take(73).cloned().collect();
        let mut registry = FakeRegistry::with(vec![participant]);
        registry.catalogue = ids;

        let snap = &collect_batch(&registry).players[0];
        assert_eq!(snap.achievements.advancement_count, 73);
        assert_eq!(snap.achievements.achievements.len(), MAX_LISTED_ACHIEVEMENTS);
        assert_eq!(snap.achievements.achievements[0], "story/step_000");
        assert!(snap.achievements.achievements_truncated);
    }

    #[test]
    fn exactly_fifty_achievements_are_not_truncated() {
        let mut participant = FakeParticipant::named("Alex");
        let ids = catalogue(50);
        participant.completed = ids.iter().cloned().collect();
        let mut registry = FakeRegistry::with(vec![participant]);
        registry.catalogue = ids;

        let snap = &collect_batch(&registry).players[0];
        assert_eq!(snap.achievements.advancement_count, 50);
        assert!(!snap.achievements.achievements_truncated);
    }

    #[test]
    fn achievement_failure_keeps_what_was_counted() {
        let mut participant = FakeParticipant::named("Alex");
        let ids = catalogue(10);
        participant.completed = ids.iter().cloned().collect();
        participant.achievement_error_at = Some(ids[4].clone());
        let mut registry = FakeRegistry::with(vec![participant]);
        registry.catalogue = ids;

        let snap = &collect_batch(&registry).players[0];
        assert_eq!(snap.achievements.advancement_count, 4);
        assert!(snap.error.is_none());
    }

    // -----------------------------------------------------------------------
    // Partial-failure isolation
    // -----------------------------------------------------------------------

    #[test]
    fn statistics_failure_leaves_snapshot_intact() {
        let mut broken = FakeParticipant::named("Broken");
        broken.failing.insert(SnapshotSection::Statistics);
        let healthy = FakeParticipant::named("Healthy");
        let registry = FakeRegistry::with(vec![broken, healthy]);

        let batch = collect_batch(&registry);
        assert_eq!(batch.count, 2);

        let broken = &batch.players[0];
        assert!(broken.statistics.is_empty());
        assert!(broken.error.is_none());
        assert!(broken.location.is_some());

        let healthy = &batch.players[1];
        assert_eq!(healthy.statistics.len(), Statistic::ALL.len());
    }

    #[test]
    fn untracked_statistics_are_absent_keys() {
        let mut participant = FakeParticipant::named("Alex");
        participant.untracked = vec![Statistic::DistanceFlown, Statistic::Jumps];
        let registry = FakeRegistry::with(vec![participant]);

        let snap = &collect_batch(&registry).players[0];
        assert_eq!(snap.statistics.len(), Statistic::ALL.len() - 2);
        assert!(!snap.statistics.contains_key(&Statistic::Jumps));
        assert_eq!(snap.statistics[&Statistic::Deaths], 10);
    }

    #[test]
    fn failed_section_is_flagged_and_others_survive() {
        let mut participant = FakeParticipant::named("Alex");
        participant.failing.insert(SnapshotSection::Location);
        participant.failing.insert(SnapshotSection::Connection);
        let registry = FakeRegistry::with(vec![participant, FakeParticipant::named("Steve")]);

        let batch = collect_batch(&registry);
        let snap = &batch.players[0];
        assert!(snap.location.is_none());
        assert!(snap.connection.is_none());
        assert!(snap.vitals.is_some());
        assert!(snap.inventory.is_some());
        assert_eq!(snap.error.as_deref(), Some(PARTIAL_FAILURE_MARKER));
        assert_eq!(
            snap.failed_sections,
            vec![SnapshotSection::Location, SnapshotSection::Connection]
        );

        assert!(batch.players[1].is_complete());
        assert!(batch.players[1].error.is_none());
    }

    // -----------------------------------------------------------------------
    // Inventory and connection
    // -----------------------------------------------------------------------

    #[test]
    fn inventory_skips_empty_and_air_slots() {
        let mut sword = ItemStack::new("DIAMOND_SWORD", 1);
        sword.durability = 12;
        sword.display_name = Some("Excalibur".to_owned());
        sword.enchantments = vec![("sharpness".to_owned(), 5), ("unbreaking".to_owned(), 3)];

        let mut participant = FakeParticipant::named("Alex");
        participant.slots = vec![
            None,
            Some(ItemStack::new("AIR", 1)),
            Some(sword),
            Some(ItemStack::new("COBBLESTONE", 0)),
            Some(ItemStack::new("BREAD", 16)),
        ];
        let registry = FakeRegistry::with(vec![participant]);

        let snap = &collect_batch(&registry).players[0];
        let items = snap.inventory.as_ref().unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].slot, 2);
        assert_eq!(items[0].durability, 12);
        assert_eq!(items[0].display_name.as_deref(), Some("Excalibur"));
        assert_eq!(
            items[0].enchantments.as_deref(),
            Some(&["sharpness:5".to_owned(), "unbreaking:3".to_owned()][..])
        );

        assert_eq!(items[1].slot, 4);
        assert_eq!(items[1].item_type, "BREAD");
        assert!(items[1].enchantments.is_none());
    }

    #[test]
    fn missing_address_reports_unknown() {
        let mut participant = FakeParticipant::named("Alex");
        participant.address = None;
        let registry = FakeRegistry::with(vec![participant]);

        let snap = &collect_batch(&registry).players[0];
        assert_eq!(snap.connection.as_ref().unwrap().address, UNKNOWN_ADDRESS);
    }

    #[test]
    fn batch_preserves_registry_order() {
        let names = ["Alex", "Steve", "Herobrine"];
        let registry =
            FakeRegistry::with(names.iter().map(|n| FakeParticipant::named(n)).collect());

        let batch = collect_batch(&registry);
        assert_eq!(batch.count, batch.players.len());
        assert_eq!(batch.server, "TestServer");
        let collected: Vec<&str> = batch.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(collected, names);
    }

    #[test]
    fn empty_registry_yields_empty_batch() {
        let registry = FakeRegistry::with(Vec::new());
        let batch = collect_batch(&registry);
        assert_eq!(batch.count, 0);
        assert!(batch.players.is_empty());
        assert!(batch.timestamp > 0);
    }
}
