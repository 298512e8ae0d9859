//! Combat tracking collaborators
//!
//! Three trackers are rebuilt per connection: [`EntityTracker`] keeps the
//! identity of everything seen on the wire, [`PlayerTracker`] the subset
//! that is a player, and [`DamageTracker`] the per-combatant aggregates the
//! overlay displays. A reset rebuilds only the damage tracker; identity
//! survives.

use chrono::NaiveDateTime;
use hashbrown::hash_map::Entry;
use hashbrown::{HashMap, HashSet};

use crate::game::messages::{GameMessage, SkillResult};
use crate::game::SkillDatabase;

// ─────────────────────────────────────────────────────────────────────────────
// Combatant Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Stable identity key for a tracked combatant within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct CombatantId(pub u64);

impl std::fmt::Display for CombatantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one tracked entity.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    pub name: String,
    pub class: String,
    pub is_player: bool,
}

/// Tracks the identity of every entity observed on the wire.
///
/// Fed every decoded message unconditionally; most messages carry nothing
/// for it and are ignored.
#[derive(Debug, Default)]
pub struct EntityTracker {
    entities: HashMap<CombatantId, EntityInfo>,
}

impl EntityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, message: &GameMessage) {
        match message {
            GameMessage::SpawnCombatant {
                id,
                name,
                class,
                is_player,
            } => {
                // Strip control characters so identity is always safe to display
                let name: String = name.chars().filter(|c| !c.is_control()).collect();
                self.entities.insert(
                    *id,
                    EntityInfo {
                        name,
                        class: class.clone(),
                        is_player: *is_player,
                    },
                );
            }
            GameMessage::DespawnCombatant { id } => {
                self.entities.remove(id);
            }
            GameMessage::SkillResult(_) => {}
        }
    }

    pub fn get(&self, id: CombatantId) -> Option<&EntityInfo> {
        self.entities.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Tracks which combatants are players.
///
/// Player status is sticky for the session: a player that despawns keeps
/// its accumulated statistics and its credit for later results.
#[derive(Debug, Default)]
pub struct PlayerTracker {
    players: HashSet<CombatantId>,
}

impl PlayerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, message: &GameMessage, entities: &EntityTracker) {
        if let GameMessage::SpawnCombatant { id, .. } = message {
            if entities.get(*id).is_some_and(|e| e.is_player) {
                self.players.insert(*id);
            }
        }
    }

    pub fn is_player(&self, id: CombatantId) -> bool {
        self.players.contains(&id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Damage Aggregation
// ─────────────────────────────────────────────────────────────────────────────

/// Per-combatant running totals.
#[derive(Debug)]
struct Aggregate {
    name: String,
    class: String,
    damage_dealt: i64,
    healing_dealt: i64,
    hits: u32,
    crits: u32,
    by_skill: HashMap<u32, i64>,
    discovery: u64,
}

/// Read-only view of one combatant's aggregates at reconciliation time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CombatantSnapshot {
    pub id: CombatantId,
    pub name: String,
    pub class: String,
    pub damage_dealt: i64,
    pub healing_dealt: i64,
    pub hits: u32,
    pub crits: u32,
    /// Damage per second over the encounter window.
    pub dps: i64,
    /// Name of the highest-damage skill, when the region data knows it.
    pub top_skill: Option<String>,
    /// Order in which the tracker first saw this combatant. Used as the
    /// deterministic tie-break for equal damage.
    pub discovery: u64,
}

/// Aggregates combat results into per-combatant statistics.
///
/// Only players are credited. The encounter window for DPS runs from the
/// first recorded result to the last one.
#[derive(Debug, Default)]
pub struct DamageTracker {
    rows: HashMap<CombatantId, Aggregate>,
    next_discovery: u64,
    first_event: Option<NaiveDateTime>,
    last_event: Option<NaiveDateTime>,
}

impl DamageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one skill result.
    ///
    /// Non-player sources are not credited. Identity is cached at first
    /// sight so a combatant that later despawns keeps its name.
    pub fn record(
        &mut self,
        result: &SkillResult,
        entities: &EntityTracker,
        players: &PlayerTracker,
    ) {
        if !players.is_player(result.source) {
            return;
        }

        self.first_event.get_or_insert(result.timestamp);
        self.last_event = Some(result.timestamp);

        let row = match self.rows.entry(result.source) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let (name, class) = match entities.get(result.source) {
                    Some(info) => (info.name.clone(), info.class.clone()),
                    None => (format!("Combatant {}", result.source), String::new()),
                };
                let discovery = self.next_discovery;
                self.next_discovery += 1;
                entry.insert(Aggregate {
                    name,
                    class,
                    damage_dealt: 0,
                    healing_dealt: 0,
                    hits: 0,
                    crits: 0,
                    by_skill: HashMap::new(),
                    discovery,
                })
            }
        };
        if result.is_heal {
            row.healing_dealt += result.amount;
        } else {
            row.damage_dealt += result.amount;
            *row.by_skill.entry(result.skill_id).or_insert(0) += result.amount;
        }
        row.hits += 1;
        if result.is_critical {
            row.crits += 1;
        }
    }

    /// Seconds covered by the encounter window, never zero.
    fn encounter_secs(&self) -> i64 {
        match (self.first_event, self.last_event) {
            (Some(first), Some(last)) => (last - first).num_seconds().max(1),
            _ => 1,
        }
    }

    /// Current aggregates for every credited combatant.
    ///
    /// Order is unspecified; the reconciler sorts.
    pub fn snapshots(&self, skills: &SkillDatabase) -> Vec<CombatantSnapshot> {
        let secs = self.encounter_secs();
        self.rows
            .iter()
            .map(|(id, row)| {
                let top_skill = row
                    .by_skill
                    .iter()
                    .max_by_key(|(skill_id, dealt)| (**dealt, std::cmp::Reverse(**skill_id)))
                    .map(|(skill_id, _)| match skills.skill_name(*skill_id) {
                        Some(name) => name.to_string(),
                        None => format!("Skill {}", skill_id),
                    });
                CombatantSnapshot {
                    id: *id,
                    name: row.name.clone(),
                    class: row.class.clone(),
                    damage_dealt: row.damage_dealt,
                    healing_dealt: row.healing_dealt,
                    hits: row.hits,
                    crits: row.crits,
                    dps: row.damage_dealt / secs,
                    top_skill,
                    discovery: row.discovery,
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2026-03-14 21:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
            + chrono::Duration::seconds(secs)
    }

    fn spawn(id: u64, name: &str, is_player: bool) -> GameMessage {
        GameMessage::SpawnCombatant {
            id: CombatantId(id),
            name: name.to_string(),
            class: "Sentinel".to_string(),
            is_player,
        }
    }

    fn hit(source: u64, skill: u32, amount: i64, secs: i64) -> SkillResult {
        SkillResult {
            source: CombatantId(source),
            target: CombatantId(999),
            skill_id: skill,
            amount,
            is_heal: false,
            is_critical: false,
            timestamp: at(secs),
        }
    }

    fn tracked(ids: &[(u64, &str, bool)]) -> (EntityTracker, PlayerTracker) {
        let mut entities = EntityTracker::new();
        let mut players = PlayerTracker::new();
        for (id, name, is_player) in ids {
            let msg = spawn(*id, name, *is_player);
            entities.update(&msg);
            players.observe(&msg, &entities);
        }
        (entities, players)
    }

    #[test]
    fn test_non_player_damage_not_credited() {
        let (entities, players) = tracked(&[(1, "Karyssa", true), (2, "Dread Guard", false)]);
        let mut tracker = DamageTracker::new();

        tracker.record(&hit(2, 101, 5000, 0), &entities, &players);
        assert!(tracker.is_empty(), "NPC damage must not create a row");

        tracker.record(&hit(1, 101, 100, 0), &entities, &players);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_heal_and_damage_split() {
        let (entities, players) = tracked(&[(1, "Karyssa", true)]);
        let mut tracker = DamageTracker::new();

        tracker.record(&hit(1, 101, 300, 0), &entities, &players);
        let mut heal = hit(1, 201, 150, 1);
        heal.is_heal = true;
        heal.is_critical = true;
        tracker.record(&heal, &entities, &players);

        let snaps = tracker.snapshots(&SkillDatabase::new());
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].damage_dealt, 300);
        assert_eq!(snaps[0].healing_dealt, 150);
        assert_eq!(snaps[0].hits, 2);
        assert_eq!(snaps[0].crits, 1);
    }

    #[test]
    fn test_discovery_follows_record_order() {
        let (entities, players) = tracked(&[(1, "A", true), (2, "B", true), (3, "C", true)]);
        let mut tracker = DamageTracker::new();

        tracker.record(&hit(3, 101, 10, 0), &entities, &players);
        tracker.record(&hit(1, 101, 10, 1), &entities, &players);
        tracker.record(&hit(2, 101, 10, 2), &entities, &players);
        // Repeat hits must not reassign discovery
        tracker.record(&hit(3, 101, 10, 3), &entities, &players);

        let mut snaps = tracker.snapshots(&SkillDatabase::new());
        snaps.sort_by_key(|s| s.discovery);
        let order: Vec<u64> = snaps.iter().map(|s| s.id.0).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn test_dps_uses_encounter_window() {
        let (entities, players) = tracked(&[(1, "Karyssa", true)]);
        let mut tracker = DamageTracker::new();

        tracker.record(&hit(1, 101, 500, 0), &entities, &players);
        tracker.record(&hit(1, 101, 500, 10), &entities, &players);

        let snaps = tracker.snapshots(&SkillDatabase::new());
        assert_eq!(snaps[0].dps, 100, "1000 damage over 10s");
    }

    #[test]
    fn test_top_skill_resolution() {
        let (entities, players) = tracked(&[(1, "Karyssa", true)]);
        let mut tracker = DamageTracker::new();
        let mut skills = SkillDatabase::new();
        skills.insert(101, "Sundering Strike");
        skills.insert(102, "Piercing Volley");

        tracker.record(&hit(1, 101, 100, 0), &entities, &players);
        tracker.record(&hit(1, 102, 900, 1), &entities, &players);

        let snaps = tracker.snapshots(&skills);
        assert_eq!(snaps[0].top_skill.as_deref(), Some("Piercing Volley"));
    }

    #[test]
    fn test_departed_player_keeps_cached_identity() {
        let (mut entities, players) = tracked(&[(1, "Karyssa", true)]);
        let mut tracker = DamageTracker::new();

        tracker.record(&hit(1, 101, 100, 0), &entities, &players);
        entities.update(&GameMessage::DespawnCombatant { id: CombatantId(1) });
        tracker.record(&hit(1, 101, 100, 1), &entities, &players);

        let snaps = tracker.snapshots(&SkillDatabase::new());
        assert_eq!(snaps[0].name, "Karyssa");
        assert_eq!(snaps[0].damage_dealt, 200);
    }

    #[test]
    fn test_control_characters_stripped_from_names() {
        let (entities, players) = tracked(&[(1, "Kar\u{7}yssa\n", true)]);
        let mut tracker = DamageTracker::new();
        tracker.record(&hit(1, 101, 100, 0), &entities, &players);

        let snaps = tracker.snapshots(&SkillDatabase::new());
        assert_eq!(snaps[0].name, "Karyssa");
    }
}
