//! Region-specific game data
//!
//! Each game region ships its own opcode mapping and skill naming. A
//! [`GameDataSet`] is built once at startup and passed into the session
//! controller; when a connection is detected the controller resolves the
//! region's [`GameData`] and builds a fresh [`MessageDecoder`] from it.

pub mod messages;

pub use messages::{GameMessage, MessageDecoder, SkillResult};

use std::sync::Arc;

use hashbrown::HashMap;
use tracing::warn;

// ─────────────────────────────────────────────────────────────────────────────
// Opcode Table
// ─────────────────────────────────────────────────────────────────────────────

/// Kinds of messages the decoder understands.
///
/// Everything else on the wire is outside protocol coverage and is dropped
/// at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    SpawnCombatant,
    DespawnCombatant,
    SkillResult,
}

/// Built-in opcode assignments, used by the default data set.
pub const OP_SPAWN_COMBATANT: u16 = 0x4F21;
pub const OP_DESPAWN_COMBATANT: u16 = 0x4F22;
pub const OP_SKILL_RESULT: u16 = 0x5B10;

/// Mapping from wire opcode to message kind for one region.
#[derive(Debug, Clone, Default)]
pub struct OpcodeTable {
    kinds: HashMap<u16, MessageKind>,
}

impl OpcodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the built-in opcode assignments.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert(OP_SPAWN_COMBATANT, MessageKind::SpawnCombatant);
        table.insert(OP_DESPAWN_COMBATANT, MessageKind::DespawnCombatant);
        table.insert(OP_SKILL_RESULT, MessageKind::SkillResult);
        table
    }

    pub fn insert(&mut self, opcode: u16, kind: MessageKind) {
        self.kinds.insert(opcode, kind);
    }

    pub fn kind_for(&self, opcode: u16) -> Option<MessageKind> {
        self.kinds.get(&opcode).copied()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Skill Database
// ─────────────────────────────────────────────────────────────────────────────

/// Skill id to display name mapping for one region.
#[derive(Debug, Clone, Default)]
pub struct SkillDatabase {
    names: HashMap<u32, String>,
}

impl SkillDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u32, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    pub fn skill_name(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Game Data
// ─────────────────────────────────────────────────────────────────────────────

/// Everything region-specific a session needs: opcode table and skill names.
#[derive(Debug, Clone)]
pub struct GameData {
    pub region: String,
    pub opcodes: OpcodeTable,
    pub skills: SkillDatabase,
}

impl GameData {
    /// Region-independent defaults: built-in opcodes, a small skill set.
    pub fn builtin(region: impl Into<String>) -> Self {
        let mut skills = SkillDatabase::new();
        skills.insert(101, "Sundering Strike");
        skills.insert(102, "Piercing Volley");
        skills.insert(103, "Searing Brand");
        skills.insert(201, "Mending Wave");
        Self {
            region: region.into(),
            opcodes: OpcodeTable::builtin(),
            skills,
        }
    }
}

/// Data sets for every known region, with a fallback for unknown ones.
///
/// Constructed once at startup and handed to the session controller; no
/// global data singleton exists.
#[derive(Clone)]
pub struct GameDataSet {
    regions: HashMap<String, Arc<GameData>>,
    fallback: Arc<GameData>,
}

impl GameDataSet {
    /// Data set containing only the built-in defaults.
    pub fn builtin() -> Self {
        Self {
            regions: HashMap::new(),
            fallback: Arc::new(GameData::builtin("default")),
        }
    }

    /// Add or replace a region's data.
    pub fn with_region(mut self, data: GameData) -> Self {
        self.regions.insert(data.region.clone(), Arc::new(data));
        self
    }

    /// Resolve the data set for a region.
    ///
    /// Unknown regions fall back to the defaults with a warning instead of
    /// refusing the connection.
    pub fn for_region(&self, region: &str) -> Arc<GameData> {
        match self.regions.get(region) {
            Some(data) => data.clone(),
            None => {
                warn!(region = %region, "no data set for region, using defaults");
                self.fallback.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_region_prefers_exact_match() {
        let mut custom = GameData::builtin("eu");
        custom.opcodes.insert(0x0001, MessageKind::SkillResult);
        let set = GameDataSet::builtin().with_region(custom);

        let eu = set.for_region("eu");
        assert_eq!(eu.region, "eu");
        assert_eq!(eu.opcodes.kind_for(0x0001), Some(MessageKind::SkillResult));
    }

    #[test]
    fn test_unknown_region_falls_back_to_defaults() {
        let set = GameDataSet::builtin();
        let data = set.for_region("somewhere");
        assert_eq!(data.region, "default");
        assert_eq!(
            data.opcodes.kind_for(OP_SKILL_RESULT),
            Some(MessageKind::SkillResult)
        );
    }
}
