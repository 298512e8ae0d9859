//! On-screen row registry
//!
//! Maps each combatant to its display entry. The registry mirrors the
//! current visible set exactly: entries are created and removed only by
//! the reconciler, and a combatant appears at most once.

use hashbrown::HashMap;

use fray_core::tracking::CombatantId;

use crate::surface::{DisplaySurface, RowHandle};

/// A visual element bound to exactly one combatant.
#[derive(Debug, Clone)]
pub struct DisplayEntry {
    pub id: CombatantId,
    pub row: RowHandle,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    /// Session-wide damage total broadcast to this row for its
    /// percentage display.
    pub total_damage: i64,
}

/// CombatantId → DisplayEntry mapping owned by the display thread.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<CombatantId, DisplayEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: CombatantId) -> Option<&DisplayEntry> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut DisplayEntry> {
        self.entries.get_mut(&id)
    }

    pub fn insert(&mut self, entry: DisplayEntry) {
        self.entries.insert(entry.id, entry);
    }

    pub fn remove(&mut self, id: CombatantId) -> Option<DisplayEntry> {
        self.entries.remove(&id)
    }

    pub fn contains(&self, id: CombatantId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = CombatantId> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DisplayEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Release every row resource and empty the registry.
    ///
    /// Used on teardown; during normal operation the reconciler releases
    /// entries one by one.
    pub fn release_all(&mut self, surface: &mut dyn DisplaySurface) {
        for (_, entry) in self.entries.drain() {
            surface.release_row(entry.row);
        }
    }
}
