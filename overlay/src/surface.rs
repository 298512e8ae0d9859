//! Display surface seam
//!
//! The actual rendering framework is outside this workspace. The
//! reconciler talks to it through [`DisplaySurface`]: it allocates one row
//! resource per visible combatant, positions it, pushes the latest
//! statistics into it and releases it when the combatant drops out of the
//! visible set.
//!
//! Row resources are addressed by generation-tagged handles rather than
//! raw references, so an operation that arrives after a row has been
//! recycled hits a stale generation and becomes an inert no-op instead of
//! touching the wrong row.

use tracing::debug;

use fray_core::tracking::{CombatantId, CombatantSnapshot};

use crate::utils::{format_number, truncate_name};

// ─────────────────────────────────────────────────────────────────────────────
// Row Handles
// ─────────────────────────────────────────────────────────────────────────────

/// Generation-tagged reference to a row resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowHandle {
    index: u32,
    generation: u32,
}

impl RowHandle {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Surface Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Seam to the rendering framework.
///
/// All methods are called from the display thread only. Operations with a
/// stale handle must be no-ops.
pub trait DisplaySurface {
    /// Current (width, height) of the display area in pixels.
    fn viewport(&self) -> (u32, u32);

    /// Allocate a row resource bound to one combatant.
    fn create_row(&mut self, id: CombatantId, height: u32) -> RowHandle;

    /// Position a row at a vertical offset and give it the container width.
    fn place_row(&mut self, handle: RowHandle, top: u32, width: u32);

    /// Push the latest statistics into a row and mark it for redraw.
    ///
    /// `total_damage` is the session-wide denominator every visible row
    /// shares for its percentage display.
    fn update_row(&mut self, handle: RowHandle, snapshot: &CombatantSnapshot, total_damage: i64);

    /// Dispose a row resource. The handle is dead afterwards.
    fn release_row(&mut self, handle: RowHandle);
}

// ─────────────────────────────────────────────────────────────────────────────
// Headless Surface
// ─────────────────────────────────────────────────────────────────────────────

/// State of one live row, as a renderer backend would hold it.
#[derive(Debug, Clone)]
pub struct RowState {
    pub id: CombatantId,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub total_damage: i64,
    /// Formatted text line, rebuilt on every update.
    pub text: String,
    /// Set by place/update, cleared when the backend would repaint.
    pub dirty: bool,
}

struct RowSlot {
    generation: u32,
    row: Option<RowState>,
}

/// Window-less surface backing the demo binary and the tests.
///
/// Keeps every row as a formatted text line instead of drawing it; slot
/// reuse and generation bumps behave exactly like a real backend.
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    max_name_chars: usize,
    slots: Vec<RowSlot>,
    free: Vec<u32>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            max_name_chars: 16,
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Change the viewport, as a window resize would.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Set the name truncation limit for row text.
    pub fn with_name_limit(mut self, max_chars: usize) -> Self {
        self.max_name_chars = max_chars;
        self
    }

    /// The row behind a handle, unless the handle is stale.
    pub fn row(&self, handle: RowHandle) -> Option<&RowState> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.row.as_ref()
    }

    /// Number of live rows.
    pub fn live_rows(&self) -> usize {
        self.slots.iter().filter(|s| s.row.is_some()).count()
    }

    /// Live rows ordered by vertical position, for rendering or logging.
    pub fn rows_top_down(&self) -> Vec<&RowState> {
        let mut rows: Vec<&RowState> = self
            .slots
            .iter()
            .filter_map(|s| s.row.as_ref())
            .collect();
        rows.sort_by_key(|r| r.top);
        rows
    }

    fn slot_mut(&mut self, handle: RowHandle) -> Option<&mut RowState> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            debug!(index = handle.index, "stale row handle, ignoring");
            return None;
        }
        slot.row.as_mut()
    }
}

impl DisplaySurface for HeadlessSurface {
    fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_row(&mut self, id: CombatantId, height: u32) -> RowHandle {
        let row = RowState {
            id,
            top: 0,
            width: self.width,
            height,
            total_damage: 0,
            text: String::new(),
            dirty: true,
        };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.row = Some(row);
                RowHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(RowSlot {
                    generation: 0,
                    row: Some(row),
                });
                RowHandle {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        }
    }

    fn place_row(&mut self, handle: RowHandle, top: u32, width: u32) {
        if let Some(row) = self.slot_mut(handle) {
            row.top = top;
            row.width = width;
            row.dirty = true;
        }
    }

    fn update_row(&mut self, handle: RowHandle, snapshot: &CombatantSnapshot, total_damage: i64) {
        let max_chars = self.max_name_chars;
        if let Some(row) = self.slot_mut(handle) {
            let percent = if total_damage > 0 {
                snapshot.damage_dealt as f64 * 100.0 / total_damage as f64
            } else {
                0.0
            };
            row.text = format!(
                "{} {} ({:.1}%) {}/s",
                truncate_name(&snapshot.name, max_chars),
                format_number(snapshot.damage_dealt),
                percent,
                format_number(snapshot.dps),
            );
            row.total_damage = total_damage;
            row.dirty = true;
        }
    }

    fn release_row(&mut self, handle: RowHandle) {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return;
        };
        if slot.generation != handle.generation || slot.row.is_none() {
            debug!(index = handle.index, "stale row handle on release, ignoring");
            return;
        }
        slot.row = None;
        // Bump so every outstanding handle to this slot goes stale
        slot.generation += 1;
        self.free.push(handle.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: u64, name: &str, damage: i64) -> CombatantSnapshot {
        CombatantSnapshot {
            id: CombatantId(id),
            name: name.to_string(),
            class: String::new(),
            damage_dealt: damage,
            healing_dealt: 0,
            hits: 1,
            crits: 0,
            dps: damage,
            top_skill: None,
            discovery: id,
        }
    }

    #[test]
    fn test_create_update_release_cycle() {
        let mut surface = HeadlessSurface::new(280, 200);
        let handle = surface.create_row(CombatantId(1), 40);

        surface.place_row(handle, 0, 280);
        surface.update_row(handle, &snapshot(1, "Karyssa", 1000), 2000);

        let row = surface.row(handle).expect("row must be live");
        assert_eq!(row.total_damage, 2000);
        assert!(row.text.contains("Karyssa"));
        assert!(row.text.contains("50.0%"));

        surface.release_row(handle);
        assert_eq!(surface.live_rows(), 0);
    }

    #[test]
    fn test_released_handle_goes_stale() {
        let mut surface = HeadlessSurface::new(280, 200);
        let old = surface.create_row(CombatantId(1), 40);
        surface.release_row(old);

        // Slot is reused for a different combatant
        let new = surface.create_row(CombatantId(2), 40);
        assert_eq!(old.index(), new.index(), "slot must be recycled");
        assert_ne!(old.generation(), new.generation());

        // A delayed operation through the old handle must not touch the
        // recycled slot
        surface.place_row(old, 999, 999);
        assert_eq!(surface.row(new).unwrap().top, 0);
        assert!(surface.row(old).is_none());

        surface.release_row(old);
        assert_eq!(surface.live_rows(), 1, "stale release must be inert");
    }

    #[test]
    fn test_double_release_is_inert() {
        let mut surface = HeadlessSurface::new(280, 200);
        let handle = surface.create_row(CombatantId(1), 40);
        surface.release_row(handle);
        surface.release_row(handle);

        assert_eq!(surface.live_rows(), 0);
        assert_eq!(surface.free.len(), 1, "slot must only be freed once");
    }
}
