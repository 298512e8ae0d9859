//! Reconciliation of combatant statistics into the row registry
//!
//! One pass takes the full current snapshot set, ranks it and makes the
//! registry match the subset that fits the viewport: missing rows are
//! created, surviving rows are repositioned and refreshed, and everything
//! that fell out of the visible set is disposed and removed. Re-running a
//! pass on unchanged input changes nothing.

use hashbrown::HashSet;

use fray_core::tracking::CombatantSnapshot;
use fray_types::MeterSettings;

use crate::registry::{DisplayEntry, Registry};
use crate::surface::DisplaySurface;

/// Row geometry for one pass.
#[derive(Debug, Clone, Copy)]
pub struct RowLayout {
    pub row_height: u32,
    pub row_spacing: u32,
}

impl From<&MeterSettings> for RowLayout {
    fn from(settings: &MeterSettings) -> Self {
        Self {
            row_height: settings.row_height,
            row_spacing: settings.row_spacing,
        }
    }
}

/// Observable outcome of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilePass {
    pub visible: usize,
    pub created: usize,
    pub removed: usize,
    /// Damage sum over the entire input set, including combatants that
    /// did not fit the viewport.
    pub total_damage: i64,
}

/// Run one reconciliation pass.
///
/// Ranking is by damage dealt descending; equal damage falls back to the
/// combatant's discovery order (the order the damage tracker first saw
/// them), then the raw id. A row is visible only when it fits the
/// viewport entirely.
pub fn reconcile(
    registry: &mut Registry,
    surface: &mut dyn DisplaySurface,
    snapshots: &[CombatantSnapshot],
    layout: RowLayout,
) -> ReconcilePass {
    let mut ranked: Vec<&CombatantSnapshot> = snapshots.iter().collect();
    ranked.sort_by(|a, b| {
        b.damage_dealt
            .cmp(&a.damage_dealt)
            .then(a.discovery.cmp(&b.discovery))
            .then(a.id.cmp(&b.id))
    });

    let total_damage: i64 = snapshots.iter().map(|s| s.damage_dealt).sum();
    let (width, height) = surface.viewport();

    let mut visible_ids = HashSet::new();
    let mut created = 0;
    let mut top = 0u32;
    for snapshot in ranked {
        // The list is ranked, so the first row that does not fit ends the
        // walk for everything below it too.
        if top + layout.row_height > height {
            break;
        }
        visible_ids.insert(snapshot.id);

        let row = match registry.get_mut(snapshot.id) {
            Some(entry) => {
                entry.top = top;
                entry.width = width;
                entry.total_damage = total_damage;
                entry.row
            }
            None => {
                let row = surface.create_row(snapshot.id, layout.row_height);
                registry.insert(DisplayEntry {
                    id: snapshot.id,
                    row,
                    top,
                    width,
                    height: layout.row_height,
                    total_damage,
                });
                created += 1;
                row
            }
        };
        surface.place_row(row, top, width);
        surface.update_row(row, snapshot, total_damage);

        top += layout.row_height + layout.row_spacing;
    }

    // Dispose everything that fell out of the visible set
    let gone: Vec<_> = registry.ids().filter(|id| !visible_ids.contains(id)).collect();
    let mut removed = 0;
    for id in gone {
        if let Some(entry) = registry.remove(id) {
            surface.release_row(entry.row);
            removed += 1;
        }
    }

    ReconcilePass {
        visible: visible_ids.len(),
        created,
        removed,
        total_damage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;
    use fray_core::tracking::CombatantId;

    const LAYOUT: RowLayout = RowLayout {
        row_height: 40,
        row_spacing: 2,
    };

    fn snap(id: u64, damage: i64, discovery: u64) -> CombatantSnapshot {
        CombatantSnapshot {
            id: CombatantId(id),
            name: format!("Combatant {}", id),
            class: String::new(),
            damage_dealt: damage,
            healing_dealt: 0,
            hits: 1,
            crits: 0,
            dps: damage,
            top_skill: None,
            discovery,
        }
    }

    fn positions(registry: &Registry) -> Vec<(u64, u32)> {
        let mut out: Vec<(u64, u32)> = registry.iter().map(|e| (e.id.0, e.top)).collect();
        out.sort();
        out
    }

    #[test]
    fn test_ranked_placement_and_positions() {
        let mut registry = Registry::new();
        let mut surface = HeadlessSurface::new(280, 200);
        let snaps = vec![snap(1, 100, 0), snap(2, 900, 1), snap(3, 500, 2)];

        let pass = reconcile(&mut registry, &mut surface, &snaps, LAYOUT);

        assert_eq!(pass.visible, 3);
        assert_eq!(pass.created, 3);
        assert_eq!(pass.removed, 0);
        // Strictly descending damage from top to bottom
        assert_eq!(registry.get(CombatantId(2)).unwrap().top, 0);
        assert_eq!(registry.get(CombatantId(3)).unwrap().top, 42);
        assert_eq!(registry.get(CombatantId(1)).unwrap().top, 84);
        // Rows take the container width
        assert!(registry.iter().all(|e| e.width == 280));
    }

    #[test]
    fn test_total_damage_includes_invisible_combatants() {
        let mut registry = Registry::new();
        // Only one row fits
        let mut surface = HeadlessSurface::new(280, 40);
        let snaps = vec![snap(1, 600, 0), snap(2, 300, 1), snap(3, 100, 2)];

        let pass = reconcile(&mut registry, &mut surface, &snaps, LAYOUT);

        assert_eq!(pass.visible, 1);
        assert_eq!(pass.total_damage, 1000, "denominator covers the whole input");
        assert_eq!(registry.get(CombatantId(1)).unwrap().total_damage, 1000);
        let row = surface.row(registry.get(CombatantId(1)).unwrap().row).unwrap();
        assert_eq!(row.total_damage, 1000);
    }

    #[test]
    fn test_viewport_bounds_visible_set() {
        // Row height 40 with spacing 2 in an 85px viewport fits exactly
        // two whole rows; the third combatant gets no entry at all.
        let mut registry = Registry::new();
        let mut surface = HeadlessSurface::new(280, 85);
        let snaps = vec![snap(1, 100, 0), snap(2, 50, 1), snap(3, 50, 2)];

        let pass = reconcile(&mut registry, &mut surface, &snaps, LAYOUT);

        assert_eq!(pass.visible, 2);
        assert_eq!(pass.total_damage, 200);
        assert!(registry.contains(CombatantId(1)));
        assert!(
            registry.contains(CombatantId(2)),
            "the tie goes to the first-discovered combatant"
        );
        assert!(!registry.contains(CombatantId(3)), "no entry for the third");
        assert!(registry.iter().all(|e| e.total_damage == 200));
        assert_eq!(surface.live_rows(), 2);
    }

    #[test]
    fn test_idempotent_under_unchanged_input() {
        let mut registry = Registry::new();
        let mut surface = HeadlessSurface::new(280, 200);
        let snaps = vec![snap(1, 300, 0), snap(2, 200, 1)];

        let first = reconcile(&mut registry, &mut surface, &snaps, LAYOUT);
        let rows_after_first = positions(&registry);
        let handles: Vec<_> = registry.iter().map(|e| e.row).collect();

        let second = reconcile(&mut registry, &mut surface, &snaps, LAYOUT);

        assert_eq!(first.visible, second.visible);
        assert_eq!(second.created, 0, "no rows created on the second pass");
        assert_eq!(second.removed, 0, "no rows removed on the second pass");
        assert_eq!(positions(&registry), rows_after_first);
        for handle in handles {
            assert!(surface.row(handle).is_some(), "row resources were reused");
        }
    }

    #[test]
    fn test_leaver_is_disposed_and_requalifier_gets_fresh_row() {
        let mut registry = Registry::new();
        let mut surface = HeadlessSurface::new(280, 40); // one row fits

        reconcile(&mut registry, &mut surface, &[snap(1, 500, 0), snap(2, 100, 1)], LAYOUT);
        let old_handle = registry.get(CombatantId(1)).unwrap().row;

        // Combatant 2 overtakes; combatant 1 drops out of the visible set
        let pass = reconcile(
            &mut registry,
            &mut surface,
            &[snap(1, 500, 0), snap(2, 900, 1)],
            LAYOUT,
        );
        assert_eq!(pass.created, 1);
        assert_eq!(pass.removed, 1);
        assert!(!registry.contains(CombatantId(1)), "removed, not hidden");
        assert!(surface.row(old_handle).is_none(), "resource disposed");

        // Combatant 1 re-qualifies and gets a brand-new row
        reconcile(
            &mut registry,
            &mut surface,
            &[snap(1, 1500, 0), snap(2, 900, 1)],
            LAYOUT,
        );
        let new_handle = registry.get(CombatantId(1)).unwrap().row;
        assert_ne!(new_handle, old_handle, "stale entries are never reused");
        assert!(surface.row(new_handle).is_some());
    }

    #[test]
    fn test_empty_input_clears_registry() {
        let mut registry = Registry::new();
        let mut surface = HeadlessSurface::new(280, 200);

        reconcile(&mut registry, &mut surface, &[snap(1, 100, 0)], LAYOUT);
        assert_eq!(registry.len(), 1);

        let pass = reconcile(&mut registry, &mut surface, &[], LAYOUT);
        assert_eq!(pass.visible, 0);
        assert_eq!(pass.removed, 1);
        assert!(registry.is_empty());
        assert_eq!(surface.live_rows(), 0);
    }

    #[test]
    fn test_tie_break_is_stable_across_passes() {
        let mut registry = Registry::new();
        let mut surface = HeadlessSurface::new(280, 40); // one row fits
        let snaps = vec![snap(7, 50, 3), snap(4, 50, 1)];

        for _ in 0..3 {
            let pass = reconcile(&mut registry, &mut surface, &snaps, LAYOUT);
            assert_eq!(pass.visible, 1);
            assert!(
                registry.contains(CombatantId(4)),
                "earlier discovery wins the tie on every pass"
            );
        }
    }

    #[test]
    fn test_shrunken_viewport_evicts_rows() {
        let mut registry = Registry::new();
        let mut surface = HeadlessSurface::new(280, 200);
        let snaps = vec![snap(1, 300, 0), snap(2, 200, 1), snap(3, 100, 2)];

        reconcile(&mut registry, &mut surface, &snaps, LAYOUT);
        assert_eq!(registry.len(), 3);

        surface.set_viewport(280, 40);
        let pass = reconcile(&mut registry, &mut surface, &snaps, LAYOUT);
        assert_eq!(pass.visible, 1);
        assert_eq!(pass.removed, 2);
        assert!(registry.contains(CombatantId(1)));
    }
}
