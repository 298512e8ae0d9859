//! Export templating and the clipboard seam
//!
//! A copy hotkey renders the current ranking to text using its own
//! template and writes it to the clipboard surface. Templates carry their
//! own sort field and direction, independent of the on-screen ordering.

use fray_types::{ExportTemplateConfig, SortDirection, SortField};

use crate::tracking::CombatantSnapshot;

// ─────────────────────────────────────────────────────────────────────────────
// Template Rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Header/body/footer format strings plus a sort order.
///
/// `body` is expanded once per combatant. Recognized placeholders:
/// `{name}`, `{class}`, `{damage}`, `{percent}`, `{dps}`, `{healing}`,
/// `{rank}`, `{top_skill}`; `{total}` additionally in header and footer.
#[derive(Debug, Clone)]
pub struct ExportTemplate {
    pub header: String,
    pub body: String,
    pub footer: String,
    pub sort_by: SortField,
    pub direction: SortDirection,
}

impl From<&ExportTemplateConfig> for ExportTemplate {
    fn from(config: &ExportTemplateConfig) -> Self {
        Self {
            header: config.header.clone(),
            body: config.body.clone(),
            footer: config.footer.clone(),
            sort_by: config.sort_by,
            direction: config.direction,
        }
    }
}

impl ExportTemplate {
    /// Render the ranking to text.
    ///
    /// The percentage denominator is the damage sum over the *entire*
    /// input set, not a visible subset; callers pass every combatant.
    pub fn render(&self, rows: &[CombatantSnapshot]) -> String {
        let total_damage: i64 = rows.iter().map(|r| r.damage_dealt).sum();

        let mut order: Vec<&CombatantSnapshot> = rows.iter().collect();
        order.sort_by(|a, b| {
            let primary = match self.sort_by {
                SortField::Damage => a.damage_dealt.cmp(&b.damage_dealt),
                SortField::Healing => a.healing_dealt.cmp(&b.healing_dealt),
                SortField::Dps => a.dps.cmp(&b.dps),
                SortField::Name => a.name.cmp(&b.name),
            };
            let primary = match self.direction {
                SortDirection::Ascending => primary,
                SortDirection::Descending => primary.reverse(),
            };
            // Discovery order keeps ties deterministic
            primary.then(a.discovery.cmp(&b.discovery))
        });

        let total_text = total_damage.to_string();
        let mut out = self.header.replace("{total}", &total_text);
        for (i, row) in order.iter().enumerate() {
            out.push_str(&fill_row(&self.body, row, i + 1, total_damage));
        }
        out.push_str(&self.footer.replace("{total}", &total_text));
        out
    }
}

fn fill_row(template: &str, row: &CombatantSnapshot, rank: usize, total_damage: i64) -> String {
    template
        .replace("{rank}", &rank.to_string())
        .replace("{name}", &row.name)
        .replace("{class}", &row.class)
        .replace("{damage}", &row.damage_dealt.to_string())
        .replace("{healing}", &row.healing_dealt.to_string())
        .replace("{dps}", &row.dps.to_string())
        .replace("{percent}", &percent(row.damage_dealt, total_damage))
        .replace("{top_skill}", row.top_skill.as_deref().unwrap_or(""))
}

fn percent(part: i64, total: i64) -> String {
    if total <= 0 {
        "0.0%".to_string()
    } else {
        format!("{:.1}%", part as f64 * 100.0 / total as f64)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clipboard Surface
// ─────────────────────────────────────────────────────────────────────────────

/// Capability interface for the clipboard/input surface exports go to.
///
/// Both operations are best-effort: a `false` return means the platform
/// refused, which callers surface as a warning at most.
pub trait ClipboardSurface {
    /// Place text on the clipboard.
    fn copy(&mut self, text: &str) -> bool;

    /// Re-emit the clipboard content to the active input surface (a paste
    /// keystroke on platforms that support it).
    fn paste(&mut self) -> bool;
}
