//! Shared configuration types for Fray
//!
//! This crate contains serializable configuration types that are shared between
//! the core session logic and the overlay display layer. It carries no logic
//! beyond defaults so that both sides can depend on it without cycles.
//!
//! All fields use `#[serde(default)]` so that configs written by older builds
//! keep loading after new fields are added.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Window Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// Saved position and size of the overlay window.
///
/// Read at startup and written back at shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            x: 50,
            y: 50,
            width: 280,
            height: 200,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Meter Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Layout and refresh settings for the ranked meter list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterSettings {
    /// Fixed height of one combatant row, in pixels.
    #[serde(default = "default_row_height")]
    pub row_height: u32,
    /// Vertical gap between rows, in pixels.
    #[serde(default = "default_row_spacing")]
    pub row_spacing: u32,
    /// Interval between reconciliation passes, in milliseconds.
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
    /// Maximum characters for combatant names before truncation.
    #[serde(default = "default_max_name_chars")]
    pub max_name_chars: usize,
}

impl Default for MeterSettings {
    fn default() -> Self {
        Self {
            row_height: default_row_height(),
            row_spacing: default_row_spacing(),
            refresh_ms: default_refresh_ms(),
            max_name_chars: default_max_name_chars(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Export Templates
// ─────────────────────────────────────────────────────────────────────────────

/// Field the export ranking is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Damage,
    Healing,
    Dps,
    Name,
}

/// Direction of the export ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Format strings used to render the current ranking to text.
///
/// `body` is expanded once per combatant; `header` and `footer` once per
/// export. Recognized placeholders are a collaborator contract; the core set
/// is `{name}`, `{class}`, `{damage}`, `{percent}`, `{dps}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportTemplateConfig {
    #[serde(default)]
    pub header: String,
    #[serde(default = "default_export_body")]
    pub body: String,
    #[serde(default)]
    pub footer: String,
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub direction: SortDirection,
}

impl Default for ExportTemplateConfig {
    fn default() -> Self {
        Self {
            header: String::new(),
            body: default_export_body(),
            footer: String::new(),
            sort_by: SortField::default(),
            direction: SortDirection::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hotkey Settings
// ─────────────────────────────────────────────────────────────────────────────

/// One copy-to-clipboard hotkey with its own export template.
///
/// Several copy bindings may share one combo; every binding matching a key
/// event fires.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopyHotkeyConfig {
    /// Key combo string, e.g. `"ctrl+alt+c"`.
    #[serde(default)]
    pub combo: String,
    #[serde(default)]
    pub template: ExportTemplateConfig,
}

/// Global hotkey configuration.
///
/// Combos are plain strings (`"ctrl+shift+f12"`) parsed by the dispatcher;
/// `None` disables a binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeySettings {
    #[serde(default = "default_paste_combo")]
    pub paste: Option<String>,
    #[serde(default = "default_reset_combo")]
    pub reset: Option<String>,
    #[serde(default = "default_copy_bindings")]
    pub copy: Vec<CopyHotkeyConfig>,
}

impl Default for HotkeySettings {
    fn default() -> Self {
        Self {
            paste: default_paste_combo(),
            reset: default_reset_combo(),
            copy: default_copy_bindings(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// App Config (combined)
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// Constructed once at startup and passed into the session controller, the
/// reconciler layout and the hotkey dispatcher; nothing reads it through a
/// global.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub meter: MeterSettings,
    #[serde(default)]
    pub hotkeys: HotkeySettings,
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

fn default_row_height() -> u32 {
    40
}

fn default_row_spacing() -> u32 {
    2
}

fn default_refresh_ms() -> u64 {
    500
}

fn default_max_name_chars() -> usize {
    16
}

fn default_export_body() -> String {
    "{rank}. {name} {damage} ({percent}) {dps}/s\n".to_string()
}

fn default_paste_combo() -> Option<String> {
    Some("ctrl+alt+v".to_string())
}

fn default_reset_combo() -> Option<String> {
    Some("ctrl+alt+r".to_string())
}

fn default_copy_bindings() -> Vec<CopyHotkeyConfig> {
    vec![CopyHotkeyConfig {
        combo: "ctrl+alt+c".to_string(),
        template: ExportTemplateConfig::default(),
    }]
}
