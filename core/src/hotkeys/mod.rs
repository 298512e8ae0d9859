//! Global hotkey dispatch
//!
//! The dispatcher owns the table of key-combo bindings from config and
//! routes matched key events to actions. Registration with the OS happens
//! through the [`HotkeyBackend`] capability trait; a failed registration
//! is a degraded state (warn and continue), never a startup abort.
//!
//! Dispatch is a fan-out: every binding whose combo matches a key event
//! fires, so several copy bindings sharing one combo each produce their
//! own export.


use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, warn};

use fray_types::HotkeySettings;

use crate::export::ExportTemplate;

// ─────────────────────────────────────────────────────────────────────────────
// Key Combos
// ─────────────────────────────────────────────────────────────────────────────

/// Modifier keys held as part of a combo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub control: bool,
    pub alt: bool,
    pub shift: bool,
    pub super_key: bool,
}

/// The non-modifier key of a combo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// F1..F24
    Function(u8),
    /// A letter or digit key
    Character(char),
}

/// A (key, modifiers) pair as registered with the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub modifiers: Modifiers,
    pub key: Key,
}

impl FromStr for KeyCombo {
    type Err = HotkeyError;

    /// Parse combo strings like `"ctrl+alt+f12"` or `"shift+d"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || HotkeyError::InvalidCombo {
            combo: s.to_string(),
        };

        let mut modifiers = Modifiers::default();
        let mut key = None;
        for part in s.split('+') {
            let part = part.trim().to_ascii_lowercase();
            match part.as_str() {
                "ctrl" | "control" => modifiers.control = true,
                "alt" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "super" | "win" | "cmd" => modifiers.super_key = true,
                other => {
                    if key.replace(parse_key(other).ok_or_else(invalid)?).is_some() {
                        return Err(invalid());
                    }
                }
            }
        }
        Ok(KeyCombo {
            modifiers,
            key: key.ok_or_else(invalid)?,
        })
    }
}

fn parse_key(s: &str) -> Option<Key> {
    if let Some(rest) = s.strip_prefix('f')
        && let Ok(n) = rest.parse::<u8>()
        && (1..=24).contains(&n)
    {
        return Some(Key::Function(n));
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() => Some(Key::Character(c)),
        _ => None,
    }
}

impl std::fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.modifiers.control {
            write!(f, "ctrl+")?;
        }
        if self.modifiers.alt {
            write!(f, "alt+")?;
        }
        if self.modifiers.shift {
            write!(f, "shift+")?;
        }
        if self.modifiers.super_key {
            write!(f, "super+")?;
        }
        match self.key {
            Key::Function(n) => write!(f, "f{}", n),
            Key::Character(c) => write!(f, "{}", c),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Capability
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from combo parsing and OS registration.
#[derive(Debug, Error)]
pub enum HotkeyError {
    #[error("unrecognized key combo '{combo}'")]
    InvalidCombo { combo: String },

    #[error("registration rejected for '{combo}': {detail}")]
    Rejected { combo: String, detail: String },

    #[error("global hotkeys are not supported on this platform")]
    Unsupported,
}

/// Opaque id for a registered combo, assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyHandle(pub u32);

/// Capability interface over the OS global-hotkey facility.
///
/// One backend exists per target operating system; matched key events are
/// delivered separately, through the event bridge, as a stream of
/// [`KeyCombo`] values.
pub trait HotkeyBackend {
    fn register(&mut self, combo: &KeyCombo) -> Result<HotkeyHandle, HotkeyError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────────────────────────────────────

/// What a matched binding does.
#[derive(Debug, Clone)]
pub enum HotkeyAction {
    /// Re-emit the most recent export to the input surface.
    Paste,
    /// Reset the current session's statistics.
    Reset,
    /// Render the ranking with this template and copy it.
    Copy(ExportTemplate),
}

/// One (combo, action) binding.
#[derive(Debug, Clone)]
pub struct HotkeyBinding {
    pub combo: KeyCombo,
    pub action: HotkeyAction,
}

/// Ordered table of hotkey bindings.
#[derive(Debug, Clone, Default)]
pub struct HotkeyDispatcher {
    bindings: Vec<HotkeyBinding>,
}

impl HotkeyDispatcher {
    /// Build the binding table from config.
    ///
    /// Malformed combo strings are skipped with a warning; the remaining
    /// bindings stay usable.
    pub fn from_settings(settings: &HotkeySettings) -> Self {
        let mut bindings = Vec::new();

        if let Some(combo) = &settings.paste {
            match combo.parse() {
                Ok(combo) => bindings.push(HotkeyBinding {
                    combo,
                    action: HotkeyAction::Paste,
                }),
                Err(error) => warn!(error = %error, "invalid paste hotkey"),
            }
        }
        if let Some(combo) = &settings.reset {
            match combo.parse() {
                Ok(combo) => bindings.push(HotkeyBinding {
                    combo,
                    action: HotkeyAction::Reset,
                }),
                Err(error) => warn!(error = %error, "invalid reset hotkey"),
            }
        }
        for copy in &settings.copy {
            match copy.combo.parse() {
                Ok(combo) => bindings.push(HotkeyBinding {
                    combo,
                    action: HotkeyAction::Copy(ExportTemplate::from(&copy.template)),
                }),
                Err(error) => warn!(error = %error, "invalid copy hotkey"),
            }
        }

        Self { bindings }
    }

    pub fn bindings(&self) -> &[HotkeyBinding] {
        &self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Register every combo with the backend.
    ///
    /// Paste/Reset are attempted first as a pair: one warning covers both
    /// if either fails. Each copy binding is then attempted independently
    /// with its own warning. Bindings sharing a combo register it once.
    /// Partial registration never aborts startup.
    pub fn register_all(&self, backend: &mut dyn HotkeyBackend) -> Vec<HotkeyHandle> {
        let mut handles = Vec::new();
        let mut registered: Vec<KeyCombo> = Vec::new();

        let mut pair_error = None;
        for binding in self
            .bindings
            .iter()
            .filter(|b| matches!(b.action, HotkeyAction::Paste | HotkeyAction::Reset))
        {
            if let Err(error) =
                register_once(backend, binding.combo, &mut registered, &mut handles)
                && pair_error.is_none()
            {
                pair_error = Some(error);
            }
        }
        if let Some(error) = pair_error {
            warn!(error = %error, "cannot bind paste/reset hotkeys");
        }

        for binding in self
            .bindings
            .iter()
            .filter(|b| matches!(b.action, HotkeyAction::Copy(_)))
        {
            if let Err(error) =
                register_once(backend, binding.combo, &mut registered, &mut handles)
            {
                warn!(error = %error, hotkey = %binding.combo, "cannot bind copy hotkey");
            }
        }

        handles
    }

    /// Every action whose binding matches the combo, in binding order.
    ///
    /// Several bindings may match one event; all of them fire.
    pub fn actions_for(&self, combo: KeyCombo) -> impl Iterator<Item = &HotkeyAction> {
        self.bindings
            .iter()
            .filter(move |b| b.combo == combo)
            .map(|b| &b.action)
    }
}

fn register_once(
    backend: &mut dyn HotkeyBackend,
    combo: KeyCombo,
    registered: &mut Vec<KeyCombo>,
    handles: &mut Vec<HotkeyHandle>,
) -> Result<(), HotkeyError> {
    if registered.contains(&combo) {
        debug!(hotkey = %combo, "combo already registered, sharing it");
        return Ok(());
    }
    let handle = backend.register(&combo)?;
    registered.push(combo);
    handles.push(handle);
    Ok(())
}
