//! Fray Core
//!
//! Session lifecycle, combat tracking and the plumbing that feeds the live
//! overlay.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    session                          │
//! │               SessionController                     │
//! │   (connection lifecycle, message fan-in, reset)     │
//! ├─────────────────────────────────────────────────────┤
//! │          tracking            │       export         │
//! │  EntityTracker, DamageTracker│  ExportTemplate,     │
//! │  (per-combatant aggregates)  │  ClipboardSurface    │
//! ├─────────────────────────────────────────────────────┤
//! │            game              │       hotkeys        │
//! │  GameData, MessageDecoder    │  HotkeyDispatcher,   │
//! │  (region data + wire codec)  │  HotkeyBackend       │
//! ├─────────────────────────────────────────────────────┤
//! │                    bridge                           │
//! │             EventBridge / EventInbox                │
//! │   (producer threads → serial display context)       │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod bridge;
pub mod capture;
pub mod context;
pub mod export;
pub mod game;
pub mod hotkeys;
pub mod session;
pub mod tracking;

// Re-exports for convenience
pub use bridge::{EventBridge, EventInbox};
pub use capture::{CaptureControl, RawMessage, ServerInfo};
pub use export::{ClipboardSurface, ExportTemplate};
pub use game::{GameData, GameDataSet, GameMessage, MessageDecoder, SkillResult};
pub use hotkeys::{HotkeyAction, HotkeyBackend, HotkeyDispatcher, HotkeyError, KeyCombo};
pub use session::{DisplayEvent, SessionController};
pub use tracking::{CombatantId, CombatantSnapshot, DamageTracker, EntityTracker, PlayerTracker};
