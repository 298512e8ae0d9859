//! Fray Overlay Library
//!
//! The live display half of the meter: a registry of on-screen rows kept
//! in sync with the ranked combatant statistics, driven by a single
//! display thread.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    runtime                          │
//! │              spawn_display_loop                     │
//! │   (drains the bridge, ticks the reconciler,         │
//! │    executes hotkey actions)                         │
//! ├─────────────────────────────────────────────────────┤
//! │          reconciler          │      registry        │
//! │   diff/create/update/remove  │  CombatantId → row   │
//! ├─────────────────────────────────────────────────────┤
//! │                    surface                          │
//! │        DisplaySurface, RowHandle (generational)     │
//! │        (seam to the rendering framework)            │
//! ├─────────────────────────────────────────────────────┤
//! │                    platform/                        │
//! │     windows (hotkeys, clipboard), unix (clipboard)  │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod platform;
pub mod reconciler;
pub mod registry;
pub mod runtime;
pub mod surface;
pub mod utils;

// Re-export commonly used types
pub use reconciler::{ReconcilePass, RowLayout, reconcile};
pub use registry::{DisplayEntry, Registry};
pub use runtime::spawn_display_loop;
pub use surface::{DisplaySurface, HeadlessSurface, RowHandle};
