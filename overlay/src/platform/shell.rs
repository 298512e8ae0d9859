//! Unix platform backends
//!
//! Clipboard writes shell out to the usual helper binaries. There is no
//! portable way to emit a paste keystroke or to grab global hotkeys from
//! an overlay process on Wayland-era desktops, so both degrade to a
//! warning and the rest of the application keeps running.

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use fray_core::bridge::EventBridge;
use fray_core::export::ClipboardSurface;
use fray_core::hotkeys::HotkeyDispatcher;
use fray_core::session::DisplayEvent;

/// Clipboard surface that pipes text into a system clipboard helper.
#[derive(Debug, Default)]
pub struct ShellClipboard;

#[cfg(target_os = "macos")]
const HELPERS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(not(target_os = "macos"))]
const HELPERS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
];

impl ClipboardSurface for ShellClipboard {
    /// Best-effort copy. Tries each helper in order and reports whether
    /// one of them accepted the text.
    fn copy(&mut self, text: &str) -> bool {
        for (helper, args) in HELPERS {
            let Ok(mut child) = Command::new(helper)
                .args(*args)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            else {
                continue;
            };
            if let Some(mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(text.as_bytes());
            }
            if child.wait().is_ok_and(|status| status.success()) {
                return true;
            }
        }
        debug!("no clipboard helper accepted the export");
        false
    }

    /// Paste keystrokes cannot be synthesized portably here.
    fn paste(&mut self) -> bool {
        false
    }
}

/// Global hotkeys are unavailable on this platform.
///
/// Surfaces one warning; the overlay continues in the same degraded state
/// that a failed registration produces elsewhere.
pub fn spawn_hotkey_listener(
    dispatcher: HotkeyDispatcher,
    _bridge: EventBridge<DisplayEvent>,
) -> Option<JoinHandle<()>> {
    if !dispatcher.is_empty() {
        warn!("global hotkeys are not supported on this platform");
    }
    None
}
