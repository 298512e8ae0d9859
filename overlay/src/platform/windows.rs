//! Windows platform backends
//!
//! Global hotkeys use Win32 `RegisterHotKey`; the matched events arrive as
//! `WM_HOTKEY` in the message queue of the registering thread, so both
//! registration and the message loop live on one dedicated listener
//! thread. The clipboard backend uses the Win32 clipboard API and emits
//! the paste keystroke with `SendInput`.

use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use windows::Win32::Foundation::{HANDLE, HGLOBAL};
use windows::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, OpenClipboard, SetClipboardData,
};
use windows::Win32::System::Memory::{GMEM_MOVEABLE, GlobalAlloc, GlobalFree, GlobalLock, GlobalUnlock};
use windows::Win32::System::Ole::CF_UNICODETEXT;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    HOT_KEY_MODIFIERS, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBD_EVENT_FLAGS, KEYBDINPUT,
    KEYEVENTF_KEYUP, MOD_ALT, MOD_CONTROL, MOD_NOREPEAT, MOD_SHIFT, MOD_WIN, RegisterHotKey,
    SendInput, UnregisterHotKey, VIRTUAL_KEY, VK_CONTROL, VK_F1, VK_V,
};
use windows::Win32::UI::WindowsAndMessaging::{GetMessageW, MSG, WM_HOTKEY};

use fray_core::bridge::EventBridge;
use fray_core::export::ClipboardSurface;
use fray_core::hotkeys::{
    HotkeyBackend, HotkeyDispatcher, HotkeyError, HotkeyHandle, Key, KeyCombo, Modifiers,
};
use fray_core::session::DisplayEvent;

// ─────────────────────────────────────────────────────────────────────────────
// Global Hotkeys
// ─────────────────────────────────────────────────────────────────────────────

/// Hotkey backend over Win32 `RegisterHotKey`.
///
/// Registrations are bound to the thread that made them; create and use
/// this only on the listener thread.
pub struct WindowsHotkeys {
    next_id: i32,
    combos: Vec<(i32, KeyCombo)>,
}

impl WindowsHotkeys {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            combos: Vec::new(),
        }
    }

    fn combo_for(&self, id: i32) -> Option<KeyCombo> {
        self.combos
            .iter()
            .find(|(registered, _)| *registered == id)
            .map(|(_, combo)| *combo)
    }

    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }

    pub fn len(&self) -> usize {
        self.combos.len()
    }
}

impl Default for WindowsHotkeys {
    fn default() -> Self {
        Self::new()
    }
}

fn virtual_key(key: Key) -> u32 {
    match key {
        Key::Function(n) => VK_F1.0 as u32 + (n as u32 - 1),
        Key::Character(c) => c.to_ascii_uppercase() as u32,
    }
}

fn modifier_flags(modifiers: Modifiers) -> HOT_KEY_MODIFIERS {
    let mut flags = MOD_NOREPEAT;
    if modifiers.control {
        flags |= MOD_CONTROL;
    }
    if modifiers.alt {
        flags |= MOD_ALT;
    }
    if modifiers.shift {
        flags |= MOD_SHIFT;
    }
    if modifiers.super_key {
        flags |= MOD_WIN;
    }
    flags
}

impl HotkeyBackend for WindowsHotkeys {
    fn register(&mut self, combo: &KeyCombo) -> Result<HotkeyHandle, HotkeyError> {
        let id = self.next_id;
        // A null hwnd posts WM_HOTKEY to this thread's message queue
        unsafe { RegisterHotKey(None, id, modifier_flags(combo.modifiers), virtual_key(combo.key)) }
            .map_err(|error| HotkeyError::Rejected {
                combo: combo.to_string(),
                detail: error.message(),
            })?;
        self.next_id += 1;
        self.combos.push((id, *combo));
        Ok(HotkeyHandle(id as u32))
    }
}

impl Drop for WindowsHotkeys {
    fn drop(&mut self) {
        for (id, _) in &self.combos {
            let _ = unsafe { UnregisterHotKey(None, *id) };
        }
    }
}

/// Spawn the hotkey listener thread.
///
/// Registration happens inside the thread (partial failure is tolerated
/// by the dispatcher); matched combos are submitted through the bridge as
/// key events. Returns `None` when nothing could be registered.
pub fn spawn_hotkey_listener(
    dispatcher: HotkeyDispatcher,
    bridge: EventBridge<DisplayEvent>,
) -> Option<JoinHandle<()>> {
    if dispatcher.is_empty() {
        return None;
    }
    Some(thread::spawn(move || {
        let mut backend = WindowsHotkeys::new();
        dispatcher.register_all(&mut backend);
        if backend.is_empty() {
            warn!("no global hotkeys could be registered");
            return;
        }
        info!(count = backend.len(), "hotkey listener running");

        let mut msg = MSG::default();
        while unsafe { GetMessageW(&mut msg, None, 0, 0) }.as_bool() {
            if msg.message == WM_HOTKEY
                && let Some(combo) = backend.combo_for(msg.wParam.0 as i32)
            {
                bridge.submit(DisplayEvent::KeyPressed(combo));
            }
        }
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Clipboard
// ─────────────────────────────────────────────────────────────────────────────

/// Clipboard surface over the Win32 clipboard API.
#[derive(Debug, Default)]
pub struct WindowsClipboard;

impl ClipboardSurface for WindowsClipboard {
    fn copy(&mut self, text: &str) -> bool {
        // CF_UNICODETEXT wants nul-terminated UTF-16 in moveable global
        // memory; ownership of the allocation passes to the system on a
        // successful SetClipboardData.
        let wide: Vec<u16> = text.encode_utf16().chain(std::iter::once(0)).collect();

        unsafe {
            if OpenClipboard(None).is_err() {
                return false;
            }
            let result = (|| -> windows::core::Result<()> {
                EmptyClipboard()?;
                let hmem: HGLOBAL = GlobalAlloc(GMEM_MOVEABLE, wide.len() * 2)?;
                let ptr = GlobalLock(hmem);
                if ptr.is_null() {
                    let _ = GlobalFree(hmem);
                    return Err(windows::core::Error::from_win32());
                }
                std::ptr::copy_nonoverlapping(wide.as_ptr(), ptr as *mut u16, wide.len());
                let _ = GlobalUnlock(hmem);
                SetClipboardData(CF_UNICODETEXT.0 as u32, HANDLE(hmem.0))?;
                Ok(())
            })();
            let _ = CloseClipboard();
            result.is_ok()
        }
    }

    fn paste(&mut self) -> bool {
        // Ctrl+V into whichever window has focus
        let inputs = [
            key_input(VK_CONTROL, false),
            key_input(VK_V, false),
            key_input(VK_V, true),
            key_input(VK_CONTROL, true),
        ];
        let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
        sent == inputs.len() as u32
    }
}

fn key_input(vk: VIRTUAL_KEY, up: bool) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: 0,
                dwFlags: if up {
                    KEYEVENTF_KEYUP
                } else {
                    KEYBD_EVENT_FLAGS(0)
                },
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}
