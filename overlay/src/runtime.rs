//! Display loop runtime
//!
//! One dedicated thread owns all display state: the row registry, the
//! surface and the session's tracking pipeline. Everything else reaches it
//! through the event bridge, so no locks guard any of that state.
//!
//! The surface is constructed *inside* the thread via a factory closure:
//! window and backend handles are not portable across threads on every
//! platform, so only the factory needs to be Send.

use std::sync::mpsc as std_mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use fray_core::bridge::{self, EventBridge, EventInbox};
use fray_core::export::ClipboardSurface;
use fray_core::hotkeys::{HotkeyAction, HotkeyDispatcher};
use fray_core::session::{DisplayEvent, SessionController};
use fray_types::MeterSettings;

use crate::platform::PlatformError;
use crate::reconciler::{RowLayout, reconcile};
use crate::registry::Registry;
use crate::surface::DisplaySurface;

/// Spawn the display thread.
///
/// Returns the bridge producers use to reach it and the join handle. The
/// caller is responsible for shutdown ordering: disable the capture
/// producer first, then submit [`DisplayEvent::Shutdown`] and join.
pub fn spawn_display_loop<S, F, C>(
    session: SessionController,
    dispatcher: HotkeyDispatcher,
    meter: MeterSettings,
    create_surface: F,
    clipboard: C,
) -> Result<(EventBridge<DisplayEvent>, JoinHandle<()>), PlatformError>
where
    S: DisplaySurface + 'static,
    F: FnOnce() -> Result<S, PlatformError> + Send + 'static,
    C: ClipboardSurface + Send + 'static,
{
    let (event_bridge, inbox) = bridge::channel(bridge::DEFAULT_CAPACITY);

    // Creation result comes back over a channel so startup failures are
    // reported to the caller instead of dying silently in the thread
    let (confirm_tx, confirm_rx) = std_mpsc::channel::<Result<(), PlatformError>>();

    let handle = thread::spawn(move || {
        let mut surface = match create_surface() {
            Ok(surface) => {
                let _ = confirm_tx.send(Ok(()));
                surface
            }
            Err(error) => {
                let _ = confirm_tx.send(Err(error));
                return;
            }
        };
        inbox.bind();
        run_loop(inbox, session, dispatcher, meter, &mut surface, clipboard);
    });

    match confirm_rx.recv() {
        Ok(Ok(())) => Ok((event_bridge, handle)),
        Ok(Err(error)) => {
            let _ = handle.join();
            Err(error)
        }
        Err(_) => Err(PlatformError::Other(
            "display thread died during startup".to_string(),
        )),
    }
}

fn run_loop<C: ClipboardSurface>(
    mut inbox: EventInbox<DisplayEvent>,
    mut session: SessionController,
    dispatcher: HotkeyDispatcher,
    meter: MeterSettings,
    surface: &mut dyn DisplaySurface,
    mut clipboard: C,
) {
    let mut registry = Registry::new();
    let layout = RowLayout::from(&meter);
    let refresh = Duration::from_millis(meter.refresh_ms.max(1));
    let mut last_pass: Option<Instant> = None;
    let mut force_pass = false;
    let mut last_export: Option<String> = None;

    'run: loop {
        // Drain everything producers queued since the last iteration
        while let Some(event) = inbox.try_next() {
            match event {
                DisplayEvent::Connected(server) => {
                    session.handle_connection(server);
                    force_pass = true;
                }
                DisplayEvent::Message(raw) => session.handle_message(&raw),
                DisplayEvent::KeyPressed(combo) => {
                    // Every matching binding fires on one event
                    for action in dispatcher.actions_for(combo) {
                        match action {
                            HotkeyAction::Paste => match &last_export {
                                Some(text) => {
                                    if clipboard.copy(text) {
                                        clipboard.paste();
                                    }
                                }
                                None => debug!("paste hotkey with no prior export"),
                            },
                            HotkeyAction::Reset => {
                                if session.reset() {
                                    force_pass = true;
                                }
                            }
                            HotkeyAction::Copy(template) => {
                                let text = template.render(&session.snapshots());
                                if !clipboard.copy(&text) {
                                    warn!("clipboard refused the export");
                                }
                                last_export = Some(text);
                            }
                        }
                    }
                }
                DisplayEvent::Shutdown => break 'run,
            }
        }

        let due = last_pass.is_none_or(|at| at.elapsed() >= refresh);
        if force_pass || due {
            let snapshots = session.snapshots();
            let pass = reconcile(&mut registry, surface, &snapshots, layout);
            trace!(
                visible = pass.visible,
                created = pass.created,
                removed = pass.removed,
                total_damage = pass.total_damage,
                "reconcile pass"
            );
            last_pass = Some(Instant::now());
            force_pass = false;
        }

        thread::sleep(Duration::from_millis(1));
    }

    // The caller disabled producers before requesting shutdown; releasing
    // display resources comes last.
    registry.release_all(surface);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{HeadlessSurface, RowHandle};
    use fray_core::capture::{RawMessage, ServerInfo};
    use fray_core::game::messages::{encode_skill_result, encode_spawn};
    use fray_core::game::{GameDataSet, OP_SKILL_RESULT, OP_SPAWN_COMBATANT};
    use fray_core::tracking::{CombatantId, CombatantSnapshot};
    use fray_types::{CopyHotkeyConfig, ExportTemplateConfig, HotkeySettings};
    use std::sync::{Arc, Mutex};

    /// Surface that shares its state with the test thread.
    #[derive(Clone)]
    struct SharedSurface(Arc<Mutex<HeadlessSurface>>);

    impl DisplaySurface for SharedSurface {
        fn viewport(&self) -> (u32, u32) {
            self.0.lock().unwrap().viewport()
        }
        fn create_row(&mut self, id: CombatantId, height: u32) -> RowHandle {
            self.0.lock().unwrap().create_row(id, height)
        }
        fn place_row(&mut self, handle: RowHandle, top: u32, width: u32) {
            self.0.lock().unwrap().place_row(handle, top, width)
        }
        fn update_row(
            &mut self,
            handle: RowHandle,
            snapshot: &CombatantSnapshot,
            total_damage: i64,
        ) {
            self.0.lock().unwrap().update_row(handle, snapshot, total_damage)
        }
        fn release_row(&mut self, handle: RowHandle) {
            self.0.lock().unwrap().release_row(handle)
        }
    }

    /// Clipboard that records copies and pastes for assertions.
    #[derive(Clone, Default)]
    struct RecordingClipboard {
        copies: Arc<Mutex<Vec<String>>>,
        pastes: Arc<Mutex<u32>>,
    }

    impl ClipboardSurface for RecordingClipboard {
        fn copy(&mut self, text: &str) -> bool {
            self.copies.lock().unwrap().push(text.to_string());
            true
        }
        fn paste(&mut self) -> bool {
            *self.pastes.lock().unwrap() += 1;
            true
        }
    }

    fn timestamp() -> chrono::NaiveDateTime {
        chrono::NaiveDateTime::parse_from_str("2026-03-14 21:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn spawn_msg(id: u64, name: &str) -> DisplayEvent {
        DisplayEvent::Message(RawMessage {
            opcode: OP_SPAWN_COMBATANT,
            timestamp: timestamp(),
            payload: encode_spawn(CombatantId(id), name, "Sentinel", true),
        })
    }

    fn hit_msg(source: u64, amount: i64) -> DisplayEvent {
        DisplayEvent::Message(RawMessage {
            opcode: OP_SKILL_RESULT,
            timestamp: timestamp(),
            payload: encode_skill_result(
                CombatantId(source),
                CombatantId(999),
                101,
                amount,
                false,
                false,
            ),
        })
    }

    fn key_event(combo: &str) -> DisplayEvent {
        DisplayEvent::KeyPressed(combo.parse().unwrap())
    }

    fn settings() -> (MeterSettings, HotkeySettings) {
        let meter = MeterSettings {
            refresh_ms: 10,
            ..MeterSettings::default()
        };
        let hotkeys = HotkeySettings {
            paste: Some("ctrl+alt+v".to_string()),
            reset: Some("ctrl+alt+r".to_string()),
            copy: vec![
                CopyHotkeyConfig {
                    combo: "ctrl+alt+c".to_string(),
                    template: ExportTemplateConfig {
                        body: "{name}:{damage} ".to_string(),
                        ..ExportTemplateConfig::default()
                    },
                },
                CopyHotkeyConfig {
                    combo: "ctrl+alt+c".to_string(),
                    template: ExportTemplateConfig {
                        body: "{name}={percent} ".to_string(),
                        ..ExportTemplateConfig::default()
                    },
                },
            ],
        };
        (meter, hotkeys)
    }

    fn start(
        meter: MeterSettings,
        hotkeys: &HotkeySettings,
    ) -> (
        EventBridge<DisplayEvent>,
        JoinHandle<()>,
        SharedSurface,
        RecordingClipboard,
    ) {
        let shared = SharedSurface(Arc::new(Mutex::new(HeadlessSurface::new(280, 200))));
        let clipboard = RecordingClipboard::default();
        let surface = shared.clone();
        let (event_bridge, handle) = spawn_display_loop(
            SessionController::new(GameDataSet::builtin()),
            HotkeyDispatcher::from_settings(hotkeys),
            meter,
            move || Ok(surface),
            clipboard.clone(),
        )
        .expect("display loop must start");
        (event_bridge, handle, shared, clipboard)
    }

    fn settle() {
        thread::sleep(Duration::from_millis(120));
    }

    #[test]
    fn test_full_flow_through_the_bridge() {
        let (meter, hotkeys) = settings();
        let (event_bridge, handle, shared, clipboard) = start(meter, &hotkeys);

        event_bridge.submit(DisplayEvent::Connected(ServerInfo {
            name: "Harbinger".to_string(),
            region: "default".to_string(),
        }));
        event_bridge.submit(spawn_msg(1, "Karyssa"));
        event_bridge.submit(spawn_msg(2, "Vett"));
        event_bridge.submit(hit_msg(1, 300));
        event_bridge.submit(hit_msg(2, 100));
        settle();

        assert_eq!(shared.0.lock().unwrap().live_rows(), 2, "both players shown");

        // One copy event fires both templates, then paste re-emits the
        // most recent export
        event_bridge.submit(key_event("ctrl+alt+c"));
        settle();
        {
            let copies = clipboard.copies.lock().unwrap();
            assert_eq!(copies.len(), 2, "both copy bindings fired");
            assert_eq!(copies[0], "Karyssa:300 Vett:100 ");
            assert_eq!(copies[1], "Karyssa=75.0% Vett=25.0% ");
        }

        event_bridge.submit(key_event("ctrl+alt+v"));
        settle();
        assert_eq!(*clipboard.pastes.lock().unwrap(), 1);
        assert_eq!(
            clipboard.copies.lock().unwrap().last().unwrap(),
            "Karyssa=75.0% Vett=25.0% ",
            "paste re-emits the most recent export"
        );

        // Reset clears the visible set without waiting for a tick
        event_bridge.submit(key_event("ctrl+alt+r"));
        settle();
        assert_eq!(shared.0.lock().unwrap().live_rows(), 0, "reset cleared the display");

        event_bridge.submit(DisplayEvent::Shutdown);
        handle.join().unwrap();
        assert_eq!(
            shared.0.lock().unwrap().live_rows(),
            0,
            "teardown released every row"
        );
    }

    #[test]
    fn test_shutdown_releases_rows() {
        let (meter, hotkeys) = settings();
        let (event_bridge, handle, shared, _clipboard) = start(meter, &hotkeys);

        event_bridge.submit(DisplayEvent::Connected(ServerInfo {
            name: "Harbinger".to_string(),
            region: "default".to_string(),
        }));
        event_bridge.submit(spawn_msg(1, "Karyssa"));
        event_bridge.submit(hit_msg(1, 300));
        settle();
        assert_eq!(shared.0.lock().unwrap().live_rows(), 1);

        event_bridge.submit(DisplayEvent::Shutdown);
        handle.join().unwrap();
        assert_eq!(shared.0.lock().unwrap().live_rows(), 0);

        // Late events after teardown are dropped silently
        event_bridge.submit(hit_msg(1, 100));
    }

    #[test]
    fn test_surface_factory_failure_is_reported() {
        let (meter, hotkeys) = settings();
        let result = spawn_display_loop(
            SessionController::new(GameDataSet::builtin()),
            HotkeyDispatcher::from_settings(&hotkeys),
            meter,
            || -> Result<HeadlessSurface, PlatformError> {
                Err(PlatformError::SurfaceInit("no display".to_string()))
            },
            RecordingClipboard::default(),
        );
        assert!(matches!(result, Err(PlatformError::SurfaceInit(_))));
    }
}
