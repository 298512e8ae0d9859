//! Example overlay application driving the meter with a synthetic feed
//!
//! This is a standalone demo: a producer thread synthesizes a connection
//! and a stream of combat results, and the display loop reconciles them
//! into the headless surface. In production the capture pipeline produces
//! these events. The current standings are logged every couple of seconds.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fray_core::EventBridge;
use fray_core::capture::{CaptureControl, RawMessage, ServerInfo};
use fray_core::context::{AppConfig, AppConfigExt};
use fray_core::game::messages::{encode_skill_result, encode_spawn};
use fray_core::game::{GameDataSet, OP_SKILL_RESULT, OP_SPAWN_COMBATANT};
use fray_core::hotkeys::HotkeyDispatcher;
use fray_core::session::{DisplayEvent, SessionController};
use fray_core::tracking::{CombatantId, CombatantSnapshot};
use fray_overlay::platform::{self, NativeClipboard};
use fray_overlay::runtime::spawn_display_loop;
use fray_overlay::surface::{DisplaySurface, HeadlessSurface, RowHandle};

/// Demo roster: (id, name, skill id, base damage per swing).
const ROSTER: &[(u64, &str, u32, i64)] = &[
    (1, "Karyssa", 101, 900),
    (2, "Vett", 102, 780),
    (3, "Maro Dun", 103, 640),
    (4, "Callia", 201, 150),
];

/// Headless surface that logs the standings every couple of seconds.
struct ConsoleSurface {
    inner: HeadlessSurface,
    last_logged: Instant,
}

impl ConsoleSurface {
    fn new(width: u32, height: u32, max_name_chars: usize) -> Self {
        Self {
            inner: HeadlessSurface::new(width, height).with_name_limit(max_name_chars),
            last_logged: Instant::now(),
        }
    }
}

impl DisplaySurface for ConsoleSurface {
    fn viewport(&self) -> (u32, u32) {
        self.inner.viewport()
    }

    fn create_row(&mut self, id: CombatantId, height: u32) -> RowHandle {
        self.inner.create_row(id, height)
    }

    fn place_row(&mut self, handle: RowHandle, top: u32, width: u32) {
        self.inner.place_row(handle, top, width)
    }

    fn update_row(&mut self, handle: RowHandle, snapshot: &CombatantSnapshot, total_damage: i64) {
        self.inner.update_row(handle, snapshot, total_damage);
        if self.last_logged.elapsed() >= Duration::from_secs(2) {
            for row in self.inner.rows_top_down() {
                info!(top = row.top, "{}", row.text);
            }
            self.last_logged = Instant::now();
        }
    }

    fn release_row(&mut self, handle: RowHandle) {
        self.inner.release_row(handle)
    }
}

/// Producer thread standing in for the capture pipeline.
struct SyntheticFeed {
    enabled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SyntheticFeed {
    fn spawn(bridge: EventBridge<DisplayEvent>) -> Self {
        let enabled = Arc::new(AtomicBool::new(true));
        let flag = enabled.clone();

        let handle = thread::spawn(move || {
            let now = || chrono::Local::now().naive_local();

            bridge.submit(DisplayEvent::Connected(ServerInfo {
                name: "Demo Server".to_string(),
                region: "default".to_string(),
            }));
            for (id, name, _, _) in ROSTER {
                bridge.submit(DisplayEvent::Message(RawMessage {
                    opcode: OP_SPAWN_COMBATANT,
                    timestamp: now(),
                    payload: encode_spawn(CombatantId(*id), name, "Sentinel", true),
                }));
            }

            let mut swing: i64 = 0;
            while flag.load(Ordering::Relaxed) {
                swing += 1;
                for (i, (id, _, skill, base)) in ROSTER.iter().enumerate() {
                    let amount = base + (swing * 37 + i as i64 * 13) % 400;
                    bridge.submit(DisplayEvent::Message(RawMessage {
                        opcode: OP_SKILL_RESULT,
                        timestamp: now(),
                        payload: encode_skill_result(
                            CombatantId(*id),
                            CombatantId(900),
                            *skill,
                            amount,
                            *skill == 201,
                            swing % 5 == 0,
                        ),
                    }));
                }
                thread::sleep(Duration::from_millis(300));
            }
        });

        Self {
            enabled,
            handle: Some(handle),
        }
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl CaptureControl for SyntheticFeed {
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Window geometry is read at startup and written back at shutdown
    let config = AppConfig::load();
    let session = SessionController::new(GameDataSet::builtin());
    let dispatcher = HotkeyDispatcher::from_settings(&config.hotkeys);

    let (width, height) = (config.window.width, config.window.height);
    let name_limit = config.meter.max_name_chars;
    let (bridge, display) = match spawn_display_loop(
        session,
        dispatcher.clone(),
        config.meter.clone(),
        move || Ok(ConsoleSurface::new(width, height, name_limit)),
        NativeClipboard::default(),
    ) {
        Ok(pair) => pair,
        Err(error) => {
            eprintln!("Failed to start display loop: {}", error);
            return;
        }
    };

    let _listener = platform::spawn_hotkey_listener(dispatcher, bridge.clone());

    let mut feed = SyntheticFeed::spawn(bridge.clone());
    info!("overlay running, feeding a synthetic encounter for 30 seconds");
    thread::sleep(Duration::from_secs(30));

    // Shutdown ordering: stop the producer first, then tear the display
    // context down
    feed.set_enabled(false);
    feed.join();
    bridge.submit(DisplayEvent::Shutdown);
    let _ = display.join();

    if let Err(error) = config.store() {
        warn!(error = %error, "could not persist window geometry");
    }
}
