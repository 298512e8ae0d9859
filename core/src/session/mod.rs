//! Session lifecycle
//!
//! A session runs from the moment a game-server connection is detected
//! until the connection is lost or the process shuts down. Detecting a new
//! connection rebuilds the whole tracking pipeline; a reset rebuilds only
//! the damage tracker and leaves identity tracking in place.


use std::sync::Arc;

use tracing::{debug, info};

use crate::capture::{RawMessage, ServerInfo};
use crate::game::{GameData, GameDataSet, GameMessage, MessageDecoder};
use crate::hotkeys::KeyCombo;
use crate::tracking::{CombatantSnapshot, DamageTracker, EntityTracker, PlayerTracker};

// ─────────────────────────────────────────────────────────────────────────────
// Display Events
// ─────────────────────────────────────────────────────────────────────────────

/// Events consumed by the display context.
///
/// Producers submit these through the event bridge; nothing else reaches
/// display-owned state.
#[derive(Debug, Clone)]
pub enum DisplayEvent {
    /// A game-server connection was detected.
    Connected(ServerInfo),
    /// A capture message arrived for the current connection.
    Message(RawMessage),
    /// A registered global hotkey fired.
    KeyPressed(KeyCombo),
    /// Tear down the display context.
    Shutdown,
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Controller
// ─────────────────────────────────────────────────────────────────────────────

/// Everything that exists only while a connection is live.
struct ActiveSession {
    server: ServerInfo,
    data: Arc<GameData>,
    decoder: MessageDecoder,
    entities: EntityTracker,
    players: PlayerTracker,
    damage: DamageTracker,
}

/// Lifecycle manager for the tracking pipeline.
///
/// Constructed once with the region data set; owns no display state. All
/// methods run on the display context.
pub struct SessionController {
    game_data: GameDataSet,
    session: Option<ActiveSession>,
}

impl SessionController {
    pub fn new(game_data: GameDataSet) -> Self {
        Self {
            game_data,
            session: None,
        }
    }

    /// Start a fresh session for a detected connection.
    ///
    /// Discards all in-memory statistics of any previous connection.
    pub fn handle_connection(&mut self, server: ServerInfo) {
        info!(
            server = %server.name,
            region = %server.region,
            "connection detected, starting session"
        );
        let data = self.game_data.for_region(&server.region);
        self.session = Some(ActiveSession {
            decoder: MessageDecoder::new(data.clone()),
            data,
            server,
            entities: EntityTracker::new(),
            players: PlayerTracker::new(),
            damage: DamageTracker::new(),
        });
    }

    /// Feed one capture message into the pipeline.
    ///
    /// Identity tracking sees every decoded message; only combat results
    /// additionally reach the damage tracker. Undecodable content is
    /// dropped, which partial protocol coverage makes routine.
    pub fn handle_message(&mut self, raw: &RawMessage) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(message) = session.decoder.decode(raw) else {
            debug!(opcode = raw.opcode, "unrecognized message, dropping");
            return;
        };

        session.entities.update(&message);
        session.players.observe(&message, &session.entities);
        if let GameMessage::SkillResult(result) = &message {
            session
                .damage
                .record(result, &session.entities, &session.players);
        }
    }

    /// Clear the session's statistics.
    ///
    /// No-op without an active session. Only the damage tracker is
    /// rebuilt; identity and player tracking survive. Returns `true` when
    /// a reconciliation pass should run immediately so the display
    /// reflects the cleared state without waiting for the next tick.
    pub fn reset(&mut self) -> bool {
        match self.session.as_mut() {
            None => false,
            Some(session) => {
                session.damage = DamageTracker::new();
                info!("session statistics reset");
                true
            }
        }
    }

    /// Current aggregates for every credited combatant.
    pub fn snapshots(&self) -> Vec<CombatantSnapshot> {
        self.session
            .as_ref()
            .map(|s| s.damage.snapshots(&s.data.skills))
            .unwrap_or_default()
    }

    pub fn server(&self) -> Option<&ServerInfo> {
        self.session.as_ref().map(|s| &s.server)
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }
}
