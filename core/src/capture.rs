//! Capture pipeline seam
//!
//! The network capture/decoding pipeline lives outside this workspace. It
//! delivers two kinds of events: a connection descriptor when a game-server
//! session is detected, and undecoded messages while the session is live.
//! Both reach the display context only through the event bridge.

use chrono::NaiveDateTime;

/// Descriptor for a detected game-server connection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub region: String,
}

/// An undecoded message delivered by the capture pipeline.
///
/// The opcode selects the message kind via the active region's opcode
/// table; the payload layout is described in [`crate::game::messages`].
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub opcode: u16,
    pub timestamp: NaiveDateTime,
    pub payload: Vec<u8>,
}

/// Control surface for the capture producer.
///
/// The shutdown path disables the producer *before* the display context
/// releases its resources, so a late capture event can never target a
/// torn-down context.
pub trait CaptureControl {
    fn set_enabled(&mut self, enabled: bool);
}
