//! Wire message decoding
//!
//! Payload layouts are little-endian:
//!
//! | kind             | payload                                              |
//! |------------------|------------------------------------------------------|
//! | SpawnCombatant   | id u64, flags u8 (bit0 player), name str, class str  |
//! | DespawnCombatant | id u64                                               |
//! | SkillResult      | source u64, target u64, skill u32, amount i64, flags |
//!
//! Strings are a u16 length followed by UTF-8 bytes. SkillResult flags:
//! bit0 heal, bit1 critical. Anything that does not parse cleanly decodes
//! to `None` and is dropped by the caller; partial protocol coverage makes
//! that an expected occurrence, not an error.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::debug;

use super::{GameData, MessageKind};
use crate::capture::RawMessage;
use crate::tracking::CombatantId;

// ─────────────────────────────────────────────────────────────────────────────
// Decoded Messages
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of one skill application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillResult {
    pub source: CombatantId,
    pub target: CombatantId,
    pub skill_id: u32,
    pub amount: i64,
    pub is_heal: bool,
    pub is_critical: bool,
    pub timestamp: NaiveDateTime,
}

/// A decoded capture message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameMessage {
    SpawnCombatant {
        id: CombatantId,
        name: String,
        class: String,
        is_player: bool,
    },
    DespawnCombatant {
        id: CombatantId,
    },
    SkillResult(SkillResult),
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoder
// ─────────────────────────────────────────────────────────────────────────────

/// Decodes raw capture messages using one region's opcode table.
///
/// Built fresh for every detected connection.
pub struct MessageDecoder {
    data: Arc<GameData>,
}

impl MessageDecoder {
    pub fn new(data: Arc<GameData>) -> Self {
        Self { data }
    }

    /// Decode a raw message, or `None` for unrecognized or malformed
    /// content.
    pub fn decode(&self, raw: &RawMessage) -> Option<GameMessage> {
        let kind = self.data.opcodes.kind_for(raw.opcode)?;
        let mut r = Reader::new(&raw.payload);

        let message = match kind {
            MessageKind::SpawnCombatant => {
                let id = CombatantId(r.read_u64()?);
                let flags = r.read_u8()?;
                let name = r.read_string()?;
                let class = r.read_string()?;
                GameMessage::SpawnCombatant {
                    id,
                    name,
                    class,
                    is_player: flags & 0x01 != 0,
                }
            }
            MessageKind::DespawnCombatant => GameMessage::DespawnCombatant {
                id: CombatantId(r.read_u64()?),
            },
            MessageKind::SkillResult => {
                let source = CombatantId(r.read_u64()?);
                let target = CombatantId(r.read_u64()?);
                let skill_id = r.read_u32()?;
                let amount = r.read_i64()?;
                let flags = r.read_u8()?;
                GameMessage::SkillResult(SkillResult {
                    source,
                    target,
                    skill_id,
                    amount,
                    is_heal: flags & 0x01 != 0,
                    is_critical: flags & 0x02 != 0,
                    timestamp: raw.timestamp,
                })
            }
        };

        if !r.at_end() {
            debug!(opcode = raw.opcode, "trailing bytes in payload, dropping");
            return None;
        }
        Some(message)
    }
}

/// Bounds-checked little-endian payload reader.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn read_u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take(8).map(|b| {
            u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        })
    }

    fn read_i64(&mut self) -> Option<i64> {
        self.read_u64().map(|v| v as i64)
    }

    fn read_string(&mut self) -> Option<String> {
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).ok()
    }

    fn at_end(&self) -> bool {
        self.pos == self.buf.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Encoding (synthetic feeds)
// ─────────────────────────────────────────────────────────────────────────────

/// Encode a spawn payload. Used by synthetic capture feeds and tests.
pub fn encode_spawn(id: CombatantId, name: &str, class: &str, is_player: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(13 + name.len() + class.len());
    out.extend_from_slice(&id.0.to_le_bytes());
    out.push(if is_player { 0x01 } else { 0x00 });
    push_string(&mut out, name);
    push_string(&mut out, class);
    out
}

/// Encode a despawn payload.
pub fn encode_despawn(id: CombatantId) -> Vec<u8> {
    id.0.to_le_bytes().to_vec()
}

/// Encode a skill-result payload.
pub fn encode_skill_result(
    source: CombatantId,
    target: CombatantId,
    skill_id: u32,
    amount: i64,
    is_heal: bool,
    is_critical: bool,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(29);
    out.extend_from_slice(&source.0.to_le_bytes());
    out.extend_from_slice(&target.0.to_le_bytes());
    out.extend_from_slice(&skill_id.to_le_bytes());
    out.extend_from_slice(&amount.to_le_bytes());
    let mut flags = 0u8;
    if is_heal {
        flags |= 0x01;
    }
    if is_critical {
        flags |= 0x02;
    }
    out.push(flags);
    out
}

fn push_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u16).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}
