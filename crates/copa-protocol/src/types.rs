//! Core protocol types for Copa's wire format.
//!
//! Everything in this module travels on the wire as JSON. The shapes are
//! fixed by the client apps, so the serde attributes here (field renames,
//! tag names) are load-bearing: a change breaks every deployed client.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque fields carried alongside the typed parts of a message.
///
/// Used for the move payload and the game-state payload, both of which
/// belong to the rules collaborator. The coordinator forwards them verbatim.
pub type OpaquePayload = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A short-lived code identifying one live room.
///
/// Codes are unique among *live* rooms only — once a room closes, its code
/// may be handed out again. `#[serde(transparent)]` keeps the wire form a
/// plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Wraps a generated code. The registry is responsible for uniqueness.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the two fixed participant slots in a room.
///
/// Seat `1` is the room creator, seat `2` the joiner. The wire form is the
/// string `"1"` or `"2"`, both as a standalone value and as a map key in
/// `scores`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
pub enum SeatId {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
}

impl SeatId {
    /// Returns the opposite seat.
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => f.write_str("1"),
            Self::Two => f.write_str("2"),
        }
    }
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The shared state of one game, owned by a room.
///
/// Only `current_turn` is meaningful to the coordinator (it gates who may
/// move). `scores` and the flattened `payload` are produced by the rules
/// collaborator and forwarded untouched.
///
/// Both maps are ordered (`BTreeMap`, and `serde_json::Map` is BTreeMap
/// backed), so serializing two clones of the same state yields identical
/// bytes — the broadcast guarantee relies on this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// The seat allowed to submit the next move.
    #[serde(rename = "currentTurn")]
    pub current_turn: SeatId,

    /// Per-seat scores, updated only by the rules collaborator.
    pub scores: BTreeMap<SeatId, u32>,

    /// Rules-defined state (board, cups, ...), flattened into the object.
    #[serde(flatten)]
    pub payload: OpaquePayload,
}

impl GameState {
    /// Builds the state a room starts with: creator to move, zero scores,
    /// and whatever initial payload the rules collaborator supplies.
    pub fn initial(payload: OpaquePayload) -> Self {
        let mut scores = BTreeMap::new();
        scores.insert(SeatId::One, 0);
        scores.insert(SeatId::Two, 0);
        Self {
            current_turn: SeatId::One,
            scores,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Client → server messages
// ---------------------------------------------------------------------------

/// Messages a client may send, selected by the `type` field.
///
/// `make_move` carries arbitrary move-specific fields next to the tag;
/// they are captured by the flatten and handed to the rules collaborator
/// without inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom,
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: RoomCode,
    },
    MakeMove {
        #[serde(flatten)]
        payload: OpaquePayload,
    },
}

// ---------------------------------------------------------------------------
// Server → client messages
// ---------------------------------------------------------------------------

/// Messages the server sends, selected by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Reply to `create_room`: the caller holds seat `1`.
    RoomCreated {
        #[serde(rename = "roomId")]
        room_id: RoomCode,
        #[serde(rename = "playerId")]
        player_id: SeatId,
    },

    /// Reply to a successful `join_room`: the caller holds seat `2`.
    RoomJoined {
        #[serde(rename = "playerId")]
        player_id: SeatId,
        #[serde(rename = "gameState")]
        game_state: GameState,
    },

    /// Sent to seat `1` when seat `2` joins; carries the same snapshot
    /// the joiner received.
    PlayerJoined {
        #[serde(rename = "gameState")]
        game_state: GameState,
    },

    /// The post-move snapshot, broadcast identically to both seats.
    GameUpdate {
        #[serde(rename = "gameState")]
        game_state: GameState,
    },

    /// Sent to the remaining seat when the other one vacates.
    PlayerDisconnected,

    /// A request was rejected; room state is unaffected.
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================
