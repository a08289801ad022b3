//! Error types for the room layer.

use copa_protocol::RoomCode;

/// Errors that can occur during room and registry operations.
///
/// Unauthorized moves are deliberately absent: a move from the wrong seat
/// is dropped inside the room without surfacing an error (the update
/// broadcast simply doesn't happen).
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// Seat 2 has already been claimed for this room.
    #[error("room {0} is full")]
    Full(RoomCode),

    /// The registry is at its configured maximum number of live rooms.
    #[error("room capacity exceeded")]
    CapacityExceeded,

    /// The room's command channel is closed (room is shutting down).
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}
