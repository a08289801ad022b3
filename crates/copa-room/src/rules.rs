//! The `Rules` trait — the seam between the coordinator and the game.
//!
//! The coordinator decides *who* may move and *where* the result goes; it
//! never computes what a move does. That transformation belongs to an
//! external rules collaborator, reached only through this trait. The
//! coordinator's own tests use deterministic stubs; a real game plugs in
//! its actual rules (see `demos/cup-duel`).

use copa_protocol::{GameState, OpaquePayload, SeatId};

/// Computes game-specific move effects. Opaque to the coordinator.
pub trait Rules: Send + Sync + 'static {
    /// Supplies the rules-defined part of a fresh room's state (board
    /// layout, piece counts, ...). Called once per room at creation.
    fn initial_payload() -> OpaquePayload;

    /// Produces the next state from an accepted move.
    ///
    /// Pure: no I/O, no shared state. The returned value — including the
    /// next `current_turn` and updated `scores` — is authoritative. The
    /// room broadcasts it verbatim and never reinterprets it.
    fn apply_move(
        state: &GameState,
        seat: SeatId,
        payload: &OpaquePayload,
    ) -> GameState;
}
