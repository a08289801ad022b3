//! Wire protocol for Copa.
//!
//! This crate defines the "language" clients and the coordinator speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`GameState`],
//!   [`RoomCode`], [`SeatId`]) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those structures are
//!   converted to/from text frames.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing so.
//!
//! The protocol layer sits between transport (raw frames) and the room
//! layer (membership and turn order). It knows nothing about connections
//! or rooms — only how to read and write messages.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, GameState, OpaquePayload, RoomCode, SeatId, ServerMessage,
};
