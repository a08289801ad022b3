//! Per-connection protocol dispatcher.
//!
//! One [`Dispatcher`] exists per connection. It parses inbound frames,
//! routes them to the registry or the connection's room, and pushes every
//! outbound message — replies and broadcasts alike — through the
//! connection's seat channel. The lifecycle is an explicit state value
//! rather than handler-local variables, so tests drive it without a live
//! transport.

use std::fmt;
use std::sync::Arc;

use copa_protocol::{ClientMessage, Codec, RoomCode, SeatId, ServerMessage};
use copa_room::{RoomError, RoomHandle, RoomRegistry, Rules, SeatSender};

/// Where a connection stands in its lifecycle.
///
/// ```text
/// Unidentified ──create_room / join_room──▶ Seated ──disconnect──▶ Closed
///       │                                                            ▲
///       └───────────────────disconnect───────────────────────────────┘
/// ```
pub enum ConnPhase {
    /// No room or seat yet; only `create_room` and `join_room` progress.
    Unidentified,
    /// Bound to one seat of one room. The handle is cached here so
    /// gameplay messages skip the registry entirely.
    Seated {
        code: RoomCode,
        seat: SeatId,
        room: RoomHandle,
    },
    /// Terminal; every further frame is ignored.
    Closed,
}

impl ConnPhase {
    /// Returns the bound seat, if seated.
    pub fn seat(&self) -> Option<SeatId> {
        match self {
            Self::Seated { seat, .. } => Some(*seat),
            _ => None,
        }
    }

    /// Returns the bound room code, if seated.
    pub fn room_code(&self) -> Option<&RoomCode> {
        match self {
            Self::Seated { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Returns `true` once the connection has reached its terminal state.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Debug for ConnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unidentified => f.write_str("Unidentified"),
            Self::Seated { code, seat, .. } => f
                .debug_struct("Seated")
                .field("code", code)
                .field("seat", seat)
                .finish(),
            Self::Closed => f.write_str("Closed"),
        }
    }
}

/// The per-connection state machine.
pub struct Dispatcher<R: Rules, C: Codec> {
    registry: Arc<RoomRegistry<R>>,
    codec: C,
    outbound: SeatSender,
    phase: ConnPhase,
}

impl<R: Rules, C: Codec> Dispatcher<R, C> {
    /// Creates a dispatcher for one connection whose outbound messages go
    /// through `outbound`.
    pub fn new(
        registry: Arc<RoomRegistry<R>>,
        codec: C,
        outbound: SeatSender,
    ) -> Self {
        Self {
            registry,
            codec,
            outbound,
            phase: ConnPhase::Unidentified,
        }
    }

    /// Returns the current lifecycle phase.
    pub fn phase(&self) -> &ConnPhase {
        &self.phase
    }

    /// Processes one inbound frame.
    ///
    /// Malformed or out-of-phase frames produce an `error` event for this
    /// connection and leave every room untouched.
    pub async fn dispatch(&mut self, frame: &str) {
        if self.phase.is_closed() {
            return;
        }

        let msg = match self.codec.decode::<ClientMessage>(frame) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed frame");
                self.reply_error("Malformed message");
                return;
            }
        };

        match msg {
            ClientMessage::CreateRoom => self.handle_create().await,
            ClientMessage::JoinRoom { room_id } => {
                self.handle_join(room_id).await;
            }
            ClientMessage::MakeMove { payload } => {
                self.handle_move(payload).await;
            }
        }
    }

    /// Runs the disconnect transition: vacates the seat if seated, then
    /// moves to `Closed`. Safe to call more than once.
    pub async fn close(&mut self) {
        if let ConnPhase::Seated { code, seat, .. } = &self.phase {
            self.registry.vacate(code, *seat).await;
        }
        self.phase = ConnPhase::Closed;
    }

    async fn handle_create(&mut self) {
        if matches!(self.phase, ConnPhase::Seated { .. }) {
            self.reply_error("Already in a room");
            return;
        }

        match self.registry.create_room(self.outbound.clone()).await {
            Ok((code, room)) => {
                self.reply(ServerMessage::RoomCreated {
                    room_id: code.clone(),
                    player_id: SeatId::One,
                });
                self.phase = ConnPhase::Seated {
                    code,
                    seat: SeatId::One,
                    room,
                };
            }
            Err(RoomError::CapacityExceeded) => {
                self.reply_error("Server is at capacity");
            }
            Err(e) => {
                tracing::warn!(error = %e, "room creation failed");
                self.reply_error("Could not create room");
            }
        }
    }

    async fn handle_join(&mut self, room_id: RoomCode) {
        if matches!(self.phase, ConnPhase::Seated { .. }) {
            self.reply_error("Already in a room");
            return;
        }

        match self
            .registry
            .join_room(&room_id, self.outbound.clone())
            .await
        {
            Ok((seat, game_state, room)) => {
                self.reply(ServerMessage::RoomJoined {
                    player_id: seat,
                    game_state,
                });
                self.phase = ConnPhase::Seated {
                    code: room_id,
                    seat,
                    room,
                };
            }
            Err(RoomError::NotFound(_)) => {
                self.reply_error("Room not found");
            }
            Err(RoomError::Full(_)) => {
                self.reply_error("Room is full");
            }
            Err(e) => {
                tracing::warn!(error = %e, code = %room_id, "join failed");
                self.reply_error("Could not join room");
            }
        }
    }

    async fn handle_move(&mut self, payload: copa_protocol::OpaquePayload) {
        let ConnPhase::Seated { seat, room, .. } = &self.phase else {
            self.reply_error("Not in a room");
            return;
        };

        // The room gate-keeps the turn; rejections stay silent here.
        if let Err(e) = room.submit_move(*seat, payload).await {
            tracing::debug!(error = %e, "move dropped, room gone");
        }
    }

    fn reply(&self, msg: ServerMessage) {
        // A dead outbound channel means the connection is already being
        // torn down; the disconnect path handles the rest.
        let _ = self.outbound.send(msg);
    }

    fn reply_error(&self, message: &str) {
        self.reply(ServerMessage::Error {
            message: message.to_string(),
        });
    }
}
