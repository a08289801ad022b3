//! Room actor: an isolated Tokio task owning one game instance.
//!
//! Each room runs in its own task and is reached only through an mpsc
//! command channel, so every membership or state mutation for a given room
//! is serialized — a move racing a disconnect can never interleave. Rooms
//! never block each other.

use std::collections::HashMap;
use std::marker::PhantomData;

use copa_protocol::{GameState, OpaquePayload, RoomCode, SeatId, ServerMessage};
use tokio::sync::{mpsc, oneshot};

use crate::{RoomError, Rules};

/// Channel sender delivering outbound messages to one seat's connection.
///
/// Unbounded: the room must never wait on a slow peer. The connection's
/// writer task drains this and applies its own send timeout.
pub type SeatSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Claim seat 2 for a new connection.
    Join {
        sender: SeatSender,
        reply: oneshot::Sender<Result<(SeatId, GameState), RoomError>>,
    },

    /// Detach a seat. Replies with whether the seat was occupied and how
    /// many seats remain.
    Vacate {
        seat: SeatId,
        reply: oneshot::Sender<(bool, usize)>,
    },

    /// Deliver a move from a seat (fire-and-forget).
    Move {
        seat: SeatId,
        payload: OpaquePayload,
    },

    /// Request a metadata snapshot.
    Info { reply: oneshot::Sender<RoomInfo> },
}

/// A snapshot of room metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    /// The room's code.
    pub code: RoomCode,
    /// Number of currently occupied seats.
    pub occupied: usize,
    /// Whether seat 2 has ever been claimed.
    pub guest_joined: bool,
    /// The seat allowed to move next.
    pub current_turn: SeatId,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Claims seat 2 for `sender`, returning the seat and a state snapshot.
    pub async fn join(
        &self,
        sender: SeatSender,
    ) -> Result<(SeatId, GameState), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?
    }

    /// Detaches a seat. Idempotent.
    ///
    /// Returns `(removed_now, remaining)`. A closed room reports
    /// `(false, 0)` — the seat is gone either way.
    pub async fn vacate(&self, seat: SeatId) -> (bool, usize) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .sender
            .send(RoomCommand::Vacate {
                seat,
                reply: reply_tx,
            })
            .await
            .is_err()
        {
            return (false, 0);
        }
        reply_rx.await.unwrap_or((false, 0))
    }

    /// Submits a move from `seat` (fire-and-forget).
    ///
    /// Rejections (wrong turn, or fewer than two occupied seats) are
    /// silent: no broadcast happens and no error comes back.
    pub async fn submit_move(
        &self,
        seat: SeatId,
        payload: OpaquePayload,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Move { seat, payload })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Requests the current room metadata.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<R: Rules> {
    code: RoomCode,
    seats: HashMap<SeatId, SeatSender>,
    /// Seat 2 is assigned only once, at the first successful join; a
    /// vacated seat is never re-assigned (no reconnection).
    guest_joined: bool,
    state: GameState,
    receiver: mpsc::Receiver<RoomCommand>,
    _rules: PhantomData<R>,
}

impl<R: Rules> RoomActor<R> {
    /// Processes commands until the last seat vacates.
    async fn run(mut self) {
        tracing::info!(code = %self.code, "room opened");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join { sender, reply } => {
                    let result = self.handle_join(sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Vacate { seat, reply } => {
                    let result = self.handle_vacate(seat);
                    let _ = reply.send(result);
                    if self.seats.is_empty() {
                        break;
                    }
                }
                RoomCommand::Move { seat, payload } => {
                    self.handle_move(seat, payload);
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
            }
        }

        tracing::info!(code = %self.code, "room closed");
    }

    fn handle_join(
        &mut self,
        sender: SeatSender,
    ) -> Result<(SeatId, GameState), RoomError> {
        if self.guest_joined {
            return Err(RoomError::Full(self.code.clone()));
        }

        self.seats.insert(SeatId::Two, sender);
        self.guest_joined = true;
        tracing::info!(code = %self.code, seat = %SeatId::Two, "seat joined");

        // The host learns about the guest with the same snapshot the
        // guest receives.
        self.send_to(
            SeatId::One,
            ServerMessage::PlayerJoined {
                game_state: self.state.clone(),
            },
        );

        Ok((SeatId::Two, self.state.clone()))
    }

    fn handle_vacate(&mut self, seat: SeatId) -> (bool, usize) {
        if self.seats.remove(&seat).is_none() {
            return (false, self.seats.len());
        }

        tracing::info!(
            code = %self.code,
            %seat,
            remaining = self.seats.len(),
            "seat vacated"
        );

        self.send_to(seat.other(), ServerMessage::PlayerDisconnected);

        (true, self.seats.len())
    }

    fn handle_move(&mut self, seat: SeatId, payload: OpaquePayload) {
        if self.seats.len() < 2 {
            tracing::debug!(
                code = %self.code,
                %seat,
                "move rejected: room is not full"
            );
            return;
        }
        if seat != self.state.current_turn {
            tracing::debug!(
                code = %self.code,
                %seat,
                current_turn = %self.state.current_turn,
                "move rejected: not this seat's turn"
            );
            return;
        }

        // The rules collaborator's output is authoritative, next turn and
        // scores included.
        self.state = R::apply_move(&self.state, seat, &payload);

        // One snapshot, cloned to both seats.
        let update = ServerMessage::GameUpdate {
            game_state: self.state.clone(),
        };
        for occupant in [SeatId::One, SeatId::Two] {
            if self.seats.contains_key(&occupant) {
                self.send_to(occupant, update.clone());
            }
        }
    }

    /// Sends a message to one seat. Silently drops if the receiver is
    /// gone — the disconnect path will vacate that seat.
    fn send_to(&self, seat: SeatId, msg: ServerMessage) {
        if let Some(sender) = self.seats.get(&seat) {
            let _ = sender.send(msg);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.code.clone(),
            occupied: self.seats.len(),
            guest_joined: self.guest_joined,
            current_turn: self.state.current_turn,
        }
    }
}

/// Spawns a room actor with seat 1 bound to `creator` and a fresh initial
/// state from the rules collaborator. Returns the handle to talk to it.
pub(crate) fn spawn_room<R: Rules>(
    code: RoomCode,
    creator: SeatSender,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let mut seats = HashMap::new();
    seats.insert(SeatId::One, creator);

    let actor = RoomActor::<R> {
        code: code.clone(),
        seats,
        guest_joined: false,
        state: GameState::initial(R::initial_payload()),
        receiver: rx,
        _rules: PhantomData,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
