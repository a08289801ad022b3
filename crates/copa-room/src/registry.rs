//! Room registry: the process-wide code → room mapping.
//!
//! The registry is an explicitly owned service object (no globals): the
//! server holds one and hands a reference to each connection's dispatcher,
//! so tests can run any number of independent instances.
//!
//! Locking: the internal mutex guards only the map itself and is never
//! held across a room operation. Per-room ordering comes from each room
//! actor's command channel, so operations on different codes never block
//! each other.

use std::collections::HashMap;
use std::marker::PhantomData;

use copa_protocol::{GameState, RoomCode, SeatId};
use rand::Rng;
use tokio::sync::Mutex;

use crate::room::spawn_room;
use crate::{RegistryConfig, RoomError, RoomHandle, Rules, SeatSender};

/// Room codes are lowercase alphanumeric, matching what players type in.
const CODE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Tracks all live rooms and creates, finds, and reaps them.
pub struct RoomRegistry<R: Rules> {
    rooms: Mutex<HashMap<RoomCode, RoomHandle>>,
    config: RegistryConfig,
    _rules: PhantomData<R>,
}

impl<R: Rules> RoomRegistry<R> {
    /// Creates an empty registry with the given configuration.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            config,
            _rules: PhantomData,
        }
    }

    /// Creates a room with seat 1 bound to `creator`.
    ///
    /// The generated code is unique among live rooms; generation retries
    /// on collision and never overwrites an existing entry.
    ///
    /// # Errors
    /// [`RoomError::CapacityExceeded`] when `max_rooms` rooms are live.
    pub async fn create_room(
        &self,
        creator: SeatSender,
    ) -> Result<(RoomCode, RoomHandle), RoomError> {
        let mut rooms = self.rooms.lock().await;

        if rooms.len() >= self.config.max_rooms {
            tracing::warn!(
                live = rooms.len(),
                max = self.config.max_rooms,
                "room creation rejected: at capacity"
            );
            return Err(RoomError::CapacityExceeded);
        }

        let code = loop {
            let candidate = generate_code(self.config.code_length);
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let handle =
            spawn_room::<R>(code.clone(), creator, self.config.channel_size);
        rooms.insert(code.clone(), handle.clone());

        tracing::info!(%code, live = rooms.len(), "room created");
        Ok((code, handle))
    }

    /// Claims seat 2 in the room with `code`.
    ///
    /// On success, seat 1 has been notified with `player_joined` carrying
    /// the same snapshot returned here.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] for an unknown (or just-closed) code,
    /// [`RoomError::Full`] when seat 2 was already claimed.
    pub async fn join_room(
        &self,
        code: &RoomCode,
        sender: SeatSender,
    ) -> Result<(SeatId, GameState, RoomHandle), RoomError> {
        let handle = {
            let rooms = self.rooms.lock().await;
            rooms
                .get(code)
                .cloned()
                .ok_or_else(|| RoomError::NotFound(code.clone()))?
        };

        // The map lock is released; the room serializes the join against
        // racing moves and vacates. A room that emptied in between reports
        // Unavailable, which is NotFound from the caller's point of view.
        let (seat, state) = handle.join(sender).await.map_err(|e| match e {
            RoomError::Unavailable(c) => RoomError::NotFound(c),
            other => other,
        })?;

        Ok((seat, state, handle))
    }

    /// Detaches `seat` from the room with `code`. Idempotent.
    ///
    /// The remaining occupant (if any) is notified; the room is removed
    /// from the registry when its last seat vacates.
    pub async fn vacate(&self, code: &RoomCode, seat: SeatId) {
        let handle = {
            let rooms = self.rooms.lock().await;
            match rooms.get(code) {
                Some(handle) => handle.clone(),
                None => return,
            }
        };

        let (removed_now, remaining) = handle.vacate(seat).await;

        // Only the vacate that emptied the room reaps the entry, so a
        // reused code can never be deleted by a stale cleanup.
        if removed_now && remaining == 0 {
            let mut rooms = self.rooms.lock().await;
            rooms.remove(code);
            tracing::info!(%code, live = rooms.len(), "room reaped");
        }
    }

    /// Returns the handle for a live room, if any.
    pub async fn handle(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.rooms.lock().await.get(code).cloned()
    }

    /// Returns the number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }
}

/// Generates a random room code of `length` chars from [`CODE_ALPHABET`].
fn generate_code(length: usize) -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect();
    RoomCode::new(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_have_requested_length() {
        assert_eq!(generate_code(6).as_str().len(), 6);
        assert_eq!(generate_code(10).as_str().len(), 10);
    }

    #[test]
    fn test_generated_codes_use_the_alphabet() {
        let code = generate_code(64);
        assert!(code
            .as_str()
            .bytes()
            .all(|b| CODE_ALPHABET.contains(&b)));
    }
}
