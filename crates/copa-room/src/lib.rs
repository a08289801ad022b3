//! Room lifecycle and turn gating for Copa.
//!
//! Each room runs as an isolated Tokio task (actor model) owning one
//! game state and at most two seats. The [`RoomRegistry`] maps short-lived
//! room codes to running rooms.
//!
//! # Key types
//!
//! - [`Rules`] — the external rules-collaborator seam
//! - [`RoomRegistry`] — creates, finds, and reaps rooms
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RegistryConfig`] — capacity and code-length settings

mod config;
mod error;
mod registry;
mod room;
mod rules;

pub use config::RegistryConfig;
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{RoomHandle, RoomInfo, SeatSender};
pub use rules::Rules;
