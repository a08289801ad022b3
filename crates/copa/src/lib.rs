//! # Copa
//!
//! Real-time session coordinator for two-player, turn-based board games
//! played over persistent WebSocket connections.
//!
//! Copa owns the hard part of such a game — room discovery through short
//! codes, turn gating, state distribution, and disconnect handling — and
//! leaves the game itself to a [`Rules`] collaborator you implement.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use copa::prelude::*;
//!
//! // Implement Rules for your game, then:
//! // let server = CopaServerBuilder::new()
//! //     .bind("0.0.0.0:3000")
//! //     .build::<MyRules>()
//! //     .await?;
//! // server.run().await
//! ```

mod dispatcher;
mod error;
mod handler;
mod server;

pub use dispatcher::{ConnPhase, Dispatcher};
pub use error::CopaError;
pub use server::{CopaServer, CopaServerBuilder};

/// The common imports for building on Copa.
pub mod prelude {
    pub use copa_protocol::{
        ClientMessage, Codec, GameState, JsonCodec, OpaquePayload, RoomCode,
        SeatId, ServerMessage,
    };
    pub use copa_room::{
        RegistryConfig, RoomError, RoomRegistry, Rules, SeatSender,
    };

    pub use crate::{
        ConnPhase, CopaError, CopaServer, CopaServerBuilder, Dispatcher,
    };
}
