//! Unified error type for the Copa coordinator.

use copa_protocol::ProtocolError;
use copa_room::RoomError;
use copa_transport::TransportError;

/// Top-level error wrapping each layer's error type.
///
/// The `#[from]` attributes generate the `From` impls that let `?`
/// convert layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CopaError {
    /// A transport-level error (accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not found, full, capacity).
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use copa_protocol::RoomCode;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let copa_err: CopaError = err.into();
        assert!(matches!(copa_err, CopaError::Transport(_)));
        assert!(copa_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let copa_err: CopaError = err.into();
        assert!(matches!(copa_err, CopaError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(RoomCode::new("abc123"));
        let copa_err: CopaError = err.into();
        assert!(matches!(copa_err, CopaError::Room(_)));
        assert!(copa_err.to_string().contains("abc123"));
    }
}
