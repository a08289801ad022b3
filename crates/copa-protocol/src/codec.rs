//! Codec trait and implementations for the wire format.
//!
//! The coordinator talks to clients in text frames, so a codec here
//! converts between message types and `String`s rather than byte buffers.
//! [`JsonCodec`] is the format the shipped clients speak; the trait exists
//! so tests (and any future binary transport) can swap it out.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes messages to wire text and decodes wire text back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a wire frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a wire frame back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the frame is malformed,
    /// truncated, or doesn't match the expected shape.
    fn decode<T: DeserializeOwned>(
        &self,
        frame: &str,
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON via `serde_json`.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        frame: &str,
    ) -> Result<T, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use crate::{ClientMessage, ServerMessage};

    use super::*;

    #[test]
    fn test_json_codec_round_trips_client_messages() {
        let codec = JsonCodec;
        let msg = ClientMessage::CreateRoom;
        let frame = codec.encode(&msg).unwrap();
        let decoded: ClientMessage = codec.decode(&frame).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_json_codec_round_trips_server_messages() {
        let codec = JsonCodec;
        let msg = ServerMessage::PlayerDisconnected;
        let frame = codec.encode(&msg).unwrap();
        let decoded: ServerMessage = codec.decode(&frame).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_json_codec_decode_garbage_is_an_error() {
        let codec = JsonCodec;
        let result: Result<ClientMessage, _> = codec.decode("not json");
        assert!(result.is_err());
    }
}
