//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The coordinator never calls `serde_json` directly; it holds something
//! that implements [`Codec`]. The matchmaking service speaks JSON today, so
//! [`JsonCodec`] is the only implementation.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because the codec lives inside the coordinator
/// task for the lifetime of the process.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use arenalink_protocol::{Codec, InboundMessage, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = br#"{"type":"queue_cancelled","message":"bye"}"#;
///
/// let msg: InboundMessage = codec.decode(bytes).unwrap();
/// assert_eq!(
///     msg,
///     InboundMessage::QueueCancelled { message: Some("bye".into()) }
/// );
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{InboundMessage, OutboundMessage, ParticipantId};

    #[test]
    fn test_encode_outbound_is_utf8_json() {
        let pid = ParticipantId::new_v4();
        let bytes = JsonCodec
            .encode(&OutboundMessage::GetRating { player_uuid: pid })
            .unwrap();
        let text = String::from_utf8(bytes).expect("JSON is UTF-8");
        assert!(text.contains(r#""type":"get_rating""#));
        assert!(text.contains(&pid.to_string()));
    }

    #[test]
    fn test_decode_float_rating_response() {
        let pid = ParticipantId::new_v4();
        let bytes = format!(r#"{{"type":"rating_response","player_uuid":"{pid}","rating":1500.0}}"#);
        let msg: InboundMessage = JsonCodec.decode(bytes.as_bytes()).unwrap();
        assert_eq!(
            msg,
            InboundMessage::RatingResponse {
                player_uuid: pid,
                rating: 1500
            }
        );
    }

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        let result: Result<OutboundMessage, _> = JsonCodec.decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
