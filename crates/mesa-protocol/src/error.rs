//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into wire text).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed: malformed JSON, unknown event tag,
    /// missing fields, or wrong field types.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// A room id string that isn't of the form `room_N`.
    #[error("invalid room id: {0:?}")]
    InvalidRoomId(String),
}
