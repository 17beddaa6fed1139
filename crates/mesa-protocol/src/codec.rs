//! Codec trait and the JSON implementation.
//!
//! The broker core doesn't care how events become frames — it talks to
//! anything implementing [`Codec`]. JSON is the only wire format the
//! truco client speaks, but keeping the seam makes the broker testable
//! with plain strings and leaves room for a binary codec later.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Converts events to and from wire text.
///
/// `Send + Sync + 'static` because the codec is shared across every
/// connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one wire frame.
    fn encode<T: Serialize>(&self, value: &T)
        -> Result<String, ProtocolError>;

    /// Deserializes one wire frame.
    fn decode<T: DeserializeOwned>(
        &self,
        text: &str,
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] using JSON via `serde_json`, one object per text frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        text: &str,
    ) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}
