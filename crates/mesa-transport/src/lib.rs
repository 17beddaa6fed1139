//! Transport layer for the Mesa broker.
//!
//! One WebSocket listener, one connection type. The broker never touches
//! sockets directly — it sees [`ConnectionId`]s and strings of JSON. A
//! connection is split once into a read half and a write half so the
//! per-connection reader task and writer task each own their side
//! outright, with no lock around the stream.

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{WsConnection, WsListener, WsReader, WsWriter};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for one transport connection.
///
/// Assigned from a process-global counter on accept and never reused for
/// the lifetime of the process. This is the only identity a participant
/// has — there is no account or session behind it.
///
/// Serializes as a plain number so it can travel inside seat-state
/// payloads (`selfHandle`, seat views).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "alice");
        map.insert(ConnectionId::new(2), "bob");
        assert_eq!(map[&ConnectionId::new(1)], "alice");
    }

    #[test]
    fn test_connection_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&ConnectionId::new(9)).unwrap();
        assert_eq!(json, "9");
    }
}
