//! Wire protocol for the Mesa session broker.
//!
//! Every message on the wire is one JSON object per WebSocket text
//! frame, tagged by an `"event"` field. This crate defines:
//!
//! - **Events** ([`ClientEvent`], [`ServerEvent`]) — the closed sets of
//!   inbound and outbound messages.
//! - **Projections** ([`RoomSummary`], [`SeatView`]) — read-only shapes
//!   the broker broadcasts.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — event ↔ text framing.
//! - **Errors** ([`ProtocolError`]).
//!
//! Relay events (`distribuir_cartas`, `jogar_carta`, `truco_action`)
//! carry payloads the broker never interprets: the extra fields of the
//! inbound object are captured as an opaque [`serde_json::Value`] and
//! re-emitted verbatim under the matching `remote_*` event name.
//!
//! The protocol layer knows nothing about rooms or connections — it
//! only converts between Rust events and the wire text.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientEvent, RoomId, RoomSummary, SeatMap, SeatView, ServerEvent,
    SEAT_COUNT,
};

// Re-exported so downstream crates name one handle type consistently.
pub use mesa_transport::ConnectionId;
