//! Error types for room and seating operations.
//!
//! Nothing here is fatal: the dispatcher either reports the error back
//! to the one connection that caused it (`room_error` / `sit_error`) or
//! swallows it as a benign no-op (`NotSeated`, `NotReady`). No variant
//! ever tears down a connection or leaves a room half-mutated.

use mesa_protocol::RoomId;
use mesa_transport::ConnectionId;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The directory already holds the maximum number of rooms.
    #[error("room limit reached (max 10), wait for a table to empty")]
    CapacityReached,

    /// No room with this id exists.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The connection already has a roster entry somewhere.
    /// A connection is a member of at most one room system-wide.
    #[error("{0} has already joined a room")]
    AlreadyJoined(ConnectionId),

    /// The target seat is taken.
    #[error("seat {0} is occupied")]
    SeatOccupied(usize),

    /// Seat index outside 0..4.
    #[error("seat {0} does not exist")]
    InvalidSeat(usize),

    /// The connection has no roster entry in the room it addressed.
    #[error("{0} is not in this room")]
    NotInRoom(ConnectionId),

    /// The connection is in the room but not seated.
    #[error("{0} is not seated")]
    NotSeated(ConnectionId),

    /// Start requested without all four seats filled.
    #[error("room {0} does not have four seated players")]
    NotReady(RoomId),
}
