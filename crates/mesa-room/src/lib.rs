//! Room lifecycle and seating coordination for the Mesa broker.
//!
//! This crate is the authoritative in-memory model: rooms, their fixed
//! four-seat tables, and the roster of every connection associated with
//! each room. It is deliberately synchronous and I/O-free — all methods
//! mutate plain state and return, so atomicity comes entirely from the
//! caller processing one event at a time (the broker actor one crate up).
//!
//! # Key types
//!
//! - [`RoomDirectory`] — owns every active room, allocates recycled ids
//!   from the bounded 1..=10 namespace, enforces the room cap, and keeps
//!   the connection → room index.
//! - [`Room`] — one table: `[Option<ConnectionId>; 4]` seats plus a
//!   roster of seated and standing participants.
//! - [`Participant`] — one roster entry.
//! - [`RoomError`] — everything that can go wrong, none of it fatal.

mod directory;
mod error;
mod room;

pub use directory::{Departure, RoomDirectory, MAX_ROOMS};
pub use error::RoomError;
pub use room::{Participant, Room, SeatVacated};
