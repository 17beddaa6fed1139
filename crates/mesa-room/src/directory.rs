//! The room directory: owns every active room.
//!
//! Room ids come from the bounded namespace 1..=10 and are recycled —
//! creating always picks the LOWEST free number, so destroying `room_2`
//! makes the next creation yield `room_2` again. The directory also
//! keeps the connection → room index that replaces scanning every
//! roster on reverse lookups; it is updated on every join and removal
//! and is the source of truth for "this connection is in at most one
//! room system-wide".

use std::collections::{BTreeMap, HashMap};

use mesa_protocol::{RoomId, RoomSummary};
use mesa_transport::ConnectionId;

use crate::room::{Room, SeatVacated};
use crate::RoomError;

/// Maximum number of concurrent rooms, and the top of the id namespace.
pub const MAX_ROOMS: usize = 10;

/// What a full departure (disconnect) did, for the dispatcher to
/// broadcast about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// The room the connection was a member of.
    pub room_id: RoomId,
    /// Present if the connection was seated.
    pub vacated: Option<SeatVacated>,
    /// True when the departure emptied the roster and the room was
    /// destroyed (its id is already free again).
    pub room_destroyed: bool,
}

/// Owns all active rooms and the connection → room index.
///
/// Not thread-safe by design: a single broker task owns the directory
/// and funnels every event through it one at a time, which is what
/// makes each operation atomic.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    /// Active rooms, ordered by id so list snapshots come out sorted.
    rooms: BTreeMap<RoomId, Room>,
    /// Where each connection is. One entry per joined connection.
    index: HashMap<ConnectionId, RoomId>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a room under the lowest unused id in 1..=10.
    pub fn create(&mut self) -> Result<RoomId, RoomError> {
        if self.rooms.len() >= MAX_ROOMS {
            return Err(RoomError::CapacityReached);
        }
        let id = (1..=MAX_ROOMS as u8)
            .map(RoomId)
            .find(|id| !self.rooms.contains_key(id))
            .expect("fewer than MAX_ROOMS rooms leaves a free id");
        self.rooms.insert(id, Room::new(id));
        tracing::info!(room = %id, "room created");
        Ok(id)
    }

    /// Deletes a room and its index entries. Idempotent.
    pub fn remove_room(&mut self, id: RoomId) {
        if self.rooms.remove(&id).is_some() {
            self.index.retain(|_, rid| *rid != id);
            tracing::info!(room = %id, "room destroyed");
        }
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    /// Reverse lookup: the room this connection is a member of.
    pub fn room_of(&self, conn: ConnectionId) -> Option<RoomId> {
        self.index.get(&conn).copied()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// The global room list, ordered by id.
    pub fn snapshot(&self) -> Vec<RoomSummary> {
        self.rooms.values().map(Room::summary).collect()
    }

    /// Adds a connection to a room's roster, unseated.
    ///
    /// Duplicate joins are rejected: one roster entry per connection,
    /// in one room, system-wide.
    pub fn join(
        &mut self,
        room_id: RoomId,
        conn: ConnectionId,
        name: String,
        avatar_id: u32,
    ) -> Result<(), RoomError> {
        if self.index.contains_key(&conn) {
            return Err(RoomError::AlreadyJoined(conn));
        }
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        room.join(conn, name, avatar_id);
        self.index.insert(conn, room_id);
        tracing::info!(room = %room_id, %conn, "joined roster");
        Ok(())
    }

    /// Seats a connection at `slot` in the addressed room.
    pub fn sit(
        &mut self,
        room_id: RoomId,
        conn: ConnectionId,
        slot: usize,
    ) -> Result<(), RoomError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        room.sit(conn, slot)?;
        tracing::debug!(room = %room_id, %conn, slot, "seated");
        Ok(())
    }

    /// Stands a connection up, keeping it in the roster.
    ///
    /// `Ok(None)` when the connection wasn't seated (or wasn't even a
    /// member) — a benign no-op per the error model.
    pub fn leave_seat(
        &mut self,
        room_id: RoomId,
        conn: ConnectionId,
    ) -> Result<Option<SeatVacated>, RoomError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        Ok(room.leave_seat(conn))
    }

    /// Marks the addressed room as started.
    pub fn request_start(
        &mut self,
        room_id: RoomId,
        conn: ConnectionId,
    ) -> Result<(), RoomError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        room.request_start(conn)
    }

    /// Full departure on disconnect.
    ///
    /// Safe to call for any connection, including ones that never
    /// joined a room (returns `None`, touches nothing). If the
    /// departure empties the roster the room is destroyed on the spot
    /// and its id freed.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Option<Departure> {
        let room_id = self.index.remove(&conn)?;
        let room = self.rooms.get_mut(&room_id)?;
        let vacated = room.remove(conn)?;

        let room_destroyed = room.is_empty();
        if room_destroyed {
            self.rooms.remove(&room_id);
            tracing::info!(room = %room_id, "room destroyed");
        }
        tracing::info!(room = %room_id, %conn, "left roster");

        Some(Departure {
            room_id,
            vacated,
            room_destroyed,
        })
    }
}
