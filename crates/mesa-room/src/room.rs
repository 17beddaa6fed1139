//! A single room: four fixed seats plus a roster.
//!
//! Seat entries are back-references (connection handles); the
//! participant itself lives in the roster. The two views must always
//! agree: `seats[i] == Some(c)` iff the roster entry for `c` has
//! `seat == Some(i)`, and `seated_count()` is derived from the seat
//! array rather than stored, so it cannot drift.

use mesa_protocol::{RoomId, RoomSummary, SeatMap, SeatView, SEAT_COUNT};
use mesa_transport::ConnectionId;

use crate::RoomError;

/// One roster entry: a connection that joined the room, seated or not.
///
/// `name` and `avatar_id` are client-asserted and untrusted; the broker
/// only echoes them back in seat views.
#[derive(Debug, Clone)]
pub struct Participant {
    pub conn: ConnectionId,
    pub name: String,
    pub avatar_id: u32,
    /// `None` while standing (spectating).
    pub seat: Option<usize>,
}

/// What `leave_seat` (or the seated half of a removal) did, so the
/// dispatcher can broadcast about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatVacated {
    /// The seat index that was cleared.
    pub slot: usize,
    /// Display name of the participant who stood up.
    pub name: String,
    /// Whether the room's game had already started. When true the
    /// dispatcher forwards a `player_disco` notice; whether the round
    /// survives is the clients' decision, not the broker's.
    pub mid_game: bool,
}

/// One table: id, display name, seats, roster, and the started flag.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    name: String,
    seats: [Option<ConnectionId>; SEAT_COUNT],
    roster: Vec<Participant>,
    started: bool,
}

impl Room {
    pub(crate) fn new(id: RoomId) -> Self {
        Self {
            id,
            name: format!("Mesa {}", id.0),
            seats: [None; SEAT_COUNT],
            roster: Vec::new(),
            started: false,
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a round has been started at this table.
    pub fn started(&self) -> bool {
        self.started
    }

    /// Number of occupied seats. Spectators don't count.
    pub fn seated_count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    /// True once the roster has no entries at all; the directory
    /// destroys the room the moment this becomes true.
    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    /// Every connection in the room, seated or standing.
    pub fn members(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.roster.iter().map(|p| p.conn)
    }

    fn participant(&self, conn: ConnectionId) -> Option<&Participant> {
        self.roster.iter().find(|p| p.conn == conn)
    }

    fn participant_mut(
        &mut self,
        conn: ConnectionId,
    ) -> Option<&mut Participant> {
        self.roster.iter_mut().find(|p| p.conn == conn)
    }

    pub fn contains(&self, conn: ConnectionId) -> bool {
        self.participant(conn).is_some()
    }

    /// Appends an unseated participant. The directory has already
    /// verified the connection isn't a member anywhere, so this cannot
    /// produce a duplicate roster entry.
    pub(crate) fn join(
        &mut self,
        conn: ConnectionId,
        name: String,
        avatar_id: u32,
    ) {
        self.roster.push(Participant {
            conn,
            name,
            avatar_id,
            seat: None,
        });
    }

    /// Seats a participant at `slot`.
    ///
    /// If they were seated elsewhere at this table, the old seat is
    /// vacated first — a participant never holds two seats, and no
    /// intermediate state escapes because the caller serializes events.
    /// Taking the seat you already occupy is `SeatOccupied`, matching
    /// the occupancy check's behavior upstream.
    pub(crate) fn sit(
        &mut self,
        conn: ConnectionId,
        slot: usize,
    ) -> Result<(), RoomError> {
        if slot >= SEAT_COUNT {
            return Err(RoomError::InvalidSeat(slot));
        }
        if self.seats[slot].is_some() {
            return Err(RoomError::SeatOccupied(slot));
        }
        let Some(pos) = self.roster.iter().position(|p| p.conn == conn)
        else {
            return Err(RoomError::NotInRoom(conn));
        };

        if let Some(old) = self.roster[pos].seat.take() {
            self.seats[old] = None;
        }
        self.roster[pos].seat = Some(slot);
        self.seats[slot] = Some(conn);
        Ok(())
    }

    /// Clears a participant's seat, keeping them in the roster.
    ///
    /// Returns `None` when they weren't seated — a benign no-op, never
    /// an error surfaced to the client.
    pub(crate) fn leave_seat(
        &mut self,
        conn: ConnectionId,
    ) -> Option<SeatVacated> {
        let started = self.started;
        let p = self.participant_mut(conn)?;
        let slot = p.seat.take()?;
        let name = p.name.clone();
        self.seats[slot] = None;
        Some(SeatVacated {
            slot,
            name,
            mid_game: started,
        })
    }

    /// Removes a participant entirely: vacate their seat if any, then
    /// drop the roster entry. Returns what happened, or `None` if the
    /// connection was never a member.
    pub(crate) fn remove(
        &mut self,
        conn: ConnectionId,
    ) -> Option<Option<SeatVacated>> {
        let pos = self.roster.iter().position(|p| p.conn == conn)?;
        let vacated = self.leave_seat(conn);
        self.roster.remove(pos);
        Some(vacated)
    }

    /// Flips the started flag. Only honored when all four seats are
    /// taken and the requester is one of the seated four.
    pub(crate) fn request_start(
        &mut self,
        conn: ConnectionId,
    ) -> Result<(), RoomError> {
        let Some(p) = self.participant(conn) else {
            return Err(RoomError::NotInRoom(conn));
        };
        if p.seat.is_none() {
            return Err(RoomError::NotSeated(conn));
        }
        if self.seated_count() != SEAT_COUNT {
            return Err(RoomError::NotReady(self.id));
        }
        self.started = true;
        tracing::info!(room = %self.id, "game started");
        Ok(())
    }

    /// Seat state as broadcast in `update_players` and `room_state`.
    pub fn seat_views(&self) -> SeatMap {
        let mut views: SeatMap = Default::default();
        for (slot, seat) in self.seats.iter().enumerate() {
            let Some(conn) = seat else { continue };
            if let Some(p) = self.participant(*conn) {
                views[slot] = Some(SeatView {
                    id: p.conn,
                    name: p.name.clone(),
                    avatar_id: p.avatar_id,
                    slot,
                });
            }
        }
        views
    }

    /// This room's row in the global list.
    pub fn summary(&self) -> RoomSummary {
        let count = self.seated_count();
        RoomSummary {
            id: self.id,
            name: self.name.clone(),
            count,
            full: count >= SEAT_COUNT,
        }
    }
}
