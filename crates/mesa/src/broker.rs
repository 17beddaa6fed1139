//! The broker actor: a single Tokio task that owns all room state.
//!
//! Every inbound event from every connection funnels through one mpsc
//! channel into this task, which processes commands strictly one at a
//! time to completion. That single serialization point is what makes
//! each seating operation atomic — there is no locking anywhere in the
//! room model. Outbound broadcasts are fire-and-forget sends into
//! per-connection unbounded channels and never block the actor.

use std::collections::HashMap;

use mesa_protocol::{ClientEvent, RoomId, ServerEvent};
use mesa_room::{RoomDirectory, RoomError};
use mesa_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::MesaError;

/// Default command channel size for the broker task.
const DEFAULT_CHANNEL_SIZE: usize = 256;

/// Channel sender for delivering outbound events to one connection's
/// writer task.
pub type OutboundSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to the broker through its channel.
enum BrokerCommand {
    /// A new connection is live; register its outbound channel.
    Connect {
        conn: ConnectionId,
        sender: OutboundSender,
    },
    /// A decoded inbound event from a connection.
    Event {
        conn: ConnectionId,
        event: ClientEvent,
    },
    /// The transport reported the connection closed. Always the last
    /// command for a given connection.
    Disconnect { conn: ConnectionId },
}

/// Handle to the running broker task. Cheap to clone — one per
/// connection handler.
#[derive(Clone)]
pub struct BrokerHandle {
    sender: mpsc::Sender<BrokerCommand>,
}

impl BrokerHandle {
    /// Registers a connection and its outbound channel.
    pub async fn connect(
        &self,
        conn: ConnectionId,
        sender: OutboundSender,
    ) -> Result<(), MesaError> {
        self.sender
            .send(BrokerCommand::Connect { conn, sender })
            .await
            .map_err(|_| MesaError::BrokerClosed)
    }

    /// Delivers one inbound event.
    pub async fn event(
        &self,
        conn: ConnectionId,
        event: ClientEvent,
    ) -> Result<(), MesaError> {
        self.sender
            .send(BrokerCommand::Event { conn, event })
            .await
            .map_err(|_| MesaError::BrokerClosed)
    }

    /// Reports a closed connection.
    pub async fn disconnect(
        &self,
        conn: ConnectionId,
    ) -> Result<(), MesaError> {
        self.sender
            .send(BrokerCommand::Disconnect { conn })
            .await
            .map_err(|_| MesaError::BrokerClosed)
    }
}

/// Spawns the broker task and returns a handle to it.
pub fn spawn_broker() -> BrokerHandle {
    let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);
    let broker = Broker {
        directory: RoomDirectory::new(),
        connections: HashMap::new(),
        receiver: rx,
    };
    tokio::spawn(broker.run());
    BrokerHandle { sender: tx }
}

/// The actor state. Lives inside the broker task only.
struct Broker {
    directory: RoomDirectory,
    /// Outbound channels for every live connection, in a room or not.
    connections: HashMap<ConnectionId, OutboundSender>,
    receiver: mpsc::Receiver<BrokerCommand>,
}

impl Broker {
    async fn run(mut self) {
        tracing::info!("broker started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                BrokerCommand::Connect { conn, sender } => {
                    self.handle_connect(conn, sender);
                }
                BrokerCommand::Event { conn, event } => {
                    self.handle_event(conn, event);
                }
                BrokerCommand::Disconnect { conn } => {
                    self.handle_disconnect(conn);
                }
            }
        }

        tracing::info!("broker stopped");
    }

    fn handle_connect(&mut self, conn: ConnectionId, sender: OutboundSender) {
        self.connections.insert(conn, sender);
        tracing::debug!(%conn, total = self.connections.len(), "connected");
        // The newcomer gets the current room list right away.
        self.send_to(
            conn,
            ServerEvent::RoomListUpdate {
                rooms: self.directory.snapshot(),
            },
        );
    }

    /// Disconnect-triggered cleanup. Unconditionally safe: for a
    /// connection that never joined a room this only drops the
    /// outbound channel.
    fn handle_disconnect(&mut self, conn: ConnectionId) {
        self.connections.remove(&conn);

        let Some(dep) = self.directory.disconnect(conn) else {
            tracing::debug!(%conn, "disconnected (no room)");
            return;
        };

        if !dep.room_destroyed {
            if dep.vacated.is_some() {
                self.broadcast_seats(dep.room_id);
            }
            if let Some(v) = dep.vacated.filter(|v| v.mid_game) {
                self.broadcast_room(
                    dep.room_id,
                    ServerEvent::PlayerDisco {
                        slot: v.slot,
                        name: v.name,
                    },
                );
            }
        }
        self.broadcast_room_list();
    }

    fn handle_event(&mut self, conn: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::CreateRoom { player_name } => {
                match self.directory.create() {
                    Ok(room_id) => {
                        tracing::info!(
                            %conn,
                            player = %player_name,
                            room = %room_id,
                            "created room"
                        );
                        self.send_to(
                            conn,
                            ServerEvent::RoomCreated { room_id },
                        );
                        self.broadcast_room_list();
                    }
                    Err(e) => {
                        self.send_to(
                            conn,
                            ServerEvent::RoomError {
                                message: e.to_string(),
                            },
                        );
                    }
                }
            }

            ClientEvent::JoinRoom {
                room_id,
                player_name,
                avatar_id,
            } => {
                match self.directory.join(
                    room_id,
                    conn,
                    player_name,
                    avatar_id,
                ) {
                    Ok(()) => {
                        let room = self
                            .directory
                            .room(room_id)
                            .expect("joined room exists");
                        self.send_to(
                            conn,
                            ServerEvent::RoomState {
                                room_id,
                                room_name: room.name().to_string(),
                                seats: room.seat_views(),
                                self_handle: conn,
                            },
                        );
                    }
                    Err(e) => {
                        self.send_to(
                            conn,
                            ServerEvent::RoomError {
                                message: e.to_string(),
                            },
                        );
                    }
                }
            }

            ClientEvent::SitDown { room_id, slot } => {
                match self.directory.sit(room_id, conn, slot) {
                    Ok(()) => {
                        self.broadcast_seats(room_id);
                        self.broadcast_room_list();
                    }
                    Err(
                        e @ (RoomError::SeatOccupied(_)
                        | RoomError::InvalidSeat(_)),
                    ) => {
                        self.send_to(
                            conn,
                            ServerEvent::SitError {
                                message: e.to_string(),
                            },
                        );
                    }
                    Err(e) => {
                        // Unknown room or not a member: nothing to
                        // report back, matching the original protocol.
                        tracing::debug!(%conn, error = %e, "sit ignored");
                    }
                }
            }

            ClientEvent::LeaveSeat { room_id } => {
                match self.directory.leave_seat(room_id, conn) {
                    Ok(Some(vacated)) => {
                        self.broadcast_seats(room_id);
                        self.broadcast_room_list();
                        if vacated.mid_game {
                            self.broadcast_room(
                                room_id,
                                ServerEvent::PlayerDisco {
                                    slot: vacated.slot,
                                    name: vacated.name,
                                },
                            );
                        }
                    }
                    // Not seated, or room unknown: benign no-ops.
                    Ok(None) => {}
                    Err(e) => {
                        tracing::debug!(%conn, error = %e, "leave ignored");
                    }
                }
            }

            ClientEvent::RequestStartGame { room_id } => {
                match self.directory.request_start(room_id, conn) {
                    Ok(()) => {
                        self.broadcast_room(
                            room_id,
                            ServerEvent::RemoteGameStart,
                        );
                    }
                    // Not ready / not seated / unknown room: silent,
                    // so the client UI stays quiet until the table
                    // actually fills.
                    Err(e) => {
                        tracing::debug!(%conn, error = %e, "start ignored");
                    }
                }
            }

            ClientEvent::DistribuirCartas { data } => {
                self.relay(conn, ServerEvent::RemoteDistribuirCartas {
                    data,
                });
            }
            ClientEvent::JogarCarta { data } => {
                self.relay(conn, ServerEvent::RemoteJogarCarta { data });
            }
            ClientEvent::TrucoAction { data } => {
                self.relay(conn, ServerEvent::RemoteTrucoAction { data });
            }
        }
    }

    /// Forwards an action to every OTHER member of the sender's room,
    /// payload untouched. Senders without a room are ignored.
    fn relay(&self, conn: ConnectionId, event: ServerEvent) {
        let Some(room_id) = self.directory.room_of(conn) else {
            tracing::debug!(%conn, "relay from connection with no room");
            return;
        };
        self.broadcast_room_except(room_id, conn, event);
    }

    // -- Broadcast helpers ------------------------------------------------

    /// Sends to one connection. Silently drops if the receiver is gone
    /// (the writer task died first; the Disconnect command is coming).
    fn send_to(&self, conn: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.connections.get(&conn) {
            let _ = sender.send(event);
        }
    }

    /// Sends to every roster member of a room, seated or not.
    fn broadcast_room(&self, room_id: RoomId, event: ServerEvent) {
        let Some(room) = self.directory.room(room_id) else { return };
        for member in room.members() {
            self.send_to(member, event.clone());
        }
    }

    fn broadcast_room_except(
        &self,
        room_id: RoomId,
        except: ConnectionId,
        event: ServerEvent,
    ) {
        let Some(room) = self.directory.room(room_id) else { return };
        for member in room.members().filter(|m| *m != except) {
            self.send_to(member, event.clone());
        }
    }

    /// Current seat state of a room, to the whole room.
    fn broadcast_seats(&self, room_id: RoomId) {
        let Some(room) = self.directory.room(room_id) else { return };
        let event = ServerEvent::UpdatePlayers {
            seats: room.seat_views(),
        };
        for member in room.members() {
            self.send_to(member, event.clone());
        }
    }

    /// The global room list, to every live connection.
    fn broadcast_room_list(&self) {
        let event = ServerEvent::RoomListUpdate {
            rooms: self.directory.snapshot(),
        };
        for sender in self.connections.values() {
            let _ = sender.send(event.clone());
        }
    }
}
