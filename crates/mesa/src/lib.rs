//! # Mesa
//!
//! Real-time session broker for a four-seat truco table: ephemeral
//! rooms, fixed seating, state broadcasts, and opaque relay of game
//! actions between seated players. Game rules live on the clients; the
//! broker coordinates who sits where and forwards everything else
//! verbatim.
//!
//! All room state is owned by a single broker task ([`spawn_broker`])
//! that drains events one at a time, so every seating operation is
//! atomic without locks. [`MesaServer`] wires that task to a WebSocket
//! listener.

mod broker;
mod error;
mod handler;
mod server;

pub use broker::{spawn_broker, BrokerHandle, OutboundSender};
pub use error::MesaError;
pub use server::MesaServer;
