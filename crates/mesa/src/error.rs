//! Unified error type for the Mesa server.

use mesa_transport::TransportError;

/// Top-level error for running the broker.
///
/// Room and protocol failures never show up here: the dispatcher turns
/// them into advisory notices to the offending connection (or swallows
/// them), so the only things that can fail the server are the transport
/// and the broker task itself going away.
#[derive(Debug, thiserror::Error)]
pub enum MesaError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The broker task stopped; no more events can be delivered.
    #[error("broker task stopped")]
    BrokerClosed,
}
