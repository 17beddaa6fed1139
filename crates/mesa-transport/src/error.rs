/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listener or accepting a connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The WebSocket handshake with a new client failed.
    #[error("websocket handshake failed: {0}")]
    HandshakeFailed(String),

    /// Sending a frame failed; the peer is effectively gone.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receiving a frame failed mid-stream.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}
