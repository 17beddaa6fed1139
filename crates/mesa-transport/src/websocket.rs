//! WebSocket listener and connection types over `tokio-tungstenite`.
//!
//! The wire carries one JSON event per text frame, so the API here is
//! string-in/string-out. Binary frames are tolerated and decoded as
//! UTF-8 for lenient clients; everything else (ping/pong) is skipped.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::{ConnectionId, TransportError};

/// Counter for assigning connection handles. Never reset, never reused.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Listens for incoming WebSocket connections.
pub struct WsListener {
    listener: TcpListener,
}

impl WsListener {
    /// Binds the listener to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket listener bound");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts the next connection and completes the WebSocket handshake.
    pub async fn accept(&self) -> Result<WsConnection, TransportError> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| TransportError::HandshakeFailed(e.to_string()))?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %peer, "accepted connection");

        Ok(WsConnection { id, ws })
    }
}

/// A freshly accepted connection, not yet split.
pub struct WsConnection {
    id: ConnectionId,
    ws: WebSocketStream<TcpStream>,
}

impl WsConnection {
    /// Returns the transport-assigned handle for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Splits into independently owned write and read halves.
    pub fn split(self) -> (WsWriter, WsReader) {
        let (sink, stream) = self.ws.split();
        (
            WsWriter { id: self.id, sink },
            WsReader { id: self.id, stream },
        )
    }
}

/// The write half of a connection. Owned by the writer task.
pub struct WsWriter {
    id: ConnectionId,
    sink: SplitSink<WebSocketStream<TcpStream>, Message>,
}

impl WsWriter {
    /// Sends one text frame.
    pub async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    /// Sends a close frame and flushes.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.sink
            .send(Message::Close(None))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

/// The read half of a connection. Owned by the reader task.
pub struct WsReader {
    id: ConnectionId,
    stream: SplitStream<WebSocketStream<TcpStream>>,
}

impl WsReader {
    /// Receives the next text payload.
    ///
    /// Returns `Ok(None)` once the peer has closed the connection.
    /// Control frames are skipped; binary frames are accepted if they
    /// hold valid UTF-8 and dropped otherwise.
    pub async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.to_string()));
                }
                Some(Ok(Message::Binary(data))) => {
                    match String::from_utf8(data.to_vec()) {
                        Ok(text) => return Ok(Some(text)),
                        Err(_) => {
                            tracing::debug!(
                                id = %self.id,
                                "dropping non-UTF-8 binary frame"
                            );
                            continue;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        e.to_string(),
                    ));
                }
            }
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }
}
