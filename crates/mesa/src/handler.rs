//! Per-connection handler: one reader task (this function) and one
//! writer task per socket.
//!
//! The reader decodes text frames into [`ClientEvent`]s and forwards
//! them to the broker; undecodable frames are logged and skipped, never
//! fatal. The writer drains the connection's outbound channel into the
//! socket. When either side ends, the drop guard reports the
//! disconnect — so cleanup runs even if this task panics.

use mesa_protocol::{ClientEvent, Codec};
use mesa_transport::{ConnectionId, WsConnection};
use tokio::sync::mpsc;

use crate::{BrokerHandle, MesaError};

/// Drop guard that reports the disconnect when the handler exits.
///
/// `Drop` is synchronous, so the actual send happens in a spawned
/// fire-and-forget task.
struct DisconnectGuard {
    conn: ConnectionId,
    broker: BrokerHandle,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let conn = self.conn;
        let broker = self.broker.clone();
        tokio::spawn(async move {
            let _ = broker.disconnect(conn).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec + Clone>(
    conn: WsConnection,
    broker: BrokerHandle,
    codec: C,
) -> Result<(), MesaError> {
    let id = conn.id();
    let (mut writer, mut reader) = conn.split();

    let (tx, mut rx) = mpsc::unbounded_channel();
    broker.connect(id, tx).await?;
    let _guard = DisconnectGuard {
        conn: id,
        broker: broker.clone(),
    };

    // Writer task: ends when the broker drops our sender (on
    // disconnect) or the socket dies.
    let writer_codec = codec.clone();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match writer_codec.encode(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(%id, error = %e, "encode failed");
                    continue;
                }
            };
            if writer.send(text).await.is_err() {
                break;
            }
        }
        let _ = writer.close().await;
    });

    // Reader loop.
    loop {
        match reader.recv().await {
            Ok(Some(text)) => match codec.decode::<ClientEvent>(&text) {
                Ok(event) => broker.event(id, event).await?,
                Err(e) => {
                    tracing::debug!(
                        %id,
                        error = %e,
                        "skipping undecodable frame"
                    );
                }
            },
            Ok(None) => {
                tracing::debug!(%id, "connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(%id, error = %e, "recv error");
                break;
            }
        }
    }

    // _guard drops here → disconnect is reported to the broker.
    Ok(())
}
