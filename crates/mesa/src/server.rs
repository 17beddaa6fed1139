//! The accept loop tying transport, protocol, and broker together.

use std::net::SocketAddr;

use mesa_protocol::JsonCodec;
use mesa_transport::WsListener;

use crate::broker::spawn_broker;
use crate::handler::handle_connection;
use crate::{BrokerHandle, MesaError};

/// A running Mesa broker bound to a WebSocket listener.
pub struct MesaServer {
    listener: WsListener,
    broker: BrokerHandle,
}

impl MesaServer {
    /// Binds the listener and spawns the broker task.
    pub async fn bind(addr: &str) -> Result<Self, MesaError> {
        let listener = WsListener::bind(addr).await?;
        let broker = spawn_broker();
        Ok(Self { listener, broker })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns a handle to the broker, for embedding or tests.
    pub fn broker(&self) -> BrokerHandle {
        self.broker.clone()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Each accepted connection gets its own handler task; a failed
    /// accept is logged and the loop continues.
    pub async fn run(self) -> Result<(), MesaError> {
        tracing::info!("mesa broker running");

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let broker = self.broker.clone();
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, broker, JsonCodec).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
