//! The `mesa-server` binary: one broker, one listener.

use mesa::{MesaError, MesaServer};

#[tokio::main]
async fn main() -> Result<(), MesaError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let addr = std::env::var("MESA_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3005".to_string());

    let server = MesaServer::bind(&addr).await?;
    if let Ok(local) = server.local_addr() {
        tracing::info!(%local, "listening");
    }
    server.run().await
}
