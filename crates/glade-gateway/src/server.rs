//! Gateway HTTP server lifecycle management.
//!
//! [`start_server`] binds a TCP listener and serves the router until the
//! process terminates; [`spawn_server`] binds eagerly (so bind errors
//! surface at startup) and then serves on a background task, which is how
//! the engine runs it alongside the scheduler.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use crate::router::build_router;
use crate::state::GatewayState;

/// Configuration for the gateway server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
        }
    }
}

/// Errors that can occur when starting or running the gateway server.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

/// Bind and serve in the current task until the process terminates.
///
/// # Errors
///
/// Returns [`GatewayError::Bind`] if the listener cannot bind, or
/// [`GatewayError::Serve`] on a fatal I/O error.
pub async fn start_server(config: &ServerConfig, state: Arc<GatewayState>) -> Result<(), GatewayError> {
    let listener = bind(config).await?;
    serve(listener, state).await
}

/// Bind eagerly, then serve on a spawned background task.
///
/// # Errors
///
/// Returns [`GatewayError::Bind`] if the listener cannot bind.
pub async fn spawn_server(
    config: &ServerConfig,
    state: Arc<GatewayState>,
) -> Result<JoinHandle<Result<(), GatewayError>>, GatewayError> {
    let listener = bind(config).await?;
    Ok(tokio::spawn(serve(listener, state)))
}

/// Resolve and bind the configured address.
async fn bind(config: &ServerConfig) -> Result<TcpListener, GatewayError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| GatewayError::Bind(format!("invalid address: {e}")))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| GatewayError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, "Gateway server listening");
    Ok(listener)
}

/// Run the Axum server over an already-bound listener.
async fn serve(listener: TcpListener, state: Arc<GatewayState>) -> Result<(), GatewayError> {
    let router = build_router(state);
    axum::serve(listener, router)
        .await
        .map_err(|e| GatewayError::Serve(format!("serve error: {e}")))
}
