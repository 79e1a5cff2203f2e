//! `CantStopServer` builder and accept loop.

use std::sync::Arc;

use cantstop_lobby::{Lobby, LobbyConfig};
use cantstop_protocol::{Codec, JsonCodec};
use cantstop_transport::{Transport, WebSocketTransport};

use crate::CantStopError;
use crate::handler::handle_connection;

/// Address used when none is configured.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Shared state handed to every connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) lobby: Lobby,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a server.
///
/// # Example
///
/// ```rust,ignore
/// let server = CantStopServer::builder()
///     .bind("0.0.0.0:8080")
///     .lobby_config(LobbyConfig { max_rooms: 2, ..LobbyConfig::default() })
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct CantStopServerBuilder {
    bind_addr: String,
    lobby_config: LobbyConfig,
}

impl CantStopServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            lobby_config: LobbyConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the lobby limits.
    pub fn lobby_config(mut self, config: LobbyConfig) -> Self {
        self.lobby_config = config;
        self
    }

    /// Binds the listener. Speaks JSON over WebSocket.
    pub async fn build(self) -> Result<CantStopServer<JsonCodec>, CantStopError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            lobby: Lobby::new(self.lobby_config),
            codec: JsonCodec,
        });

        Ok(CantStopServer { transport, state })
    }
}

impl Default for CantStopServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server, ready to accept connections.
///
/// Call [`run()`](Self::run) to start serving.
pub struct CantStopServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl CantStopServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> CantStopServerBuilder {
        CantStopServerBuilder::new()
    }
}

impl<C: Codec + Clone> CantStopServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop, spawning one handler task per connection.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), CantStopError> {
        match self.transport.local_addr() {
            Ok(addr) => tracing::info!(%addr, "Can't Stop server running"),
            Err(_) => tracing::info!("Can't Stop server running"),
        }

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
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
