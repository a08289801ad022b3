//! `CopaServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → dispatcher → rooms.
//! The registry is owned here and shared with every connection handler —
//! an explicit service object, not a process global, so tests can run any
//! number of independent servers.

use std::sync::Arc;
use std::time::Duration;

use copa_protocol::{Codec, JsonCodec};
use copa_room::{RegistryConfig, RoomRegistry, Rules};
use copa_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::CopaError;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<R: Rules, C: Codec> {
    pub(crate) registry: Arc<RoomRegistry<R>>,
    pub(crate) codec: C,
    pub(crate) send_timeout: Duration,
}

/// Builder for configuring and starting a Copa server.
///
/// # Example
///
/// ```rust,ignore
/// let server = CopaServerBuilder::new()
///     .bind("0.0.0.0:3000")
///     .build::<MyRules>()
///     .await?;
/// server.run().await
/// ```
pub struct CopaServerBuilder {
    bind_addr: String,
    registry_config: RegistryConfig,
    send_timeout: Duration,
}

impl CopaServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            registry_config: RegistryConfig::default(),
            send_timeout: Duration::from_secs(10),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the registry configuration (capacity, code length).
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = config;
        self
    }

    /// Sets how long an outbound send may take before the peer is
    /// considered unreachable and disconnected.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Binds the transport and builds the server with the given rules
    /// collaborator. Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<R: Rules>(
        self,
    ) -> Result<CopaServer<R, JsonCodec>, CopaError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Arc::new(RoomRegistry::new(self.registry_config)),
            codec: JsonCodec,
            send_timeout: self.send_timeout,
        });

        Ok(CopaServer { transport, state })
    }
}

impl Default for CopaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Copa coordinator.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct CopaServer<R: Rules, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<R, C>>,
}

impl<R, C> CopaServer<R, C>
where
    R: Rules,
    C: Codec + Clone,
{
    /// Creates a new builder.
    pub fn builder() -> CopaServerBuilder {
        CopaServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop, spawning one handler task per connection.
    /// Runs until the process is terminated; no accept error is fatal.
    pub async fn run(mut self) -> Result<(), CopaError> {
        tracing::info!("Copa coordinator running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection::<R, C, _>(conn, state).await
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
