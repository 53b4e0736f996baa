//! Relay server listener
//!
//! Binds the socket, starts the broadcaster and serves the router until
//! shutdown.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::relay::{Broadcaster, LocationSink, RelayConfig};
use crate::server::config::ServerConfig;
use crate::server::connection::ServerState;
use crate::server::routes::build_router;
use crate::session::LocationHub;

/// Location relay server
pub struct LocationServer<S: LocationSink> {
    config: ServerConfig,
    hub: LocationHub,
    broadcaster: Broadcaster<S>,
}

impl<S: LocationSink> LocationServer<S> {
    /// Create a new server publishing to `sink`
    pub fn new(config: ServerConfig, sink: S) -> Self {
        let relay_config = config.relay_config();
        Self::with_relay_config(config, sink, relay_config)
    }

    /// Create a new server with custom queue and broadcaster settings
    pub fn with_relay_config(config: ServerConfig, sink: S, relay_config: RelayConfig) -> Self {
        let (hub, broadcaster) = LocationHub::new(relay_config, sink);

        Self {
            config,
            hub,
            broadcaster,
        }
    }

    /// Get a handle to the relay
    pub fn hub(&self) -> &LocationHub {
        &self.hub
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Router serving this server's routes
    ///
    /// Fan-out only happens while the server is running; a bare router
    /// still ingests, caches and answers HTTP queries.
    pub fn router(&self) -> Router {
        build_router(ServerState::new(
            self.hub.clone(),
            self.config.outbound_buffer,
            self.config.max_connections,
        ))
    }

    /// Run the server
    ///
    /// This method blocks until the process is killed.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Location relay listening");

        let router = self.router();
        let token = CancellationToken::new();
        let broadcaster = self.broadcaster.spawn(token.clone());

        // Open sockets would hold graceful shutdown forever; release them
        // as soon as the signal arrives.
        let registry = self.hub.registry().clone();
        let signal = async move {
            shutdown.await;
            tracing::info!("Shutdown signal received");
            registry.close_all().await;
        };

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(signal)
            .await;

        token.cancel();
        if let Err(e) = broadcaster.await {
            tracing::error!(error = %e, "Broadcaster task failed");
        }

        tracing::info!("Location relay stopped");
        result.map_err(Into::into)
    }
}
