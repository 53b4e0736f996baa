//! Server configuration

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::relay::config::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WRITE_TIMEOUT};
use crate::relay::RelayConfig;

/// Default listen port
pub const DEFAULT_PORT: u16 = 9000;

/// Default per-connection outbound queue length
pub const DEFAULT_OUTBOUND_BUFFER: usize = 64;

/// Default external publish channel
pub const DEFAULT_SINK_CHANNEL: &str = "drivers.locations";

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent WebSocket connections (0 = unlimited)
    pub max_connections: usize,

    /// Pending updates between ingestion and fan-out
    pub queue_capacity: usize,

    /// Deadline for one write to one connection
    pub write_timeout: Duration,

    /// Messages buffered per connection ahead of its socket writer
    pub outbound_buffer: usize,

    /// Channel name for the external sink
    pub sink_channel: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            max_connections: 0, // Unlimited
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            sink_channel: DEFAULT_SINK_CHANNEL.to_string(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the update queue capacity (at least 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the write timeout
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the per-connection outbound buffer (at least 1)
    pub fn outbound_buffer(mut self, buffer: usize) -> Self {
        self.outbound_buffer = buffer.max(1);
        self
    }

    /// Set the external sink channel
    pub fn sink_channel(mut self, channel: impl Into<String>) -> Self {
        self.sink_channel = channel.into();
        self
    }

    /// Queue and broadcaster settings derived from this config
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig::default()
            .queue_capacity(self.queue_capacity)
            .write_timeout(self.write_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 9000);
        assert!(config.bind_addr.ip().is_unspecified());
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.write_timeout, Duration::from_secs(3));
        assert_eq!(config.outbound_buffer, 64);
        assert_eq!(config.sink_channel, "drivers.locations");
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:9100".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr.port(), 9100);
    }

    #[test]
    fn test_builder_floors() {
        let config = ServerConfig::default().queue_capacity(0).outbound_buffer(0);

        assert_eq!(config.queue_capacity, 1);
        assert_eq!(config.outbound_buffer, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .max_connections(50)
            .queue_capacity(32)
            .write_timeout(Duration::from_millis(500))
            .outbound_buffer(8)
            .sink_channel("fleet.positions");

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.queue_capacity, 32);
        assert_eq!(config.write_timeout, Duration::from_millis(500));
        assert_eq!(config.outbound_buffer, 8);
        assert_eq!(config.sink_channel, "fleet.positions");
    }

    #[test]
    fn test_relay_config() {
        let relay = ServerConfig::default()
            .queue_capacity(16)
            .write_timeout(Duration::from_secs(1))
            .relay_config();

        assert_eq!(relay.queue_capacity, 16);
        assert_eq!(relay.write_timeout, Duration::from_secs(1));
    }
}
