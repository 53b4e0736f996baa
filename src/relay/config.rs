//! Relay configuration

use std::time::Duration;

/// Default number of pending updates between ingestion and fan-out
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default deadline for handing one payload to one consumer
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(3);

/// Settings for the update queue and the broadcaster
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Capacity of the update queue; updates beyond it are dropped
    pub queue_capacity: usize,

    /// Per-consumer write deadline, also bounds each external publish
    pub write_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl RelayConfig {
    /// Set the queue capacity (at least 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the per-consumer write deadline
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();

        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.write_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_builder_queue_capacity_floor() {
        let config = RelayConfig::default().queue_capacity(0);
        assert_eq!(config.queue_capacity, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = RelayConfig::default()
            .queue_capacity(16)
            .write_timeout(Duration::from_millis(250));

        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.write_timeout, Duration::from_millis(250));
    }
}
