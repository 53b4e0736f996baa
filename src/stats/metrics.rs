//! Statistics and metrics for the relay

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Relay-wide counters
///
/// Shared by `Arc` between connection tasks and the broadcaster. Counters
/// only ever increase; connection gauges are read from the registry when a
/// snapshot is taken.
#[derive(Debug)]
pub struct RelayStats {
    started_at: Instant,
    ingested: AtomicU64,
    rejected: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
    pruned: AtomicU64,
    sink_failures: AtomicU64,
}

impl RelayStats {
    /// Create a zeroed stats tracker
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            ingested: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            pruned: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
        }
    }

    /// An update was accepted into the cache
    pub fn record_ingested(&self) {
        self.ingested.fetch_add(1, Ordering::Relaxed);
    }

    /// A producer payload failed validation
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// An update was dropped because the queue was full
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// An update was handed to a consumer
    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// A consumer was pruned after a failed delivery
    pub fn record_pruned(&self) {
        self.pruned.fetch_add(1, Ordering::Relaxed);
    }

    /// The external sink rejected a publish
    pub fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Updates dropped on a full queue so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Time since the tracker was created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Copy the counters together with the current connection gauges
    pub fn snapshot(&self, producers: usize, consumers: usize, cached: usize) -> StatsSnapshot {
        StatsSnapshot {
            uptime_secs: self.uptime().as_secs(),
            producers,
            consumers,
            cached_drivers: cached,
            ingested: self.ingested.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            pruned: self.pruned.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain copy of the relay statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Seconds since startup
    pub uptime_secs: u64,
    /// Live producer connections
    pub producers: usize,
    /// Live consumer connections
    pub consumers: usize,
    /// Drivers with a last-known update
    pub cached_drivers: usize,
    /// Updates accepted
    pub ingested: u64,
    /// Payloads rejected by validation
    pub rejected: u64,
    /// Updates dropped on a full queue
    pub dropped: u64,
    /// Per-consumer deliveries
    pub delivered: u64,
    /// Consumers removed after a failed delivery
    pub pruned: u64,
    /// Failed external publishes
    pub sink_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = RelayStats::new();
        let snapshot = stats.snapshot(0, 0, 0);

        assert_eq!(snapshot.ingested, 0);
        assert_eq!(snapshot.rejected, 0);
        assert_eq!(snapshot.dropped, 0);
        assert_eq!(snapshot.delivered, 0);
        assert_eq!(snapshot.pruned, 0);
        assert_eq!(snapshot.sink_failures, 0);
    }

    #[test]
    fn test_counters() {
        let stats = RelayStats::new();

        stats.record_ingested();
        stats.record_ingested();
        stats.record_rejected();
        stats.record_dropped();
        stats.record_delivered();
        stats.record_pruned();
        stats.record_sink_failure();

        let snapshot = stats.snapshot(2, 3, 4);
        assert_eq!(snapshot.ingested, 2);
        assert_eq!(snapshot.rejected, 1);
        assert_eq!(snapshot.dropped, 1);
        assert_eq!(snapshot.delivered, 1);
        assert_eq!(snapshot.pruned, 1);
        assert_eq!(snapshot.sink_failures, 1);
        assert_eq!(snapshot.producers, 2);
        assert_eq!(snapshot.consumers, 3);
        assert_eq!(snapshot.cached_drivers, 4);
        assert_eq!(stats.dropped(), 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = RelayStats::new().snapshot(1, 0, 1);
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["producers"], 1);
        assert_eq!(value["cached_drivers"], 1);
    }
}
