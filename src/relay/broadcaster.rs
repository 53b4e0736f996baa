//! Broadcaster
//!
//! The single consumer of the update queue. For each update it publishes to
//! the external sink, then delivers to every matching consumer found in a
//! fresh registry snapshot. Consumers that cannot take the payload within
//! the write deadline are removed from the registry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::location::LocationUpdate;
use crate::protocol::encode;
use crate::registry::ConnectionRegistry;
use crate::stats::RelayStats;

use super::config::DEFAULT_WRITE_TIMEOUT;
use super::queue::QueueReceiver;
use super::sink::LocationSink;

/// Outcome of fanning out one update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    /// Consumers that accepted the payload
    pub delivered: usize,
    /// Consumers whose filter excluded the update
    pub skipped: usize,
    /// Consumers removed after a failed delivery
    pub pruned: usize,
}

/// Queue consumer that forwards to the sink and fans out to monitors
pub struct Broadcaster<S: LocationSink> {
    queue: QueueReceiver,
    registry: Arc<ConnectionRegistry>,
    sink: S,
    stats: Arc<RelayStats>,
    write_timeout: Duration,
}

impl<S: LocationSink> Broadcaster<S> {
    /// Create a broadcaster draining `queue`
    pub fn new(
        queue: QueueReceiver,
        registry: Arc<ConnectionRegistry>,
        sink: S,
        stats: Arc<RelayStats>,
    ) -> Self {
        Self {
            queue,
            registry,
            sink,
            stats,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Set the per-consumer write deadline
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Process updates until every queue producer is dropped
    pub async fn run(mut self) {
        self.drain().await;
        tracing::debug!("Broadcast queue closed, broadcaster exiting");
    }

    /// Process updates until `shutdown` resolves or the queue closes
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = shutdown => {
                tracing::info!("Broadcaster cancelled");
            }
            _ = self.drain() => {
                tracing::debug!("Broadcast queue closed, broadcaster exiting");
            }
        }
    }

    /// Run on a dedicated task until `token` is cancelled
    pub fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run_until(token.cancelled_owned()).await;
        })
    }

    async fn drain(&mut self) {
        while let Some(update) = self.queue.recv().await {
            self.dispatch(&update).await;
        }
    }

    /// Publish one update to the sink and fan it out to consumers
    pub async fn dispatch(&self, update: &LocationUpdate) -> FanoutReport {
        self.forward_to_sink(update).await;
        self.fan_out(update).await
    }

    async fn forward_to_sink(&self, update: &LocationUpdate) {
        match tokio::time::timeout(self.write_timeout, self.sink.publish(update)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.stats.record_sink_failure();
                tracing::debug!(driver_id = %update.driver_id, error = %e, "Sink publish failed");
            }
            Err(_) => {
                self.stats.record_sink_failure();
                tracing::debug!(driver_id = %update.driver_id, "Sink publish timed out");
            }
        }
    }

    async fn fan_out(&self, update: &LocationUpdate) -> FanoutReport {
        let mut report = FanoutReport::default();

        let payload = match encode(update) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(driver_id = %update.driver_id, error = %e, "Failed to encode location");
                return report;
            }
        };

        let snapshot = self.registry.snapshot().await;

        for conn in snapshot.targets(&update.driver_id) {
            match conn.send(payload.clone(), self.write_timeout).await {
                Ok(()) => {
                    report.delivered += 1;
                    self.stats.record_delivered();
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %conn.id(),
                        error = %e,
                        "Removing dead monitor"
                    );
                    self.registry.remove_consumer(conn.id()).await;
                    report.pruned += 1;
                    self.stats.record_pruned();
                }
            }
        }

        report.skipped = snapshot.len() - report.delivered - report.pruned;
        report
    }
}
