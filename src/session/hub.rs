//! Relay hub
//!
//! Ties the stores, the queue and the broadcaster together behind the
//! operations connection tasks and HTTP handlers need: ingest an update,
//! open and close driver/monitor connections, and apply subscriptions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::location::{
    now_epoch_secs, parse_driver_frame, parse_submission, IngestError, LocationUpdate,
};
use crate::protocol::{encode, MonitorMessage};
use crate::registry::{ConnectionHandle, ConnectionId, ConnectionRegistry, LastKnownCache};
use crate::relay::{Broadcaster, EnqueueOutcome, LocationSink, RelayConfig, UpdateQueue};
use crate::stats::{RelayStats, StatsSnapshot};

use super::subscription::Subscription;

/// Shared entry point into the relay; cheap to clone
#[derive(Debug, Clone)]
pub struct LocationHub {
    registry: Arc<ConnectionRegistry>,
    cache: Arc<LastKnownCache>,
    queue: UpdateQueue,
    stats: Arc<RelayStats>,
    write_timeout: Duration,
}

impl LocationHub {
    /// Create a hub and the broadcaster that drains its queue
    ///
    /// The broadcaster does nothing until it is run or spawned.
    pub fn new<S: LocationSink>(config: RelayConfig, sink: S) -> (Self, Broadcaster<S>) {
        let stats = Arc::new(RelayStats::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let cache = Arc::new(LastKnownCache::new());
        let (queue, receiver) = UpdateQueue::bounded(config.queue_capacity, stats.clone());

        let broadcaster = Broadcaster::new(receiver, registry.clone(), sink, stats.clone())
            .write_timeout(config.write_timeout);

        let hub = Self {
            registry,
            cache,
            queue,
            stats,
            write_timeout: config.write_timeout,
        };

        (hub, broadcaster)
    }

    /// Connection registry
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Last-known cache
    pub fn cache(&self) -> &Arc<LastKnownCache> {
        &self.cache
    }

    /// Per-write deadline used for pushes and fan-out
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Accept a parsed update: stamp it, cache it, queue it for fan-out
    pub async fn ingest(&self, mut update: LocationUpdate) -> Result<EnqueueOutcome, IngestError> {
        if update.driver_id.trim().is_empty() {
            self.stats.record_rejected();
            return Err(IngestError::MissingDriverId);
        }

        update.stamp(now_epoch_secs());
        self.cache.set(update.clone()).await;
        self.stats.record_ingested();

        Ok(self.queue.enqueue(update))
    }

    /// Parse and ingest a frame from `driver_id`'s connection
    pub async fn ingest_frame(
        &self,
        driver_id: &str,
        payload: &[u8],
    ) -> Result<EnqueueOutcome, IngestError> {
        match parse_driver_frame(driver_id, payload) {
            Ok(update) => self.ingest(update).await,
            Err(e) => {
                self.stats.record_rejected();
                Err(e)
            }
        }
    }

    /// Parse and ingest an HTTP submission
    pub async fn submit(&self, body: &[u8]) -> Result<EnqueueOutcome, IngestError> {
        match parse_submission(body) {
            Ok(update) => self.ingest(update).await,
            Err(e) => {
                self.stats.record_rejected();
                Err(e)
            }
        }
    }

    /// Latest update for a driver
    pub async fn last_known(&self, driver_id: &str) -> Option<LocationUpdate> {
        self.cache.get(driver_id).await
    }

    /// Copy of every latest update
    pub async fn all_last_known(&self) -> HashMap<String, LocationUpdate> {
        self.cache.get_all().await
    }

    /// Register a driver connection
    ///
    /// A previous connection for the same driver is closed.
    pub async fn open_producer(
        &self,
        driver_id: &str,
        buffer: usize,
    ) -> (ConnectionHandle, mpsc::Receiver<Bytes>) {
        let (conn, rx) = ConnectionHandle::new(self.registry.next_id(), buffer);

        if let Some(previous) = self.registry.add_producer(driver_id, conn.clone()).await {
            tracing::info!(
                driver_id = %driver_id,
                previous = %previous.id(),
                "Driver reconnected, closing previous connection"
            );
            previous.close();
        }

        (conn, rx)
    }

    /// Release a driver connection unless it was already replaced
    pub async fn close_producer(&self, driver_id: &str, id: ConnectionId) -> bool {
        self.registry.release_producer(driver_id, id).await
    }

    /// Register a monitor and queue its initial push
    ///
    /// Filtered monitors get the cached update for their driver, if any;
    /// unfiltered monitors get a snapshot of the whole cache unless it is
    /// empty.
    pub async fn open_monitor(
        &self,
        subscription: &Subscription,
        buffer: usize,
    ) -> (ConnectionHandle, mpsc::Receiver<Bytes>) {
        let (conn, rx) = ConnectionHandle::new(self.registry.next_id(), buffer);
        self.registry
            .add_consumer(conn.clone(), subscription.filter())
            .await;

        match subscription {
            Subscription::Driver(driver_id) => {
                if let Some(update) = self.cache.get(driver_id).await {
                    self.push(&conn, &update).await;
                }
            }
            Subscription::All => {
                let locations = self.cache.get_all().await;
                if !locations.is_empty() {
                    self.push(&conn, &MonitorMessage::Snapshot {
                        locations: &locations,
                    })
                    .await;
                }
            }
        }

        (conn, rx)
    }

    /// Change a monitor's filter, acknowledge, and push the cached update
    ///
    /// An empty `driver_id` returns the monitor to receiving every driver.
    /// Returns false if the monitor is no longer registered.
    pub async fn subscribe(&self, conn: &ConnectionHandle, driver_id: &str) -> bool {
        if !self.registry.set_filter(conn.id(), driver_id).await {
            return false;
        }

        tracing::debug!(connection_id = %conn.id(), driver_id = %driver_id, "Monitor subscribed");
        self.push(conn, &MonitorMessage::Subscribed { driver_id })
            .await;

        if !driver_id.is_empty() {
            if let Some(update) = self.cache.get(driver_id).await {
                self.push(conn, &update).await;
            }
        }

        true
    }

    /// Remove a monitor from the registry
    pub async fn close_monitor(&self, id: ConnectionId) -> bool {
        self.registry.remove_consumer(id).await
    }

    /// Counters plus current gauges
    pub async fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(
            self.registry.producer_count().await,
            self.registry.consumer_count().await,
            self.cache.len().await,
        )
    }

    async fn push<T: Serialize>(&self, conn: &ConnectionHandle, message: &T) -> bool {
        let payload = match encode(message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode monitor message");
                return false;
            }
        };

        match conn.send(payload, self.write_timeout).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(connection_id = %conn.id(), error = %e, "Push to monitor failed");
                false
            }
        }
    }
}
