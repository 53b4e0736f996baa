//! Connection registry implementation
//!
//! Tracks producer connections (one per driver id) and consumer connections
//! with their optional driver filter. All three maps sit behind one `RwLock`
//! so a snapshot never observes a half-applied connection event.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use super::connection::{ConnectionHandle, ConnectionId};
use super::snapshot::ConsumerSnapshot;

#[derive(Debug, Default)]
struct RegistryState {
    /// Driver id → producer connection
    producers: HashMap<String, ConnectionHandle>,
    /// Active consumer connections
    consumers: HashMap<ConnectionId, ConnectionHandle>,
    /// Consumer → driver filter; absent means "receive all"
    subscriptions: HashMap<ConnectionId, String>,
}

/// Registry of live producer and consumer connections
#[derive(Debug)]
pub struct ConnectionRegistry {
    state: RwLock<RegistryState>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh connection identifier
    pub fn next_id(&self) -> ConnectionId {
        ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register the producer connection for `driver_id`
    ///
    /// An existing entry is overwritten and returned so the transport can
    /// close the displaced socket.
    pub async fn add_producer(
        &self,
        driver_id: &str,
        conn: ConnectionHandle,
    ) -> Option<ConnectionHandle> {
        let mut state = self.state.write().await;
        let previous = state.producers.insert(driver_id.to_string(), conn);

        tracing::debug!(
            driver_id = %driver_id,
            replaced = previous.is_some(),
            producers = state.producers.len(),
            "Producer registered"
        );

        previous
    }

    /// Remove and release the producer for `driver_id`; no-op if absent
    pub async fn remove_producer(&self, driver_id: &str) -> bool {
        let removed = self.state.write().await.producers.remove(driver_id);

        match removed {
            Some(conn) => {
                conn.close();
                tracing::debug!(driver_id = %driver_id, "Producer removed");
                true
            }
            None => false,
        }
    }

    /// Remove the producer for `driver_id` only if it is still `id`
    ///
    /// Connection teardown goes through here so that a driver which already
    /// reconnected keeps its newer registration.
    pub async fn release_producer(&self, driver_id: &str, id: ConnectionId) -> bool {
        let mut state = self.state.write().await;

        match state.producers.get(driver_id).map(ConnectionHandle::id) {
            Some(current) if current == id => {
                if let Some(conn) = state.producers.remove(driver_id) {
                    conn.close();
                }
                tracing::debug!(driver_id = %driver_id, connection_id = %id, "Producer released");
                true
            }
            Some(current) => {
                tracing::debug!(
                    driver_id = %driver_id,
                    expected = %current,
                    actual = %id,
                    "Producer release skipped, connection was replaced"
                );
                false
            }
            None => false,
        }
    }

    /// Register a consumer with its initial filter (empty = unfiltered)
    pub async fn add_consumer(&self, conn: ConnectionHandle, filter: &str) {
        let mut state = self.state.write().await;
        let id = conn.id();

        state.consumers.insert(id, conn);
        if filter.is_empty() {
            state.subscriptions.remove(&id);
        } else {
            state.subscriptions.insert(id, filter.to_string());
        }

        tracing::debug!(
            connection_id = %id,
            filter = %filter,
            consumers = state.consumers.len(),
            "Consumer registered"
        );
    }

    /// Remove and release a consumer; idempotent
    pub async fn remove_consumer(&self, id: ConnectionId) -> bool {
        let removed = {
            let mut state = self.state.write().await;
            state.subscriptions.remove(&id);
            state.consumers.remove(&id)
        };

        match removed {
            Some(conn) => {
                conn.close();
                tracing::debug!(connection_id = %id, "Consumer removed");
                true
            }
            None => false,
        }
    }

    /// Change a registered consumer's filter
    ///
    /// An empty filter returns the consumer to "receive all". Returns false
    /// if the consumer is not registered.
    pub async fn set_filter(&self, id: ConnectionId, filter: &str) -> bool {
        let mut state = self.state.write().await;

        if !state.consumers.contains_key(&id) {
            return false;
        }

        if filter.is_empty() {
            state.subscriptions.remove(&id);
        } else {
            state.subscriptions.insert(id, filter.to_string());
        }
        true
    }

    /// Current filter of a consumer (`None` when unfiltered or unknown)
    pub async fn filter_of(&self, id: ConnectionId) -> Option<String> {
        self.state.read().await.subscriptions.get(&id).cloned()
    }

    /// Isolated copy of the consumer set and filter map
    pub async fn snapshot(&self) -> ConsumerSnapshot {
        let state = self.state.read().await;
        ConsumerSnapshot::new(
            state.consumers.values().cloned().collect(),
            state.subscriptions.clone(),
        )
    }

    /// Whether `driver_id` has a live producer
    pub async fn has_producer(&self, driver_id: &str) -> bool {
        self.state.read().await.producers.contains_key(driver_id)
    }

    /// Whether a consumer is registered
    pub async fn has_consumer(&self, id: ConnectionId) -> bool {
        self.state.read().await.consumers.contains_key(&id)
    }

    /// Number of producer connections
    pub async fn producer_count(&self) -> usize {
        self.state.read().await.producers.len()
    }

    /// Number of consumer connections
    pub async fn consumer_count(&self) -> usize {
        self.state.read().await.consumers.len()
    }

    /// Release every connection and empty the registry
    pub async fn close_all(&self) {
        let mut state = self.state.write().await;

        for (_, conn) in state.producers.drain() {
            conn.close();
        }
        for (_, conn) in state.consumers.drain() {
            conn.close();
        }
        state.subscriptions.clear();

        tracing::info!("All connections released");
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
