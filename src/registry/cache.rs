//! Last-known location cache
//!
//! Holds the most recent update per driver for the lifetime of the process.
//! Writes overwrite unconditionally: the producer timestamp is not compared,
//! so an out-of-order update replaces a newer one.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::location::LocationUpdate;

/// Driver id → most recent update
#[derive(Debug, Default)]
pub struct LastKnownCache {
    entries: RwLock<HashMap<String, LocationUpdate>>,
}

impl LastKnownCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `update` as the latest value for its driver
    pub async fn set(&self, update: LocationUpdate) {
        let mut entries = self.entries.write().await;
        entries.insert(update.driver_id.clone(), update);
    }

    /// Latest update for `driver_id`, if any was ever received
    pub async fn get(&self, driver_id: &str) -> Option<LocationUpdate> {
        self.entries.read().await.get(driver_id).cloned()
    }

    /// Copy of the full mapping
    pub async fn get_all(&self) -> HashMap<String, LocationUpdate> {
        self.entries.read().await.clone()
    }

    /// Number of drivers with a cached update
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing has been cached yet
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing() {
        let cache = LastKnownCache::new();
        assert!(cache.get("D1").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = LastKnownCache::new();
        let update = LocationUpdate::new("D1", 5.6, -0.1).with_ts(1000.0);

        cache.set(update.clone()).await;

        assert_eq!(cache.get("D1").await, Some(update));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_last_write_wins_regardless_of_timestamp() {
        let cache = LastKnownCache::new();
        let newer = LocationUpdate::new("D1", 1.0, 1.0).with_ts(2000.0);
        let older = LocationUpdate::new("D1", 2.0, 2.0).with_ts(1000.0);

        cache.set(newer).await;
        cache.set(older.clone()).await;

        assert_eq!(cache.get("D1").await, Some(older));
    }

    #[tokio::test]
    async fn test_get_all_is_a_copy() {
        let cache = LastKnownCache::new();
        cache.set(LocationUpdate::new("D1", 1.0, 1.0)).await;

        let mut all = cache.get_all().await;
        all.clear();

        assert_eq!(cache.len().await, 1);
    }
}
