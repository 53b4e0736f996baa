//! Point-in-time copy of the consumer side of the registry

use std::collections::HashMap;

use super::connection::{ConnectionHandle, ConnectionId};

/// Whether a consumer with `filter` should receive an update for `driver_id`
///
/// An empty filter accepts everything; otherwise the ids must match exactly.
pub fn filter_accepts(filter: &str, driver_id: &str) -> bool {
    filter.is_empty() || filter == driver_id
}

/// Consumers and their filters as they were when the snapshot was taken
#[derive(Debug, Clone, Default)]
pub struct ConsumerSnapshot {
    consumers: Vec<ConnectionHandle>,
    filters: HashMap<ConnectionId, String>,
}

impl ConsumerSnapshot {
    pub(super) fn new(
        consumers: Vec<ConnectionHandle>,
        filters: HashMap<ConnectionId, String>,
    ) -> Self {
        Self { consumers, filters }
    }

    /// Filter recorded for a consumer, `None` if unfiltered
    pub fn filter_of(&self, id: ConnectionId) -> Option<&str> {
        self.filters.get(&id).map(String::as_str)
    }

    /// Consumers that should receive an update for `driver_id`
    pub fn targets<'a>(&'a self, driver_id: &'a str) -> impl Iterator<Item = &'a ConnectionHandle> + 'a {
        self.consumers
            .iter()
            .filter(move |conn| filter_accepts(self.filter_of(conn.id()).unwrap_or(""), driver_id))
    }

    /// Number of consumers in the snapshot
    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    /// Whether the snapshot holds no consumers
    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts() {
        assert!(filter_accepts("", "D1"));
        assert!(filter_accepts("D1", "D1"));
        assert!(!filter_accepts("D1", "D2"));
        assert!(!filter_accepts("D1", "d1"));
    }

    #[test]
    fn test_targets() {
        let (all, _all_rx) = ConnectionHandle::new(ConnectionId::new(1), 1);
        let (only_d1, _d1_rx) = ConnectionHandle::new(ConnectionId::new(2), 1);
        let (only_d2, _d2_rx) = ConnectionHandle::new(ConnectionId::new(3), 1);

        let mut filters = HashMap::new();
        filters.insert(only_d1.id(), "D1".to_string());
        filters.insert(only_d2.id(), "D2".to_string());
        let snapshot = ConsumerSnapshot::new(vec![all, only_d1, only_d2], filters);

        let mut ids: Vec<u64> = snapshot.targets("D1").map(|c| c.id().get()).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);

        let ids: Vec<u64> = snapshot.targets("D7").map(|c| c.id().get()).collect();
        assert_eq!(ids, vec![1]);
    }
}
