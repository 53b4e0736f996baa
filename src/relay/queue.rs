//! Bounded update queue
//!
//! Multi-producer, single-consumer. Enqueueing never waits: when the queue
//! is full the incoming update is dropped and counted, so a slow broadcaster
//! can never stall a driver connection.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::location::LocationUpdate;
use crate::stats::RelayStats;

/// Result of a non-blocking enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The update is waiting for the broadcaster
    Queued,
    /// The queue was full and the update was discarded
    Dropped,
    /// The broadcaster is gone
    Closed,
}

/// Producer side of the queue; cheap to clone
#[derive(Debug, Clone)]
pub struct UpdateQueue {
    tx: mpsc::Sender<LocationUpdate>,
    stats: Arc<RelayStats>,
}

/// Consumer side of the queue, owned by the broadcaster
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::Receiver<LocationUpdate>,
}

impl UpdateQueue {
    /// Create a queue holding at most `capacity` pending updates
    pub fn bounded(capacity: usize, stats: Arc<RelayStats>) -> (Self, QueueReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, stats }, QueueReceiver { rx })
    }

    /// Enqueue without waiting; drops `update` if the queue is full
    pub fn enqueue(&self, update: LocationUpdate) -> EnqueueOutcome {
        match self.tx.try_send(update) {
            Ok(()) => EnqueueOutcome::Queued,
            Err(TrySendError::Full(update)) => {
                self.stats.record_dropped();
                tracing::warn!(
                    driver_id = %update.driver_id,
                    capacity = self.capacity(),
                    dropped_total = self.stats.dropped(),
                    "Broadcast queue full, dropped location"
                );
                EnqueueOutcome::Dropped
            }
            Err(TrySendError::Closed(update)) => {
                tracing::debug!(driver_id = %update.driver_id, "Broadcaster stopped, location not queued");
                EnqueueOutcome::Closed
            }
        }
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Number of updates waiting for the broadcaster
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Whether no updates are pending
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QueueReceiver {
    /// Wait for the next update; `None` once every producer handle is gone
    pub async fn recv(&mut self) -> Option<LocationUpdate> {
        self.rx.recv().await
    }

    /// Take an update if one is ready
    pub fn try_recv(&mut self) -> Option<LocationUpdate> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(driver_id: &str, ts: f64) -> LocationUpdate {
        LocationUpdate::new(driver_id, 1.0, 2.0).with_ts(ts)
    }

    #[tokio::test]
    async fn test_enqueue_and_receive_in_order() {
        let (queue, mut rx) = UpdateQueue::bounded(4, Arc::new(RelayStats::new()));

        assert_eq!(queue.enqueue(update("D1", 1.0)), EnqueueOutcome::Queued);
        assert_eq!(queue.enqueue(update("D1", 2.0)), EnqueueOutcome::Queued);
        assert_eq!(queue.len(), 2);

        assert_eq!(rx.recv().await.unwrap().ts, 1.0);
        assert_eq!(rx.recv().await.unwrap().ts, 2.0);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_drops_newest() {
        let stats = Arc::new(RelayStats::new());
        let (queue, mut rx) = UpdateQueue::bounded(2, stats.clone());

        assert_eq!(queue.enqueue(update("D1", 1.0)), EnqueueOutcome::Queued);
        assert_eq!(queue.enqueue(update("D1", 2.0)), EnqueueOutcome::Queued);
        assert_eq!(queue.enqueue(update("D1", 3.0)), EnqueueOutcome::Dropped);
        assert_eq!(stats.dropped(), 1);

        // The oldest items survive, the newest was discarded
        assert_eq!(rx.recv().await.unwrap().ts, 1.0);
        assert_eq!(rx.recv().await.unwrap().ts, 2.0);
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_enqueue_never_blocks_outside_runtime() {
        // try_send needs no runtime, so a saturated queue returns immediately
        let (queue, _rx) = UpdateQueue::bounded(1, Arc::new(RelayStats::new()));

        for i in 0..100 {
            queue.enqueue(update("D1", i as f64));
        }
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.capacity(), 1);
    }

    #[test]
    fn test_closed_queue() {
        let (queue, rx) = UpdateQueue::bounded(1, Arc::new(RelayStats::new()));
        drop(rx);

        assert_eq!(queue.enqueue(update("D1", 1.0)), EnqueueOutcome::Closed);
    }
}
