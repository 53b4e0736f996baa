//! External publish targets
//!
//! The broadcaster forwards every update to a [`LocationSink`] before fanning
//! it out locally. Publishing is best effort: the broadcaster bounds each call
//! by its write deadline, counts failures, and otherwise ignores the result.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::location::LocationUpdate;

/// Error reported by a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The destination could not be reached or configured
    Unavailable(String),
    /// The destination refused the message
    Publish(String),
    /// The update could not be serialized
    Encode(String),
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Unavailable(msg) => write!(f, "Sink unavailable: {}", msg),
            SinkError::Publish(msg) => write!(f, "Publish failed: {}", msg),
            SinkError::Encode(msg) => write!(f, "Encode failed: {}", msg),
        }
    }
}

impl std::error::Error for SinkError {}

/// Fire-and-forget destination for every relayed update
pub trait LocationSink: Send + Sync + 'static {
    /// Publish one update
    fn publish(&self, update: &LocationUpdate) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LocationSink for NoopSink {
    async fn publish(&self, _update: &LocationUpdate) -> Result<(), SinkError> {
        Ok(())
    }
}

/// An absent sink publishes nothing
impl<S: LocationSink> LocationSink for Option<S> {
    async fn publish(&self, update: &LocationUpdate) -> Result<(), SinkError> {
        match self {
            Some(sink) => sink.publish(update).await,
            None => Ok(()),
        }
    }
}

impl<S: LocationSink> LocationSink for Arc<S> {
    async fn publish(&self, update: &LocationUpdate) -> Result<(), SinkError> {
        self.as_ref().publish(update).await
    }
}

/// In-process sink backed by a `tokio::sync::broadcast` channel
///
/// Each subscriber receives the serialized JSON of every update. Lagging
/// subscribers skip messages instead of slowing the broadcaster down.
#[derive(Debug, Clone)]
pub struct MemorySink {
    tx: broadcast::Sender<String>,
}

impl MemorySink {
    /// Create a sink retaining up to `capacity` messages per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Receive every update published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl LocationSink for MemorySink {
    async fn publish(&self, update: &LocationUpdate) -> Result<(), SinkError> {
        let payload = serde_json::to_string(update).map_err(|e| SinkError::Encode(e.to_string()))?;
        // No subscribers is not a failure
        let _ = self.tx.send(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_sink() {
        let update = LocationUpdate::new("D1", 1.0, 2.0);
        assert!(NoopSink.publish(&update).await.is_ok());
        assert!(None::<NoopSink>.publish(&update).await.is_ok());
    }

    #[tokio::test]
    async fn test_memory_sink_delivers_json() {
        let sink = MemorySink::new(8);
        let mut rx = sink.subscribe();
        let update = LocationUpdate::new("D1", 5.6, -0.1).with_ts(1000.0);

        Some(Arc::new(sink)).publish(&update).await.unwrap();

        let payload = rx.recv().await.unwrap();
        let decoded: LocationUpdate = serde_json::from_str(&payload).unwrap();
        assert_eq!(decoded, update);
    }

    #[tokio::test]
    async fn test_memory_sink_without_subscribers() {
        let sink = MemorySink::new(8);
        assert!(sink.publish(&LocationUpdate::new("D1", 1.0, 2.0)).await.is_ok());
    }

    #[test]
    fn test_error_display() {
        let err = SinkError::Unavailable("connection refused".into());
        assert_eq!(err.to_string(), "Sink unavailable: connection refused");
    }
}
