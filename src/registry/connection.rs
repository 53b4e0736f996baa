//! Connection handles
//!
//! A handle is the registry's view of one live WebSocket: an outbound queue
//! drained by the connection's writer task, plus a cancellation token that
//! tears down both of the connection's tasks when the registry releases it.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Identifier for a single connection, unique for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wrap a raw identifier
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Why a payload could not be handed to a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The connection was released or its writer has exited
    Closed,
    /// The outbound queue stayed full for the whole write deadline
    Timeout,
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Closed => write!(f, "connection closed"),
            DeliveryError::Timeout => write!(f, "write deadline exceeded"),
        }
    }
}

impl std::error::Error for DeliveryError {}

/// Cloneable handle to a live connection
///
/// Clones share the same outbound queue and cancellation token, so a
/// snapshot copy can deliver to and release the real connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::Sender<Bytes>,
    token: CancellationToken,
}

impl ConnectionHandle {
    /// Create a handle and the receiving end of its outbound queue
    pub fn new(id: ConnectionId, buffer: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let handle = Self {
            id,
            tx,
            token: CancellationToken::new(),
        };
        (handle, rx)
    }

    /// Connection identifier
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a payload for the writer, waiting at most `deadline` for room
    pub async fn send(&self, payload: Bytes, deadline: Duration) -> Result<(), DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::Closed);
        }

        match self.tx.send_timeout(payload, deadline).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => Err(DeliveryError::Timeout),
            Err(SendTimeoutError::Closed(_)) => Err(DeliveryError::Closed),
        }
    }

    /// Release the connection; its reader and writer tasks stop
    pub fn close(&self) {
        self.token.cancel();
    }

    /// Whether the connection was released or its writer is gone
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.tx.is_closed()
    }

    /// Future that resolves once the connection is released
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Token shared with the connection's tasks
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_receive() {
        let (handle, mut rx) = ConnectionHandle::new(ConnectionId::new(1), 4);

        handle
            .send(Bytes::from_static(b"hello"), Duration::from_millis(50))
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_send_times_out_when_full() {
        let (handle, _rx) = ConnectionHandle::new(ConnectionId::new(1), 1);
        let deadline = Duration::from_millis(20);

        handle.send(Bytes::from_static(b"a"), deadline).await.unwrap();
        let result = handle.send(Bytes::from_static(b"b"), deadline).await;

        assert_eq!(result, Err(DeliveryError::Timeout));
    }

    #[tokio::test]
    async fn test_send_fails_after_writer_exit() {
        let (handle, rx) = ConnectionHandle::new(ConnectionId::new(1), 4);
        drop(rx);

        assert!(handle.is_closed());
        let result = handle
            .send(Bytes::from_static(b"a"), Duration::from_millis(20))
            .await;
        assert_eq!(result, Err(DeliveryError::Closed));
    }

    #[tokio::test]
    async fn test_close_is_shared_by_clones() {
        let (handle, _rx) = ConnectionHandle::new(ConnectionId::new(7), 4);
        let copy = handle.clone();

        copy.close();

        assert!(handle.is_closed());
        tokio_test::assert_ready!(tokio_test::task::spawn(handle.closed()).poll());
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionId::new(42).to_string(), "conn-42");
    }
}
