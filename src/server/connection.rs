//! Per-connection plumbing shared by driver and monitor sockets

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures::stream::SplitSink;
use futures::SinkExt;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio_util::sync::CancellationToken;

use crate::registry::ConnectionId;
use crate::session::LocationHub;

/// State handed to every route
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Relay entry point
    pub hub: LocationHub,

    /// Outbound queue length for new connections
    pub outbound_buffer: usize,

    connection_limit: Option<Arc<Semaphore>>,
}

impl ServerState {
    /// Build route state; `max_connections == 0` means unlimited
    pub fn new(hub: LocationHub, outbound_buffer: usize, max_connections: usize) -> Self {
        let connection_limit = if max_connections > 0 {
            Some(Arc::new(Semaphore::new(max_connections)))
        } else {
            None
        };

        Self {
            hub,
            outbound_buffer,
            connection_limit,
        }
    }

    /// Reserve a connection slot
    ///
    /// `Ok(None)` when unlimited. The slot is held until the permit is
    /// dropped.
    pub fn try_admit(&self) -> Result<Option<OwnedSemaphorePermit>, TryAcquireError> {
        match &self.connection_limit {
            Some(sem) => sem.clone().try_acquire_owned().map(Some),
            None => Ok(None),
        }
    }
}

/// Drain a connection's outbound queue into its socket
///
/// Each write is bounded by `write_timeout`. The task ends when the token is
/// cancelled, the queue closes, or a write fails; on the way out it cancels
/// the token so the reader stops too and closes the queue so later
/// deliveries fail fast.
pub async fn writer_task(
    id: ConnectionId,
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Bytes>,
    token: CancellationToken,
    write_timeout: Duration,
) {
    loop {
        let payload = tokio::select! {
            _ = token.cancelled() => break,
            payload = outbound.recv() => match payload {
                Some(payload) => payload,
                None => break,
            },
        };

        let text = match std::str::from_utf8(&payload) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(connection_id = %id, error = %e, "Dropping non-UTF-8 payload");
                continue;
            }
        };

        match tokio::time::timeout(write_timeout, sink.send(Message::Text(text.into()))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(connection_id = %id, error = %e, "Socket write failed");
                break;
            }
            Err(_) => {
                tracing::debug!(
                    connection_id = %id,
                    timeout_ms = write_timeout.as_millis() as u64,
                    "Socket write timed out"
                );
                break;
            }
        }
    }

    token.cancel();
    outbound.close();

    let _ = tokio::time::timeout(write_timeout, sink.send(Message::Close(None))).await;
}
