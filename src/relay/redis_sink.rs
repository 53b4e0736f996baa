//! Redis pub/sub sink for fan-out beyond this process
//!
//! Every update is `PUBLISH`ed as JSON on one channel. The multiplexed
//! connection is opened lazily and dropped after a failed publish, so the
//! next update reconnects.

use redis::aio::MultiplexedConnection;
use tokio::sync::Mutex;

use crate::location::LocationUpdate;

use super::sink::{LocationSink, SinkError};

/// Publishes updates to a Redis channel
pub struct RedisSink {
    client: redis::Client,
    channel: String,
    conn: Mutex<Option<MultiplexedConnection>>,
}

impl RedisSink {
    /// Create a sink for `url`, publishing on `channel`
    ///
    /// Only the URL is validated here; no connection is made until the first
    /// publish.
    pub fn open(url: &str, channel: impl Into<String>) -> Result<Self, SinkError> {
        let client =
            redis::Client::open(url).map_err(|e| SinkError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            channel: channel.into(),
            conn: Mutex::new(None),
        })
    }

    /// Channel updates are published on
    pub fn channel(&self) -> &str {
        &self.channel
    }

    async fn connection(&self) -> Result<MultiplexedConnection, SinkError> {
        let mut guard = self.conn.lock().await;

        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;

        tracing::info!(channel = %self.channel, "Connected to Redis");
        *guard = Some(conn.clone());
        Ok(conn)
    }
}

impl std::fmt::Debug for RedisSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSink")
            .field("channel", &self.channel)
            .finish()
    }
}

impl LocationSink for RedisSink {
    async fn publish(&self, update: &LocationUpdate) -> Result<(), SinkError> {
        let payload = serde_json::to_string(update).map_err(|e| SinkError::Encode(e.to_string()))?;
        let mut conn = self.connection().await?;

        let result = redis::cmd("PUBLISH")
            .arg(&self.channel)
            .arg(payload)
            .query_async::<i64>(&mut conn)
            .await;

        if let Err(e) = result {
            self.conn.lock().await.take();
            return Err(SinkError::Publish(e.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_rejects_bad_url() {
        let result = RedisSink::open("not a url", "drivers.locations");
        assert!(matches!(result, Err(SinkError::Unavailable(_))));
    }

    #[test]
    fn test_open_is_lazy() {
        // Nothing listens here; open must still succeed
        let sink = RedisSink::open("redis://127.0.0.1:1/", "drivers.locations").unwrap();
        assert_eq!(sink.channel(), "drivers.locations");
    }
}
