//! Messages sent to monitors
//!
//! Location fan-out items are the serialized [`LocationUpdate`] itself (it
//! carries its own `"type": "location"` tag). The relay adds two control
//! messages, both tagged the same way.

use std::collections::HashMap;

use bytes::Bytes;
use serde::Serialize;

use crate::location::LocationUpdate;

/// Control messages pushed to a monitor
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorMessage<'a> {
    /// Every cached update, sent once to an unfiltered monitor on connect
    Snapshot {
        locations: &'a HashMap<String, LocationUpdate>,
    },
    /// Acknowledges a `subscribe:` directive
    Subscribed { driver_id: &'a str },
}

/// Serialize any outbound message to a shareable JSON payload
pub fn encode<T: Serialize + ?Sized>(message: &T) -> Result<Bytes, serde_json::Error> {
    serde_json::to_vec(message).map(Bytes::from)
}
