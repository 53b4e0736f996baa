//! Location update model
//!
//! One position report from a driver. This is both the cached value and the
//! fan-out payload, so its serialized form is the wire contract towards
//! monitors and the external sink.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default value of the `type` tag
pub const LOCATION_KIND: &str = "location";

/// A single driver position report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationUpdate {
    /// Message tag, `"location"` unless the producer said otherwise
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,

    /// Driver identifier (never empty once stored)
    pub driver_id: String,

    /// Latitude in degrees
    pub lat: f64,

    /// Longitude in degrees
    pub lng: f64,

    /// Producer timestamp, epoch seconds
    #[serde(default)]
    pub ts: f64,

    /// Opaque producer metadata
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,

    /// When the relay accepted the update, epoch seconds
    #[serde(skip)]
    received_at: f64,
}

fn default_kind() -> String {
    LOCATION_KIND.to_string()
}

impl LocationUpdate {
    /// Create an update with no timestamp and no metadata
    pub fn new(driver_id: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            kind: default_kind(),
            driver_id: driver_id.into(),
            lat,
            lng,
            ts: 0.0,
            meta: Map::new(),
            received_at: 0.0,
        }
    }

    /// Set the producer timestamp
    pub fn with_ts(mut self, ts: f64) -> Self {
        self.ts = ts;
        self
    }

    /// Set the metadata map
    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = meta;
        self
    }

    /// Apply ingestion defaults
    ///
    /// An empty `kind` becomes `"location"`, a zero timestamp becomes `now`,
    /// and `received_at` is always set to `now`.
    pub fn stamp(&mut self, now: f64) {
        if self.kind.is_empty() {
            self.kind = default_kind();
        }
        if self.ts == 0.0 {
            self.ts = now;
        }
        self.received_at = now;
    }

    /// When the relay accepted this update (0 if never stamped)
    pub fn received_at(&self) -> f64 {
        self.received_at
    }
}

/// Equality over the client-visible fields; `received_at` is bookkeeping.
impl PartialEq for LocationUpdate {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.driver_id == other.driver_id
            && self.lat == other.lat
            && self.lng == other.lng
            && self.ts == other.ts
            && self.meta == other.meta
    }
}

/// Current wall-clock time in whole epoch seconds
pub fn now_epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as f64)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stamp_fills_missing_timestamp() {
        let mut update = LocationUpdate::new("D1", 5.6, -0.1);
        update.stamp(1234.0);

        assert_eq!(update.ts, 1234.0);
        assert_eq!(update.received_at(), 1234.0);
        assert_eq!(update.kind, LOCATION_KIND);
    }

    #[test]
    fn test_stamp_keeps_producer_timestamp() {
        let mut update = LocationUpdate::new("D1", 5.6, -0.1).with_ts(1000.0);
        update.stamp(2000.0);

        assert_eq!(update.ts, 1000.0);
        assert_eq!(update.received_at(), 2000.0);
    }

    #[test]
    fn test_serialized_shape() {
        let mut meta = Map::new();
        meta.insert("speed".into(), json!(12.5));
        let mut update = LocationUpdate::new("D1", 5.6, -0.1)
            .with_ts(1000.0)
            .with_meta(meta);
        update.stamp(2000.0);

        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "location",
                "driver_id": "D1",
                "lat": 5.6,
                "lng": -0.1,
                "ts": 1000.0,
                "meta": {"speed": 12.5}
            })
        );
    }

    #[test]
    fn test_empty_meta_is_omitted() {
        let update = LocationUpdate::new("D1", 1.0, 2.0).with_ts(3.0);
        let value = serde_json::to_value(&update).unwrap();

        assert!(value.get("meta").is_none());
        assert!(value.get("received_at").is_none());
    }

    #[test]
    fn test_equality_ignores_received_at() {
        let mut a = LocationUpdate::new("D1", 1.0, 2.0).with_ts(3.0);
        let mut b = a.clone();
        a.stamp(10.0);
        b.stamp(20.0);

        assert_eq!(a, b);
    }

    #[test]
    fn test_deserialize_defaults_kind() {
        let update: LocationUpdate =
            serde_json::from_str(r#"{"driver_id":"D9","lat":1.0,"lng":2.0}"#).unwrap();

        assert_eq!(update.kind, LOCATION_KIND);
        assert_eq!(update.ts, 0.0);
        assert!(update.meta.is_empty());
    }
}
