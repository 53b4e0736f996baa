//! Ingestion parsing
//!
//! Turns raw producer payloads into [`LocationUpdate`]s. Two entry shapes
//! exist: WebSocket frames from a driver connection, where the driver id comes
//! from the connection path, and HTTP submissions, which carry `driver_id` in
//! the body. Both share the same coordinate coercion.

use serde_json::{Map, Value};

use super::coerce::{coerce_f64, coerce_field};
use super::update::LocationUpdate;

/// Reason a producer payload was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum IngestError {
    /// Payload is not valid JSON
    InvalidJson(String),
    /// Payload is valid JSON but not an object
    NotAnObject,
    /// No usable driver identifier
    MissingDriverId,
    /// `lat` or `lng` missing or not coercible to a number
    MissingCoordinates,
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::InvalidJson(_) => write!(f, "invalid json"),
            IngestError::NotAnObject => write!(f, "expected a JSON object"),
            IngestError::MissingDriverId => write!(f, "missing driver_id"),
            IngestError::MissingCoordinates => write!(f, "missing lat/lng"),
        }
    }
}

impl std::error::Error for IngestError {}

/// Parse a frame received on a driver connection
///
/// Expected shape: `{"lat": n, "lng": n, "ts"?: n, "meta"?: {...}}`.
/// The timestamp is left at 0 when absent so the caller can stamp it.
pub fn parse_driver_frame(driver_id: &str, payload: &[u8]) -> Result<LocationUpdate, IngestError> {
    if driver_id.trim().is_empty() {
        return Err(IngestError::MissingDriverId);
    }

    let fields = parse_object(payload)?;
    build_update(driver_id.to_string(), &fields)
}

/// Parse an HTTP submission
///
/// Same shape as a driver frame plus a `driver_id` field. Numeric ids are
/// accepted and converted to their string form.
pub fn parse_submission(payload: &[u8]) -> Result<LocationUpdate, IngestError> {
    let fields = parse_object(payload)?;

    let driver_id = match fields.get("driver_id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(IngestError::MissingDriverId),
    };

    build_update(driver_id, &fields)
}

fn parse_object(payload: &[u8]) -> Result<Map<String, Value>, IngestError> {
    match serde_json::from_slice::<Value>(payload) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(IngestError::NotAnObject),
        Err(e) => Err(IngestError::InvalidJson(e.to_string())),
    }
}

fn build_update(driver_id: String, fields: &Map<String, Value>) -> Result<LocationUpdate, IngestError> {
    let lat = coerce_field(fields.get("lat"));
    let lng = coerce_field(fields.get("lng"));

    let (lat, lng) = match (lat, lng) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => return Err(IngestError::MissingCoordinates),
    };

    let ts = fields.get("ts").and_then(coerce_f64).unwrap_or(0.0);

    // Non-object meta is dropped rather than rejected
    let meta = match fields.get("meta") {
        Some(Value::Object(m)) => m.clone(),
        _ => Map::new(),
    };

    Ok(LocationUpdate::new(driver_id, lat, lng)
        .with_ts(ts)
        .with_meta(meta))
}
