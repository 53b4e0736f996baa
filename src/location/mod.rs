//! Location data model and ingestion
//!
//! Everything needed to turn a producer payload into a validated
//! [`LocationUpdate`], independent of any connection handling.

pub mod coerce;
pub mod ingest;
pub mod update;

pub use coerce::coerce_f64;
pub use ingest::{parse_driver_frame, parse_submission, IngestError};
pub use update::{now_epoch_secs, LocationUpdate, LOCATION_KIND};
