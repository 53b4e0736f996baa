//! Live driver location relay
//!
//! Drivers stream their position over a WebSocket (or POST it over HTTP).
//! Every accepted update replaces the driver's entry in a last-known cache
//! and is queued for a single broadcaster task, which forwards it to an
//! optional external pub/sub sink and fans it out to every monitor whose
//! filter matches.
//!
//! ```no_run
//! use live_location::relay::NoopSink;
//! use live_location::server::{LocationServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> live_location::Result<()> {
//!     let server = LocationServer::new(ServerConfig::default(), NoopSink);
//!     server.run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     }).await
//! }
//! ```
//!
//! The pieces are usable on their own: [`session::LocationHub`] drives the
//! relay without any transport, and [`server::build_router`] exposes it as an
//! axum router.

pub mod error;
pub mod location;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use location::LocationUpdate;
pub use relay::{Broadcaster, LocationSink, NoopSink};
pub use server::{LocationServer, ServerConfig};
pub use session::LocationHub;
