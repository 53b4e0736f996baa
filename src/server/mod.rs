//! HTTP and WebSocket transport
//!
//! ```text
//!   /ws/driver/{id} ──► reader ──► LocationHub::ingest_frame
//!   /ws/monitor     ──► reader ──► subscribe:<id>
//!                       writer ◄── outbound queue ◄── Broadcaster
//!   POST /location  ──► LocationHub::submit
//!   GET  /locations, /locations/{id}, /stats, /healthz
//! ```

pub mod config;
pub mod connection;
pub mod http;
pub mod listener;
pub mod routes;
pub mod ws;

pub use config::ServerConfig;
pub use connection::ServerState;
pub use listener::LocationServer;
pub use routes::build_router;
