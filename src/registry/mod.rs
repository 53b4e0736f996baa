//! Shared relay state
//!
//! Two stores are shared between every connection task and the broadcaster:
//! the [`ConnectionRegistry`] and the [`LastKnownCache`]. Each owns its own
//! lock and only exposes whole operations, never the raw maps.
//!
//! ```text
//!        driver tasks                     monitor tasks
//!   add/release_producer           add/remove_consumer, set_filter
//!             │                                 │
//!             ▼                                 ▼
//!   ┌───────────────────────────────────────────────────┐
//!   │ ConnectionRegistry (one RwLock)                   │
//!   │   producers: driver_id → handle                   │
//!   │   consumers: id → handle                          │
//!   │   subscriptions: id → driver filter               │
//!   └──────────────────────────┬────────────────────────┘
//!                              │ snapshot()
//!                              ▼
//!                         Broadcaster ── remove_consumer() on failed delivery
//! ```

pub mod cache;
pub mod connection;
pub mod snapshot;
pub mod store;

pub use cache::LastKnownCache;
pub use connection::{ConnectionHandle, ConnectionId, DeliveryError};
pub use snapshot::{filter_accepts, ConsumerSnapshot};
pub use store::ConnectionRegistry;
