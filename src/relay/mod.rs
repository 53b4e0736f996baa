//! Update queue and fan-out
//!
//! Driver connections enqueue updates without waiting; a single broadcaster
//! task drains the queue, publishes to the external sink and delivers to
//! monitors.
//!
//! ```text
//!   driver task ──┐
//!   driver task ──┼──► UpdateQueue (bounded, drop newest) ──► Broadcaster
//!   POST /location┘                                             │
//!                                   ┌───────────────────────────┤
//!                                   ▼                           ▼
//!                          LocationSink::publish      registry.snapshot()
//!                            (best effort)          filter → send → prune
//! ```

pub mod broadcaster;
pub mod config;
pub mod queue;
#[cfg(feature = "redis-sink")]
pub mod redis_sink;
pub mod sink;

pub use broadcaster::{Broadcaster, FanoutReport};
pub use config::RelayConfig;
pub use queue::{EnqueueOutcome, QueueReceiver, UpdateQueue};
#[cfg(feature = "redis-sink")]
pub use redis_sink::RedisSink;
pub use sink::{LocationSink, MemorySink, NoopSink, SinkError};
