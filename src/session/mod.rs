//! Connection sessions and the relay hub
//!
//! - [`LocationHub`]: the operations connection tasks call into
//! - [`Subscription`]: a monitor's filter state machine
//! - [`SessionState`]: per-connection lifecycle bookkeeping

pub mod hub;
pub mod state;
pub mod subscription;

pub use hub::LocationHub;
pub use state::{SessionPhase, SessionRole, SessionState};
pub use subscription::Subscription;
