//! Connection session state
//!
//! Tracks one WebSocket connection from upgrade to teardown. The registry
//! is the source of truth for routing; this is the connection task's own
//! view, used for lifecycle bookkeeping and the close log line.

use std::time::{Duration, Instant};

use crate::protocol::MonitorCommand;
use crate::registry::ConnectionId;

use super::subscription::Subscription;

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Upgraded, not yet registered
    Connected,
    /// Registered and exchanging frames
    Active,
    /// Read loop ended, releasing registry entries
    Closing,
    /// Fully torn down
    Closed,
}

/// Which side of the relay the connection is on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRole {
    /// A driver publishing its own position
    Driver { driver_id: String },
    /// A monitor receiving fan-out
    Monitor { subscription: Subscription },
}

/// State of a single connection
#[derive(Debug)]
pub struct SessionState {
    /// Registry identifier
    pub id: ConnectionId,

    /// Driver or monitor
    pub role: SessionRole,

    /// Current phase
    pub phase: SessionPhase,

    /// Connection start time
    pub connected_at: Instant,

    /// Frames read from the socket
    pub frames_received: u64,

    /// Frames that failed validation (drivers only)
    pub frames_rejected: u64,
}

impl SessionState {
    /// State for a driver connection
    pub fn driver(id: ConnectionId, driver_id: impl Into<String>) -> Self {
        Self::new(
            id,
            SessionRole::Driver {
                driver_id: driver_id.into(),
            },
        )
    }

    /// State for a monitor connection
    pub fn monitor(id: ConnectionId, subscription: Subscription) -> Self {
        Self::new(id, SessionRole::Monitor { subscription })
    }

    fn new(id: ConnectionId, role: SessionRole) -> Self {
        Self {
            id,
            role,
            phase: SessionPhase::Connected,
            connected_at: Instant::now(),
            frames_received: 0,
            frames_rejected: 0,
        }
    }

    /// Registered with the relay
    pub fn activate(&mut self) {
        if self.phase == SessionPhase::Connected {
            self.phase = SessionPhase::Active;
        }
    }

    /// Count an inbound frame
    pub fn on_frame(&mut self, accepted: bool) {
        self.frames_received += 1;
        if !accepted {
            self.frames_rejected += 1;
        }
    }

    /// Apply a monitor directive; no-op for drivers
    pub fn on_command(&mut self, command: &MonitorCommand) {
        if let SessionRole::Monitor { subscription } = &mut self.role {
            subscription.apply(command);
        }
    }

    /// Current subscription, `None` for drivers
    pub fn subscription(&self) -> Option<&Subscription> {
        match &self.role {
            SessionRole::Monitor { subscription } => Some(subscription),
            SessionRole::Driver { .. } => None,
        }
    }

    /// Start tearing down
    pub fn close(&mut self) {
        if self.phase != SessionPhase::Closed {
            self.phase = SessionPhase::Closing;
        }
    }

    /// Teardown finished
    pub fn finish(&mut self) {
        self.phase = SessionPhase::Closed;
    }

    /// Time since the connection was accepted
    pub fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Whether the session is exchanging frames
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }
}
