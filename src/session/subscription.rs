//! Monitor subscription state
//!
//! A monitor starts either unfiltered or filtered from its connect
//! parameters, and each `subscribe:` directive moves it to a new state.
//!
//! ```text
//!   ┌─────┐  subscribe:<id>   ┌────────────┐
//!   │ All │ ────────────────► │ Driver(id) │ ◄─┐ subscribe:<other>
//!   └─────┘ ◄──────────────── └────────────┘ ──┘
//!              subscribe:
//! ```

use crate::protocol::MonitorCommand;
use crate::registry::filter_accepts;

/// What a monitor wants to receive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Subscription {
    /// Every driver
    #[default]
    All,
    /// A single driver id
    Driver(String),
}

impl Subscription {
    /// Build from a raw filter value; blank means unfiltered
    pub fn from_filter(filter: &str) -> Self {
        let filter = filter.trim();
        if filter.is_empty() {
            Subscription::All
        } else {
            Subscription::Driver(filter.to_string())
        }
    }

    /// Registry filter string (empty for `All`)
    pub fn filter(&self) -> &str {
        match self {
            Subscription::All => "",
            Subscription::Driver(id) => id,
        }
    }

    /// Whether an update from `driver_id` should be delivered
    pub fn accepts(&self, driver_id: &str) -> bool {
        filter_accepts(self.filter(), driver_id)
    }

    /// Apply a directive and return the new state
    pub fn apply(&mut self, command: &MonitorCommand) -> &Self {
        match command {
            MonitorCommand::Subscribe(driver_id) => *self = Subscription::from_filter(driver_id),
        }
        self
    }
}

impl std::fmt::Display for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subscription::All => write!(f, "*"),
            Subscription::Driver(id) => write!(f, "{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_filter() {
        assert_eq!(Subscription::from_filter(""), Subscription::All);
        assert_eq!(Subscription::from_filter("  "), Subscription::All);
        assert_eq!(
            Subscription::from_filter("D1"),
            Subscription::Driver("D1".into())
        );
    }

    #[test]
    fn test_accepts() {
        assert!(Subscription::All.accepts("anyone"));

        let only_d1 = Subscription::Driver("D1".into());
        assert!(only_d1.accepts("D1"));
        assert!(!only_d1.accepts("D2"));
    }

    #[test]
    fn test_transitions() {
        let mut sub = Subscription::All;

        sub.apply(&MonitorCommand::Subscribe("D1".into()));
        assert_eq!(sub, Subscription::Driver("D1".into()));

        sub.apply(&MonitorCommand::Subscribe("D2".into()));
        assert_eq!(sub, Subscription::Driver("D2".into()));

        sub.apply(&MonitorCommand::Subscribe(String::new()));
        assert_eq!(sub, Subscription::All);
    }

    #[test]
    fn test_display() {
        assert_eq!(Subscription::All.to_string(), "*");
        assert_eq!(Subscription::Driver("D7".into()).to_string(), "D7");
    }
}
