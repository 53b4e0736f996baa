//! Directives sent by monitors
//!
//! Monitors speak plain text. The only directive is `subscribe:<driver_id>`;
//! everything else (pings, chatter) is ignored.

/// Prefix of the subscribe directive
pub const SUBSCRIBE_PREFIX: &str = "subscribe:";

/// A parsed monitor directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorCommand {
    /// Restrict the monitor to one driver; an empty id means all drivers
    Subscribe(String),
}

impl MonitorCommand {
    /// Parse a text frame, `None` if it is not a directive
    pub fn parse(text: &str) -> Option<Self> {
        text.strip_prefix(SUBSCRIBE_PREFIX)
            .map(|driver_id| MonitorCommand::Subscribe(driver_id.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subscribe() {
        assert_eq!(
            MonitorCommand::parse("subscribe:D1"),
            Some(MonitorCommand::Subscribe("D1".into()))
        );
        assert_eq!(
            MonitorCommand::parse("subscribe:  D 2 \n"),
            Some(MonitorCommand::Subscribe("D 2".into()))
        );
    }

    #[test]
    fn test_parse_empty_subscribe() {
        assert_eq!(
            MonitorCommand::parse("subscribe:"),
            Some(MonitorCommand::Subscribe(String::new()))
        );
    }

    #[test]
    fn test_parse_ignores_other_text() {
        assert_eq!(MonitorCommand::parse("ping"), None);
        assert_eq!(MonitorCommand::parse(" subscribe:D1"), None);
        assert_eq!(MonitorCommand::parse("SUBSCRIBE:D1"), None);
        assert_eq!(MonitorCommand::parse(""), None);
    }
}
