//! Error types
//!
//! The relay core never fails a producer because of downstream trouble, so
//! most of these only surface at the edges: HTTP submission validation,
//! listener setup and sink construction.

use crate::location::IngestError;
use crate::relay::SinkError;

/// Crate-wide error type
#[derive(Debug)]
pub enum Error {
    /// Socket or listener I/O failure
    Io(std::io::Error),
    /// A producer message or submission was rejected
    Ingest(IngestError),
    /// The external sink could not be created or published to
    Sink(SinkError),
    /// Invalid configuration value
    Config(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Ingest(e) => write!(f, "Rejected update: {}", e),
            Error::Sink(e) => write!(f, "Sink error: {}", e),
            Error::Config(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Ingest(e) => Some(e),
            Error::Sink(e) => Some(e),
            Error::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<IngestError> for Error {
    fn from(e: IngestError) -> Self {
        Error::Ingest(e)
    }
}

impl From<SinkError> for Error {
    fn from(e: SinkError) -> Self {
        Error::Sink(e)
    }
}

/// Result alias using the crate error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_wraps_ingest_error() {
        let err = Error::from(IngestError::MissingCoordinates);
        assert_eq!(err.to_string(), "Rejected update: missing lat/lng");
    }

    #[test]
    fn test_io_error_has_source() {
        let err = Error::from(std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            "port taken",
        ));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("port taken"));
    }
}
