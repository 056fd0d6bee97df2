//! Error types for dbreg

use thiserror::Error;

/// Core error type for dbreg operations
#[derive(Error, Debug)]
pub enum DbRegError {
    /// The requested connection name is not present in the configuration
    #[error("unknown connection: {0}")]
    UnknownConnection(String),

    #[error("unknown driver: {0}")]
    UnknownDriver(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection is closed")]
    Closed,

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl DbRegError {
    /// Check whether this error reports an unconfigured connection name
    pub fn is_unknown_connection(&self) -> bool {
        matches!(self, DbRegError::UnknownConnection(_))
    }
}

/// Result type alias for dbreg operations
pub type Result<T> = std::result::Result<T, DbRegError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_connection_message_names_the_connection() {
        let err = DbRegError::UnknownConnection("reporting".into());
        assert_eq!(err.to_string(), "unknown connection: reporting");
        assert!(err.is_unknown_connection());
    }

    #[test]
    fn test_other_errors_are_not_unknown_connection() {
        assert!(!DbRegError::Closed.is_unknown_connection());
        assert!(!DbRegError::UnknownDriver("x".into()).is_unknown_connection());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DbRegError = io.into();
        assert!(matches!(err, DbRegError::Io(_)));
    }
}
