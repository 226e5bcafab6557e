//! Error handling module for the firehose router
//!
//! This module defines the error types used at the edges of the
//! application: startup, configuration, I/O and the operational API. The
//! routing core itself is infallible; failures inside collaborators are
//! logged where they happen.

use thiserror::Error;

/// Result type alias for firehose router operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the firehose router
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// App directory errors
    #[error("App directory error: {0}")]
    Directory(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create an app directory error
    pub fn directory<S: Into<String>>(msg: S) -> Self {
        Error::Directory(msg.into())
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }
}

/// Convert from envconfig::Error to our Error type
impl From<envconfig::Error> for Error {
    fn from(err: envconfig::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::directory("closed").to_string(),
            "App directory error: closed"
        );
        assert_eq!(
            Error::internal("bind failed").to_string(),
            "Internal error: bind failed"
        );
    }

    #[test]
    fn test_from_envconfig_error() {
        let err: Error = envconfig::Error::EnvVarMissing { name: "EVENTS" }.into();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_io_error() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
