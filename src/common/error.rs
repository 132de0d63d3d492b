//! Error types for testrig
//!
//! One central error enum covering all layers: transport, routing,
//! resolution and the runner itself. Transport and routing errors are
//! turned into failed test results by the runner; resolution errors
//! abort the run before anything executes.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for testrig
#[derive(Error, Debug)]
pub enum Error {
    // === Transport Errors ===
    #[error("Failed to connect to '{resource}': {reason}")]
    ConnectFailed { resource: String, reason: String },

    #[error("Missing credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Timed out after {0} seconds waiting for the remote prompt")]
    Timeout(u64),

    // === Routing Errors ===
    #[error("Unsupported target scheme '{0}'. Supported: local, ssh, serial, stty, telnet, uboot")]
    UnsupportedScheme(String),

    #[error("Unknown execution context '{0}'")]
    UnknownContext(String),

    // === Resolution Errors ===
    #[error("Cyclic dependency between suites detected")]
    CyclicDependency,

    #[error("'{0}' is neither a known test nor a known suite")]
    UnknownName(String),

    // === Runner Errors ===
    #[error("Command output does not match expectation")]
    ExpectationMismatch,

    #[error("Some tests or suites failed")]
    RunFailed,

    // === Addressing Errors ===
    #[error("Invalid target URI: {0}")]
    InvalidUri(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Unsupported event format '{0}'. Supported: human, machine")]
    UnsupportedFormat(String),

    #[error("Invalid prompt pattern '{pattern}': {error}")]
    InvalidPattern { pattern: String, error: String },

    // === Spec File Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Invalid spec file '{path}': {error}")]
    SpecParse { path: String, error: String },

    #[error("No {1} named '{0}'")]
    SpecNotFound(String, &'static str),

    #[error("A {1} named '{0}' already exists")]
    SpecExists(String, &'static str),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create a connect failure for a given resource
    pub fn connect_failed(resource: &str, reason: impl ToString) -> Self {
        Self::ConnectFailed {
            resource: resource.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a spec parse error for a given path
    pub fn spec_parse(path: &std::path::Path, error: impl ToString) -> Self {
        Self::SpecParse {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// True if this error should fail the test that triggered it rather
    /// than abort the whole run
    pub fn is_test_failure(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailed { .. }
                | Self::CommandFailed(_)
                | Self::Timeout(_)
                | Self::UnknownContext(_)
                | Self::ExpectationMismatch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_are_test_failures() {
        assert!(Error::CommandFailed("x".into()).is_test_failure());
        assert!(Error::Timeout(30).is_test_failure());
        assert!(Error::UnknownContext("dev".into()).is_test_failure());
        assert!(!Error::CyclicDependency.is_test_failure());
        assert!(!Error::UnknownName("a".into()).is_test_failure());
    }

    #[test]
    fn test_error_messages_name_the_offender() {
        let e = Error::UnknownName("boot-checks".into());
        assert!(e.to_string().contains("boot-checks"));

        let e = Error::connect_failed("ssh://box", "connection refused");
        assert!(e.to_string().contains("ssh://box"));
        assert!(e.to_string().contains("connection refused"));
    }
}
