//! Unified error type for the crival workspace.
//!
//! Every variant is fatal to the scenario that raised it. Nothing in the
//! workspace retries on any of these.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum CrivalError {
    /// A log file could not be opened or read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A log line matched neither encoding or failed field parsing.
    #[error("malformed log record {line:?}: {reason}")]
    MalformedRecord {
        /// The offending raw line.
        line: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A polled condition never held within its window.
    #[error("timed out after {waited:?} waiting for {condition}; last observed: {last_observed}")]
    Timeout {
        /// Human-readable description of the awaited condition.
        condition: String,
        /// Time spent polling before giving up.
        waited: Duration,
        /// Debug rendering of the last probed value.
        last_observed: String,
    },

    /// The external runtime returned an error where none was expected.
    #[error("runtime call {operation} failed: {message}")]
    Runtime {
        /// Name of the runtime operation.
        operation: &'static str,
        /// Error reported by the runtime client.
        message: String,
    },

    /// The external runtime succeeded where an error was required.
    #[error("runtime call {operation} succeeded but an error was expected")]
    UnexpectedSuccess {
        /// Name of the runtime operation.
        operation: &'static str,
    },

    /// An observed value did not match the expectation.
    #[error("assertion failed: {message}")]
    Assertion {
        /// Description of the mismatch.
        message: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl CrivalError {
    /// Builds a [`CrivalError::Assertion`] from any displayable message.
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    /// Wraps an error reported by the runtime client.
    pub fn runtime(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Runtime {
            operation,
            message: err.to_string(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CrivalError>;
