//! Normalized log record shared by both encodings.

use std::fmt;

use chrono::{DateTime, Utc};
use crival_common::constants::{STDERR, STDOUT};
use serde::{Deserialize, Serialize};

/// Output stream a log line was written to.
///
/// Unrecognized markers are kept verbatim in [`LogStream::Other`] rather
/// than rejected; they never compare equal to `Stdout` or `Stderr`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogStream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
    /// Any other marker, as found in the file.
    Other(String),
}

impl LogStream {
    /// Returns the wire name of the stream.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Stdout => STDOUT,
            Self::Stderr => STDERR,
            Self::Other(raw) => raw,
        }
    }
}

impl From<&str> for LogStream {
    fn from(raw: &str) -> Self {
        match raw {
            STDOUT => Self::Stdout,
            STDERR => Self::Stderr,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for LogStream {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            STDOUT => Self::Stdout,
            STDERR => Self::Stderr,
            _ => Self::Other(raw),
        }
    }
}

impl From<LogStream> for String {
    fn from(stream: LogStream) -> Self {
        match stream {
            LogStream::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// When the runtime captured the line, with nanosecond precision.
    pub timestamp: DateTime<Utc>,
    /// Stream the line was written to.
    pub stream: LogStream,
    /// Decoded text. Tagged lines carry a trailing newline.
    pub payload: String,
}

impl LogRecord {
    /// Returns whether this record carries exactly `payload` on `stream`.
    #[must_use]
    pub fn matches(&self, payload: &str, stream: &LogStream) -> bool {
        self.payload == payload && &self.stream == stream
    }
}
