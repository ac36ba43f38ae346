//! Whole-file log reading and queries.
//!
//! Nothing is cached between calls. Each read re-opens the file, decodes
//! it from the start, and closes it before returning, so callers can poll
//! a file the runtime is still writing or has just rotated.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crival_common::error::{CrivalError, Result};

use crate::decode::decode;
use crate::record::{LogRecord, LogStream};

/// Records decoded from one log file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSequence {
    records: Vec<LogRecord>,
}

impl LogSequence {
    /// Wraps already-decoded records.
    #[must_use]
    pub const fn new(records: Vec<LogRecord>) -> Self {
        Self { records }
    }

    /// Returns whether some record carries exactly `payload` on `stream`.
    ///
    /// No substring or trimmed matching is done.
    #[must_use]
    pub fn contains_message(&self, payload: &str, stream: &LogStream) -> bool {
        self.records.iter().any(|r| r.matches(payload, stream))
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the file had no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the records in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, LogRecord> {
        self.records.iter()
    }

    /// Borrows the records as a slice.
    #[must_use]
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Unwraps the records.
    #[must_use]
    pub fn into_records(self) -> Vec<LogRecord> {
        self.records
    }
}

impl IntoIterator for LogSequence {
    type Item = LogRecord;
    type IntoIter = std::vec::IntoIter<LogRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a LogSequence {
    type Item = &'a LogRecord;
    type IntoIter = std::slice::Iter<'a, LogRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Resolves a container log path against its sandbox log directory.
#[must_use]
pub fn log_file_path(log_directory: &Path, log_path: &Path) -> PathBuf {
    log_directory.join(log_path)
}

/// Reads and decodes every line of the log file at `path`.
///
/// # Errors
///
/// Returns [`CrivalError::Io`] if the file cannot be opened or a read
/// fails, and [`CrivalError::MalformedRecord`] on the first line that
/// does not decode.
pub fn read_all(path: &Path) -> Result<LogSequence> {
    let file = File::open(path).map_err(|e| CrivalError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), "opened log file");

    let mut reader = BufReader::new(file);
    let mut records = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).map_err(|e| CrivalError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if read == 0 {
            break;
        }
        // Containers may print bytes that are not UTF-8; such lines still decode.
        let line = String::from_utf8_lossy(trim_line_end(&buf));
        records.push(decode(&line)?);
    }

    tracing::debug!(path = %path.display(), records = records.len(), "parsed container log");
    Ok(LogSequence::new(records))
}

fn trim_line_end(mut line: &[u8]) -> &[u8] {
    if let [rest @ .., b'\n'] = line {
        line = rest;
    }
    if let [rest @ .., b'\r'] = line {
        line = rest;
    }
    line
}

/// Asserts that the log file at `path` holds `payload` on `stream`.
///
/// # Errors
///
/// Propagates [`read_all`] errors, and returns [`CrivalError::Assertion`]
/// listing the decoded records if no record matches.
pub fn verify_log_contents(path: &Path, payload: &str, stream: &LogStream) -> Result<()> {
    tracing::info!(path = %path.display(), %stream, ?payload, "verify log contents");
    let sequence = read_all(path)?;
    if sequence.contains_message(payload, stream) {
        return Ok(());
    }
    Err(CrivalError::assertion(format!(
        "expected log {payload:?} (stream={stream}) not found in logs {:?}",
        sequence.records()
    )))
}
