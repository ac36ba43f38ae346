//! Line decoder for the two container log encodings.
//!
//! JSON encoding, one object per line:
//!
//! ```text
//! {"log":"content 1","stream":"stdout","time":"2016-10-20T18:39:20.57606443Z"}
//! ```
//!
//! Tagged CRI encoding, four space-separated fields:
//!
//! ```text
//! 2016-10-06T00:17:09.669794202Z stdout P The content of the log entry 1
//! 2016-10-06T00:17:10.113242941Z stderr F The content of the log entry 2
//! ```

use chrono::{DateTime, Utc};
use crival_common::error::{CrivalError, Result};
use serde::Deserialize;

use crate::record::{LogRecord, LogStream};

/// Encoding of a single raw log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// `TIMESTAMP STREAM TAG CONTENT`.
    Cri,
}

/// Picks the encoding of `line` from its first non-space character.
#[must_use]
pub fn classify(line: &str) -> LogFormat {
    if line.trim_start().starts_with('{') {
        LogFormat::Json
    } else {
        LogFormat::Cri
    }
}

/// Decodes one raw line, whatever its encoding.
///
/// # Errors
///
/// Returns [`CrivalError::MalformedRecord`] if the line does not parse in
/// the encoding [`classify`] picked for it.
pub fn decode(line: &str) -> Result<LogRecord> {
    match classify(line) {
        LogFormat::Json => decode_json(line),
        LogFormat::Cri => decode_cri(line),
    }
}

#[derive(Deserialize)]
struct JsonLogLine {
    log: String,
    stream: String,
    time: DateTime<Utc>,
}

/// Decodes a JSON-encoded line. The `log` field is kept verbatim.
///
/// # Errors
///
/// Returns [`CrivalError::MalformedRecord`] if the line is not an object
/// with string `log` and `stream` fields and an RFC 3339 `time` field.
pub fn decode_json(line: &str) -> Result<LogRecord> {
    let parsed: JsonLogLine = serde_json::from_str(line).map_err(|e| malformed(line, e))?;
    Ok(LogRecord {
        timestamp: parsed.time,
        stream: LogStream::from(parsed.stream),
        payload: parsed.log,
    })
}

/// Decodes a tagged CRI line.
///
/// Content is everything after the third space, with a newline appended.
/// The partial/full tag is not interpreted: every physical line yields
/// one record.
///
/// # Errors
///
/// Returns [`CrivalError::MalformedRecord`] if the line has fewer than
/// four fields or its timestamp is not RFC 3339.
pub fn decode_cri(line: &str) -> Result<LogRecord> {
    let mut fields = line.splitn(4, ' ');
    let (Some(timestamp), Some(stream), Some(_tag), Some(content)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(malformed(line, "expected TIMESTAMP STREAM TAG CONTENT"));
    };

    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|e| malformed(line, format!("bad timestamp {timestamp:?}: {e}")))?
        .with_timezone(&Utc);

    Ok(LogRecord {
        timestamp,
        stream: LogStream::from(stream),
        payload: format!("{content}\n"),
    })
}

fn malformed(line: &str, reason: impl std::fmt::Display) -> CrivalError {
    CrivalError::MalformedRecord {
        line: line.to_string(),
        reason: reason.to_string(),
    }
}
