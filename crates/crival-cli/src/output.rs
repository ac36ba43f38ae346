//! Formatted output helpers for CLI commands.

use chrono::SecondsFormat;
use crival_log::LogRecord;

/// Formats a record as a table row, with the payload's trailing newline
/// shown as `\n`.
#[must_use]
pub fn format_record(record: &LogRecord) -> String {
    format!(
        "{:<32} {:<8} {}",
        record.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
        record.stream,
        record.payload.escape_debug()
    )
}
