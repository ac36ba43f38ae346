//! # crival-log
//!
//! Reads container log files written by a CRI runtime and answers
//! questions about them.
//!
//! - [`decode`]: turns one raw line, in either the JSON-per-line encoding
//!   or the tagged `TIMESTAMP STREAM TAG CONTENT` encoding, into a
//!   [`LogRecord`](record::LogRecord).
//! - [`verify`]: re-reads a whole file into a
//!   [`LogSequence`](verify::LogSequence) and queries it.
//! - [`poll`]: re-runs a probe until a predicate holds or a deadline passes.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod decode;
pub mod poll;
pub mod record;
pub mod verify;

pub use decode::decode;
pub use record::{LogRecord, LogStream};
pub use verify::{LogSequence, read_all};
