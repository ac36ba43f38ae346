//! `crival verify` — Check a container log file for a message.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};
use crival_common::config::ValidateConfig;
use crival_log::LogStream;
use crival_log::poll::wait_for;

/// Stream selector for `--stream`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamArg {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl From<StreamArg> for LogStream {
    fn from(arg: StreamArg) -> Self {
        match arg {
            StreamArg::Stdout => Self::Stdout,
            StreamArg::Stderr => Self::Stderr,
        }
    }
}

/// Arguments for the `verify` command.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Log file to check.
    pub file: PathBuf,

    /// Message to look for.
    #[arg(short, long)]
    pub message: String,

    /// Stream the message must appear on.
    #[arg(short, long, value_enum, default_value_t = StreamArg::Stdout)]
    pub stream: StreamArg,

    /// Match the message as given, without appending a newline.
    #[arg(long)]
    pub exact: bool,

    /// Keep re-reading the file for up to this many seconds.
    #[arg(short, long)]
    pub wait: Option<u64>,

    /// Milliseconds between re-reads; defaults to the configured log poll interval.
    #[arg(long)]
    pub interval: Option<u64>,
}

impl VerifyArgs {
    /// Payload the records are compared against.
    #[must_use]
    pub fn expected_payload(&self) -> String {
        if self.exact {
            self.message.clone()
        } else {
            format!("{}\n", self.message)
        }
    }
}

/// Executes the `verify` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a line does not decode,
/// or the message is not found in time.
pub fn execute(args: &VerifyArgs, config: &ValidateConfig) -> anyhow::Result<()> {
    let payload = args.expected_payload();
    let stream = LogStream::from(args.stream);

    match args.wait {
        None => crival_log::verify::verify_log_contents(&args.file, &payload, &stream)?,
        Some(secs) => {
            let interval = args
                .interval
                .map_or_else(|| config.log_poll_interval(), Duration::from_millis);
            let _ = wait_for(
                &format!("{payload:?} on {stream} in {}", args.file.display()),
                || crival_log::read_all(&args.file),
                |sequence| sequence.contains_message(&payload, &stream),
                interval,
                Duration::from_secs(secs),
            )?;
        }
    }

    println!("found {payload:?} on {stream} in {}", args.file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn args(file: PathBuf, message: &str) -> VerifyArgs {
        VerifyArgs {
            file,
            message: message.into(),
            stream: StreamArg::Stdout,
            exact: false,
            wait: None,
            interval: None,
        }
    }

    fn log_file(dir: &tempfile::TempDir, line: &str) -> PathBuf {
        let path = dir.path().join("c.log");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, "{line}").expect("write");
        path
    }

    #[test]
    fn newline_is_appended_unless_exact() {
        let mut a = args(PathBuf::from("c.log"), "hello");
        assert_eq!(a.expected_payload(), "hello\n");
        a.exact = true;
        assert_eq!(a.expected_payload(), "hello");
    }

    #[test]
    fn verify_finds_message() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = log_file(&dir, "2016-10-06T00:17:09.669794202Z stdout F hello World");
        execute(&args(path, "hello World"), &ValidateConfig::default()).expect("found");
    }

    #[test]
    fn verify_with_wait_times_out_on_wrong_stream() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = log_file(&dir, "2016-10-06T00:17:09.669794202Z stdout F hello World");
        let a = VerifyArgs {
            stream: StreamArg::Stderr,
            wait: Some(0),
            interval: Some(1),
            ..args(path, "hello World")
        };
        let err = execute(&a, &ValidateConfig::default()).unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
