//! Configuration model for conformance runs.
//!
//! Every timeout, poll interval, and default value the scenarios use is
//! carried here and passed in explicitly.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{CrivalError, Result};

/// Root configuration for a conformance run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateConfig {
    /// Grace period passed to `StopContainer`; also bounds the stop race.
    pub stop_container_timeout_secs: u64,
    /// Deadline for `ExecSync` calls.
    pub exec_sync_timeout_secs: u64,
    /// Text the logging containers echo.
    pub default_log: String,
    /// Interval between container state probes.
    pub state_poll_interval_ms: u64,
    /// Upper bound on waiting for a container state.
    pub state_poll_timeout_ms: u64,
    /// Interval between log file probes.
    pub log_poll_interval_ms: u64,
    /// Upper bound on waiting for log output.
    pub log_poll_timeout_ms: u64,
    /// Window during which a rotated log must stay unchanged.
    pub log_steady_window_ms: u64,
    /// Image used by default containers.
    pub default_image: String,
    /// Image with declared volumes.
    pub default_volume_image: String,
    /// Attempt number recorded in container metadata.
    pub default_attempt: u32,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            stop_container_timeout_secs: constants::DEFAULT_STOP_CONTAINER_TIMEOUT_SECS,
            exec_sync_timeout_secs: constants::DEFAULT_EXEC_SYNC_TIMEOUT_SECS,
            default_log: constants::DEFAULT_LOG.to_string(),
            state_poll_interval_ms: 4_000,
            state_poll_timeout_ms: 60_000,
            log_poll_interval_ms: 1_000,
            log_poll_timeout_ms: 60_000,
            log_steady_window_ms: 5_000,
            default_image: constants::DEFAULT_CONTAINER_IMAGE.to_string(),
            default_volume_image: constants::DEFAULT_CONTAINER_VOLUME_IMAGE.to_string(),
            default_attempt: constants::DEFAULT_ATTEMPT,
        }
    }
}

impl ValidateConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON,
    /// or contains an invalid combination of values.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CrivalError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every poll interval is non-zero and fits its window.
    ///
    /// # Errors
    ///
    /// Returns [`CrivalError::Config`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        let pairs = [
            ("state poll", self.state_poll_interval_ms, self.state_poll_timeout_ms),
            ("log poll", self.log_poll_interval_ms, self.log_poll_timeout_ms),
            ("log steady", self.log_poll_interval_ms, self.log_steady_window_ms),
        ];
        for (name, interval, window) in pairs {
            if interval == 0 {
                return Err(CrivalError::Config {
                    message: format!("{name} interval must be non-zero"),
                });
            }
            if interval > window {
                return Err(CrivalError::Config {
                    message: format!("{name} interval {interval}ms exceeds its window {window}ms"),
                });
            }
        }
        if self.default_log.contains('\n') {
            return Err(CrivalError::Config {
                message: "default_log must be a single line".into(),
            });
        }
        Ok(())
    }

    /// Grace period for `StopContainer`.
    #[must_use]
    pub const fn stop_container_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_container_timeout_secs)
    }

    /// Deadline for `ExecSync`.
    #[must_use]
    pub const fn exec_sync_timeout(&self) -> Duration {
        Duration::from_secs(self.exec_sync_timeout_secs)
    }

    /// Interval between container state probes.
    #[must_use]
    pub const fn state_poll_interval(&self) -> Duration {
        Duration::from_millis(self.state_poll_interval_ms)
    }

    /// Upper bound on waiting for a container state.
    #[must_use]
    pub const fn state_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.state_poll_timeout_ms)
    }

    /// Interval between log file probes.
    #[must_use]
    pub const fn log_poll_interval(&self) -> Duration {
        Duration::from_millis(self.log_poll_interval_ms)
    }

    /// Upper bound on waiting for log output.
    #[must_use]
    pub const fn log_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.log_poll_timeout_ms)
    }

    /// Window during which a rotated log must stay unchanged.
    #[must_use]
    pub const fn log_steady_window(&self) -> Duration {
        Duration::from_millis(self.log_steady_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_conformance_values() {
        let cfg = ValidateConfig::default();
        assert_eq!(cfg.stop_container_timeout(), Duration::from_secs(60));
        assert_eq!(cfg.exec_sync_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.default_log, "hello World");
        assert_eq!(cfg.state_poll_interval(), Duration::from_secs(4));
        assert_eq!(cfg.log_steady_window(), Duration::from_secs(5));
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn from_file_fills_missing_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("crival.json");
        std::fs::write(&path, r#"{"default_log":"bonjour","log_poll_interval_ms":10}"#)
            .expect("write");

        let cfg = ValidateConfig::from_file(&path).expect("load");
        assert_eq!(cfg.default_log, "bonjour");
        assert_eq!(cfg.log_poll_interval_ms, 10);
        assert_eq!(cfg.exec_sync_timeout_secs, 5);
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ValidateConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CrivalError::Io { .. }));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let cfg = ValidateConfig {
            state_poll_interval_ms: 0,
            ..ValidateConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(CrivalError::Config { .. })));
    }

    #[test]
    fn interval_longer_than_window_is_rejected() {
        let cfg = ValidateConfig {
            log_poll_interval_ms: 10_000,
            ..ValidateConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn multiline_default_log_is_rejected() {
        let cfg = ValidateConfig {
            default_log: "a\nb".into(),
            ..ValidateConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
