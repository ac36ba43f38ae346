//! Blocking poll loops.
//!
//! Probes run on the calling thread, one at a time, with a fixed sleep in
//! between. A probe error ends the loop immediately.

use std::fmt;
use std::time::{Duration, Instant};

use crival_common::error::{CrivalError, Result};

/// Why [`poll_until`] gave up.
#[derive(Debug)]
pub enum PollError<T> {
    /// The predicate never held. Carries the last probed value.
    Timeout {
        /// Value returned by the final probe.
        last: T,
        /// Time spent polling.
        waited: Duration,
    },
    /// A probe failed; polling stopped at once.
    Probe(CrivalError),
}

impl<T: fmt::Debug> PollError<T> {
    /// Converts into the workspace error, naming the awaited condition.
    pub fn into_error(self, condition: impl Into<String>) -> CrivalError {
        match self {
            Self::Timeout { last, waited } => CrivalError::Timeout {
                condition: condition.into(),
                waited,
                last_observed: format!("{last:?}"),
            },
            Self::Probe(err) => err,
        }
    }
}

impl<T: fmt::Debug> fmt::Display for PollError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { last, waited } => {
                write!(f, "condition not met after {waited:?}, last observed {last:?}")
            }
            Self::Probe(err) => write!(f, "probe failed: {err}"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for PollError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timeout { .. } => None,
            Self::Probe(err) => Some(err),
        }
    }
}

/// Runs `probe` every `interval` until `predicate` accepts its value.
///
/// Returns the first accepted value without sleeping if the first probe
/// already satisfies `predicate`. Otherwise gives up once at least
/// `timeout` has elapsed; the final sleep is clamped so the loop ends
/// within one probe of the deadline.
///
/// # Errors
///
/// Returns [`PollError::Timeout`] with the last probed value, or
/// [`PollError::Probe`] as soon as a probe fails.
pub fn poll_until<T, P, F>(
    mut probe: P,
    predicate: F,
    interval: Duration,
    timeout: Duration,
) -> std::result::Result<T, PollError<T>>
where
    P: FnMut() -> Result<T>,
    F: Fn(&T) -> bool,
{
    let start = Instant::now();
    loop {
        let value = probe().map_err(PollError::Probe)?;
        if predicate(&value) {
            return Ok(value);
        }
        let waited = start.elapsed();
        if waited >= timeout {
            return Err(PollError::Timeout { last: value, waited });
        }
        std::thread::sleep(interval.min(timeout - waited));
    }
}

/// [`poll_until`] with the failure folded into [`CrivalError`].
///
/// # Errors
///
/// Returns [`CrivalError::Timeout`] naming `condition`, or the probe's
/// own error.
pub fn wait_for<T, P, F>(
    condition: &str,
    probe: P,
    predicate: F,
    interval: Duration,
    timeout: Duration,
) -> Result<T>
where
    T: fmt::Debug,
    P: FnMut() -> Result<T>,
    F: Fn(&T) -> bool,
{
    tracing::debug!(condition, ?interval, ?timeout, "waiting");
    poll_until(probe, predicate, interval, timeout).map_err(|e| e.into_error(condition))
}

/// Requires every probe over `window` to satisfy `predicate`.
///
/// Probes immediately, then every `interval` until `window` has elapsed.
/// Returns the last probed value.
///
/// # Errors
///
/// Returns [`CrivalError::Assertion`] on the first rejected value, or the
/// probe's own error.
pub fn hold_steady<T, P, F>(
    condition: &str,
    mut probe: P,
    predicate: F,
    interval: Duration,
    window: Duration,
) -> Result<T>
where
    T: fmt::Debug,
    P: FnMut() -> Result<T>,
    F: Fn(&T) -> bool,
{
    let start = Instant::now();
    loop {
        let value = probe()?;
        if !predicate(&value) {
            return Err(CrivalError::assertion(format!(
                "{condition} stopped holding after {:?}: observed {value:?}",
                start.elapsed()
            )));
        }
        let held = start.elapsed();
        if held >= window {
            return Ok(value);
        }
        std::thread::sleep(interval.min(window - held));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    const TICK: Duration = Duration::from_millis(20);

    #[test]
    fn already_true_returns_without_sleeping() {
        let start = Instant::now();
        let v = poll_until(|| Ok(7), |v| *v == 7, Duration::from_secs(10), Duration::from_secs(60))
            .expect("immediate");
        assert_eq!(v, 7);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn becomes_true_after_a_few_probes() {
        let calls = Cell::new(0);
        let v = poll_until(
            || {
                calls.set(calls.get() + 1);
                Ok(calls.get())
            },
            |v| *v >= 3,
            Duration::from_millis(1),
            Duration::from_secs(5),
        )
        .expect("eventually");
        assert_eq!(v, 3);
    }

    #[test]
    fn never_true_times_out_within_bounds() {
        let timeout = Duration::from_millis(100);
        let start = Instant::now();
        let err = poll_until(|| Ok("created"), |_| false, TICK, timeout).unwrap_err();
        let elapsed = start.elapsed();

        assert!(elapsed >= timeout);
        assert!(elapsed < timeout + TICK + Duration::from_millis(200));
        match err {
            PollError::Timeout { last, waited } => {
                assert_eq!(last, "created");
                assert!(waited >= timeout);
            }
            PollError::Probe(e) => unreachable!("probe never fails: {e}"),
        }
    }

    #[test]
    fn probe_error_stops_immediately() {
        let calls = Cell::new(0);
        let err = poll_until(
            || -> Result<u32> {
                calls.set(calls.get() + 1);
                Err(CrivalError::assertion("boom"))
            },
            |_| true,
            TICK,
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, PollError::Probe(CrivalError::Assertion { .. })));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn wait_for_timeout_names_condition() {
        let err = wait_for("log non-empty", || Ok(0_usize), |n| *n > 0, TICK, TICK).unwrap_err();
        assert!(matches!(
            err,
            CrivalError::Timeout { ref condition, ref last_observed, .. }
                if condition == "log non-empty" && last_observed == "0"
        ));
    }

    #[test]
    fn hold_steady_accepts_constant_value() {
        let start = Instant::now();
        let window = Duration::from_millis(60);
        let v = hold_steady("length unchanged", || Ok(4), |n| *n == 4, TICK, window)
            .expect("steady");
        assert_eq!(v, 4);
        assert!(start.elapsed() >= window);
    }

    #[test]
    fn hold_steady_rejects_change() {
        let calls = Cell::new(0);
        let err = hold_steady(
            "length unchanged",
            || {
                calls.set(calls.get() + 1);
                Ok(calls.get())
            },
            |n| *n < 2,
            Duration::from_millis(1),
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(err.to_string().contains("length unchanged stopped holding"));
    }
}
