//! Integration tests for log verification and container conformance.
//!
//! These tests are implemented in:
//! - `crates/crival-log/tests/log_file_test.rs`
//! - `crates/crival-validate/tests/scenarios_test.rs`
//!
//! Covered scenarios:
//! - `json_file_matches_stream_and_payload`: JSON-per-line file, exact stream match
//! - `cri_file_with_both_streams`: tagged file with stdout and stderr lines
//! - `poll_sees_lines_written_later`: polling a file still being written
//! - `rotated_file_stays_unchanged`: rotation leaves the old file frozen
//! - `every_scenario_passes_against_fake_runtime`: all conformance scenarios
//! - `sandbox_is_torn_down_after_failure`: teardown runs on every exit path
//! - `slow_stop_loses_the_race`: bounded stop reports a timeout
