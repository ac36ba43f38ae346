//! Container lifecycle assertions.
//!
//! Every runtime error is fatal to the caller. Where a call is required to
//! fail, success is reported as [`CrivalError::UnexpectedSuccess`].

use std::path::Path;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crival_common::error::{CrivalError, Result};
use crival_common::types::{
    Container, ContainerFilter, ContainerId, ContainerState, ContainerStatus,
};
use crival_log::poll::{hold_steady, wait_for};
use crival_log::{LogSequence, LogStream, read_all};

use crate::client::ClientResult;
use crate::framework::Harness;

/// Turns a call that must fail into a result.
///
/// # Errors
///
/// Returns [`CrivalError::UnexpectedSuccess`] if `result` is `Ok`.
pub fn expect_runtime_error<T>(operation: &'static str, result: ClientResult<T>) -> Result<()> {
    match result {
        Ok(_) => Err(CrivalError::UnexpectedSuccess { operation }),
        Err(e) => {
            tracing::debug!(operation, error = %e, "runtime call failed as expected");
            Ok(())
        }
    }
}

impl Harness {
    /// Fetches the status of a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime call fails.
    pub fn container_status(&self, id: &ContainerId) -> Result<ContainerStatus> {
        tracing::debug!(%id, "get container status");
        self.runtime
            .container_status(id)
            .map_err(|e| CrivalError::runtime("ContainerStatus", e))
    }

    /// Polls the container until it reports `state`.
    ///
    /// # Errors
    ///
    /// Returns [`CrivalError::Timeout`] carrying the last observed state,
    /// or the first failed status call.
    pub fn wait_for_state(&self, id: &ContainerId, state: ContainerState) -> Result<()> {
        let _ = wait_for(
            &format!("container {id} to reach {state}"),
            || Ok(self.container_status(id)?.state),
            |observed| *observed == state,
            self.config.state_poll_interval(),
            self.config.state_poll_timeout(),
        )?;
        Ok(())
    }

    /// Starts a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime call fails.
    pub fn start_container(&self, id: &ContainerId) -> Result<()> {
        tracing::info!(%id, "start container");
        self.runtime
            .start_container(id)
            .map_err(|e| CrivalError::runtime("StartContainer", e))?;
        tracing::info!(%id, "started container");
        Ok(())
    }

    /// Starts a container and waits until it is running.
    ///
    /// # Errors
    ///
    /// Returns an error if the start fails or the state never becomes
    /// [`ContainerState::Running`].
    pub fn start_container_and_wait(&self, id: &ContainerId) -> Result<()> {
        self.start_container(id)?;
        self.wait_for_state(id, ContainerState::Running)
    }

    /// Stops a container, giving up once `timeout` has passed.
    ///
    /// The runtime call runs on its own thread and races a deadline. When
    /// the deadline wins the call is left running and its result dropped,
    /// so the container may still stop after this returns.
    ///
    /// # Errors
    ///
    /// Returns [`CrivalError::Timeout`] if the call has not returned in
    /// time, or the runtime's error if it failed.
    pub fn stop_container(&self, id: &ContainerId, timeout: Duration) -> Result<()> {
        tracing::info!(%id, ?timeout, "stop container");
        let (tx, rx) = mpsc::sync_channel(1);
        let runtime = Arc::clone(&self.runtime);
        let target = id.clone();
        let _detached = std::thread::spawn(move || {
            let _ = tx.send(runtime.stop_container(&target, timeout).map_err(|e| e.to_string()));
        });

        match rx.recv_timeout(timeout) {
            Ok(Ok(())) => {
                tracing::info!(%id, "stopped container");
                Ok(())
            }
            Ok(Err(message)) => Err(CrivalError::Runtime {
                operation: "StopContainer",
                message,
            }),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(CrivalError::Timeout {
                condition: format!("stop container {id}"),
                waited: timeout,
                last_observed: "StopContainer still pending".into(),
            }),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(CrivalError::Runtime {
                operation: "StopContainer",
                message: "stop call ended without a result".into(),
            }),
        }
    }

    /// Stops a container with the configured grace period and waits until
    /// it has exited.
    ///
    /// # Errors
    ///
    /// See [`Harness::stop_container`] and [`Harness::wait_for_state`].
    pub fn stop_container_and_wait(&self, id: &ContainerId) -> Result<()> {
        self.stop_container(id, self.config.stop_container_timeout())?;
        self.wait_for_state(id, ContainerState::Exited)
    }

    /// Removes a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime call fails.
    pub fn remove_container(&self, id: &ContainerId) -> Result<()> {
        tracing::info!(%id, "remove container");
        self.runtime
            .remove_container(id)
            .map_err(|e| CrivalError::runtime("RemoveContainer", e))?;
        tracing::info!(%id, "removed container");
        Ok(())
    }

    /// Lists containers filtered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime call fails.
    pub fn list_container_for_id(&self, id: &ContainerId) -> Result<Vec<Container>> {
        tracing::debug!(%id, "list containers");
        let filter = ContainerFilter {
            id: Some(id.clone()),
        };
        self.runtime
            .list_containers(&filter)
            .map_err(|e| CrivalError::runtime("ListContainers", e))
    }

    /// Runs `command` in the container and returns its stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or anything was written to
    /// stderr.
    pub fn exec_sync_container(&self, id: &ContainerId, command: &[String]) -> Result<String> {
        tracing::info!(%id, ?command, "execSync");
        let output = self
            .runtime
            .exec_sync(id, command, self.config.exec_sync_timeout())
            .map_err(|e| CrivalError::runtime("ExecSync", e))?;
        if !output.stderr.is_empty() {
            return Err(CrivalError::assertion(format!(
                "execSync {command:?} wrote to stderr: {:?}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Asserts that `command` prints exactly `expected` on stdout.
    ///
    /// # Errors
    ///
    /// Returns [`CrivalError::Assertion`] on a mismatch, or any
    /// [`Harness::exec_sync_container`] error.
    pub fn verify_exec_sync_output(
        &self,
        id: &ContainerId,
        command: &[String],
        expected: &str,
    ) -> Result<()> {
        let stdout = self.exec_sync_container(id, command)?;
        if stdout != expected {
            return Err(CrivalError::assertion(format!(
                "stdout of execSync should be {expected:?}, got {stdout:?}"
            )));
        }
        Ok(())
    }

    /// Asserts that running `command` fails.
    ///
    /// # Errors
    ///
    /// Returns [`CrivalError::UnexpectedSuccess`] if it succeeds.
    pub fn verify_exec_sync_fails(&self, id: &ContainerId, command: &[String]) -> Result<()> {
        tracing::info!(%id, ?command, "execSync expecting failure");
        expect_runtime_error(
            "ExecSync",
            self.runtime
                .exec_sync(id, command, self.config.exec_sync_timeout()),
        )
    }

    /// Asks the runtime to reopen a container's log.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime call fails.
    pub fn reopen_container_log(&self, id: &ContainerId) -> Result<()> {
        tracing::info!(%id, "reopen container log");
        self.runtime
            .reopen_container_log(id)
            .map_err(|e| CrivalError::runtime("ReopenContainerLog", e))
    }

    /// Polls the log file until it holds at least one record.
    ///
    /// # Errors
    ///
    /// Returns [`CrivalError::Timeout`], or the first read/decode error.
    pub fn wait_for_log_output(&self, path: &Path) -> Result<LogSequence> {
        wait_for(
            &format!("log output in {}", path.display()),
            || read_all(path),
            |sequence| !sequence.is_empty(),
            self.config.log_poll_interval(),
            self.config.log_poll_timeout(),
        )
    }

    /// Asserts that the log file keeps `expected_len` records for the
    /// configured steady window.
    ///
    /// # Errors
    ///
    /// Returns [`CrivalError::Assertion`] if the record count changes, or
    /// the first read/decode error.
    pub fn verify_log_unchanged(&self, path: &Path, expected_len: usize) -> Result<()> {
        let _ = hold_steady(
            &format!("record count of {}", path.display()),
            || read_all(path).map(|s| s.len()),
            |len| *len == expected_len,
            self.config.log_poll_interval(),
            self.config.log_steady_window(),
        )?;
        Ok(())
    }

    /// Asserts the log file holds the configured default message on stdout.
    ///
    /// # Errors
    ///
    /// See [`crival_log::verify::verify_log_contents`].
    pub fn verify_default_log(&self, path: &Path) -> Result<()> {
        let expected = format!("{}\n", self.config.default_log);
        crival_log::verify::verify_log_contents(path, &expected, &LogStream::Stdout)
    }
}
