//! Client surface of the external CRI runtime.
//!
//! Implementors wrap a real RPC client; transport and retries are theirs.
//! Errors are opaque here: the harness only cares whether one occurred.

use std::time::Duration;

use crival_common::types::{
    Container, ContainerConfig, ContainerFilter, ContainerId, ContainerStatus, ExecSyncOutput,
    ImageSpec, ImageStatus, PodSandboxConfig, PodSandboxId,
};

/// Error reported by a runtime or image client.
pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a single client call.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// CRI `RuntimeService`: sandbox and container operations.
pub trait RuntimeService: Send + Sync {
    /// Creates and starts a pod sandbox.
    ///
    /// # Errors
    ///
    /// Returns the client's error if the sandbox cannot be run.
    fn run_pod_sandbox(&self, config: &PodSandboxConfig) -> ClientResult<PodSandboxId>;

    /// Stops a pod sandbox and every container in it.
    ///
    /// # Errors
    ///
    /// Returns the client's error if the sandbox cannot be stopped.
    fn stop_pod_sandbox(&self, id: &PodSandboxId) -> ClientResult<()>;

    /// Removes a stopped pod sandbox.
    ///
    /// # Errors
    ///
    /// Returns the client's error if the sandbox cannot be removed.
    fn remove_pod_sandbox(&self, id: &PodSandboxId) -> ClientResult<()>;

    /// Creates a container inside a sandbox.
    ///
    /// # Errors
    ///
    /// Returns the client's error if the container cannot be created.
    fn create_container(
        &self,
        pod_id: &PodSandboxId,
        config: &ContainerConfig,
        sandbox_config: &PodSandboxConfig,
    ) -> ClientResult<ContainerId>;

    /// Starts a created container.
    ///
    /// # Errors
    ///
    /// Returns the client's error if the container cannot be started.
    fn start_container(&self, id: &ContainerId) -> ClientResult<()>;

    /// Stops a container, killing it once `timeout` has elapsed.
    ///
    /// # Errors
    ///
    /// Returns the client's error if the container cannot be stopped.
    fn stop_container(&self, id: &ContainerId, timeout: Duration) -> ClientResult<()>;

    /// Removes a container that is not running.
    ///
    /// # Errors
    ///
    /// Returns the client's error if the container cannot be removed.
    fn remove_container(&self, id: &ContainerId) -> ClientResult<()>;

    /// Returns the detailed status of a container.
    ///
    /// # Errors
    ///
    /// Returns the client's error if the status cannot be fetched.
    fn container_status(&self, id: &ContainerId) -> ClientResult<ContainerStatus>;

    /// Lists containers matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns the client's error if listing fails.
    fn list_containers(&self, filter: &ContainerFilter) -> ClientResult<Vec<Container>>;

    /// Runs a command in a running container and waits for it.
    ///
    /// # Errors
    ///
    /// Returns the client's error if the command cannot be run.
    fn exec_sync(
        &self,
        id: &ContainerId,
        command: &[String],
        timeout: Duration,
    ) -> ClientResult<ExecSyncOutput>;

    /// Asks the runtime to reopen the container's log file at its path.
    ///
    /// # Errors
    ///
    /// Returns the client's error if the log cannot be reopened.
    fn reopen_container_log(&self, id: &ContainerId) -> ClientResult<()>;
}

/// CRI `ImageManagerService`: image operations.
pub trait ImageService: Send + Sync {
    /// Returns the status of an image, or `None` if it is not present.
    ///
    /// # Errors
    ///
    /// Returns the client's error if the status cannot be fetched.
    fn image_status(&self, image: &ImageSpec) -> ClientResult<Option<ImageStatus>>;

    /// Pulls an image, returning its reference.
    ///
    /// # Errors
    ///
    /// Returns the client's error if the pull fails.
    fn pull_image(&self, image: &ImageSpec) -> ClientResult<String>;
}
