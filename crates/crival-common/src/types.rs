//! CRI domain types exchanged with the external runtime client.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identifier the runtime assigns to a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier the runtime assigns to a pod sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PodSandboxId(String);

impl PodSandboxId {
    /// Creates a sandbox ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PodSandboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a container as reported by the runtime.
///
/// `Created -> Running -> Exited`; removal is only valid outside `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerState {
    /// Created but not yet started.
    Created,
    /// Actively running.
    Running,
    /// Exited on its own or after a stop call.
    Exited,
    /// The runtime cannot tell.
    Unknown,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "CONTAINER_CREATED"),
            Self::Running => write!(f, "CONTAINER_RUNNING"),
            Self::Exited => write!(f, "CONTAINER_EXITED"),
            Self::Unknown => write!(f, "CONTAINER_UNKNOWN"),
        }
    }
}

/// Name and attempt counter identifying a container within its sandbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    /// Container name.
    pub name: String,
    /// Restart attempt number.
    pub attempt: u32,
}

/// Metadata identifying a pod sandbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSandboxMetadata {
    /// Sandbox name.
    pub name: String,
    /// Owning pod UID.
    pub uid: String,
    /// Namespace of the pod.
    pub namespace: String,
    /// Restart attempt number.
    pub attempt: u32,
}

/// Reference to a container image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSpec {
    /// Image reference, e.g. `busybox:1.28`.
    pub image: String,
}

impl ImageSpec {
    /// Creates an image spec for a reference.
    #[must_use]
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
        }
    }
}

/// A host path or named volume mounted into a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    /// Volume name; empty for plain bind mounts.
    pub name: String,
    /// Path on the host.
    pub host_path: PathBuf,
    /// Path inside the container.
    pub container_path: PathBuf,
}

/// An environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    /// Variable name.
    pub key: String,
    /// Variable value.
    pub value: String,
}

/// Linux resource settings attached to a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinuxContainerResources {
    /// Disk quota per mount point, e.g. `"/" -> "10g"`.
    pub disk_quota: HashMap<String, String>,
}

/// Linux-specific container settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinuxContainerConfig {
    /// Resource settings, if any.
    pub resources: Option<LinuxContainerResources>,
}

/// Everything the runtime needs to create a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Name and attempt.
    pub metadata: ContainerMetadata,
    /// Image to run.
    pub image: ImageSpec,
    /// Entrypoint and arguments.
    pub command: Vec<String>,
    /// Environment variables.
    pub envs: Vec<KeyValue>,
    /// Mounts.
    pub mounts: Vec<Mount>,
    /// Log file path, relative to the sandbox log directory.
    pub log_path: Option<PathBuf>,
    /// Linux-specific settings.
    pub linux: Option<LinuxContainerConfig>,
    /// Keep stdin open.
    pub stdin: bool,
    /// Close stdin after the first attach detaches.
    pub stdin_once: bool,
    /// Allocate a TTY.
    pub tty: bool,
}

/// Everything the runtime needs to create a pod sandbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSandboxConfig {
    /// Sandbox identity.
    pub metadata: PodSandboxMetadata,
    /// Directory holding the log files of the sandbox's containers.
    pub log_directory: Option<PathBuf>,
}

/// Filter for `ListContainers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerFilter {
    /// Only match this container ID.
    pub id: Option<ContainerId>,
}

/// Summary row returned by `ListContainers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Container ID.
    pub id: ContainerId,
    /// Owning sandbox.
    pub pod_sandbox_id: PodSandboxId,
    /// Current state.
    pub state: ContainerState,
}

/// Detailed status returned by `ContainerStatus`.
///
/// Optional fields are the extended fields some runtimes add on top of the
/// upstream CRI status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatus {
    /// Container ID.
    pub id: ContainerId,
    /// Current state.
    pub state: ContainerState,
    /// Image the container runs.
    pub image: ImageSpec,
    /// Disk quota identifier.
    pub quota_id: Option<String>,
    /// Resource settings in effect.
    pub resources: Option<LinuxContainerResources>,
    /// Mounts in effect.
    pub mounts: Option<Vec<Mount>>,
    /// Environment in effect.
    pub envs: Option<Vec<KeyValue>>,
}

/// Status returned by `ImageStatus`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStatus {
    /// Image ID.
    pub id: String,
    /// Volumes declared by the image.
    pub volumes: Option<HashMap<String, String>>,
}

/// Captured output of a synchronous exec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecSyncOutput {
    /// Bytes written to standard output.
    pub stdout: Vec<u8>,
    /// Bytes written to standard error.
    pub stderr: Vec<u8>,
}

/// Returns `prefix` followed by a fresh UUID, for unique resource names.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}{}", uuid::Uuid::new_v4())
}
