//! Harness, sandbox fixtures, and container creation helpers.

use std::path::Path;
use std::sync::Arc;

use crival_common::config::ValidateConfig;
use crival_common::error::{CrivalError, Result};
use crival_common::types::{
    Container, ContainerConfig, ContainerId, ContainerMetadata, ImageSpec, LinuxContainerConfig,
    Mount, PodSandboxConfig, PodSandboxId, PodSandboxMetadata, unique_name,
};
use tempfile::TempDir;

use crate::client::{ImageService, RuntimeService};

/// Namespace every test sandbox is created in.
pub const TEST_NAMESPACE: &str = "cri-test-namespace";

/// Runtime and image clients plus the configuration of one run.
pub struct Harness {
    pub(crate) runtime: Arc<dyn RuntimeService>,
    pub(crate) images: Arc<dyn ImageService>,
    pub(crate) config: ValidateConfig,
}

impl Harness {
    /// Creates a harness over the given clients.
    #[must_use]
    pub fn new(
        runtime: Arc<dyn RuntimeService>,
        images: Arc<dyn ImageService>,
        config: ValidateConfig,
    ) -> Self {
        Self {
            runtime,
            images,
            config,
        }
    }

    /// Returns the run configuration.
    #[must_use]
    pub const fn config(&self) -> &ValidateConfig {
        &self.config
    }

    /// Returns the runtime client.
    #[must_use]
    pub fn runtime(&self) -> &dyn RuntimeService {
        self.runtime.as_ref()
    }

    /// Returns the image client.
    #[must_use]
    pub fn images(&self) -> &dyn ImageService {
        self.images.as_ref()
    }

    /// Runs a sandbox for plain container tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot run the sandbox.
    pub fn run_sandbox(&self) -> Result<SandboxFixture<'_>> {
        let config = self.sandbox_config("create-PodSandbox-for-container-", None);
        self.start_fixture(config, None)
    }

    /// Runs a sandbox whose log directory is a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the runtime
    /// cannot run the sandbox.
    pub fn run_sandbox_with_log_directory(&self) -> Result<SandboxFixture<'_>> {
        let log_dir = tempfile::Builder::new()
            .prefix("podLogTest")
            .tempdir()
            .map_err(|e| CrivalError::Io {
                path: std::env::temp_dir(),
                source: e,
            })?;
        let config = self.sandbox_config("PodSandbox-with-log-directory-", Some(log_dir.path()));
        self.start_fixture(config, Some(log_dir))
    }

    fn sandbox_config(&self, prefix: &str, log_directory: Option<&Path>) -> PodSandboxConfig {
        let name = unique_name(prefix);
        PodSandboxConfig {
            metadata: PodSandboxMetadata {
                uid: unique_name(""),
                name,
                namespace: TEST_NAMESPACE.to_string(),
                attempt: self.config.default_attempt,
            },
            log_directory: log_directory.map(Path::to_path_buf),
        }
    }

    fn start_fixture(
        &self,
        config: PodSandboxConfig,
        log_dir: Option<TempDir>,
    ) -> Result<SandboxFixture<'_>> {
        tracing::info!(name = %config.metadata.name, "run PodSandbox");
        let id = self
            .runtime
            .run_pod_sandbox(&config)
            .map_err(|e| CrivalError::runtime("RunPodSandbox", e))?;
        tracing::info!(%id, "PodSandbox running");
        Ok(SandboxFixture {
            harness: self,
            id,
            config,
            _log_dir: log_dir,
        })
    }

    /// Builds metadata for a container with the configured attempt.
    #[must_use]
    pub fn container_metadata(&self, name: impl Into<String>) -> ContainerMetadata {
        ContainerMetadata {
            name: name.into(),
            attempt: self.config.default_attempt,
        }
    }

    /// Pulls `image` unless the runtime already has it.
    ///
    /// # Errors
    ///
    /// Returns an error if the status query or the pull fails.
    pub fn ensure_image(&self, image: &ImageSpec) -> Result<()> {
        let status = self
            .images
            .image_status(image)
            .map_err(|e| CrivalError::runtime("ImageStatus", e))?;
        if status.is_none() {
            tracing::info!(image = %image.image, "pull image");
            let reference = self
                .images
                .pull_image(image)
                .map_err(|e| CrivalError::runtime("PullImage", e))?;
            tracing::debug!(%reference, "image pulled");
        }
        Ok(())
    }

    /// Creates a container in `sandbox`, pulling its image first if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be made available or the
    /// runtime rejects the container.
    pub fn create_container(
        &self,
        sandbox: &SandboxFixture<'_>,
        config: &ContainerConfig,
    ) -> Result<ContainerId> {
        self.ensure_image(&config.image)?;
        tracing::info!(name = %config.metadata.name, "create container");
        let id = self
            .runtime
            .create_container(&sandbox.id, config, &sandbox.config)
            .map_err(|e| CrivalError::runtime("CreateContainer", e))?;
        tracing::info!(%id, "created container");
        Ok(id)
    }

    /// Creates a container running `top` in the default image.
    ///
    /// # Errors
    ///
    /// See [`Harness::create_container`].
    pub fn create_default_container(
        &self,
        sandbox: &SandboxFixture<'_>,
        prefix: &str,
    ) -> Result<ContainerId> {
        let config = ContainerConfig {
            metadata: self.container_metadata(unique_name(prefix)),
            image: ImageSpec::new(&self.config.default_image),
            command: vec!["top".into()],
            linux: Some(LinuxContainerConfig::default()),
            ..ContainerConfig::default()
        };
        self.create_container(sandbox, &config)
    }
}

/// A running pod sandbox, stopped and removed when dropped.
///
/// Teardown runs whatever the scenario's outcome. Failures during
/// teardown are logged, never raised.
pub struct SandboxFixture<'h> {
    harness: &'h Harness,
    /// Sandbox ID assigned by the runtime.
    pub id: PodSandboxId,
    /// Configuration the sandbox was run with.
    pub config: PodSandboxConfig,
    _log_dir: Option<TempDir>,
}

impl SandboxFixture<'_> {
    /// Returns the sandbox log directory, if it has one.
    #[must_use]
    pub fn log_directory(&self) -> Option<&Path> {
        self.config.log_directory.as_deref()
    }

    /// Returns the sandbox log directory.
    ///
    /// # Errors
    ///
    /// Returns [`CrivalError::Config`] if the sandbox was run without one.
    pub fn require_log_directory(&self) -> Result<&Path> {
        self.log_directory().ok_or_else(|| CrivalError::Config {
            message: format!("sandbox {} has no log directory", self.id),
        })
    }
}

impl Drop for SandboxFixture<'_> {
    fn drop(&mut self) {
        tracing::info!(id = %self.id, "stop PodSandbox");
        if let Err(e) = self.harness.runtime.stop_pod_sandbox(&self.id) {
            tracing::warn!(id = %self.id, error = %e, "failed to stop PodSandbox");
        }
        tracing::info!(id = %self.id, "delete PodSandbox");
        if let Err(e) = self.harness.runtime.remove_pod_sandbox(&self.id) {
            tracing::warn!(id = %self.id, error = %e, "failed to remove PodSandbox");
        }
    }
}

/// Returns whether `containers` lists `id`.
#[must_use]
pub fn container_found(containers: &[Container], id: &ContainerId) -> bool {
    containers.iter().any(|c| &c.id == id)
}

/// Returns the first non-empty volume name in `mounts`.
#[must_use]
pub fn first_volume_name(mounts: &[Mount]) -> Option<&str> {
    mounts
        .iter()
        .map(|m| m.name.as_str())
        .find(|name| !name.is_empty())
}
