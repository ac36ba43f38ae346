//! Container conformance scenarios.
//!
//! Each scenario runs a sandbox, drives one or more containers through it,
//! and returns the first failure. Sandbox teardown happens when the
//! fixture drops, so it runs on every exit path.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crival_common::constants::ROTATED_LOG_SUFFIX;
use crival_common::error::{CrivalError, Result};
use crival_common::types::{
    ContainerConfig, ContainerId, ContainerState, ImageSpec, KeyValue, LinuxContainerConfig,
    LinuxContainerResources, Mount, unique_name,
};
use crival_log::read_all;
use crival_log::verify::log_file_path;

use crate::framework::{Harness, SandboxFixture, container_found, first_volume_name};
use crate::hostpath::{create_host_path, create_symlink, path_exists};

/// A named conformance check.
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    /// Human-readable name.
    pub name: &'static str,
    /// Entry point.
    pub run: fn(&Harness) -> Result<()>,
}

/// Every container conformance check, in execution order.
pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "runtime should support creating container",
        run: create_container,
    },
    Scenario {
        name: "runtime should support starting container",
        run: start_container,
    },
    Scenario {
        name: "runtime should support stopping container",
        run: stop_container,
    },
    Scenario {
        name: "runtime should support removing container",
        run: remove_container,
    },
    Scenario {
        name: "runtime should support execSync",
        run: exec_sync,
    },
    Scenario {
        name: "runtime should support execSync with wrong command",
        run: exec_sync_wrong_command,
    },
    Scenario {
        name: "runtime should support starting container with volume",
        run: start_container_with_volume,
    },
    Scenario {
        name: "runtime should support starting container with volume when host path is a symlink",
        run: start_container_with_symlink_volume,
    },
    Scenario {
        name: "runtime should support starting container with log",
        run: start_container_with_log,
    },
    Scenario {
        name: "runtime should support reopening container log",
        run: reopen_container_log,
    },
    Scenario {
        name: "runtime should support creating extended container",
        run: create_extended_container,
    },
    Scenario {
        name: "runtime should support starting extended container",
        run: start_extended_container,
    },
    Scenario {
        name: "runtime should support getting container status",
        run: extended_container_status,
    },
    Scenario {
        name: "runtime should support getting image status",
        run: image_status,
    },
    Scenario {
        name: "runtime should support removing volumes",
        run: remove_volumes,
    },
];

/// Runs one scenario, logging its outcome.
///
/// # Errors
///
/// Returns the scenario's first failure.
pub fn run(harness: &Harness, scenario: &Scenario) -> Result<()> {
    tracing::info!(scenario = scenario.name, "running");
    let result = (scenario.run)(harness);
    match &result {
        Ok(()) => tracing::info!(scenario = scenario.name, "passed"),
        Err(e) => tracing::warn!(scenario = scenario.name, error = %e, "failed"),
    }
    result
}

fn require(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(CrivalError::assertion(message))
    }
}

fn command(args: &[&str]) -> Vec<String> {
    args.iter().map(ToString::to_string).collect()
}

/// Creates a default container and checks it is created and listed.
///
/// # Errors
///
/// Returns the first failed runtime call or assertion.
pub fn create_container(h: &Harness) -> Result<()> {
    let sandbox = h.run_sandbox()?;
    let id = h.create_default_container(&sandbox, "container-for-create-test-")?;
    h.wait_for_state(&id, ContainerState::Created)?;
    let containers = h.list_container_for_id(&id)?;
    require(container_found(&containers, &id), "container should be created")
}

/// Starts a container and waits until it runs.
///
/// # Errors
///
/// Returns the first failed runtime call or assertion.
pub fn start_container(h: &Harness) -> Result<()> {
    let sandbox = h.run_sandbox()?;
    let id = h.create_default_container(&sandbox, "container-for-start-test-")?;
    h.start_container_and_wait(&id)
}

/// Stops a running container and waits until it exits.
///
/// # Errors
///
/// Returns the first failed runtime call or assertion.
pub fn stop_container(h: &Harness) -> Result<()> {
    let sandbox = h.run_sandbox()?;
    let id = h.create_default_container(&sandbox, "container-for-stop-test-")?;
    h.start_container(&id)?;
    h.stop_container_and_wait(&id)
}

/// Removes a created container and checks it is no longer listed.
///
/// # Errors
///
/// Returns the first failed runtime call or assertion.
pub fn remove_container(h: &Harness) -> Result<()> {
    let sandbox = h.run_sandbox()?;
    let id = h.create_default_container(&sandbox, "container-for-remove-test-")?;
    h.remove_container(&id)?;
    let containers = h.list_container_for_id(&id)?;
    require(!container_found(&containers, &id), "container should be removed")
}

/// Runs `echo hello` in a running container.
///
/// # Errors
///
/// Returns the first failed runtime call or assertion.
pub fn exec_sync(h: &Harness) -> Result<()> {
    let sandbox = h.run_sandbox()?;
    let id = h.create_default_container(&sandbox, "container-for-execSync-test-")?;
    h.start_container(&id)?;
    h.verify_exec_sync_output(&id, &command(&["echo", "hello"]), "hello\n")
}

/// Runs a command that does not exist and expects an error.
///
/// # Errors
///
/// Returns the first failed runtime call, or
/// [`CrivalError::UnexpectedSuccess`] if the exec succeeds.
pub fn exec_sync_wrong_command(h: &Harness) -> Result<()> {
    let sandbox = h.run_sandbox()?;
    let id = h.create_default_container(&sandbox, "container-for-execSync-test-")?;
    h.start_container(&id)?;
    h.verify_exec_sync_fails(&id, &command(&["not-exist-command"]))
}

fn volume_container_config(h: &Harness, prefix: &str, host_path: &Path) -> ContainerConfig {
    ContainerConfig {
        metadata: h.container_metadata(unique_name(prefix)),
        image: ImageSpec::new(&h.config().default_image),
        command: command(&["sh", "-c", "top"]),
        // Same path on both sides so the exec below can list it.
        mounts: vec![Mount {
            name: String::new(),
            host_path: host_path.to_path_buf(),
            container_path: host_path.to_path_buf(),
        }],
        ..ContainerConfig::default()
    }
}

fn verify_mount_not_empty(h: &Harness, id: &ContainerId, path: &Path) -> Result<()> {
    let listing = h.exec_sync_container(id, &[
        "ls".into(),
        "-A".into(),
        path.display().to_string(),
    ])?;
    require(!listing.is_empty(), "listing of the mounted host path should not be empty")
}

/// Mounts a host directory and checks its contents are visible.
///
/// # Errors
///
/// Returns the first failed runtime call, host I/O, or assertion.
pub fn start_container_with_volume(h: &Harness) -> Result<()> {
    let sandbox = h.run_sandbox()?;
    let host_path = create_host_path(&sandbox.id)?;
    let config = volume_container_config(h, "container-with-volume-test-", host_path.path());
    let id = h.create_container(&sandbox, &config)?;
    h.start_container_and_wait(&id)?;
    verify_mount_not_empty(h, &id, host_path.path())
}

/// Mounts a symlink to a host directory and checks its contents are visible.
///
/// # Errors
///
/// Returns the first failed runtime call, host I/O, or assertion.
pub fn start_container_with_symlink_volume(h: &Harness) -> Result<()> {
    let sandbox = h.run_sandbox()?;
    let host_path = create_host_path(&sandbox.id)?;
    let link = create_symlink(host_path.path())?;
    let config = volume_container_config(h, "container-with-symlink-host-path-test-", link.path());
    let id = h.create_container(&sandbox, &config)?;
    h.start_container_and_wait(&id)?;
    verify_mount_not_empty(h, &id, link.path())
}

fn log_container_config(h: &Harness, prefix: &str, command: Vec<String>) -> ContainerConfig {
    let name = unique_name(prefix);
    ContainerConfig {
        log_path: Some(PathBuf::from(format!("{name}.log"))),
        metadata: h.container_metadata(name),
        image: ImageSpec::new(&h.config().default_image),
        command,
        ..ContainerConfig::default()
    }
}

fn created_log_path(sandbox: &SandboxFixture<'_>, config: &ContainerConfig) -> Result<PathBuf> {
    let relative = config.log_path.as_deref().ok_or_else(|| CrivalError::Config {
        message: format!("container {} has no log path", config.metadata.name),
    })?;
    Ok(log_file_path(sandbox.require_log_directory()?, relative))
}

/// Runs `echo <default log>` and checks the line lands in its log file.
///
/// # Errors
///
/// Returns the first failed runtime call, log read, or assertion.
pub fn start_container_with_log(h: &Harness) -> Result<()> {
    let sandbox = h.run_sandbox_with_log_directory()?;
    let config = log_container_config(
        h,
        "container-with-log-test-",
        vec!["echo".into(), h.config().default_log.clone()],
    );
    let path = created_log_path(&sandbox, &config)?;
    let id = h.create_container(&sandbox, &config)?;
    h.start_container(&id)?;
    h.wait_for_state(&id, ContainerState::Exited)?;
    h.verify_default_log(&path)
}

/// Rotates a live log file and checks the runtime writes to the new one
/// while the rotated one stays frozen.
///
/// # Errors
///
/// Returns the first failed runtime call, log read, or assertion.
pub fn reopen_container_log(h: &Harness) -> Result<()> {
    let sandbox = h.run_sandbox_with_log_directory()?;
    let script = format!("while true; do echo {}; sleep 1; done", h.config().default_log);
    let config = log_container_config(
        h,
        "container-reopen-log-test-",
        vec!["sh".into(), "-c".into(), script],
    );
    let path = created_log_path(&sandbox, &config)?;
    let id = h.create_container(&sandbox, &config)?;
    h.start_container(&id)?;
    let _ = h.wait_for_log_output(&path)?;

    let mut rotated: OsString = path.clone().into_os_string();
    rotated.push(ROTATED_LOG_SUFFIX);
    let rotated = PathBuf::from(rotated);
    tracing::info!(from = %path.display(), to = %rotated.display(), "rename container log");
    std::fs::rename(&path, &rotated).map_err(|e| CrivalError::Io {
        path: path.clone(),
        source: e,
    })?;

    h.reopen_container_log(&id)?;
    require(path_exists(&path)?, "new container log file should be created")?;
    let _ = h.wait_for_log_output(&path)?;

    let old_len = read_all(&rotated)?.len();
    h.verify_log_unchanged(&rotated, old_len)
}

fn extended_container_config(h: &Harness, prefix: &str) -> ContainerConfig {
    ContainerConfig {
        metadata: h.container_metadata(unique_name(prefix)),
        image: ImageSpec::new(&h.config().default_volume_image),
        command: command(&["sh", "-c", "top"]),
        envs: vec![KeyValue {
            key: "GO_VERSION".into(),
            value: "1.9.1".into(),
        }],
        linux: Some(LinuxContainerConfig {
            resources: Some(LinuxContainerResources {
                disk_quota: HashMap::from([("/".to_string(), "10g".to_string())]),
            }),
        }),
        ..ContainerConfig::default()
    }
}

const EXTENDED_PREFIX: &str = "container-with-extended-test-";

/// Creates a container with quota and env extensions and checks it is listed.
///
/// # Errors
///
/// Returns the first failed runtime call or assertion.
pub fn create_extended_container(h: &Harness) -> Result<()> {
    let sandbox = h.run_sandbox()?;
    let _host_path = create_host_path(&sandbox.id)?;
    let id = h.create_container(&sandbox, &extended_container_config(h, EXTENDED_PREFIX))?;
    let containers = h.list_container_for_id(&id)?;
    require(container_found(&containers, &id), "container should be created")
}

/// Starts an extended container and waits until it runs.
///
/// # Errors
///
/// Returns the first failed runtime call or assertion.
pub fn start_extended_container(h: &Harness) -> Result<()> {
    let sandbox = h.run_sandbox()?;
    let _host_path = create_host_path(&sandbox.id)?;
    let id = h.create_container(&sandbox, &extended_container_config(h, EXTENDED_PREFIX))?;
    h.start_container_and_wait(&id)
}

/// Checks the extended status fields are reported.
///
/// # Errors
///
/// Returns the first failed runtime call or a missing field.
pub fn extended_container_status(h: &Harness) -> Result<()> {
    let sandbox = h.run_sandbox()?;
    let _host_path = create_host_path(&sandbox.id)?;
    let id = h.create_container(&sandbox, &extended_container_config(h, EXTENDED_PREFIX))?;
    let status = h.container_status(&id)?;
    require(status.quota_id.is_some(), "the quotaId of container should not be nil")?;
    require(status.resources.is_some(), "the resources of container should not be nil")?;
    require(status.mounts.is_some(), "the mounts of container should not be nil")?;
    require(status.envs.is_some(), "the envs of container should not be nil")
}

/// Checks the image of an extended container reports its volumes.
///
/// # Errors
///
/// Returns the first failed runtime call or a missing field.
pub fn image_status(h: &Harness) -> Result<()> {
    let sandbox = h.run_sandbox()?;
    let _host_path = create_host_path(&sandbox.id)?;
    let id = h.create_container(&sandbox, &extended_container_config(h, EXTENDED_PREFIX))?;
    let status = h.container_status(&id)?;
    let image = h
        .images()
        .image_status(&status.image)
        .map_err(|e| CrivalError::runtime("ImageStatus", e))?
        .ok_or_else(|| {
            CrivalError::assertion(format!("image {} should be present", status.image.image))
        })?;
    require(image.volumes.is_some(), "the volumes of image should not be nil")
}

/// Stops and removes a container that owns a named volume.
///
/// # Errors
///
/// Returns the first failed runtime call or assertion.
pub fn remove_volumes(h: &Harness) -> Result<()> {
    let sandbox = h.run_sandbox()?;
    let _host_path = create_host_path(&sandbox.id)?;
    let id = h.create_container(&sandbox, &extended_container_config(h, EXTENDED_PREFIX))?;
    let status = h.container_status(&id)?;
    let mounts = status.mounts.unwrap_or_default();
    let volume = first_volume_name(&mounts)
        .ok_or_else(|| CrivalError::assertion(format!("container {id} has no named volume")))?;
    tracing::info!(%id, volume, "container volume");
    h.stop_container(&id, h.config().stop_container_timeout())?;
    // Removing the container removes its volumes too.
    h.remove_container(&id)
}
