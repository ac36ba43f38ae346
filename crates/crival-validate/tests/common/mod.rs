//! In-memory CRI runtime used to drive the conformance scenarios.
//!
//! Behaviour is deliberately small:
//! - `echo ARGS...` containers write one JSON log line and exit on start
//! - `sh -c "while ..."` containers write one tagged line on start and on
//!   every log reopen, and keep running
//! - anything else just runs
//! - `exec_sync` understands `echo` and `ls -A PATH`

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use crival_common::config::ValidateConfig;
use crival_common::constants::ROTATED_LOG_SUFFIX;
use crival_common::types::{
    Container, ContainerConfig, ContainerFilter, ContainerId, ContainerState, ContainerStatus,
    ExecSyncOutput, ImageSpec, ImageStatus, Mount, PodSandboxConfig, PodSandboxId,
};
use crival_validate::Harness;
use crival_validate::client::{ClientResult, ImageService, RuntimeService};

pub const VOLUME_NAME: &str = "data-volume";

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub sandbox: PodSandboxId,
    pub config: ContainerConfig,
    pub state: ContainerState,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub sandboxes: HashMap<PodSandboxId, PodSandboxConfig>,
    pub stopped_sandboxes: HashSet<PodSandboxId>,
    pub removed_sandboxes: HashSet<PodSandboxId>,
    pub containers: HashMap<ContainerId, FakeContainer>,
    pub images: HashSet<String>,
    pub pulls: usize,
}

/// Knobs for injecting misbehaviour.
#[derive(Debug, Default, Clone)]
pub struct Faults {
    pub stop_delay: Option<Duration>,
    pub exec_always_succeeds: bool,
    pub never_exit: bool,
    pub fail_remove: bool,
    pub stderr_noise: bool,
    /// Keep appending to the rotated file after a reopen.
    pub keep_writing_rotated: bool,
    /// Accept reopen calls without recreating the log file.
    pub no_reopen: bool,
}

#[derive(Debug, Default)]
pub struct FakeRuntime {
    pub state: Mutex<FakeState>,
    pub faults: Faults,
    next_id: AtomicUsize,
}

impl FakeRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_faults(faults: Faults) -> Arc<Self> {
        Arc::new(Self {
            faults,
            ..Self::default()
        })
    }

    fn next(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    pub fn snapshot<T>(&self, f: impl FnOnce(&FakeState) -> T) -> T {
        f(&self.state.lock().unwrap())
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn append_line(path: &PathBuf, line: &str) -> ClientResult<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    // One write per line so concurrent readers never see half a record.
    file.write_all(format!("{line}\n").as_bytes())?;
    Ok(())
}

fn rotated_path(path: &PathBuf) -> PathBuf {
    let mut rotated = path.clone().into_os_string();
    rotated.push(ROTATED_LOG_SUFFIX);
    PathBuf::from(rotated)
}

fn is_volume_image(image: &ImageSpec) -> bool {
    image.image == ValidateConfig::default().default_volume_image
}

impl RuntimeService for FakeRuntime {
    fn run_pod_sandbox(&self, config: &PodSandboxConfig) -> ClientResult<PodSandboxId> {
        let id = PodSandboxId::new(self.next("pod"));
        let _ = self
            .state
            .lock()
            .unwrap()
            .sandboxes
            .insert(id.clone(), config.clone());
        Ok(id)
    }

    fn stop_pod_sandbox(&self, id: &PodSandboxId) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        for c in state.containers.values_mut().filter(|c| &c.sandbox == id) {
            c.state = ContainerState::Exited;
        }
        let _ = state.stopped_sandboxes.insert(id.clone());
        Ok(())
    }

    fn remove_pod_sandbox(&self, id: &PodSandboxId) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        state.containers.retain(|_, c| &c.sandbox != id);
        let _ = state.sandboxes.remove(id);
        let _ = state.removed_sandboxes.insert(id.clone());
        Ok(())
    }

    fn create_container(
        &self,
        pod_id: &PodSandboxId,
        config: &ContainerConfig,
        sandbox_config: &PodSandboxConfig,
    ) -> ClientResult<ContainerId> {
        let mut state = self.state.lock().unwrap();
        if !state.sandboxes.contains_key(pod_id) {
            return Err(format!("sandbox {pod_id} not found").into());
        }
        if !state.images.contains(&config.image.image) {
            return Err(format!("image {} not present", config.image.image).into());
        }
        let log_file = match (&sandbox_config.log_directory, &config.log_path) {
            (Some(dir), Some(rel)) => Some(dir.join(rel)),
            _ => None,
        };
        let id = ContainerId::new(self.next("ctr"));
        let _ = state.containers.insert(
            id.clone(),
            FakeContainer {
                sandbox: pod_id.clone(),
                config: config.clone(),
                state: ContainerState::Created,
                log_file,
            },
        );
        Ok(id)
    }

    fn start_container(&self, id: &ContainerId) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        let c = state
            .containers
            .get_mut(id)
            .ok_or_else(|| format!("container {id} not found"))?;
        if c.state != ContainerState::Created {
            return Err(format!("container {id} is {}", c.state).into());
        }
        c.state = ContainerState::Running;
        let cmd = c.config.command.clone();
        match cmd.first().map(String::as_str) {
            Some("echo") => {
                if let Some(path) = &c.log_file {
                    let line = serde_json::json!({
                        "log": format!("{}\n", cmd[1..].join(" ")),
                        "stream": "stdout",
                        "time": now(),
                    });
                    append_line(path, &line.to_string())?;
                }
                if !self.faults.never_exit {
                    c.state = ContainerState::Exited;
                }
            }
            Some("sh") if cmd.get(2).is_some_and(|s| s.starts_with("while")) => {
                if let Some(path) = &c.log_file {
                    append_line(path, &format!("{} stdout F hello World", now()))?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn stop_container(&self, id: &ContainerId, _timeout: Duration) -> ClientResult<()> {
        if let Some(delay) = self.faults.stop_delay {
            std::thread::sleep(delay);
        }
        let mut state = self.state.lock().unwrap();
        let c = state
            .containers
            .get_mut(id)
            .ok_or_else(|| format!("container {id} not found"))?;
        c.state = ContainerState::Exited;
        Ok(())
    }

    fn remove_container(&self, id: &ContainerId) -> ClientResult<()> {
        if self.faults.fail_remove {
            return Err("remove refused".into());
        }
        let mut state = self.state.lock().unwrap();
        match state.containers.get(id).map(|c| c.state) {
            None => Err(format!("container {id} not found").into()),
            Some(ContainerState::Running) => Err(format!("container {id} is running").into()),
            Some(_) => {
                let _ = state.containers.remove(id);
                Ok(())
            }
        }
    }

    fn container_status(&self, id: &ContainerId) -> ClientResult<ContainerStatus> {
        let state = self.state.lock().unwrap();
        let c = state
            .containers
            .get(id)
            .ok_or_else(|| format!("container {id} not found"))?;
        let mut mounts = c.config.mounts.clone();
        if is_volume_image(&c.config.image) {
            mounts.push(Mount {
                name: VOLUME_NAME.into(),
                host_path: PathBuf::from("/var/lib/volumes").join(VOLUME_NAME),
                container_path: PathBuf::from("/data"),
            });
        }
        Ok(ContainerStatus {
            id: id.clone(),
            state: c.state,
            image: c.config.image.clone(),
            quota_id: Some("quota-1".into()),
            resources: c.config.linux.as_ref().and_then(|l| l.resources.clone()),
            mounts: Some(mounts),
            envs: Some(c.config.envs.clone()),
        })
    }

    fn list_containers(&self, filter: &ContainerFilter) -> ClientResult<Vec<Container>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .containers
            .iter()
            .filter(|(id, _)| filter.id.as_ref().is_none_or(|want| want == *id))
            .map(|(id, c)| Container {
                id: id.clone(),
                pod_sandbox_id: c.sandbox.clone(),
                state: c.state,
            })
            .collect())
    }

    fn exec_sync(
        &self,
        id: &ContainerId,
        command: &[String],
        _timeout: Duration,
    ) -> ClientResult<ExecSyncOutput> {
        {
            let state = self.state.lock().unwrap();
            let c = state
                .containers
                .get(id)
                .ok_or_else(|| format!("container {id} not found"))?;
            if c.state != ContainerState::Running {
                return Err(format!("container {id} is not running").into());
            }
        }
        let stderr = if self.faults.stderr_noise {
            b"warning\n".to_vec()
        } else {
            Vec::new()
        };
        let args: Vec<&str> = command.iter().map(String::as_str).collect();
        let stdout = match args.as_slice() {
            ["echo", rest @ ..] => format!("{}\n", rest.join(" ")).into_bytes(),
            ["ls", "-A", path] => {
                let mut names: Vec<String> = std::fs::read_dir(path)?
                    .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
                    .collect::<Result<_, _>>()?;
                names.sort();
                names.into_iter().map(|n| n + "\n").collect::<String>().into_bytes()
            }
            _ if self.faults.exec_always_succeeds => Vec::new(),
            _ => return Err(format!("exec: {:?}: executable file not found", args).into()),
        };
        Ok(ExecSyncOutput { stdout, stderr })
    }

    fn reopen_container_log(&self, id: &ContainerId) -> ClientResult<()> {
        let state = self.state.lock().unwrap();
        let c = state
            .containers
            .get(id)
            .ok_or_else(|| format!("container {id} not found"))?;
        let path = c.log_file.as_ref().ok_or("container has no log path")?;
        if self.faults.no_reopen {
            return Ok(());
        }
        if self.faults.keep_writing_rotated {
            let rotated = rotated_path(path);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    if append_line(&rotated, &format!("{} stdout F stale", now())).is_err() {
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(5));
                }
            });
        }
        append_line(path, &format!("{} stdout F hello World", now()))
    }
}

#[derive(Debug)]
pub struct FakeImages {
    pub runtime: Arc<FakeRuntime>,
}

impl ImageService for FakeImages {
    fn image_status(&self, image: &ImageSpec) -> ClientResult<Option<ImageStatus>> {
        let state = self.runtime.state.lock().unwrap();
        if !state.images.contains(&image.image) {
            return Ok(None);
        }
        let volumes = is_volume_image(image)
            .then(|| HashMap::from([("/data".to_string(), String::new())]));
        Ok(Some(ImageStatus {
            id: format!("sha256:{}", image.image),
            volumes,
        }))
    }

    fn pull_image(&self, image: &ImageSpec) -> ClientResult<String> {
        let mut state = self.runtime.state.lock().unwrap();
        let _ = state.images.insert(image.image.clone());
        state.pulls += 1;
        Ok(image.image.clone())
    }
}

/// Intervals short enough for unit-test wall-clock budgets.
pub fn fast_config() -> ValidateConfig {
    ValidateConfig {
        stop_container_timeout_secs: 2,
        state_poll_interval_ms: 5,
        state_poll_timeout_ms: 500,
        log_poll_interval_ms: 5,
        log_poll_timeout_ms: 500,
        log_steady_window_ms: 30,
        ..ValidateConfig::default()
    }
}

pub fn harness(runtime: &Arc<FakeRuntime>) -> Harness {
    harness_with(runtime, fast_config())
}

pub fn harness_with(runtime: &Arc<FakeRuntime>, config: ValidateConfig) -> Harness {
    let images = Arc::new(FakeImages {
        runtime: Arc::clone(runtime),
    });
    Harness::new(Arc::clone(runtime) as Arc<dyn RuntimeService>, images, config)
}
