//! Wire-level constants and default values.
//!
//! Defaults only seed [`ValidateConfig`](crate::config::ValidateConfig);
//! nothing reads them as process-wide state.

/// Stream name used by both log encodings for standard output.
pub const STDOUT: &str = "stdout";

/// Stream name used by both log encodings for standard error.
pub const STDERR: &str = "stderr";

/// Grace period handed to the runtime when stopping a container, in seconds.
pub const DEFAULT_STOP_CONTAINER_TIMEOUT_SECS: u64 = 60;

/// Deadline for synchronous exec calls, in seconds.
pub const DEFAULT_EXEC_SYNC_TIMEOUT_SECS: u64 = 5;

/// Text the logging containers echo.
pub const DEFAULT_LOG: &str = "hello World";

/// Image used by default containers.
pub const DEFAULT_CONTAINER_IMAGE: &str = "busybox:1.28";

/// Image that declares volumes, used by the extended-container scenarios.
pub const DEFAULT_CONTAINER_VOLUME_IMAGE: &str = "docker.io/library/redis:alpine";

/// Attempt number recorded in container metadata.
pub const DEFAULT_ATTEMPT: u32 = 2;

/// Suffix appended to a log file when it is rotated aside.
pub const ROTATED_LOG_SUFFIX: &str = ".new";
