//! Host-side directories mounted into test containers.

use std::path::{Path, PathBuf};

use crival_common::error::{CrivalError, Result};
use crival_common::types::PodSandboxId;
use tempfile::TempDir;

/// Name of the marker file placed in every host path.
pub const FLAG_FILE: &str = "testVolume.file";

/// Creates a temporary host directory holding [`FLAG_FILE`].
///
/// The directory is deleted when the returned guard drops.
///
/// # Errors
///
/// Returns an error if the directory or the flag file cannot be created.
pub fn create_host_path(pod_id: &PodSandboxId) -> Result<TempDir> {
    let dir = tempfile::Builder::new()
        .prefix(&format!("test{pod_id}"))
        .tempdir()
        .map_err(|e| CrivalError::Io {
            path: std::env::temp_dir(),
            source: e,
        })?;
    let flag = dir.path().join(FLAG_FILE);
    let _ = std::fs::File::create(&flag).map_err(|e| CrivalError::Io {
        path: flag,
        source: e,
    })?;
    tracing::debug!(path = %dir.path().display(), "created host path");
    Ok(dir)
}

/// A symlink removed when dropped.
#[derive(Debug)]
pub struct Symlink {
    path: PathBuf,
}

impl Symlink {
    /// Path of the link itself.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Symlink {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove symlink");
        }
    }
}

/// Creates `<target>-symlink` pointing at `target`.
///
/// # Errors
///
/// Returns an error if the link cannot be created.
#[cfg(unix)]
pub fn create_symlink(target: &Path) -> Result<Symlink> {
    let mut link = target.as_os_str().to_owned();
    link.push("-symlink");
    let path = PathBuf::from(link);
    std::os::unix::fs::symlink(target, &path).map_err(|e| CrivalError::Io {
        path: path.clone(),
        source: e,
    })?;
    Ok(Symlink { path })
}

/// Creates `<target>-symlink` pointing at `target`.
///
/// # Errors
///
/// Always returns an error on platforms without Unix symlinks.
#[cfg(not(unix))]
pub fn create_symlink(target: &Path) -> Result<Symlink> {
    Err(CrivalError::Config {
        message: format!("cannot symlink {}: unsupported platform", target.display()),
    })
}

/// Returns whether `path` exists.
///
/// # Errors
///
/// Returns an error if existence cannot be determined, e.g. permission
/// denied on a parent directory.
pub fn path_exists(path: &Path) -> Result<bool> {
    path.try_exists().map_err(|e| CrivalError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
