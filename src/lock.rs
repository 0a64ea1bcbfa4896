//! File-based locking to prevent concurrent execution.
//!
//! Uses flock-style advisory locking so two batch runs cannot consume and
//! rotate the same log at once. The ad-hoc scan command never mutates the
//! log and takes no lock.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// A guard holding an exclusive lock on the configured lock file.
/// The lock is released when the guard is dropped.
pub struct LockGuard {
    _file: File,
}

impl LockGuard {
    /// Attempt to acquire an exclusive lock.
    /// Returns an error if another instance is already running.
    ///
    /// Uses OpenOptions with create+read+write to avoid TOCTOU race
    /// between file creation and lock acquisition.
    pub fn acquire(lock_path: &Path) -> Result<Self> {
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).ok();
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .with_context(|| format!("Failed to open lock file: {:?}", lock_path))?;

        fs::set_permissions(lock_path, fs::Permissions::from_mode(0o600))
            .context("Failed to set lock file permissions")?;

        file.try_lock_exclusive().map_err(|_| {
            anyhow::anyhow!(
                "Another instance of topip is already running.\n\
                 If you believe this is an error, remove the lock file: {:?}\n\
                 Or wait for the other instance to complete.",
                lock_path
            )
        })?;

        Ok(Self { _file: file })
    }
}

// Lock is automatically released when file is closed (on drop)
