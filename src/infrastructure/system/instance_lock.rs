//! Host-wide exclusive lock for the migration run
//!
//! Held with `flock(LOCK_EX)` for the lifetime of the process so a second
//! orchestrator started by hand or by a restarted unit exits immediately.
//! The lock is released when the value is dropped.

use crate::domain::migration::MigrationError;
use fs2::FileExt;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct InstanceLock {
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Try to acquire the lock without blocking.
    pub fn try_acquire<P: AsRef<Path>>(path: P) -> Result<Self, MigrationError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                info!("Acquired instance lock at {}", path.display());
                Ok(Self { file, path })
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                debug!("Instance lock already held at {}", path.display());
                Err(MigrationError::AlreadyRunning(path))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
