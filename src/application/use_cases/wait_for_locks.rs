use crate::domain::migration::{LockProbe, MigrationError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Polls between status lines while waiting.
const REPORT_EVERY: u32 = 12;

/// パッケージマネージャのロック解放を待つ
///
/// This only observes the locks. A package manager can still grab a lock
/// between the final poll and our own apt invocation; apt then waits on
/// its own frontend lock, so the window is accepted rather than closed.
pub struct LockWaiter {
    probe: Arc<dyn LockProbe>,
}

impl LockWaiter {
    pub fn new(probe: Arc<dyn LockProbe>) -> Self {
        Self { probe }
    }

    /// Succeeds as soon as one poll finds every lock free. Fails after
    /// `max_attempts` held polls, having waited `max_attempts * interval`.
    pub async fn wait_for_locks(
        &self,
        lock_paths: &[PathBuf],
        interval: Duration,
        max_attempts: u32,
    ) -> Result<(), MigrationError> {
        for attempt in 1..=max_attempts {
            let held: Vec<&PathBuf> = lock_paths
                .iter()
                .filter(|path| self.probe.is_held(path))
                .collect();

            if held.is_empty() {
                if attempt > 1 {
                    info!("Package manager locks released after {} checks", attempt);
                } else {
                    info!("No package manager locks held");
                }
                return Ok(());
            }

            if attempt == 1 || attempt % REPORT_EVERY == 0 {
                info!(
                    "Waiting for package manager locks ({}/{}): {:?}",
                    attempt, max_attempts, held
                );
            }
            tokio::time::sleep(interval).await;
        }

        Err(MigrationError::ContentionTimeout {
            attempts: max_attempts,
            waited_secs: interval.as_secs() * u64::from(max_attempts),
        })
    }
}
