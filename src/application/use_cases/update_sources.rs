use crate::domain::migration::{
    BackupHandle, MigrationError, PackageManager, RefreshOutcome, SourceListStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// リポジトリ sources ファイルのバックアップ・書き換え・ロールバック
///
/// One instance per run. The backup is taken at most once and every
/// rollback restores that same snapshot.
pub struct SourceListManager {
    store: Arc<dyn SourceListStore>,
    path: PathBuf,
    backup_taken: bool,
    handle: Option<BackupHandle>,
}

impl SourceListManager {
    pub fn new(store: Arc<dyn SourceListStore>, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            path: path.into(),
            backup_taken: false,
            handle: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot the current sources file. Returns `None` when there is no
    /// file yet. An existing backup is never overwritten.
    pub fn backup(&mut self) -> Result<Option<BackupHandle>, MigrationError> {
        if self.backup_taken {
            return Ok(self.handle.clone());
        }

        self.handle = self.store.snapshot(&self.path)?;
        if self.handle.is_none() {
            info!("No existing sources at {}, nothing to back up", self.path.display());
        }
        self.backup_taken = true;
        Ok(self.handle.clone())
    }

    /// Write new sources. Returns whether the file content changed.
    pub fn apply(&self, content: &str) -> Result<bool, MigrationError> {
        if !self.backup_taken {
            return Err(MigrationError::ConfigurationApply(
                "refusing to modify sources before a backup was taken".to_string(),
            ));
        }

        if let Ok(Some(current)) = self.store.read(&self.path) {
            if current == content {
                info!("Sources at {} already up to date", self.path.display());
                return Ok(false);
            }
        }

        match self.store.write(&self.path, content) {
            Ok(()) => {
                info!("Updated {}", self.path.display());
                Ok(true)
            }
            Err(e) => {
                error!("Failed to write {}: {}", self.path.display(), e);
                let mut reason = format!("cannot write {}: {e}", self.path.display());
                if let Err(rollback) = self.rollback() {
                    error!("Rollback of {} failed: {}", self.path.display(), rollback);
                    reason.push_str(&format!("; rollback failed: {rollback}"));
                }
                Err(MigrationError::ConfigurationApply(reason))
            }
        }
    }

    /// Restore the pre-migration sources. Without a backup the file did
    /// not exist before, so it is removed.
    pub fn rollback(&self) -> Result<(), MigrationError> {
        self.store.restore(&self.path, self.handle.as_ref())
    }

    /// Refresh the package index. On failure, roll back once and retry
    /// once; a second failure is fatal.
    pub async fn refresh(
        &self,
        package_manager: &dyn PackageManager,
    ) -> Result<RefreshOutcome, MigrationError> {
        let first = match package_manager.update_index().await {
            Ok(()) => return Ok(RefreshOutcome::Applied),
            Err(e) => e,
        };

        warn!("Package index refresh failed: {}. Rolling back sources", first);
        if let Err(rollback) = self.rollback() {
            error!("Rollback of {} failed: {}", self.path.display(), rollback);
            return Err(MigrationError::ConfigurationApply(format!(
                "refresh failed ({first}) and rollback failed ({rollback})"
            )));
        }

        match package_manager.update_index().await {
            Ok(()) => {
                warn!("Package index refreshed against restored sources");
                Ok(RefreshOutcome::RolledBack)
            }
            Err(retry) => Err(MigrationError::ConfigurationApply(format!(
                "refresh failed ({first}) and retry after rollback failed ({retry})"
            ))),
        }
    }
}
