use super::entities::BackupHandle;
use super::errors::MigrationError;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// パッケージマネージャ (apt) への操作
#[async_trait]
pub trait PackageManager: Send + Sync {
    async fn update_index(&self) -> Result<(), MigrationError>;
    async fn install(&self, packages: &[String]) -> Result<(), MigrationError>;
    async fn purge(&self, packages: &[String]) -> Result<(), MigrationError>;
    async fn fix_broken(&self) -> Result<(), MigrationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitChange {
    Changed,
    AlreadyInState,
}

/// サービスマネージャ (systemd) への操作
#[async_trait]
pub trait ServiceManager: Send + Sync {
    /// Disable without stopping. A unit that is already disabled or no
    /// longer exists reports `AlreadyInState`.
    async fn disable(&self, unit: &str) -> Result<UnitChange, MigrationError>;
    async fn reload(&self) -> Result<(), MigrationError>;
}

#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn check(&self, url: &str, timeout: Duration) -> Result<(), MigrationError>;
}

pub trait DiskSpaceProbe: Send + Sync {
    fn available_kb(&self, path: &Path) -> Result<u64, MigrationError>;
}

pub trait LockProbe: Send + Sync {
    /// Whether another process currently holds the lock at `path`.
    fn is_held(&self, path: &Path) -> bool;
}

/// リポジトリ sources ファイルの永続化
pub trait SourceListStore: Send + Sync {
    /// Current content, `None` when the file does not exist.
    fn read(&self, path: &Path) -> Result<Option<String>, MigrationError>;

    /// Copy the file to a fresh timestamped sibling. `None` when there is
    /// no file to copy.
    fn snapshot(&self, path: &Path) -> Result<Option<BackupHandle>, MigrationError>;

    /// Replace the content. Readers see either the old or the new file,
    /// never a partial write.
    fn write(&self, path: &Path, content: &str) -> Result<(), MigrationError>;

    /// Put the snapshot back, or remove the file when there was none.
    fn restore(&self, path: &Path, backup: Option<&BackupHandle>) -> Result<(), MigrationError>;
}
