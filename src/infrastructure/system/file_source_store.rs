use crate::domain::migration::{BackupHandle, MigrationError, SourceListStore};
use chrono::Local;
use std::fs::{self, Permissions};
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// apt reads sources as an unprivileged user for some operations.
const SOURCES_MODE: u32 = 0o644;

/// sources ファイルをファイルシステム上で扱う実装
pub struct FileSourceListStore;

impl Default for FileSourceListStore {
    fn default() -> Self {
        Self
    }
}

impl FileSourceListStore {
    pub fn new() -> Self {
        Self
    }

    fn next_backup_path(path: &Path) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let base = format!("{}.bak.{stamp}", path.display());
        let mut candidate = PathBuf::from(&base);
        let mut n = 1;
        while candidate.exists() {
            candidate = PathBuf::from(format!("{base}.{n}"));
            n += 1;
        }
        candidate
    }
}

/// Write to a sibling temporary file and rename it over `path`.
fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    fs::set_permissions(tmp.path(), Permissions::from_mode(SOURCES_MODE))?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl SourceListStore for FileSourceListStore {
    fn read(&self, path: &Path) -> Result<Option<String>, MigrationError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn snapshot(&self, path: &Path) -> Result<Option<BackupHandle>, MigrationError> {
        if !path.exists() {
            return Ok(None);
        }

        let backup = Self::next_backup_path(path);
        fs::copy(path, &backup)?;
        info!("Created backup at {}", backup.display());

        Ok(Some(BackupHandle {
            original: path.to_path_buf(),
            backup,
        }))
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), MigrationError> {
        write_atomic(path, content)?;
        debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(())
    }

    fn restore(&self, path: &Path, backup: Option<&BackupHandle>) -> Result<(), MigrationError> {
        match backup {
            Some(handle) => {
                let content = fs::read_to_string(&handle.backup)?;
                write_atomic(path, &content)?;
                info!("Restored {} from {}", path.display(), handle.backup.display());
            }
            None => match fs::remove_file(path) {
                Ok(()) => info!("Removed {} (no previous sources)", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }
}
