use crate::config::Settings;
use crate::domain::platform::{PackageId, Platform};
use chrono::Local;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MigrationState {
    Idle,
    CheckingMarker,
    Preflight,
    LockWait,
    Backup,
    ApplySources,
    Refresh,
    Detect,
    SelectPackage,
    FixBroken,
    PurgeOld,
    InstallGenesis,
    InstallCritical,
    MarkComplete,
    Cleanup,
    Done,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationState::Idle => "idle",
            MigrationState::CheckingMarker => "checking-marker",
            MigrationState::Preflight => "preflight",
            MigrationState::LockWait => "lock-wait",
            MigrationState::Backup => "backup",
            MigrationState::ApplySources => "apply-sources",
            MigrationState::Refresh => "refresh",
            MigrationState::Detect => "detect",
            MigrationState::SelectPackage => "select-package",
            MigrationState::FixBroken => "fix-broken",
            MigrationState::PurgeOld => "purge-old",
            MigrationState::InstallGenesis => "install-genesis",
            MigrationState::InstallCritical => "install-critical",
            MigrationState::MarkComplete => "mark-complete",
            MigrationState::Cleanup => "cleanup",
            MigrationState::Done => "done",
        };
        f.write_str(name)
    }
}

/// ネットワーク再試行の待機ポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self
            .multiplier
            .max(1)
            .saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// 変更前の sources ファイルのスナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupHandle {
    pub original: PathBuf,
    pub backup: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Index refreshed against the new sources.
    Applied,
    /// First refresh failed; sources were restored and the retry succeeded.
    RolledBack,
}

/// 移行完了マーカー。ファイルの存在そのものが完了を表す。
#[derive(Debug, Clone)]
pub struct CompletionMarker {
    path: PathBuf,
}

impl CompletionMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Persist the marker. An existing marker is left untouched.
    pub fn write(&self, platform: Platform, package: &PackageId, channel: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(()),
            Err(e) => return Err(e),
        };

        writeln!(file, "completed_at={}", Local::now().to_rfc3339())?;
        writeln!(file, "platform={platform}")?;
        writeln!(file, "package={package}")?;
        writeln!(file, "channel={channel}")?;
        file.sync_all()
    }

    /// Read back a written marker. `None` when the marker does not exist.
    pub fn read(&self) -> io::Result<Option<MarkerRecord>> {
        match fs::read_to_string(&self.path) {
            Ok(body) => Ok(Some(MarkerRecord::parse(&body))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// 完了マーカーに記録された内容
///
/// Markers written by hand or by older tooling may lack any of the keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MarkerRecord {
    pub completed_at: Option<String>,
    pub platform: Option<String>,
    pub package: Option<String>,
    pub channel: Option<String>,
}

impl MarkerRecord {
    pub fn parse(body: &str) -> Self {
        let mut record = Self::default();
        for line in body.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = Some(value.trim().to_string());
            match key.trim() {
                "completed_at" => record.completed_at = value,
                "platform" => record.platform = value,
                "package" => record.package = value,
                "channel" => record.channel = value,
                _ => {}
            }
        }
        record
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub already_absent: Vec<PathBuf>,
    pub unit_disabled: bool,
    pub units_reloaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    AlreadyComplete(CleanupReport),
    Migrated {
        platform: Platform,
        package: PackageId,
        cleanup: CleanupReport,
    },
}

/// 移行の全ステートを通して受け渡される実行コンテキスト
#[derive(Debug)]
pub struct MigrationContext {
    pub settings: Settings,
    pub state: MigrationState,
    pub history: Vec<MigrationState>,
    pub backup: Option<BackupHandle>,
    pub refresh: Option<RefreshOutcome>,
    pub platform: Option<Platform>,
    pub package: Option<PackageId>,
    /// Channel the sources point at after the refresh step.
    pub channel: Option<String>,
}

impl MigrationContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            state: MigrationState::Idle,
            history: vec![MigrationState::Idle],
            backup: None,
            refresh: None,
            platform: None,
            package: None,
            channel: None,
        }
    }

    pub fn sources_path(&self) -> &Path {
        &self.settings.repository.sources_file
    }

    pub fn marker(&self) -> CompletionMarker {
        CompletionMarker::new(&self.settings.paths.marker_file)
    }

    pub fn transition(&mut self, next: MigrationState) {
        info!("State {} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);
    }

    pub fn visited(&self, state: MigrationState) -> bool {
        self.history.contains(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_retry_policy_backoff() {
        let policy = RetryPolicy {
            initial_delay: Duration::from_secs(60),
            multiplier: 2,
            max_delay: Duration::from_secs(900),
            max_attempts: 10,
        };
        assert_eq!(policy.delay_after(1), Duration::from_secs(60));
        assert_eq!(policy.delay_after(2), Duration::from_secs(120));
        assert_eq!(policy.delay_after(4), Duration::from_secs(480));
        assert_eq!(policy.delay_after(5), Duration::from_secs(900));
        assert_eq!(policy.delay_after(40), Duration::from_secs(900));
    }

    #[test]
    fn test_retry_policy_fixed_delay() {
        let policy = RetryPolicy {
            initial_delay: Duration::from_secs(60),
            multiplier: 1,
            max_delay: Duration::from_secs(60),
            max_attempts: 3,
        };
        assert_eq!(policy.delay_after(1), policy.delay_after(3));
    }

    #[test]
    fn test_marker_written_once() {
        let dir = TempDir::new().unwrap();
        let marker = CompletionMarker::new(dir.path().join("state/migration-complete"));
        assert!(!marker.exists());

        marker
            .write(Platform::Cm5, &PackageId::new("distiller-genesis-cm5"), "testing")
            .unwrap();
        assert!(marker.exists());
        let first = fs::read_to_string(marker.path()).unwrap();
        assert!(first.contains("platform=cm5"));
        assert!(first.contains("package=distiller-genesis-cm5"));

        marker
            .write(Platform::Radxa, &PackageId::new("other"), "stable")
            .unwrap();
        assert_eq!(fs::read_to_string(marker.path()).unwrap(), first);
    }

    #[test]
    fn test_marker_read_back() {
        let dir = TempDir::new().unwrap();
        let marker = CompletionMarker::new(dir.path().join("migration-complete"));
        assert_eq!(marker.read().unwrap(), None);

        marker
            .write(Platform::Radxa, &PackageId::new("distiller-genesis-rockchip"), "testing")
            .unwrap();
        let record = marker.read().unwrap().unwrap();
        assert_eq!(record.platform.as_deref(), Some("radxa"));
        assert_eq!(record.package.as_deref(), Some("distiller-genesis-rockchip"));
        assert_eq!(record.channel.as_deref(), Some("testing"));
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn test_marker_record_tolerates_foreign_body() {
        let record = MarkerRecord::parse("done\nchannel = testing\nextra=1\n");
        assert_eq!(record.channel.as_deref(), Some("testing"));
        assert_eq!(record.platform, None);
        assert_eq!(MarkerRecord::parse(""), MarkerRecord::default());
    }

    #[test]
    fn test_context_transitions_are_recorded() {
        let mut ctx = MigrationContext::new(Settings::default());
        ctx.transition(MigrationState::CheckingMarker);
        ctx.transition(MigrationState::Preflight);
        assert_eq!(ctx.state, MigrationState::Preflight);
        assert_eq!(
            ctx.history,
            vec![
                MigrationState::Idle,
                MigrationState::CheckingMarker,
                MigrationState::Preflight
            ]
        );
        assert!(!ctx.visited(MigrationState::Backup));
    }
}
