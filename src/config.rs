//! 設定の読み込み
//!
//! 起動時に一度だけ TOML ファイルと環境変数から `Settings` を構築します。
//! 実行中に環境変数を直接参照することはありません。

use crate::domain::migration::{MigrationError, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/distiller-migrate/config.toml";
pub const CONFIG_PATH_ENV: &str = "DISTILLER_MIGRATE_CONFIG";
pub const PLATFORM_OVERRIDE_ENV: &str = "DISTILLER_PLATFORM";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub repository: RepositorySettings,
    pub preflight: PreflightSettings,
    pub locks: LockSettings,
    pub packages: PackageSettings,
    pub paths: PathSettings,
    pub deployment: DeploymentSettings,
    pub logging: LoggingSettings,
    /// Raw value of the platform override. Validated by the detector so an
    /// invalid value degrades to signal-based detection.
    #[serde(skip)]
    pub platform_override: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    pub url: String,
    pub previous_channel: String,
    pub target_channel: String,
    pub components: String,
    pub architecture: String,
    pub keyring: PathBuf,
    pub sources_file: PathBuf,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            url: "http://apt.pamir.ai".to_string(),
            previous_channel: "unstable".to_string(),
            target_channel: "testing".to_string(),
            components: "main".to_string(),
            architecture: "arm64".to_string(),
            keyring: PathBuf::from("/usr/share/keyrings/pamir-ai-archive-keyring.gpg"),
            sources_file: PathBuf::from("/etc/apt/sources.list.d/pamir-ai.list"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreflightSettings {
    pub network_timeout_secs: u64,
    pub min_free_kb: u64,
    pub cache_dir: PathBuf,
    pub retry: RetrySettings,
}

impl Default for PreflightSettings {
    fn default() -> Self {
        Self {
            network_timeout_secs: 10,
            min_free_kb: 1_048_576,
            cache_dir: PathBuf::from("/var/cache/apt/archives"),
            retry: RetrySettings::default(),
        }
    }
}

impl PreflightSettings {
    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.network_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub initial_delay_secs: u64,
    pub multiplier: u32,
    pub max_delay_secs: u64,
    pub max_attempts: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            initial_delay_secs: 60,
            multiplier: 2,
            max_delay_secs: 900,
            max_attempts: 10,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_secs(self.initial_delay_secs),
            multiplier: self.multiplier,
            max_delay: Duration::from_secs(self.max_delay_secs),
            max_attempts: self.max_attempts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    pub paths: Vec<PathBuf>,
    pub interval_secs: u64,
    pub max_attempts: u32,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            paths: vec![
                PathBuf::from("/var/lib/dpkg/lock-frontend"),
                PathBuf::from("/var/lib/dpkg/lock"),
                PathBuf::from("/var/lib/apt/lists/lock"),
                PathBuf::from("/var/cache/apt/archives/lock"),
            ],
            interval_secs: 5,
            max_attempts: 360,
        }
    }
}

impl LockSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageSettings {
    /// Packages from the previous channel that the genesis set replaces.
    pub legacy: Vec<String>,
    /// Installed after the genesis package. Failures are tolerated.
    pub critical: Vec<String>,
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            legacy: vec![
                "distiller-cm5-sdk".to_string(),
                "distiller-cm5-services".to_string(),
                "distiller-cm5-mcp-hub".to_string(),
            ],
            critical: vec![
                "distiller-sdk".to_string(),
                "distiller-services".to_string(),
                "distiller-update".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub marker_file: PathBuf,
    pub instance_lock: PathBuf,
    /// Filesystem root used for platform probing.
    pub sysroot: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            marker_file: PathBuf::from("/var/lib/distiller-migrate/migration-complete"),
            instance_lock: PathBuf::from("/run/distiller-migrate.lock"),
            sysroot: PathBuf::from("/"),
        }
    }
}

/// 自己削除対象のデプロイ成果物
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentSettings {
    pub unit_name: String,
    pub unit_file: PathBuf,
    pub script_path: PathBuf,
    pub helper_path: PathBuf,
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            unit_name: "distiller-migrate.service".to_string(),
            unit_file: PathBuf::from("/etc/systemd/system/distiller-migrate.service"),
            script_path: PathBuf::from("/usr/local/sbin/distiller-migrate"),
            helper_path: PathBuf::from("/usr/local/lib/distiller/detect-platform.sh"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub file: PathBuf,
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: PathBuf::from("/var/log/distiller-migrate.log"),
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// Returns the settings and the file they were read from, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), MigrationError> {
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    pub fn load_with<F>(
        explicit: Option<&Path>,
        lookup: F,
    ) -> Result<(Self, Option<PathBuf>), MigrationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let candidate = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(MigrationError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Some(path.to_path_buf())
            }
            None => lookup(CONFIG_PATH_ENV)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
                .or_else(|| {
                    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                    default.exists().then_some(default)
                }),
        };

        let mut settings = match &candidate {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(&lookup);

        Ok((settings, candidate))
    }

    pub fn from_file(path: &Path) -> Result<Self, MigrationError> {
        let content = fs::read_to_string(path).map_err(|e| {
            MigrationError::Config(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
            .map_err(|e| MigrationError::Config(format!("Invalid {}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// `config` サブコマンド用。環境変数による上書きは含まない
    pub fn to_toml(&self) -> Result<String, MigrationError> {
        toml::to_string_pretty(self).map_err(|e| MigrationError::Config(e.to_string()))
    }

    fn apply_env<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.platform_override = lookup(PLATFORM_OVERRIDE_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.repository.target_channel, "testing");
        assert_eq!(settings.preflight.min_free_kb, 1_048_576);
        assert_eq!(settings.locks.interval_secs, 5);
        assert_eq!(settings.locks.max_attempts, 360);
        assert_eq!(settings.preflight.retry.initial_delay_secs, 60);
        assert!(settings.platform_override.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            [repository]
            target_channel = "stable"

            [locks]
            max_attempts = 12
            "#,
        )
        .unwrap();

        assert_eq!(settings.repository.target_channel, "stable");
        assert_eq!(settings.repository.url, "http://apt.pamir.ai");
        assert_eq!(settings.locks.max_attempts, 12);
        assert_eq!(settings.locks.interval_secs, 5);
    }

    #[test]
    fn test_platform_override_from_env() {
        let (settings, source) =
            Settings::load_with(None, env(&[(PLATFORM_OVERRIDE_ENV, " radxa ")])).unwrap();
        assert_eq!(settings.platform_override.as_deref(), Some("radxa"));
        // Only the default system path could have been used here.
        assert!(source.is_none() || source == Some(PathBuf::from(DEFAULT_CONFIG_PATH)));

        let (settings, _) =
            Settings::load_with(None, env(&[(PLATFORM_OVERRIDE_ENV, "  ")])).unwrap();
        assert!(settings.platform_override.is_none());
    }

    #[test]
    fn test_config_path_from_env() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[preflight]\nmin_free_kb = 42\n").unwrap();

        let (settings, source) = Settings::load_with(
            None,
            env(&[(CONFIG_PATH_ENV, path.to_str().unwrap())]),
        )
        .unwrap();

        assert_eq!(settings.preflight.min_free_kb, 42);
        assert_eq!(source, Some(path));
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let result = Settings::load_with(Some(&missing), env(&[]));
        assert!(matches!(result, Err(MigrationError::Config(_))));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[locks\nmax_attempts = ").unwrap();
        assert!(matches!(
            Settings::from_file(&path),
            Err(MigrationError::Config(_))
        ));
    }

    #[test]
    fn test_effective_settings_render_as_loadable_toml() {
        let mut settings = Settings::from_toml("[locks]\nmax_attempts = 12\n").unwrap();
        settings.platform_override = Some("cm5".into());

        let rendered = settings.to_toml().unwrap();
        assert!(rendered.contains("[repository]"));
        assert!(!rendered.contains("platform_override"));

        let reloaded = Settings::from_toml(&rendered).unwrap();
        assert_eq!(reloaded.locks.max_attempts, 12);
        assert_eq!(reloaded.repository.target_channel, "testing");
        assert_eq!(reloaded.paths.marker_file, settings.paths.marker_file);
    }

    #[test]
    fn test_retry_policy_from_settings() {
        let policy = RetrySettings::default().policy();
        assert_eq!(policy.initial_delay, Duration::from_secs(60));
        assert_eq!(policy.max_delay, Duration::from_secs(900));
        assert_eq!(policy.max_attempts, 10);
    }
}
