//! デバッグとログ機能
//!
//! コンソールとログファイルの両方へ同じイベントを出力する

use crate::config::LoggingSettings;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// デバッグ設定
#[derive(Debug, Clone)]
pub struct DebugConfig {
    /// ログレベル (`RUST_LOG` が優先される)
    pub log_level: String,
    /// ログファイル。`None` ならファイル出力しない
    pub log_file: Option<PathBuf>,
    /// コンソールログを有効にするか
    pub enable_console_logging: bool,
    /// コンソールログを stdout ではなく stderr に出すか
    pub console_to_stderr: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self::from_settings(&LoggingSettings::default())
    }
}

impl DebugConfig {
    pub fn from_settings(logging: &LoggingSettings) -> Self {
        Self {
            log_level: logging.level.clone(),
            log_file: Some(logging.file.clone()),
            enable_console_logging: true,
            console_to_stderr: false,
        }
    }

    /// stderr only. Used by commands whose stdout is machine readable and
    /// that must not touch the log file.
    pub fn stderr_only(log_level: &str) -> Self {
        Self {
            log_level: log_level.to_string(),
            log_file: None,
            enable_console_logging: true,
            console_to_stderr: true,
        }
    }
}

/// ログシステムを初期化
///
/// A log file that cannot be opened disables file output with a warning
/// instead of failing; the console sink alone is enough to run.
pub fn init_logging(config: &DebugConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // 環境変数からのフィルター設定
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("distiller_migrate={}", config.log_level)))?;

    let mut file_error = None;
    let file_layer = match &config.log_file {
        Some(path) => match file_appender(path) {
            Ok(appender) => Some(
                fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_target(false),
            ),
            Err(e) => {
                file_error = Some(format!("{}: {}", path.display(), e));
                None
            }
        },
        None => None,
    };

    let console_layer = config.enable_console_logging.then(|| {
        let writer = if config.console_to_stderr {
            BoxMakeWriter::new(std::io::stderr)
        } else {
            BoxMakeWriter::new(std::io::stdout)
        };
        fmt::layer().with_writer(writer).with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    if let Some(e) = file_error {
        warn!("File logging disabled: {}", e);
    }
    debug!("デバッグ設定: {:?}", config);

    Ok(())
}

/// Append-only writer for `path`, creating its directory first.
fn file_appender(path: &Path) -> Result<RollingFileAppender, Box<dyn std::error::Error + Send + Sync>> {
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("{} is not a file path", path.display()))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy().into_owned())
        .build(directory)?;
    Ok(appender)
}

/// パフォーマンス測定用のマクロ
#[macro_export]
macro_rules! measure_time {
    ($name:expr, $block:block) => {{
        let start = std::time::Instant::now();
        let result = $block;
        let duration = start.elapsed();
        tracing::info!(
            operation = $name,
            duration_ms = duration.as_millis(),
            "操作完了"
        );
        result
    }};
}

/// デバッグ用のヘルパー関数
pub mod debug_helpers {
    use super::*;
    use tracing::error;

    /// 起動時の環境情報をログに出力
    pub fn log_system_info(build_timestamp: &str) {
        info!("=== システム情報 ===");
        info!("OS: {}", std::env::consts::OS);
        info!("アーキテクチャ: {}", std::env::consts::ARCH);
        info!("バージョン: {}", env!("CARGO_PKG_VERSION"));
        info!("ビルド: {}", build_timestamp);
    }

    /// エラーの詳細情報をログに出力
    pub fn log_error_details(error: &dyn std::error::Error, context: &str) {
        error!(
            context = context,
            error = %error,
            "エラーが発生しました"
        );

        // エラーチェーンをログに出力
        let mut source = error.source();
        let mut level = 1;
        while let Some(err) = source {
            error!(
                context = context,
                level = level,
                source_error = %err,
                "エラーの原因"
            );
            source = err.source();
            level += 1;
        }
    }

    /// デバッグ用の状態ダンプ
    pub fn dump_state<T: std::fmt::Debug>(name: &str, state: &T) {
        debug!(
            component = name,
            state = ?state,
            "状態ダンプ"
        );
    }
}
