use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Repository host unreachable: {0}")]
    TransientInfra(String),

    #[error("Insufficient disk space: {available_kb} KB free, {required_kb} KB required")]
    ResourceExhausted { available_kb: u64, required_kb: u64 },

    #[error("Package manager locks still held after {attempts} checks ({waited_secs}s)")]
    ContentionTimeout { attempts: u32, waited_secs: u64 },

    #[error("Failed to apply repository sources: {0}")]
    ConfigurationApply(String),

    #[error("Platform detection helper missing: {}", .0.display())]
    DetectionMissing(PathBuf),

    #[error("Failed to install {package}: {reason}")]
    InstallFailure { package: String, reason: String },

    #[error("Command `{command}` failed: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("Another migration is already running (lock {})", .0.display())]
    AlreadyRunning(PathBuf),

    #[error("This command requires root privileges")]
    PermissionDenied,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystemError(#[from] std::io::Error),
}

impl MigrationError {
    /// Only an unreachable repository host is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MigrationError::TransientInfra(_))
    }

    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_infra_is_retryable() {
        assert!(MigrationError::TransientInfra("timeout".into()).is_retryable());
        assert!(
            !MigrationError::ResourceExhausted {
                available_kb: 1,
                required_kb: 2
            }
            .is_retryable()
        );
        assert!(!MigrationError::DetectionMissing(PathBuf::from("/x")).is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = MigrationError::ResourceExhausted {
            available_kb: 500_000,
            required_kb: 1_048_576,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient disk space: 500000 KB free, 1048576 KB required"
        );
        assert_eq!(err.exit_code(), 1);

        let err = MigrationError::DetectionMissing(PathBuf::from("/usr/local/lib/x.sh"));
        assert_eq!(
            err.to_string(),
            "Platform detection helper missing: /usr/local/lib/x.sh"
        );
    }
}
