pub mod cleanup_deployment;
pub mod detect_platform;
pub mod preflight_check;
pub mod run_migration;
pub mod show_status;
pub mod update_sources;
pub mod wait_for_locks;

pub use cleanup_deployment::CleanupAgent;
pub use detect_platform::{DetectPlatformUseCase, DetectionReport};
pub use preflight_check::PreflightChecker;
pub use run_migration::MigrationRunner;
pub use show_status::{ShowStatusUseCase, StatusReport};
pub use update_sources::SourceListManager;
pub use wait_for_locks::LockWaiter;
