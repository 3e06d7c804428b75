mod cli;

use crate::cli::{Cli, Commands};
use clap::Parser;
use nix::unistd::Uid;
use std::sync::Arc;
use tracing::{error, info};

use distiller_migrate::application::use_cases::{
    DetectPlatformUseCase, MigrationRunner, ShowStatusUseCase,
};
use distiller_migrate::config::{LoggingSettings, Settings};
use distiller_migrate::debug::{debug_helpers, init_logging};
use distiller_migrate::domain::migration::{MigrationContext, MigrationError, MigrationOutcome};
use distiller_migrate::domain::platform::PlatformDetector;
use distiller_migrate::infrastructure::system::{
    AptPackageManager, FcntlLockProbe, FileSourceListStore, InstanceLock, LinuxPlatformProbe,
    LinuxSystemdManager, StatvfsDiskProbe, TcpNetworkProbe,
};

const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (settings, source) = match Settings::load(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            // 設定が読めないので既定のログ設定で記録する
            if let Err(log_err) = init_logging(&cli.debug_config(&LoggingSettings::default())) {
                eprintln!("Failed to initialize logging: {}", log_err);
            }
            error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&cli.debug_config(&settings.logging)) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let platform_probe = Arc::new(LinuxPlatformProbe::new(&settings.paths.sysroot));
    let sources = Arc::new(FileSourceListStore::new());

    match cli.command {
        Some(Commands::Detect) => {
            let detector = PlatformDetector::new(platform_probe.clone(), platform_probe);
            let report =
                DetectPlatformUseCase::new(detector).execute(settings.platform_override.as_deref());
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some(Commands::Status { json }) => {
            let report = match ShowStatusUseCase::new(sources).execute(&settings) {
                Ok(report) => report,
                Err(e) => {
                    debug_helpers::log_error_details(&e, "status");
                    std::process::exit(e.exit_code());
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render());
            }
            if !report.complete {
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            match &source {
                Some(path) => println!("# Loaded from {}", path.display()),
                None => println!("# Built-in defaults"),
            }
            println!("{}", settings.to_toml()?);
        }
        None => {
            debug_helpers::log_system_info(BUILD_TIMESTAMP);
            match &source {
                Some(path) => info!("Loaded configuration from {}", path.display()),
                None => info!("No configuration file found, using defaults"),
            }
            debug_helpers::dump_state("settings", &settings);

            if !Uid::effective().is_root() {
                error!("{}", MigrationError::PermissionDenied);
                std::process::exit(MigrationError::PermissionDenied.exit_code());
            }

            let _instance = match InstanceLock::try_acquire(&settings.paths.instance_lock) {
                Ok(lock) => lock,
                Err(e) => {
                    error!("{}", e);
                    std::process::exit(1);
                }
            };

            // Dependency injection
            let runner = MigrationRunner::new(
                Arc::new(AptPackageManager::new()),
                Arc::new(LinuxSystemdManager::new()),
                sources,
                Arc::new(TcpNetworkProbe::new()),
                Arc::new(StatvfsDiskProbe::new()),
                Arc::new(FcntlLockProbe::new()),
                platform_probe.clone(),
                platform_probe,
            );

            let mut ctx = MigrationContext::new(settings);
            match runner.run(&mut ctx).await {
                Ok(MigrationOutcome::AlreadyComplete(_)) => {
                    info!("Nothing to migrate");
                }
                Ok(MigrationOutcome::Migrated {
                    platform, package, ..
                }) => {
                    info!("Migrated {} to {}", platform, package);
                }
                Err(e) => {
                    debug_helpers::log_error_details(&e, &ctx.state.to_string());
                    std::process::exit(e.exit_code());
                }
            }
        }
    }

    Ok(())
}
