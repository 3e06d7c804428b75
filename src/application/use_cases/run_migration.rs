use super::cleanup_deployment::CleanupAgent;
use super::preflight_check::PreflightChecker;
use super::update_sources::SourceListManager;
use super::wait_for_locks::LockWaiter;
use crate::domain::migration::{
    CleanupReport, DiskSpaceProbe, LockProbe, MigrationContext, MigrationError, MigrationOutcome,
    MigrationState, NetworkProbe, PackageManager, RefreshOutcome, ServiceManager,
    SourceListStore, render_sources, sources_channel,
};
use crate::domain::platform::{
    DeviceTreeReader, KernelInfoReader, PackageSelector, PlatformDetector,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

/// チャネル移行のステートマシン
pub struct MigrationRunner {
    preflight: PreflightChecker,
    lock_waiter: LockWaiter,
    detector: PlatformDetector,
    package_manager: Arc<dyn PackageManager>,
    sources: Arc<dyn SourceListStore>,
    cleanup: CleanupAgent,
}

impl MigrationRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        package_manager: Arc<dyn PackageManager>,
        service_manager: Arc<dyn ServiceManager>,
        sources: Arc<dyn SourceListStore>,
        network: Arc<dyn NetworkProbe>,
        disk: Arc<dyn DiskSpaceProbe>,
        locks: Arc<dyn LockProbe>,
        device_tree: Arc<dyn DeviceTreeReader>,
        kernel_info: Arc<dyn KernelInfoReader>,
    ) -> Self {
        Self {
            preflight: PreflightChecker::new(network, disk),
            lock_waiter: LockWaiter::new(locks),
            detector: PlatformDetector::new(device_tree, kernel_info),
            package_manager,
            sources,
            cleanup: CleanupAgent::new(service_manager),
        }
    }

    pub async fn run(&self, ctx: &mut MigrationContext) -> Result<MigrationOutcome, MigrationError> {
        info!(
            "Starting repository migration {} -> {}",
            ctx.settings.repository.previous_channel, ctx.settings.repository.target_channel
        );

        ctx.transition(MigrationState::CheckingMarker);
        let marker = ctx.marker();
        if marker.exists() {
            info!(
                "Migration already complete (marker {}), running cleanup only",
                marker.path().display()
            );
            let report = self.cleanup_stage(ctx).await;
            return Ok(MigrationOutcome::AlreadyComplete(report));
        }

        match self.migrate(ctx).await {
            Ok(outcome) => {
                info!("Migration finished successfully");
                Ok(outcome)
            }
            Err(e) => {
                error!("Migration failed during {}: {}", ctx.state, e);
                Err(e)
            }
        }
    }

    async fn migrate(&self, ctx: &mut MigrationContext) -> Result<MigrationOutcome, MigrationError> {
        let settings = ctx.settings.clone();
        let repository = &settings.repository;

        ctx.transition(MigrationState::Preflight);
        self.preflight
            .check_network(
                &repository.url,
                settings.preflight.network_timeout(),
                &settings.preflight.retry.policy(),
            )
            .await?;
        self.preflight
            .check_disk_space(&settings.preflight.cache_dir, settings.preflight.min_free_kb)?;

        ctx.transition(MigrationState::LockWait);
        self.lock_waiter
            .wait_for_locks(
                &settings.locks.paths,
                settings.locks.interval(),
                settings.locks.max_attempts,
            )
            .await?;

        ctx.transition(MigrationState::Backup);
        let mut sources = SourceListManager::new(self.sources.clone(), ctx.sources_path());
        ctx.backup = sources.backup()?;

        ctx.transition(MigrationState::ApplySources);
        sources.apply(&render_sources(repository))?;

        ctx.transition(MigrationState::Refresh);
        let refresh = sources.refresh(self.package_manager.as_ref()).await?;
        let channel = match refresh {
            RefreshOutcome::Applied => repository.target_channel.clone(),
            RefreshOutcome::RolledBack => {
                let restored = self
                    .sources
                    .read(sources.path())?
                    .as_deref()
                    .and_then(sources_channel)
                    .unwrap_or_else(|| repository.previous_channel.clone());
                warn!("Continuing with the restored {} sources", restored);
                restored
            }
        };
        ctx.refresh = Some(refresh);
        ctx.channel = Some(channel.clone());

        ctx.transition(MigrationState::Detect);
        let helper = &settings.deployment.helper_path;
        if !helper.exists() {
            return Err(MigrationError::DetectionMissing(helper.clone()));
        }
        let platform = self
            .detector
            .classify(settings.platform_override.as_deref());
        info!("Detected platform: {} ({})", platform, platform.description());
        ctx.platform = Some(platform);

        ctx.transition(MigrationState::SelectPackage);
        let package = PackageSelector::select_package(platform);
        info!("Selected genesis package {}", package);
        ctx.package = Some(package.clone());

        ctx.transition(MigrationState::FixBroken);
        best_effort("Broken package repair", self.package_manager.fix_broken()).await;

        ctx.transition(MigrationState::PurgeOld);
        if settings.packages.legacy.is_empty() {
            info!("No legacy packages configured");
        } else {
            best_effort(
                "Legacy package purge",
                self.package_manager.purge(&settings.packages.legacy),
            )
            .await;
        }

        ctx.transition(MigrationState::InstallGenesis);
        self.package_manager
            .install(&[package.to_string()])
            .await
            .map_err(|e| MigrationError::InstallFailure {
                package: package.to_string(),
                reason: e.to_string(),
            })?;

        ctx.transition(MigrationState::InstallCritical);
        if !settings.packages.critical.is_empty() {
            best_effort(
                "Critical package install",
                self.package_manager.install(&settings.packages.critical),
            )
            .await;
        }

        ctx.transition(MigrationState::MarkComplete);
        let marker = ctx.marker();
        marker.write(platform, &package, &channel)?;
        info!("Migration marked complete at {}", marker.path().display());

        let cleanup = self.cleanup_stage(ctx).await;
        Ok(MigrationOutcome::Migrated {
            platform,
            package,
            cleanup,
        })
    }

    async fn cleanup_stage(&self, ctx: &mut MigrationContext) -> CleanupReport {
        ctx.transition(MigrationState::Cleanup);
        let report = self.cleanup.execute(&ctx.settings.deployment).await;
        ctx.transition(MigrationState::Done);
        report
    }
}

async fn best_effort<F>(step: &str, operation: F)
where
    F: Future<Output = Result<(), MigrationError>>,
{
    if let Err(e) = operation.await {
        warn!("{} failed, continuing: {}", step, e);
    }
}
