use crate::config::DeploymentSettings;
use crate::domain::migration::{CleanupReport, ServiceManager, UnitChange};
use std::fs;
use std::io::ErrorKind;
use std::sync::Arc;
use tracing::{info, warn};

/// 移行用のユニット・スクリプトを削除して自身を登録解除する
pub struct CleanupAgent {
    service_manager: Arc<dyn ServiceManager>,
}

impl CleanupAgent {
    pub fn new(service_manager: Arc<dyn ServiceManager>) -> Self {
        Self { service_manager }
    }

    /// Never fails. Artifacts that are already gone count as cleaned up and
    /// other problems are logged as warnings.
    ///
    /// The unit is disabled while its descriptor still exists because
    /// `systemctl disable` reads the `[Install]` section. The final reload
    /// only rescans unit directories.
    pub async fn execute(&self, deployment: &DeploymentSettings) -> CleanupReport {
        info!("Starting cleanup of migration artifacts...");
        let mut report = CleanupReport::default();

        match self.service_manager.disable(&deployment.unit_name).await {
            Ok(UnitChange::Changed) => {
                report.unit_disabled = true;
            }
            Ok(UnitChange::AlreadyInState) => {
                info!("{} already disabled", deployment.unit_name);
                report.unit_disabled = true;
            }
            Err(e) => warn!("Could not disable {}: {}", deployment.unit_name, e),
        }

        for path in [
            &deployment.unit_file,
            &deployment.script_path,
            &deployment.helper_path,
        ] {
            match fs::remove_file(path) {
                Ok(()) => {
                    info!("Removed {}", path.display());
                    report.removed.push(path.clone());
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    info!("{} already absent", path.display());
                    report.already_absent.push(path.clone());
                }
                Err(e) => warn!("Could not remove {}: {}", path.display(), e),
            }
        }

        match self.service_manager.reload().await {
            Ok(()) => report.units_reloaded = true,
            Err(e) => warn!("Could not reload unit files: {}", e),
        }

        info!("Cleanup finished");
        report
    }
}
