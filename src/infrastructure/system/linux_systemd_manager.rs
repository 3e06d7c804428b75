use crate::domain::migration::{MigrationError, ServiceManager, UnitChange};
use async_trait::async_trait;
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info};

pub struct LinuxSystemdManager;

impl Default for LinuxSystemdManager {
    fn default() -> Self {
        Self
    }
}

impl LinuxSystemdManager {
    pub fn new() -> Self {
        Self
    }

    async fn run_systemctl(&self, args: &[&str]) -> Result<Output, MigrationError> {
        Command::new("systemctl")
            .args(args)
            .output()
            .await
            .map_err(|e| MigrationError::CommandFailed {
                command: format!("systemctl {}", args.join(" ")),
                reason: format!("Failed to run systemctl: {e}"),
            })
    }
}

/// systemctl reports a missing unit on stderr rather than with a distinct
/// exit status.
fn is_missing_unit(stderr: &str) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    stderr.contains("does not exist") || stderr.contains("not loaded") || stderr.contains("not found")
}

#[async_trait]
impl ServiceManager for LinuxSystemdManager {
    async fn disable(&self, unit: &str) -> Result<UnitChange, MigrationError> {
        let enabled = self.run_systemctl(&["is-enabled", unit]).await?;
        let state = String::from_utf8_lossy(&enabled.stdout).trim().to_string();
        debug!("Service {} is-enabled result: {}", unit, state);

        if state == "disabled" {
            return Ok(UnitChange::AlreadyInState);
        }

        let output = self.run_systemctl(&["disable", unit]).await?;
        if output.status.success() {
            info!("Disabled {}", unit);
            return Ok(UnitChange::Changed);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_missing_unit(&stderr) {
            return Ok(UnitChange::AlreadyInState);
        }

        Err(MigrationError::CommandFailed {
            command: format!("systemctl disable {unit}"),
            reason: stderr.trim().to_string(),
        })
    }

    async fn reload(&self) -> Result<(), MigrationError> {
        let output = self.run_systemctl(&["daemon-reload"]).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MigrationError::CommandFailed {
                command: "systemctl daemon-reload".to_string(),
                reason: stderr.trim().to_string(),
            });
        }

        info!("Reloaded systemd daemon");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_unit_detection() {
        assert!(is_missing_unit(
            "Failed to disable unit: Unit file distiller-migrate.service does not exist."
        ));
        assert!(is_missing_unit("Unit distiller-migrate.service not loaded."));
        assert!(!is_missing_unit("Failed to connect to bus: No such file or directory"));
    }
}
