use crate::domain::migration::{MigrationError, PackageManager};
use crate::measure_time;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

const APT_GET: &str = "apt-get";

/// Keep existing conffiles and never prompt.
const DPKG_OPTIONS: [&str; 4] = [
    "-o",
    "Dpkg::Options::=--force-confdef",
    "-o",
    "Dpkg::Options::=--force-confold",
];

pub struct AptPackageManager;

impl Default for AptPackageManager {
    fn default() -> Self {
        Self
    }
}

impl AptPackageManager {
    pub fn new() -> Self {
        Self
    }

    async fn run_apt(&self, args: &[&str]) -> Result<(), MigrationError> {
        let command_line = format!("{APT_GET} {}", args.join(" "));
        debug!("Running {}", command_line);

        let output = Command::new(APT_GET)
            .args(args)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .env("APT_LISTCHANGES_FRONTEND", "none")
            .output()
            .await
            .map_err(|e| MigrationError::CommandFailed {
                command: command_line.clone(),
                reason: format!("failed to spawn: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MigrationError::CommandFailed {
                command: command_line,
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        Ok(())
    }
}

fn package_args<'a>(verb: &'a str, packages: &'a [String]) -> Vec<&'a str> {
    let mut args = vec![verb, "-y"];
    args.extend(DPKG_OPTIONS);
    args.extend(packages.iter().map(String::as_str));
    args
}

#[async_trait]
impl PackageManager for AptPackageManager {
    async fn update_index(&self) -> Result<(), MigrationError> {
        info!("Refreshing package index...");
        measure_time!("apt-get update", { self.run_apt(&["update"]).await })
    }

    async fn install(&self, packages: &[String]) -> Result<(), MigrationError> {
        info!("Installing {}", packages.join(" "));
        let args = package_args("install", packages);
        measure_time!("apt-get install", { self.run_apt(&args).await })
    }

    async fn purge(&self, packages: &[String]) -> Result<(), MigrationError> {
        info!("Purging {}", packages.join(" "));
        let args = package_args("purge", packages);
        measure_time!("apt-get purge", { self.run_apt(&args).await })
    }

    async fn fix_broken(&self) -> Result<(), MigrationError> {
        info!("Repairing broken packages...");
        let mut args = vec!["--fix-broken", "install", "-y"];
        args.extend(DPKG_OPTIONS);
        measure_time!("apt-get --fix-broken install", { self.run_apt(&args).await })
    }
}
