use crate::domain::migration::{DiskSpaceProbe, MigrationError, NetworkProbe};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

/// リポジトリホストへの TCP 接続で到達性を確認する
pub struct TcpNetworkProbe;

impl Default for TcpNetworkProbe {
    fn default() -> Self {
        Self
    }
}

impl TcpNetworkProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NetworkProbe for TcpNetworkProbe {
    async fn check(&self, url: &str, timeout: Duration) -> Result<(), MigrationError> {
        let parsed = Url::parse(url)
            .map_err(|e| MigrationError::Config(format!("Invalid repository URL {url}: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| MigrationError::Config(format!("Repository URL has no host: {url}")))?;
        let port = parsed.port_or_known_default().unwrap_or(80);

        debug!("Probing {}:{} (timeout {:?})", host, port, timeout);
        match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(MigrationError::TransientInfra(format!("{host}:{port}: {e}"))),
            Err(_) => Err(MigrationError::TransientInfra(format!(
                "{host}:{port}: no response within {}s",
                timeout.as_secs()
            ))),
        }
    }
}

/// statvfs による空き容量の取得
pub struct StatvfsDiskProbe;

impl Default for StatvfsDiskProbe {
    fn default() -> Self {
        Self
    }
}

impl StatvfsDiskProbe {
    pub fn new() -> Self {
        Self
    }
}

impl DiskSpaceProbe for StatvfsDiskProbe {
    /// Free space of the filesystem backing `path`, measured at the nearest
    /// existing ancestor when `path` itself is missing.
    fn available_kb(&self, path: &Path) -> Result<u64, MigrationError> {
        let existing = path
            .ancestors()
            .find(|candidate| candidate.exists())
            .unwrap_or_else(|| Path::new("/"));
        let bytes = fs2::available_space(existing)?;
        debug!("{} bytes available at {}", bytes, existing.display());
        Ok(bytes / 1024)
    }
}
