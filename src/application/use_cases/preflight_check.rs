use crate::domain::migration::{DiskSpaceProbe, MigrationError, NetworkProbe, RetryPolicy};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 変更を加える前のネットワーク・空き容量チェック
pub struct PreflightChecker {
    network: Arc<dyn NetworkProbe>,
    disk: Arc<dyn DiskSpaceProbe>,
}

impl PreflightChecker {
    pub fn new(network: Arc<dyn NetworkProbe>, disk: Arc<dyn DiskSpaceProbe>) -> Self {
        Self { network, disk }
    }

    /// Probe the repository host, retrying transient failures with
    /// exponential backoff until the policy's attempts are used up.
    pub async fn check_network(
        &self,
        url: &str,
        timeout: Duration,
        policy: &RetryPolicy,
    ) -> Result<(), MigrationError> {
        let attempts = policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.network.check(url, timeout).await {
                Ok(()) => {
                    info!("Repository {} is reachable", url);
                    return Ok(());
                }
                Err(e) if e.is_retryable() && attempt < attempts => {
                    let delay = policy.delay_after(attempt);
                    warn!(
                        "Network check {}/{} failed: {}. Retrying in {}s",
                        attempt,
                        attempts,
                        e,
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Returns the free space in KB when it meets the threshold.
    pub fn check_disk_space(&self, path: &Path, threshold_kb: u64) -> Result<u64, MigrationError> {
        let available_kb = self.disk.available_kb(path)?;

        if available_kb < threshold_kb {
            return Err(MigrationError::ResourceExhausted {
                available_kb,
                required_kb: threshold_kb,
            });
        }

        info!(
            "{} KB free at {} (need {} KB)",
            available_kb,
            path.display(),
            threshold_kb
        );
        Ok(available_kb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    struct CountingNetwork {
        failures: u32,
        calls: AtomicU32,
    }

    impl CountingNetwork {
        fn failing(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl NetworkProbe for CountingNetwork {
        async fn check(&self, _url: &str, _timeout: Duration) -> Result<(), MigrationError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(MigrationError::TransientInfra("connection refused".into()))
            } else {
                Ok(())
            }
        }
    }

    struct FixedDisk(u64);

    impl DiskSpaceProbe for FixedDisk {
        fn available_kb(&self, _path: &Path) -> Result<u64, MigrationError> {
            Ok(self.0)
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_secs(60),
            multiplier: 2,
            max_delay: Duration::from_secs(900),
            max_attempts,
        }
    }

    fn checker(network: Arc<CountingNetwork>, free_kb: u64) -> PreflightChecker {
        PreflightChecker::new(network, Arc::new(FixedDisk(free_kb)))
    }

    #[test]
    fn test_low_disk_space_is_resource_exhausted() {
        let checker = checker(Arc::new(CountingNetwork::failing(0)), 500_000);
        let result = checker.check_disk_space(Path::new("/var/cache/apt/archives"), 1_048_576);
        match result {
            Err(MigrationError::ResourceExhausted {
                available_kb,
                required_kb,
            }) => {
                assert_eq!(available_kb, 500_000);
                assert_eq!(required_kb, 1_048_576);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_enough_disk_space() {
        let checker = checker(Arc::new(CountingNetwork::failing(0)), 2_000_000);
        assert_eq!(
            checker
                .check_disk_space(Path::new("/var/cache/apt/archives"), 1_048_576)
                .unwrap(),
            2_000_000
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_retries_with_backoff_then_succeeds() {
        let network = Arc::new(CountingNetwork::failing(2));
        let checker = checker(network.clone(), 0);
        let start = Instant::now();

        checker
            .check_network("http://apt.pamir.ai", Duration::from_secs(10), &policy(5))
            .await
            .unwrap();

        assert_eq!(network.calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(60 + 120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_gives_up_after_max_attempts() {
        let network = Arc::new(CountingNetwork::failing(u32::MAX));
        let checker = checker(network.clone(), 0);
        let start = Instant::now();

        let result = checker
            .check_network("http://apt.pamir.ai", Duration::from_secs(10), &policy(4))
            .await;

        assert!(matches!(result, Err(MigrationError::TransientInfra(_))));
        assert_eq!(network.calls.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(60 + 120 + 240));
    }
}
