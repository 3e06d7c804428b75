//! Linux 上の外部コラボレータ実装
//!
//! ドメイン層で定義したトレイトの具体的な実装 (apt、systemd、procfs、
//! ロック、空き容量、ネットワーク、sources ファイル) を提供します。

mod apt_package_manager;
mod dpkg_lock_probe;
mod file_source_store;
mod instance_lock;
mod linux_platform_probe;
mod linux_systemd_manager;
mod preflight_probes;

// 公開APIの再エクスポート
pub use apt_package_manager::AptPackageManager;
pub use dpkg_lock_probe::FcntlLockProbe;
pub use file_source_store::FileSourceListStore;
pub use instance_lock::InstanceLock;
pub use linux_platform_probe::LinuxPlatformProbe;
pub use linux_systemd_manager::LinuxSystemdManager;
pub use preflight_probes::{StatvfsDiskProbe, TcpNetworkProbe};
