//! 移行ドメイン
//!
//! チャネル移行のステートマシンが扱う値と、外部コラボレータ
//! (パッケージマネージャ、サービスマネージャ、各種プローブ) の境界を定義します。

pub mod entities;
pub mod errors;
pub mod repositories;
pub mod services;

// 主要な型の再エクスポート
pub use entities::{
    BackupHandle, CleanupReport, CompletionMarker, MarkerRecord, MigrationContext,
    MigrationOutcome, MigrationState, RefreshOutcome, RetryPolicy,
};
pub use errors::MigrationError;
pub use repositories::{
    DiskSpaceProbe, LockProbe, NetworkProbe, PackageManager, ServiceManager, SourceListStore,
    UnitChange,
};
pub use services::{render_sources, sources_channel};
