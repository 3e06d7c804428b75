//! プラットフォームドメイン
//!
//! ハードウェアプラットフォームの分類と、プラットフォームごとの
//! ハードウェアアクセサ表・後継メタパッケージ表を提供します。

pub mod entities;
pub mod repositories;
pub mod services;

// 主要な型の再エクスポート
pub use entities::{GpioPins, HardwareProfile, PackageId, Platform};
pub use repositories::{DeviceTreeReader, KernelInfoReader};
pub use services::{PackageSelector, PlatformDetector};
