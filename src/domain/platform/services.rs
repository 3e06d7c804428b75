use super::entities::{PackageId, Platform};
use super::repositories::{DeviceTreeReader, KernelInfoReader};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

/// Armbian builds its Rockchip kernels as `<version>-<branch>-<family>`.
static ARMBIAN_KERNEL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|-)(?:vendor|current|edge|legacy)-(?:rk35xx|rockchip64)(?:-|$)")
        .expect("armbian kernel pattern is valid")
});

/// Ordered device-tree needles. The first match wins.
const DEVICE_TREE_SIGNATURES: &[(&str, Platform)] = &[
    ("raspberrypi", Platform::Cm5),
    ("brcm,bcm2712", Platform::Cm5),
    ("radxa,zero3", Platform::Radxa),
    ("armsom,", Platform::ArmsomRk3576),
    ("rockchip,rk3576", Platform::ArmsomRk3576),
];

pub fn is_armbian_kernel_name(name: &str) -> bool {
    ARMBIAN_KERNEL_PATTERN.is_match(name)
}

/// ハードウェアプラットフォームを判定するドメインサービス
pub struct PlatformDetector {
    device_tree: Arc<dyn DeviceTreeReader>,
    kernel_info: Arc<dyn KernelInfoReader>,
}

impl PlatformDetector {
    pub fn new(
        device_tree: Arc<dyn DeviceTreeReader>,
        kernel_info: Arc<dyn KernelInfoReader>,
    ) -> Self {
        Self {
            device_tree,
            kernel_info,
        }
    }

    /// Classify the host.
    ///
    /// A valid override always wins. An invalid one is reported and ignored.
    /// Armbian evidence is checked before the device tree because Armbian
    /// images keep the vendor board's compatible strings.
    pub fn classify(&self, override_value: Option<&str>) -> Platform {
        if let Some(raw) = override_value {
            match raw.parse::<Platform>() {
                Ok(platform) => {
                    info!("Using platform override: {}", platform);
                    return platform;
                }
                Err(e) => {
                    warn!("Ignoring platform override: {}", e);
                }
            }
        }

        if self.has_armbian_evidence() {
            return Platform::Armbian;
        }

        let compatible = self.device_tree.compatible();
        debug!("Device tree compatible: {:?}", compatible);
        for (needle, platform) in DEVICE_TREE_SIGNATURES {
            if compatible.iter().any(|entry| entry.contains(needle)) {
                debug!("Matched device tree signature {:?}", needle);
                return *platform;
            }
        }

        Platform::Unknown
    }

    fn has_armbian_evidence(&self) -> bool {
        if self.kernel_info.armbian_marker_present() {
            debug!("Found Armbian marker file");
            return true;
        }

        if let Some(release) = self.kernel_info.kernel_release() {
            if is_armbian_kernel_name(&release) {
                debug!("Kernel release {} matches Armbian naming", release);
                return true;
            }
        }

        self.kernel_info
            .module_directories()
            .iter()
            .any(|dir| is_armbian_kernel_name(dir))
    }
}

pub const CM5_GENESIS_PACKAGE: &str = "distiller-genesis-cm5";
pub const ROCKCHIP_GENESIS_PACKAGE: &str = "distiller-genesis-rockchip";
pub const COMMON_GENESIS_PACKAGE: &str = "distiller-genesis-common";

/// プラットフォームから後継メタパッケージを選択する
pub struct PackageSelector;

impl PackageSelector {
    /// `Unknown` selects the common package, unlike the hardware tables
    /// which fall back to CM5.
    pub fn select_package(platform: Platform) -> PackageId {
        let name = match platform {
            Platform::Cm5 => CM5_GENESIS_PACKAGE,
            Platform::Radxa | Platform::Armbian | Platform::ArmsomRk3576 => {
                ROCKCHIP_GENESIS_PACKAGE
            }
            Platform::Unknown => COMMON_GENESIS_PACKAGE,
        };
        PackageId::new(name)
    }
}
