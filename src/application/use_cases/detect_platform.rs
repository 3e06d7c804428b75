use crate::domain::platform::{
    HardwareProfile, PackageId, PackageSelector, Platform, PlatformDetector,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub platform: Platform,
    pub package: PackageId,
    pub profile: HardwareProfile,
}

/// プラットフォーム判定結果を表示用にまとめるユースケース
pub struct DetectPlatformUseCase {
    detector: PlatformDetector,
}

impl DetectPlatformUseCase {
    pub fn new(detector: PlatformDetector) -> Self {
        Self { detector }
    }

    pub fn execute(&self, override_value: Option<&str>) -> DetectionReport {
        let platform = self.detector.classify(override_value);
        DetectionReport {
            platform,
            package: PackageSelector::select_package(platform),
            profile: platform.hardware_profile(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::platform::{DeviceTreeReader, KernelInfoReader};
    use std::sync::Arc;

    struct Nothing;

    impl DeviceTreeReader for Nothing {
        fn compatible(&self) -> Vec<String> {
            Vec::new()
        }
    }

    impl KernelInfoReader for Nothing {
        fn kernel_release(&self) -> Option<String> {
            None
        }

        fn module_directories(&self) -> Vec<String> {
            Vec::new()
        }

        fn armbian_marker_present(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_unknown_report_mixes_fallbacks() {
        let use_case =
            DetectPlatformUseCase::new(PlatformDetector::new(Arc::new(Nothing), Arc::new(Nothing)));
        let report = use_case.execute(None);

        assert_eq!(report.platform, Platform::Unknown);
        assert_eq!(report.package.as_str(), "distiller-genesis-common");
        assert_eq!(report.profile, Platform::Cm5.hardware_profile());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["platform"], "unknown");
        assert_eq!(json["package"], "distiller-genesis-common");
        assert_eq!(json["profile"]["spi_device"], "/dev/spidev0.0");
        assert_eq!(json["profile"]["gpio_pins"]["dc"], 7);
    }

    #[test]
    fn test_override_report() {
        let use_case =
            DetectPlatformUseCase::new(PlatformDetector::new(Arc::new(Nothing), Arc::new(Nothing)));
        let report = use_case.execute(Some("radxa"));
        assert_eq!(report.platform, Platform::Radxa);
        assert_eq!(report.package.as_str(), "distiller-genesis-rockchip");
        assert_eq!(report.profile.gpio_chip, "/dev/gpiochip3");
    }
}
