use crate::domain::platform::{DeviceTreeReader, KernelInfoReader};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const DEVICE_TREE_COMPATIBLE: &str = "proc/device-tree/compatible";
const KERNEL_RELEASE: &str = "proc/sys/kernel/osrelease";
const MODULES_DIR: &str = "lib/modules";
const ARMBIAN_MARKERS: [&str; 2] = ["etc/armbian-release", "boot/armbianEnv.txt"];

/// procfs とブートファイルからプラットフォーム判定用の情報を読み出す
pub struct LinuxPlatformProbe {
    root: PathBuf,
}

impl Default for LinuxPlatformProbe {
    fn default() -> Self {
        Self::new("/")
    }
}

impl LinuxPlatformProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

/// Split a NUL-separated device-tree string list.
pub fn parse_compatible(raw: &[u8]) -> Vec<String> {
    raw.split(|b| *b == 0)
        .filter(|entry| !entry.is_empty())
        .map(|entry| String::from_utf8_lossy(entry).trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

impl DeviceTreeReader for LinuxPlatformProbe {
    fn compatible(&self) -> Vec<String> {
        match fs::read(self.resolve(DEVICE_TREE_COMPATIBLE)) {
            Ok(raw) => parse_compatible(&raw),
            Err(e) => {
                debug!("No device tree compatible property: {}", e);
                Vec::new()
            }
        }
    }
}

impl KernelInfoReader for LinuxPlatformProbe {
    fn kernel_release(&self) -> Option<String> {
        fs::read_to_string(self.resolve(KERNEL_RELEASE))
            .ok()
            .map(|release| release.trim().to_string())
            .filter(|release| !release.is_empty())
    }

    fn module_directories(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.resolve(MODULES_DIR)) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn armbian_marker_present(&self) -> bool {
        ARMBIAN_MARKERS
            .iter()
            .map(|marker| self.resolve(marker))
            .any(|path| path.exists())
    }
}
