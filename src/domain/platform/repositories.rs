/// デバイスツリーの compatible 文字列を読み出す
pub trait DeviceTreeReader: Send + Sync {
    /// Entries of the `compatible` property in kernel order. Empty when the
    /// property is unavailable.
    fn compatible(&self) -> Vec<String>;
}

/// カーネルおよびブート環境の情報を読み出す
pub trait KernelInfoReader: Send + Sync {
    fn kernel_release(&self) -> Option<String>;

    /// Directory names under the installed kernel module tree.
    fn module_directories(&self) -> Vec<String>;

    /// Whether the Armbian release marker or its boot environment file is
    /// present. Both ship with the Armbian kernel packages.
    fn armbian_marker_present(&self) -> bool;
}
