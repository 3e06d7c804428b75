use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 分類可能なハードウェアプラットフォーム
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Cm5,
    Radxa,
    Armbian,
    #[serde(rename = "armsom-rk3576")]
    ArmsomRk3576,
    Unknown,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Cm5,
        Platform::Radxa,
        Platform::Armbian,
        Platform::ArmsomRk3576,
        Platform::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Cm5 => "cm5",
            Platform::Radxa => "radxa",
            Platform::Armbian => "armbian",
            Platform::ArmsomRk3576 => "armsom-rk3576",
            Platform::Unknown => "unknown",
        }
    }

    /// Hardware accessor tuple for this platform.
    ///
    /// `Unknown` resolves to the CM5 profile in every table.
    pub fn hardware_profile(&self) -> HardwareProfile {
        HardwareProfile {
            spi_device: self.spi_device(),
            gpio_chip: self.gpio_chip(),
            gpio_pins: self.gpio_pins(),
            config_path: self.config_path(),
            description: self.description(),
        }
    }

    pub fn spi_device(&self) -> &'static str {
        match self {
            Platform::Radxa => "/dev/spidev3.0",
            Platform::Armbian | Platform::ArmsomRk3576 => "/dev/spidev0.0",
            Platform::Cm5 | Platform::Unknown => "/dev/spidev0.0",
        }
    }

    pub fn gpio_chip(&self) -> &'static str {
        match self {
            Platform::Radxa => "/dev/gpiochip3",
            Platform::Armbian => "/dev/gpiochip1",
            Platform::ArmsomRk3576 => "/dev/gpiochip4",
            Platform::Cm5 | Platform::Unknown => "/dev/gpiochip0",
        }
    }

    pub fn gpio_pins(&self) -> GpioPins {
        match self {
            Platform::Radxa => GpioPins::new(8, 2, 1),
            Platform::Armbian => GpioPins::new(4, 5, 6),
            Platform::ArmsomRk3576 => GpioPins::new(12, 11, 10),
            Platform::Cm5 | Platform::Unknown => GpioPins::new(7, 13, 9),
        }
    }

    pub fn config_path(&self) -> &'static str {
        match self {
            Platform::Radxa => "/opt/distiller-sdk/configs/radxa-zero3.conf",
            Platform::Armbian => "/opt/distiller-sdk/configs/armbian.conf",
            Platform::ArmsomRk3576 => "/opt/distiller-sdk/configs/armsom-rk3576.conf",
            Platform::Cm5 | Platform::Unknown => "/opt/distiller-sdk/configs/cm5.conf",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Platform::Radxa => "Radxa Zero 3W/3E (RK3566)",
            Platform::Armbian => "Armbian on Rockchip (RK35xx)",
            Platform::ArmsomRk3576 => "ArmSom Sige5 (RK3576)",
            Platform::Cm5 | Platform::Unknown => "Raspberry Pi Compute Module 5",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized platform identifier: {0:?}")]
pub struct UnknownPlatformError(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cm5" => Ok(Platform::Cm5),
            "radxa" => Ok(Platform::Radxa),
            "armbian" => Ok(Platform::Armbian),
            "armsom-rk3576" => Ok(Platform::ArmsomRk3576),
            "unknown" => Ok(Platform::Unknown),
            _ => Err(UnknownPlatformError(s.to_string())),
        }
    }
}

/// e-ink パネル制御用の GPIO ピン割り当て
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpioPins {
    pub dc: u8,
    pub rst: u8,
    pub busy: u8,
}

impl GpioPins {
    pub const fn new(dc: u8, rst: u8, busy: u8) -> Self {
        Self { dc, rst, busy }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HardwareProfile {
    pub spi_device: &'static str,
    pub gpio_chip: &'static str,
    pub gpio_pins: GpioPins,
    pub config_path: &'static str,
    pub description: &'static str,
}

/// 後継メタパッケージの識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PackageId(String);

impl PackageId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
