use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tour_nav::{classify_device, DeviceClass, DeviceProbe, DeviceProbeError};

/// `tour_viewer` - walks an authored panorama grid in a desktop window.
///
/// Arrow keys or WASD step between viewpoints, dragging looks around, the
/// wheel zooms and a quick click jumps to the viewpoint under the cursor.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Scene description (JSON) with viewpoints, surfaces and tunables.
    #[arg(long, env = "TOUR_SCENE", default_value = "scenes/demo.json")]
    pub scene: PathBuf,

    /// Device class used for sensitivities and marker behaviour.
    #[arg(long, value_enum, default_value_t = DeviceArg::Auto)]
    pub device: DeviceArg,

    /// Initial window width in logical pixels.
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height in logical pixels.
    #[arg(long, default_value_t = 720)]
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DeviceArg {
    /// Ask the platform.
    Auto,
    Desktop,
    Mobile,
}

impl std::fmt::Display for DeviceArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeviceArg::Auto => "auto",
            DeviceArg::Desktop => "desktop",
            DeviceArg::Mobile => "mobile",
        };
        f.write_str(s)
    }
}

impl DeviceArg {
    pub fn resolve(self, probe: &dyn DeviceProbe) -> DeviceClass {
        match self {
            DeviceArg::Auto => classify_device(probe),
            DeviceArg::Desktop => DeviceClass::Desktop,
            DeviceArg::Mobile => DeviceClass::Mobile,
        }
    }
}

/// Environment variable a host shell can set to describe the device
/// (a user agent, an OS name).
pub const DEVICE_STRING_VAR: &str = "TOUR_DEVICE_STRING";

/// Platform probe backed by the compile target and the process environment.
#[derive(Debug, Default)]
pub struct EnvDeviceProbe;

impl DeviceProbe for EnvDeviceProbe {
    fn is_mobile_platform(&self) -> bool {
        cfg!(any(target_os = "android", target_os = "ios"))
    }

    fn device_string(&self) -> Result<String, DeviceProbeError> {
        match std::env::var(DEVICE_STRING_VAR) {
            Ok(value) => Ok(value),
            Err(std::env::VarError::NotPresent) => Ok(std::env::consts::OS.to_owned()),
            Err(err) => Err(DeviceProbeError::Query(err.to_string())),
        }
    }
}
