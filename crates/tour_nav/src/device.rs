//! Touch/desktop device classification.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    #[default]
    Desktop,
    Mobile,
}

impl DeviceClass {
    #[inline]
    pub fn is_mobile(self) -> bool {
        self == DeviceClass::Mobile
    }
}

#[derive(Debug, Error)]
pub enum DeviceProbeError {
    #[error("device string unavailable: {0}")]
    Unavailable(String),
    #[error("platform query failed: {0}")]
    Query(String),
}

/// Platform queries used to decide the device class.
pub trait DeviceProbe {
    /// True on native handheld platforms.
    fn is_mobile_platform(&self) -> bool;

    /// Free-form description reported by the host (user agent, OS name, ...).
    fn device_string(&self) -> Result<String, DeviceProbeError>;
}

const MOBILE_MARKERS: [&str; 6] = ["ios", "iphone", "ipad", "android", "mobile", "tablet"];

/// Classifies the device. Probe failures fall back to desktop.
pub fn classify_device(probe: &dyn DeviceProbe) -> DeviceClass {
    if probe.is_mobile_platform() {
        return DeviceClass::Mobile;
    }

    match probe.device_string() {
        Ok(device) => {
            let device = device.to_lowercase();
            if MOBILE_MARKERS.iter().any(|m| device.contains(m)) {
                DeviceClass::Mobile
            } else {
                DeviceClass::Desktop
            }
        }
        Err(err) => {
            log::warn!("Device probe failed ({}); assuming desktop.", err);
            DeviceClass::Desktop
        }
    }
}
