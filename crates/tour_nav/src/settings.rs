//! Tunables for a tour, grouped by the part that reads them.
//!
//! Every group deserializes with defaults for missing fields, so a scene file
//! only has to mention what it changes.

use serde::{Deserialize, Serialize};

use crate::camera::CameraSettings;
use crate::error::{Result, TourError};
use crate::gesture::GestureSettings;
use crate::hover::HoverSettings;
use crate::pulse::PulseSettings;

/// Overlap as a share of the camera's settle time when no explicit delay is set.
const DERIVED_DELAY_FACTOR: f32 = 0.55;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TourSettings {
    pub camera: CameraSettings,
    pub gesture: GestureSettings,
    pub hover: HoverSettings,
    pub pulse: PulseSettings,
    /// Seconds the previous viewpoint stays visible after a switch.
    pub deactivate_previous_delay: Option<f32>,
    /// Start on the indexed cell closest to the camera instead of the cell
    /// under it.
    pub snap_to_closest_node_on_start: bool,
    /// Hidden by default; pointer-driven hosts usually turn it on.
    pub show_cursor: bool,
}

impl Default for TourSettings {
    fn default() -> Self {
        Self {
            camera: CameraSettings::default(),
            gesture: GestureSettings::default(),
            hover: HoverSettings::default(),
            pulse: PulseSettings::default(),
            deactivate_previous_delay: None,
            snap_to_closest_node_on_start: true,
            show_cursor: false,
        }
    }
}

impl TourSettings {
    pub fn deactivation_delay(&self) -> f32 {
        self.deactivate_previous_delay
            .unwrap_or(self.camera.move_smooth_time * DERIVED_DELAY_FACTOR)
    }

    /// Rejects values the controller cannot work with.
    pub fn validate(&self) -> Result<()> {
        let camera = &self.camera;
        if !(camera.min_pitch_deg <= camera.max_pitch_deg) {
            return Err(invalid(
                "camera.min_pitch_deg",
                format!("{} exceeds max_pitch_deg {}", camera.min_pitch_deg, camera.max_pitch_deg),
            ));
        }
        if !(camera.min_fov_deg <= camera.max_fov_deg) {
            return Err(invalid(
                "camera.min_fov_deg",
                format!("{} exceeds max_fov_deg {}", camera.min_fov_deg, camera.max_fov_deg),
            ));
        }
        if !(camera.min_fov_deg > 0.0 && camera.max_fov_deg < 180.0) {
            return Err(invalid("camera.fov", "must lie strictly between 0 and 180 degrees".into()));
        }
        non_negative("camera.move_smooth_time", camera.move_smooth_time)?;

        let gesture = &self.gesture;
        non_negative("gesture.input_repeat_delay", gesture.input_repeat_delay)?;
        non_negative("gesture.tap_max_time", gesture.tap_max_time)?;
        non_negative("gesture.tap_max_move_pixels", gesture.tap_max_move_pixels)?;
        if !(gesture.mobile_sensitivity_divider > 0.0) {
            return Err(invalid(
                "gesture.mobile_sensitivity_divider",
                "must be positive".into(),
            ));
        }

        non_negative("pulse.up_time", self.pulse.up_time)?;
        non_negative("pulse.down_time", self.pulse.down_time)?;
        if let Some(delay) = self.deactivate_previous_delay {
            non_negative("deactivate_previous_delay", delay)?;
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: String) -> TourError {
    TourError::InvalidSetting { name, reason }
}

fn non_negative(name: &'static str, value: f32) -> Result<()> {
    if value < 0.0 || value.is_nan() {
        return Err(invalid(name, format!("{value} must not be negative")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let settings = TourSettings::default();
        assert_eq!(settings.validate(), Ok(()));
        assert!((settings.deactivation_delay() - 0.0825).abs() < 1e-6);
    }

    #[test]
    fn explicit_delay_wins() {
        let settings = TourSettings {
            deactivate_previous_delay: Some(0.3),
            ..TourSettings::default()
        };
        assert_eq!(settings.deactivation_delay(), 0.3);
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let mut settings = TourSettings::default();
        settings.camera.min_fov_deg = 130.0;
        assert!(matches!(
            settings.validate(),
            Err(TourError::InvalidSetting { name: "camera.min_fov_deg", .. })
        ));

        let mut settings = TourSettings::default();
        settings.gesture.tap_max_time = -1.0;
        assert!(matches!(
            settings.validate(),
            Err(TourError::InvalidSetting { name: "gesture.tap_max_time", .. })
        ));
    }

    #[test]
    fn nan_ranges_are_rejected() {
        let mut settings = TourSettings::default();
        settings.camera.max_pitch_deg = f32::NAN;
        assert!(matches!(
            settings.validate(),
            Err(TourError::InvalidSetting { name: "camera.min_pitch_deg", .. })
        ));

        let mut settings = TourSettings::default();
        settings.camera.min_fov_deg = f32::NAN;
        assert!(matches!(
            settings.validate(),
            Err(TourError::InvalidSetting { name: "camera.min_fov_deg", .. })
        ));

        let mut settings = TourSettings::default();
        settings.gesture.mobile_sensitivity_divider = f32::NAN;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn cursor_is_hidden_unless_asked_for() {
        assert!(!TourSettings::default().show_cursor);
        let settings: TourSettings = serde_json::from_str(r#"{ "show_cursor": true }"#).unwrap();
        assert!(settings.show_cursor);
        assert!(settings.snap_to_closest_node_on_start);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: TourSettings = serde_json::from_str(
            r#"{ "camera": { "max_fov_deg": 90.0 }, "gesture": { "invert_y": true } }"#,
        )
        .unwrap();
        assert_eq!(settings.camera.max_fov_deg, 90.0);
        assert_eq!(settings.camera.min_fov_deg, 50.0);
        assert!(settings.gesture.invert_y);
        assert_eq!(settings.pulse, PulseSettings::default());
    }
}
