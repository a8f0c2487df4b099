use serde::{Deserialize, Serialize};

use super::device::{DeviceType, Position};
use super::error::SessionError;

/// Nominal zoom used for devices that report no field of view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackZoomTable {
    pub ultra_wide: f64,
    pub telephoto: f64,
    pub default: f64,
}

impl FallbackZoomTable {
    pub fn nominal_zoom(&self, device_type: DeviceType) -> f64 {
        match device_type {
            DeviceType::UltraWide => self.ultra_wide,
            DeviceType::Telephoto => self.telephoto,
            _ => self.default,
        }
    }
}

impl Default for FallbackZoomTable {
    fn default() -> Self {
        Self {
            ultra_wide: 0.5,
            telephoto: 3.0,
            default: 1.0,
        }
    }
}

/// Configuration for a capture session manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfiguration {
    /// Position of the device selected at configuration time (default: back).
    pub default_position: Position,

    pub fallback_zoom: FallbackZoomTable,

    /// Margin a different lens must win by before a pinch gesture switches to it.
    pub lens_switch_hysteresis: f64,

    /// Frames allowed in flight between capture and classification (default: 1).
    /// Frames beyond this are dropped as they arrive.
    pub max_pending_frames: usize,

    /// Name of the session-configuration worker thread.
    pub queue_label: String,
}

impl SessionConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.lens_switch_hysteresis.is_nan() || self.lens_switch_hysteresis < 0.0 {
            return Err(format!(
                "lens switch hysteresis must be non-negative: {}",
                self.lens_switch_hysteresis
            ));
        }
        if self.max_pending_frames == 0 {
            return Err("max pending frames must be at least 1".into());
        }
        let table = &self.fallback_zoom;
        for (name, value) in [
            ("ultra_wide", table.ultra_wide),
            ("telephoto", table.telephoto),
            ("default", table.default),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(format!("fallback zoom {} must be positive: {}", name, value));
            }
        }
        if self.queue_label.is_empty() {
            return Err("queue label must not be empty".into());
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SessionError::InvalidConfiguration(format!("failed to parse: {}", e)))?;
        config.validate().map_err(SessionError::InvalidConfiguration)?;
        Ok(config)
    }
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self {
            default_position: Position::Back,
            fallback_zoom: FallbackZoomTable::default(),
            lens_switch_hysteresis: 0.1,
            max_pending_frames: 1,
            queue_label: "lens-capture.session".into(),
        }
    }
}
