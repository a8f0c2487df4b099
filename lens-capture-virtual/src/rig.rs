//! Simulated camera hardware shared by the virtual discovery and backend.
//!
//! A `VirtualRig` is a cheap handle; clones observe and control the same
//! hardware. Tests and the demo use it to inject faults and to inspect what
//! the session did to the hardware.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use thiserror::Error;

use lens_capture_core::models::device::{CaptureDevice, DeviceType, Position};
use lens_capture_core::models::session_models::Authorization;
use lens_capture_core::traits::FrameHandler;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RigError {
    #[error("invalid rig configuration: {0}")]
    InvalidConfig(String),
}

/// Frame format and cadence of the simulated sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualRigConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Time between frames on the capture thread.
    pub frame_interval: Duration,
}

impl Default for VirtualRigConfig {
    fn default() -> Self {
        Self {
            frame_width: 64,
            frame_height: 48,
            frame_interval: Duration::from_millis(33),
        }
    }
}

impl VirtualRigConfig {
    pub fn validate(&self) -> Result<(), RigError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(RigError::InvalidConfig(format!(
                "frame size {}x{} is empty",
                self.frame_width, self.frame_height
            )));
        }
        if self.frame_interval.is_zero() {
            return Err(RigError::InvalidConfig("frame interval must be non-zero".into()));
        }
        Ok(())
    }

    /// Bytes per row of a BGRA frame.
    pub fn stride(&self) -> u32 {
        self.frame_width * 4
    }
}

/// Scripted hardware faults.
#[derive(Debug, Default, Clone)]
pub struct Faults {
    /// Device ids whose inputs cannot be attached.
    pub reject_inputs: HashSet<String>,
    pub reject_output: bool,
    pub lock_unavailable: bool,
    pub start_fails: bool,
}

pub(crate) struct RigState {
    pub(crate) config: VirtualRigConfig,
    pub(crate) devices: Vec<CaptureDevice>,
    pub(crate) disconnected: HashSet<String>,
    pub(crate) authorization: Authorization,
    pub(crate) grant_on_request: bool,
    pub(crate) faults: Faults,
    pub(crate) input: Option<String>,
    pub(crate) handler: Option<FrameHandler>,
    pub(crate) mirrored: bool,
    pub(crate) running: bool,
    pub(crate) in_transaction: bool,
    pub(crate) locked: HashSet<String>,
    pub(crate) zoom: HashMap<String, f64>,
    pub(crate) frames_produced: u64,
    pub(crate) frames_by_device: HashMap<String, u64>,
}

#[derive(Clone)]
pub struct VirtualRig {
    state: Arc<Mutex<RigState>>,
}

impl VirtualRig {
    pub fn new(devices: Vec<CaptureDevice>, config: VirtualRigConfig) -> Result<Self, RigError> {
        config.validate()?;
        let mut ids = HashSet::new();
        for device in &devices {
            if !ids.insert(device.id.as_str()) {
                return Err(RigError::InvalidConfig(format!("duplicate device id {}", device.id)));
            }
        }

        Ok(Self {
            state: Arc::new(Mutex::new(RigState {
                config,
                devices,
                disconnected: HashSet::new(),
                authorization: Authorization::Authorized,
                grant_on_request: true,
                faults: Faults::default(),
                input: None,
                handler: None,
                mirrored: false,
                running: false,
                in_transaction: false,
                locked: HashSet::new(),
                zoom: HashMap::new(),
                frames_produced: 0,
                frames_by_device: HashMap::new(),
            })),
        })
    }

    /// A rear triple camera with ultra-wide, telephoto and wide lenses, plus
    /// a front camera. The logical triple device is enumerated first and the
    /// telephoto lens before the wide one.
    pub fn handset(config: VirtualRigConfig) -> Result<Self, RigError> {
        Self::new(handset_devices(), config)
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, RigState> {
        self.state.lock()
    }

    // --- Control ---

    pub fn set_authorization(&self, authorization: Authorization) {
        self.state().authorization = authorization;
    }

    /// Answer given to the next access prompt.
    pub fn set_grant_on_request(&self, grant: bool) {
        self.state().grant_on_request = grant;
    }

    pub fn set_faults(&self, faults: Faults) {
        self.state().faults = faults;
    }

    pub fn reject_input(&self, device_id: &str) {
        self.state().faults.reject_inputs.insert(device_id.to_string());
    }

    pub fn clear_faults(&self) {
        self.state().faults = Faults::default();
    }

    /// Remove a device from discovery. Frames stop while it is the input.
    pub fn disconnect(&self, device_id: &str) {
        self.state().disconnected.insert(device_id.to_string());
    }

    pub fn reconnect(&self, device_id: &str) {
        self.state().disconnected.remove(device_id);
    }

    /// Stop the capture thread as a media-server crash would.
    pub fn crash_capture(&self) {
        let mut state = self.state();
        if state.running {
            log::warn!("Virtual rig: capture pipeline crashed");
        }
        state.running = false;
    }

    // --- Inspection ---

    pub fn attached_input(&self) -> Option<String> {
        self.state().input.clone()
    }

    pub fn is_mirrored(&self) -> bool {
        self.state().mirrored
    }

    pub fn is_running(&self) -> bool {
        self.state().running
    }

    pub fn zoom_of(&self, device_id: &str) -> Option<f64> {
        self.state().zoom.get(device_id).copied()
    }

    pub fn locked_devices(&self) -> usize {
        self.state().locked.len()
    }

    pub fn frames_produced(&self) -> u64 {
        self.state().frames_produced
    }

    pub fn frames_from(&self, device_id: &str) -> u64 {
        self.state().frames_by_device.get(device_id).copied().unwrap_or(0)
    }

    pub(crate) fn connected_devices(&self) -> Vec<CaptureDevice> {
        let state = self.state();
        state
            .devices
            .iter()
            .filter(|d| !state.disconnected.contains(&d.id))
            .cloned()
            .collect()
    }
}

// Order matters: telephoto (3.0x) is listed before wide (1.0x). A 2.0x
// request is equidistant from both and ties go to the first listed lens,
// so this order is what lands 2.0x on the telephoto lens.
fn handset_devices() -> Vec<CaptureDevice> {
    vec![
        CaptureDevice::new("back-triple", "Back Triple Camera", Position::Back, DeviceType::Triple)
            .with_zoom_range(1.0, 15.0),
        CaptureDevice::new("back-ultra-wide", "Back Ultra Wide Camera", Position::Back, DeviceType::UltraWide)
            .with_field_of_view(108.0)
            .with_zoom_range(1.0, 2.0),
        CaptureDevice::new("back-telephoto", "Back Telephoto Camera", Position::Back, DeviceType::Telephoto)
            .with_field_of_view(18.0)
            .with_zoom_range(1.0, 10.0),
        CaptureDevice::new("back-wide", "Back Camera", Position::Back, DeviceType::WideAngle)
            .with_field_of_view(54.0)
            .with_zoom_range(1.0, 6.0),
        CaptureDevice::new("front-wide", "Front Camera", Position::Front, DeviceType::WideAngle)
            .with_field_of_view(60.0)
            .with_zoom_range(1.0, 4.0),
    ]
}
