use chrono::{DateTime, Utc};
use serde::Serialize;

use super::device::CaptureDevice;

/// Camera access as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Authorization {
    Authorized,
    NotDetermined,
    Denied,
    Restricted,
}

/// The frame output attached to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameOutput {
    pub id: String,
    /// Whether the output drops frames that arrive while the previous one is still in use.
    pub discards_late_frames: bool,
}

/// The device, output and mirroring currently feeding preview and
/// classification. Replaced as a whole on every device switch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveConfiguration {
    pub device: CaptureDevice,
    pub output: FrameOutput,
    pub mirrored: bool,
    pub activated_at: DateTime<Utc>,
}

impl ActiveConfiguration {
    pub fn new(device: CaptureDevice, output: FrameOutput) -> Self {
        let mirrored = device.position.is_front();
        Self {
            device,
            output,
            mirrored,
            activated_at: Utc::now(),
        }
    }
}

/// Counters for debugging capture sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionDiagnostics {
    pub frames_received: u64,
    pub frames_delivered: u64,
    pub frames_dropped_no_consumer: u64,
    pub frames_dropped_backpressure: u64,
    pub frames_dropped_stale: u64,
    pub device_switches: u64,
    pub failed_switches: u64,
    pub media_service_restarts: u64,
    pub last_switch_at: Option<String>,
}

impl SessionDiagnostics {
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped_no_consumer + self.frames_dropped_backpressure + self.frames_dropped_stale
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
