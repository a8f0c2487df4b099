use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::device::Position;

/// Raw pixel data of one captured frame. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pub data: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    /// Bytes per row, including any padding.
    pub stride: u32,
}

impl FrameBuffer {
    pub fn new(data: impl Into<Arc<[u8]>>, width: u32, height: u32, stride: u32) -> Self {
        Self {
            data: data.into(),
            width,
            height,
            stride,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A frame as delivered by the capture backend.
#[derive(Debug, Clone)]
pub struct Frame {
    pub buffer: FrameBuffer,
    /// Id of the device whose input produced this frame.
    pub device_id: String,
    /// Presentation time on the backend's monotonic capture clock.
    pub presentation_time: Duration,
}

impl Frame {
    pub fn timestamp_millis(&self) -> u64 {
        self.presentation_time.as_millis() as u64
    }
}

/// Physical orientation of the handset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl DeviceOrientation {
    pub(crate) fn to_raw(self) -> u8 {
        match self {
            Self::Portrait => 0,
            Self::PortraitUpsideDown => 1,
            Self::LandscapeLeft => 2,
            Self::LandscapeRight => 3,
        }
    }

    pub(crate) fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::PortraitUpsideDown,
            2 => Self::LandscapeLeft,
            3 => Self::LandscapeRight,
            _ => Self::Portrait,
        }
    }
}

/// Orientation of the image content within a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Up,
    Down,
    Left,
    Right,
    UpMirrored,
    DownMirrored,
    LeftMirrored,
    RightMirrored,
}

impl Orientation {
    /// Image orientation of sensor output for a handset orientation.
    ///
    /// Sensors are mounted landscape, so a portrait handset sees the back
    /// camera's image rotated right. Front-facing frames are mirrored.
    pub fn for_capture(device: DeviceOrientation, position: Position) -> Self {
        let front = position.is_front();
        match (device, front) {
            (DeviceOrientation::Portrait, false) => Self::Right,
            (DeviceOrientation::Portrait, true) => Self::LeftMirrored,
            (DeviceOrientation::LandscapeLeft, false) => Self::Up,
            (DeviceOrientation::LandscapeLeft, true) => Self::DownMirrored,
            (DeviceOrientation::PortraitUpsideDown, false) => Self::Left,
            (DeviceOrientation::PortraitUpsideDown, true) => Self::RightMirrored,
            (DeviceOrientation::LandscapeRight, false) => Self::Down,
            (DeviceOrientation::LandscapeRight, true) => Self::UpMirrored,
        }
    }

    pub fn is_mirrored(self) -> bool {
        matches!(
            self,
            Self::UpMirrored | Self::DownMirrored | Self::LeftMirrored | Self::RightMirrored
        )
    }
}
