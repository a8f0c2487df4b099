use std::fmt;

use serde::{Deserialize, Serialize};

/// Physical mounting position of a capture device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Front,
    Back,
    Unspecified,
}

impl Position {
    /// The position on the other side of the handset, if there is one.
    pub fn opposite(self) -> Option<Position> {
        match self {
            Self::Front => Some(Self::Back),
            Self::Back => Some(Self::Front),
            Self::Unspecified => None,
        }
    }

    pub fn is_front(self) -> bool {
        matches!(self, Self::Front)
    }
}

/// The single-lens capability a device provides at its default zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Wide,
    UltraWide,
    Telephoto,
}

/// Hardware class of a capture device.
///
/// The first three are physical lenses. The rest are logical aggregates that
/// switch between several physical lenses behind one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    WideAngle,
    UltraWide,
    Telephoto,
    /// Wide + telephoto.
    Dual,
    /// Ultra-wide + wide.
    DualWide,
    /// Ultra-wide + wide + telephoto.
    Triple,
}

impl DeviceType {
    pub fn is_logical(self) -> bool {
        matches!(self, Self::Dual | Self::DualWide | Self::Triple)
    }

    /// Capability class used to deduplicate the catalog.
    ///
    /// Logical devices open on their wide lens, so they cover `Wide`.
    pub fn capability(self) -> Capability {
        match self {
            Self::UltraWide => Capability::UltraWide,
            Self::Telephoto => Capability::Telephoto,
            Self::WideAngle | Self::Dual | Self::DualWide | Self::Triple => Capability::Wide,
        }
    }
}

/// Supported zoom factor range of a device, `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
}

impl ZoomRange {
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Clamp `value` into the range. NaN clamps to `min`.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self { min: 1.0, max: 1.0 }
    }
}

/// A capture device as reported by discovery.
///
/// Identity fields never change. `nominal_zoom` is filled in by the
/// [`DeviceCatalog`](crate::catalog::DeviceCatalog) and is 1.0 until then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureDevice {
    pub id: String,
    pub name: String,
    pub position: Position,
    pub device_type: DeviceType,
    /// Horizontal field of view in degrees, when the hardware reports one.
    pub field_of_view: Option<f64>,
    pub zoom_range: ZoomRange,
    pub nominal_zoom: f64,
}

impl CaptureDevice {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        position: Position,
        device_type: DeviceType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            device_type,
            field_of_view: None,
            zoom_range: ZoomRange::default(),
            nominal_zoom: 1.0,
        }
    }

    pub fn with_field_of_view(mut self, degrees: f64) -> Self {
        self.field_of_view = Some(degrees);
        self
    }

    pub fn with_zoom_range(mut self, min: f64, max: f64) -> Self {
        self.zoom_range = ZoomRange::new(min, max);
        self
    }

    /// Same physical device, regardless of derived fields.
    pub fn same_device(&self, other: &CaptureDevice) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for CaptureDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:?} {:?}, {:.1}x)",
            self.name, self.position, self.device_type, self.nominal_zoom
        )
    }
}

/// A device paired with its nominal zoom. Recomputed on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct LensOption {
    pub device: CaptureDevice,
    pub nominal_zoom: f64,
}
