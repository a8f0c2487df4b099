use crate::models::device::{CaptureDevice, LensOption, Position};

/// Maps zoom requests and position toggles onto physical devices.
///
/// Holds lens options in catalog enumeration order; that order breaks ties.
#[derive(Debug, Clone, Default)]
pub struct LensSelector {
    options: Vec<LensOption>,
}

impl LensSelector {
    pub fn new(options: Vec<LensOption>) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &[LensOption] {
        &self.options
    }

    pub fn first(&self) -> Option<CaptureDevice> {
        self.options.first().map(|o| o.device.clone())
    }

    /// The device whose nominal zoom is nearest `requested`.
    ///
    /// `position` restricts the search; `None` searches every position.
    /// Equal distances resolve to the option listed first.
    pub fn select_for_zoom(&self, requested: f64, position: Option<Position>) -> Option<CaptureDevice> {
        self.options
            .iter()
            .filter(|o| position.map_or(true, |p| o.device.position == p))
            .min_by(|a, b| {
                let da = (a.nominal_zoom - requested).abs();
                let db = (b.nominal_zoom - requested).abs();
                da.total_cmp(&db)
            })
            .map(|o| o.device.clone())
    }

    /// The first device on the other side of the handset.
    pub fn select_opposite(&self, from: Position) -> Option<CaptureDevice> {
        let target = from.opposite()?;
        self.options
            .iter()
            .find(|o| o.device.position == target)
            .map(|o| o.device.clone())
    }

    /// Distance from `requested` to a device's nominal zoom.
    pub fn distance(device: &CaptureDevice, requested: f64) -> f64 {
        (device.nominal_zoom - requested).abs()
    }
}
