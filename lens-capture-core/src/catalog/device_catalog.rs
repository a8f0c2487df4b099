use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::lens_selector::LensSelector;
use crate::models::config::FallbackZoomTable;
use crate::models::device::{CaptureDevice, DeviceType, LensOption, Position};
use crate::traits::device_discovery::DeviceDiscovery;

/// Deduplicated view of the capture devices, with nominal zoom per device.
///
/// Stateless apart from the discovery source: every call re-queries the
/// hardware, so results always reflect currently connected devices.
#[derive(Clone)]
pub struct DeviceCatalog {
    discovery: Arc<dyn DeviceDiscovery>,
    fallback: FallbackZoomTable,
}

impl DeviceCatalog {
    pub fn new(discovery: Arc<dyn DeviceDiscovery>, fallback: FallbackZoomTable) -> Self {
        Self { discovery, fallback }
    }

    /// Devices in enumeration order, one per (capability, position).
    ///
    /// Physical lenses claim their key first. A logical device is kept only
    /// when no physical lens at its position already covers its capability.
    pub fn list_devices(&self) -> Vec<CaptureDevice> {
        let discovered = self.discovery.devices();
        let reference = reference_field_of_view(&discovered);

        let mut winners = HashMap::new();
        for logical_pass in [false, true] {
            for (index, device) in discovered.iter().enumerate() {
                if device.device_type.is_logical() == logical_pass {
                    winners
                        .entry((device.device_type.capability(), device.position))
                        .or_insert(index);
                }
            }
        }

        discovered
            .into_iter()
            .enumerate()
            .filter(|(index, device)| {
                let key = (device.device_type.capability(), device.position);
                let kept = winners.get(&key) == Some(index);
                if !kept {
                    log::debug!("Catalog skipping {} ({:?}): key already covered", device.id, key);
                }
                kept
            })
            .map(|(_, mut device)| {
                device.nominal_zoom = self.nominal_zoom(&device, reference);
                device
            })
            .collect()
    }

    /// Lens options sorted ascending by nominal zoom. Equal zooms keep catalog order.
    pub fn lens_options(&self) -> Vec<LensOption> {
        let mut options = self.options_in_catalog_order();
        options.sort_by(|a, b| a.nominal_zoom.total_cmp(&b.nominal_zoom));
        options
    }

    /// Lens options in enumeration order.
    pub fn options_in_catalog_order(&self) -> Vec<LensOption> {
        self.list_devices()
            .into_iter()
            .map(|device| LensOption {
                nominal_zoom: device.nominal_zoom,
                device,
            })
            .collect()
    }

    /// A selector over a snapshot of the current catalog.
    pub fn selector(&self) -> LensSelector {
        LensSelector::new(self.options_in_catalog_order())
    }

    pub fn device(&self, id: &str) -> Option<CaptureDevice> {
        self.list_devices().into_iter().find(|d| d.id == id)
    }

    /// The device a fresh session opens on: the lens nearest 1x at
    /// `position`, or the first device anywhere if that position is empty.
    pub fn default_device(&self, position: Position) -> Option<CaptureDevice> {
        let selector = self.selector();
        selector
            .select_for_zoom(1.0, Some(position))
            .or_else(|| selector.first())
    }

    fn nominal_zoom(&self, device: &CaptureDevice, reference: Option<f64>) -> f64 {
        match (reference, device.field_of_view) {
            (Some(reference), Some(fov)) if fov > 0.0 => reference / fov,
            _ => self.fallback.nominal_zoom(device.device_type),
        }
    }
}

/// Field of view of the rear wide-angle lens, else of any wide-angle lens.
fn reference_field_of_view(devices: &[CaptureDevice]) -> Option<f64> {
    let wide_fov = |position: Option<Position>| {
        devices
            .iter()
            .filter(|d| d.device_type == DeviceType::WideAngle)
            .filter(|d| position.map_or(true, |p| d.position == p))
            .find_map(|d| d.field_of_view.filter(|fov| *fov > 0.0))
    };
    wide_fov(Some(Position::Back)).or_else(|| wide_fov(None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticDiscovery;
    use approx::assert_relative_eq;

    fn catalog(devices: Vec<CaptureDevice>) -> DeviceCatalog {
        DeviceCatalog::new(Arc::new(StaticDiscovery(devices)), FallbackZoomTable::default())
    }

    fn ids(devices: &[CaptureDevice]) -> Vec<&str> {
        devices.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn aggregate_is_dropped_when_physical_lens_covers_it() {
        let catalog = catalog(vec![
            CaptureDevice::new("back-wide", "Back Wide", Position::Back, DeviceType::WideAngle),
            CaptureDevice::new("back-dual", "Back Dual", Position::Back, DeviceType::Dual),
            CaptureDevice::new("back-ultra", "Back Ultra Wide", Position::Back, DeviceType::UltraWide),
        ]);

        assert_eq!(ids(&catalog.list_devices()), vec!["back-wide", "back-ultra"]);
    }

    #[test]
    fn physical_lens_wins_even_when_enumerated_after_aggregate() {
        let catalog = catalog(vec![
            CaptureDevice::new("back-triple", "Back Triple", Position::Back, DeviceType::Triple),
            CaptureDevice::new("back-wide", "Back Wide", Position::Back, DeviceType::WideAngle),
        ]);

        assert_eq!(ids(&catalog.list_devices()), vec!["back-wide"]);
    }

    #[test]
    fn aggregate_kept_when_no_physical_lens_covers_it() {
        let catalog = catalog(vec![
            CaptureDevice::new("back-dual", "Back Dual", Position::Back, DeviceType::Dual),
            CaptureDevice::new("back-tele", "Back Tele", Position::Back, DeviceType::Telephoto),
            CaptureDevice::new("front-wide", "Front", Position::Front, DeviceType::WideAngle),
        ]);

        assert_eq!(
            ids(&catalog.list_devices()),
            vec!["back-dual", "back-tele", "front-wide"]
        );
    }

    #[test]
    fn same_capability_at_different_positions_is_kept() {
        let catalog = catalog(vec![
            CaptureDevice::new("back-wide", "Back", Position::Back, DeviceType::WideAngle),
            CaptureDevice::new("front-wide", "Front", Position::Front, DeviceType::WideAngle),
        ]);

        assert_eq!(catalog.list_devices().len(), 2);
    }

    #[test]
    fn nominal_zoom_from_field_of_view_ratio() {
        let catalog = catalog(vec![
            CaptureDevice::new("wide", "Wide", Position::Back, DeviceType::WideAngle).with_field_of_view(60.0),
            CaptureDevice::new("ultra", "Ultra", Position::Back, DeviceType::UltraWide).with_field_of_view(120.0),
            CaptureDevice::new("tele", "Tele", Position::Back, DeviceType::Telephoto).with_field_of_view(20.0),
        ]);

        let devices = catalog.list_devices();
        assert_relative_eq!(devices[0].nominal_zoom, 1.0);
        assert_relative_eq!(devices[1].nominal_zoom, 0.5);
        assert_relative_eq!(devices[2].nominal_zoom, 3.0);
    }

    #[test]
    fn front_wide_is_reference_when_no_rear_wide() {
        let catalog = catalog(vec![
            CaptureDevice::new("front", "Front", Position::Front, DeviceType::WideAngle).with_field_of_view(70.0),
            CaptureDevice::new("tele", "Tele", Position::Back, DeviceType::Telephoto).with_field_of_view(35.0),
        ]);

        let devices = catalog.list_devices();
        assert_relative_eq!(devices[1].nominal_zoom, 2.0);
    }

    #[test]
    fn fallback_table_without_field_of_view() {
        let catalog = catalog(vec![
            CaptureDevice::new("ultra", "Ultra", Position::Back, DeviceType::UltraWide),
            CaptureDevice::new("tele", "Tele", Position::Back, DeviceType::Telephoto),
            CaptureDevice::new("dual", "Dual", Position::Front, DeviceType::Dual),
        ]);

        let devices = catalog.list_devices();
        assert_relative_eq!(devices[0].nominal_zoom, 0.5);
        assert_relative_eq!(devices[1].nominal_zoom, 3.0);
        assert_relative_eq!(devices[2].nominal_zoom, 1.0);
    }

    #[test]
    fn lens_options_sorted_by_nominal_zoom() {
        let catalog = catalog(vec![
            CaptureDevice::new("tele", "Tele", Position::Back, DeviceType::Telephoto),
            CaptureDevice::new("wide", "Wide", Position::Back, DeviceType::WideAngle),
            CaptureDevice::new("ultra", "Ultra", Position::Back, DeviceType::UltraWide),
            CaptureDevice::new("front", "Front", Position::Front, DeviceType::WideAngle),
        ]);

        let zooms: Vec<(String, f64)> = catalog
            .lens_options()
            .into_iter()
            .map(|o| (o.device.id, o.nominal_zoom))
            .collect();
        assert_eq!(
            zooms,
            vec![
                ("ultra".to_string(), 0.5),
                ("wide".to_string(), 1.0),
                ("front".to_string(), 1.0),
                ("tele".to_string(), 3.0),
            ]
        );
    }

    #[test]
    fn default_device_prefers_requested_position() {
        let catalog = catalog(vec![
            CaptureDevice::new("front", "Front", Position::Front, DeviceType::WideAngle),
            CaptureDevice::new("ultra", "Ultra", Position::Back, DeviceType::UltraWide),
            CaptureDevice::new("wide", "Wide", Position::Back, DeviceType::WideAngle),
        ]);

        assert_eq!(catalog.default_device(Position::Back).unwrap().id, "wide");
        assert_eq!(catalog.default_device(Position::Unspecified).unwrap().id, "front");
    }

    #[test]
    fn empty_discovery_yields_nothing() {
        let catalog = catalog(Vec::new());
        assert!(catalog.list_devices().is_empty());
        assert!(catalog.default_device(Position::Back).is_none());
    }
}
