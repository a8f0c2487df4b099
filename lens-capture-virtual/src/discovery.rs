use lens_capture_core::models::device::CaptureDevice;
use lens_capture_core::traits::DeviceDiscovery;

use crate::rig::VirtualRig;

/// Enumerates the rig's connected devices in their configured order.
#[derive(Clone)]
pub struct VirtualDiscovery {
    rig: VirtualRig,
}

impl VirtualDiscovery {
    pub fn new(rig: &VirtualRig) -> Self {
        Self { rig: rig.clone() }
    }
}

impl DeviceDiscovery for VirtualDiscovery {
    fn devices(&self) -> Vec<CaptureDevice> {
        self.rig.connected_devices()
    }
}
