use crate::models::device::CaptureDevice;

/// Read-only enumeration of the capture devices on this machine.
///
/// Implementations perform hardware queries only and hold no mutable
/// state, so they may be called from any thread.
pub trait DeviceDiscovery: Send + Sync {
    /// All devices across every position, in platform enumeration order.
    fn devices(&self) -> Vec<CaptureDevice>;
}
