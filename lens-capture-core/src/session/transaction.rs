use std::ops::{Deref, DerefMut};

use crate::models::device::CaptureDevice;
use crate::models::error::HardwareError;
use crate::traits::capture_backend::CaptureBackend;

/// Scoped configuration transaction. Commits on drop, on every exit path.
pub(crate) struct ConfigurationTransaction<'a, B: CaptureBackend> {
    backend: &'a mut B,
}

impl<'a, B: CaptureBackend> ConfigurationTransaction<'a, B> {
    pub(crate) fn begin(backend: &'a mut B) -> Self {
        backend.begin_configuration();
        Self { backend }
    }
}

impl<B: CaptureBackend> Deref for ConfigurationTransaction<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.backend
    }
}

impl<B: CaptureBackend> DerefMut for ConfigurationTransaction<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.backend
    }
}

impl<B: CaptureBackend> Drop for ConfigurationTransaction<'_, B> {
    fn drop(&mut self) {
        self.backend.commit_configuration();
    }
}

/// Exclusive hold on a device's hardware settings. Unlocks on drop.
pub(crate) struct DeviceConfigurationLock<'a, B: CaptureBackend> {
    backend: &'a mut B,
    device: &'a CaptureDevice,
}

impl<'a, B: CaptureBackend> DeviceConfigurationLock<'a, B> {
    pub(crate) fn acquire(backend: &'a mut B, device: &'a CaptureDevice) -> Result<Self, HardwareError> {
        backend.lock_for_configuration(device)?;
        Ok(Self { backend, device })
    }

    pub(crate) fn set_zoom_factor(&mut self, factor: f64) {
        self.backend.set_zoom_factor(self.device, factor);
    }

    pub(crate) fn zoom_factor(&self) -> f64 {
        self.backend.zoom_factor(self.device)
    }
}

impl<B: CaptureBackend> Drop for DeviceConfigurationLock<'_, B> {
    fn drop(&mut self) {
        self.backend.unlock_for_configuration(self.device);
    }
}
