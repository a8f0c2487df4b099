use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::device::{CaptureDevice, Position};
use crate::traits::frame_classifier::FrameClassifier;

/// The device a classifier is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundDevice {
    pub id: String,
    pub position: Position,
}

impl From<&CaptureDevice> for BoundDevice {
    fn from(device: &CaptureDevice) -> Self {
        Self {
            id: device.id.clone(),
            position: device.position,
        }
    }
}

/// A classifier together with the device whose frames it accepts.
#[derive(Clone)]
pub struct ClassifierBinding {
    pub classifier: Arc<dyn FrameClassifier>,
    /// `None` until a device is active.
    pub device: Option<BoundDevice>,
}

impl ClassifierBinding {
    pub fn accepts(&self, device_id: &str) -> bool {
        self.device.as_ref().is_some_and(|d| d.id == device_id)
    }
}

/// Reader/writer guarded reference to the classification handle.
///
/// The dispatch thread reads on every frame; device switches write. A held
/// write guard excludes all deliveries, so a device change and the matching
/// handle change land as one transition.
#[derive(Default)]
pub struct ClassifierSlot {
    binding: RwLock<Option<ClassifierBinding>>,
    attached: AtomicBool,
}

impl ClassifierSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock-free hint for the capture thread. May lag a concurrent rebind;
    /// delivery re-checks under the read lock.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    pub fn bound_device(&self) -> Option<BoundDevice> {
        self.binding.read().as_ref().and_then(|b| b.device.clone())
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Option<ClassifierBinding>> {
        self.binding.read()
    }

    /// Hold off every delivery until the returned guard is dropped.
    pub(crate) fn rebind(&self) -> Rebind<'_> {
        Rebind {
            binding: self.binding.write(),
            attached: &self.attached,
        }
    }
}

/// Exclusive access to the slot during a device transition.
pub(crate) struct Rebind<'a> {
    binding: RwLockWriteGuard<'a, Option<ClassifierBinding>>,
    attached: &'a AtomicBool,
}

impl Rebind<'_> {
    pub(crate) fn current(&self) -> Option<&ClassifierBinding> {
        self.binding.as_ref()
    }

    pub(crate) fn install(&mut self, binding: Option<ClassifierBinding>) {
        self.attached.store(binding.is_some(), Ordering::Release);
        *self.binding = binding;
    }
}
