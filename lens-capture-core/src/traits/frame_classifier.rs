use std::sync::Arc;

use crate::models::device::CaptureDevice;
use crate::models::frame::{FrameBuffer, Orientation};

/// Downstream consumer of captured frames.
///
/// Called from the frame-dispatch thread, never from the capture thread.
/// Classification is fire-and-forget here: results are delivered through
/// the classifier's own channels.
pub trait FrameClassifier: Send + Sync {
    fn classify(&self, frame: &FrameBuffer, orientation: Orientation, timestamp_millis: u64);
}

/// Builds the classifier bound to a newly active device.
///
/// Invoked while frame delivery is held off, so no frame from the new device
/// reaches a classifier built for the old one. Returning `None` detaches
/// classification until a classifier is registered again.
pub trait ClassifierProvisioner: Send + Sync {
    fn provision(&self, device: &CaptureDevice) -> Option<Arc<dyn FrameClassifier>>;
}
