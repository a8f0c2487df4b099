use std::sync::Arc;

use crate::models::device::CaptureDevice;
use crate::models::error::HardwareError;
use crate::models::frame::Frame;
use crate::models::session_models::{Authorization, FrameOutput};

/// Callback invoked for every captured frame.
///
/// Fires on the backend's capture thread. Keep processing minimal.
pub type FrameHandler = Arc<dyn Fn(Frame) + Send + Sync + 'static>;

/// Interface for a platform capture session.
///
/// A backend is owned exclusively by the session-configuration worker, so
/// every method takes `&mut self` and runs strictly in request order.
/// Implemented by:
/// - `VirtualCameraBackend` (lens-capture-virtual)
pub trait CaptureBackend: Send + 'static {
    /// Current camera access status.
    fn authorization_status(&self) -> Authorization;

    /// Prompt for camera access and block until the user answers.
    ///
    /// Returns whether access was granted.
    fn request_access(&mut self) -> bool;

    /// Open a configuration transaction. Changes apply together on commit.
    fn begin_configuration(&mut self);

    fn commit_configuration(&mut self);

    /// Attach an input for `device`. Only one input is attached at a time.
    fn add_input(&mut self, device: &CaptureDevice) -> Result<(), HardwareError>;

    fn remove_input(&mut self, device: &CaptureDevice);

    /// Attach the frame output, delivering frames to `handler`.
    fn add_frame_output(&mut self, handler: FrameHandler) -> Result<FrameOutput, HardwareError>;

    /// Mirror the output connection (front-facing preview and frames).
    fn set_mirrored(&mut self, mirrored: bool);

    fn start_running(&mut self) -> Result<(), HardwareError>;

    fn stop_running(&mut self);

    fn is_running(&self) -> bool;

    /// Take exclusive access to a device's hardware settings.
    fn lock_for_configuration(&mut self, device: &CaptureDevice) -> Result<(), HardwareError>;

    fn unlock_for_configuration(&mut self, device: &CaptureDevice);

    fn zoom_factor(&self, device: &CaptureDevice) -> f64;

    /// Apply a zoom factor. Only called while the device is locked and with
    /// a value inside the device's zoom range.
    fn set_zoom_factor(&mut self, device: &CaptureDevice, factor: f64);
}
