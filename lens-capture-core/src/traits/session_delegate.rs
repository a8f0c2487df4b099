use crate::models::device::CaptureDevice;
use crate::models::error::SessionError;
use crate::models::state::SessionState;

/// Event delegate for capture session notifications.
///
/// All methods are called from the session-configuration thread, not the UI
/// thread. Implementations should marshal to the UI thread if needed and
/// must not block on session completions.
pub trait SessionDelegate: Send + Sync {
    /// Called after every state transition.
    fn on_state_changed(&self, state: &SessionState);

    /// Adding the device input or frame output failed.
    fn on_configuration_failed(&self, error: &SessionError);

    /// Camera access was denied.
    fn on_permission_denied(&self);

    fn on_session_interrupted(&self, resumable: bool);

    fn on_session_resumed(&self);

    /// A runtime fault that was not recovered automatically.
    fn on_runtime_error(&self, error: &SessionError);

    /// A new device is feeding preview and classification.
    fn on_active_device_changed(&self, device: &CaptureDevice);
}
