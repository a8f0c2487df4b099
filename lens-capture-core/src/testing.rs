//! Scripted fakes shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};

use crate::models::device::{CaptureDevice, DeviceType, Position};
use crate::models::error::{HardwareError, SessionError};
use crate::models::frame::{Frame, FrameBuffer, Orientation};
use crate::models::session_models::{Authorization, FrameOutput};
use crate::models::state::SessionState;
use crate::traits::{CaptureBackend, DeviceDiscovery, FrameClassifier, FrameHandler, SessionDelegate};

pub(crate) struct StaticDiscovery(pub Vec<CaptureDevice>);

impl DeviceDiscovery for StaticDiscovery {
    fn devices(&self) -> Vec<CaptureDevice> {
        self.0.clone()
    }
}

/// Rear ultra-wide, telephoto and wide lenses plus a front camera, in that
/// enumeration order.
pub(crate) fn handset() -> Vec<CaptureDevice> {
    vec![
        CaptureDevice::new("back-ultra", "Back Ultra Wide", Position::Back, DeviceType::UltraWide)
            .with_field_of_view(120.0)
            .with_zoom_range(1.0, 2.0),
        CaptureDevice::new("back-tele", "Back Telephoto", Position::Back, DeviceType::Telephoto)
            .with_field_of_view(20.0)
            .with_zoom_range(1.0, 10.0),
        CaptureDevice::new("back-wide", "Back Wide", Position::Back, DeviceType::WideAngle)
            .with_field_of_view(60.0)
            .with_zoom_range(1.0, 6.0),
        CaptureDevice::new("back-triple", "Back Triple", Position::Back, DeviceType::Triple)
            .with_zoom_range(1.0, 15.0),
        CaptureDevice::new("front-wide", "Front", Position::Front, DeviceType::WideAngle)
            .with_field_of_view(70.0)
            .with_zoom_range(1.0, 4.0),
    ]
}

#[derive(Default)]
pub(crate) struct RigState {
    pub authorization: Option<Authorization>,
    pub grant_on_request: bool,
    pub access_requests: u32,
    pub reject_inputs: HashSet<String>,
    pub reject_output: bool,
    pub lock_unavailable: bool,
    pub start_fails: bool,
    pub input: Option<String>,
    pub mirrored: bool,
    pub running: bool,
    pub zoom: HashMap<String, f64>,
    pub locked: HashSet<String>,
    pub unlocks: u32,
    pub open_transactions: u32,
    pub commits: u32,
    pub handler: Option<FrameHandler>,
    pub log: Vec<String>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeRig(Arc<Mutex<RigState>>);

impl FakeRig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, RigState> {
        self.0.lock()
    }

    /// Push one frame from the currently attached input through the handler.
    pub fn emit(&self, millis: u64) -> bool {
        let (handler, input) = {
            let rig = self.lock();
            (rig.handler.clone(), rig.input.clone())
        };
        match (handler, input) {
            (Some(handler), Some(input)) => {
                handler(frame_from(&input, millis));
                true
            }
            _ => false,
        }
    }
}

pub(crate) struct FakeBackend {
    rig: FakeRig,
}

impl FakeBackend {
    pub fn new(rig: &FakeRig) -> Self {
        Self { rig: rig.clone() }
    }
}

impl CaptureBackend for FakeBackend {
    fn authorization_status(&self) -> Authorization {
        self.rig.lock().authorization.unwrap_or(Authorization::Authorized)
    }

    fn request_access(&mut self) -> bool {
        let mut rig = self.rig.lock();
        rig.access_requests += 1;
        let granted = rig.grant_on_request;
        rig.authorization = Some(if granted {
            Authorization::Authorized
        } else {
            Authorization::Denied
        });
        granted
    }

    fn begin_configuration(&mut self) {
        self.rig.lock().open_transactions += 1;
    }

    fn commit_configuration(&mut self) {
        let mut rig = self.rig.lock();
        rig.open_transactions -= 1;
        rig.commits += 1;
    }

    fn add_input(&mut self, device: &CaptureDevice) -> Result<(), HardwareError> {
        let mut rig = self.rig.lock();
        rig.log.push(format!("add {}", device.id));
        if rig.reject_inputs.contains(&device.id) {
            return Err(HardwareError::InputRejected(device.id.clone()));
        }
        rig.input = Some(device.id.clone());
        Ok(())
    }

    fn remove_input(&mut self, device: &CaptureDevice) {
        let mut rig = self.rig.lock();
        rig.log.push(format!("remove {}", device.id));
        if rig.input.as_deref() == Some(device.id.as_str()) {
            rig.input = None;
        }
    }

    fn add_frame_output(&mut self, handler: FrameHandler) -> Result<FrameOutput, HardwareError> {
        let mut rig = self.rig.lock();
        if rig.reject_output {
            return Err(HardwareError::OutputRejected("video data output".into()));
        }
        rig.handler = Some(handler);
        Ok(FrameOutput {
            id: "video-data".into(),
            discards_late_frames: true,
        })
    }

    fn set_mirrored(&mut self, mirrored: bool) {
        self.rig.lock().mirrored = mirrored;
    }

    fn start_running(&mut self) -> Result<(), HardwareError> {
        let mut rig = self.rig.lock();
        if rig.start_fails {
            return Err(HardwareError::StartFailed("scripted".into()));
        }
        rig.running = true;
        Ok(())
    }

    fn stop_running(&mut self) {
        self.rig.lock().running = false;
    }

    fn is_running(&self) -> bool {
        self.rig.lock().running
    }

    fn lock_for_configuration(&mut self, device: &CaptureDevice) -> Result<(), HardwareError> {
        let mut rig = self.rig.lock();
        if rig.lock_unavailable {
            return Err(HardwareError::LockUnavailable(device.id.clone()));
        }
        rig.locked.insert(device.id.clone());
        Ok(())
    }

    fn unlock_for_configuration(&mut self, device: &CaptureDevice) {
        let mut rig = self.rig.lock();
        rig.locked.remove(&device.id);
        rig.unlocks += 1;
    }

    fn zoom_factor(&self, device: &CaptureDevice) -> f64 {
        self.rig.lock().zoom.get(&device.id).copied().unwrap_or(1.0)
    }

    fn set_zoom_factor(&mut self, device: &CaptureDevice, factor: f64) {
        let mut rig = self.rig.lock();
        assert!(rig.locked.contains(&device.id), "zoom set without device lock");
        rig.zoom.insert(device.id.clone(), factor);
    }
}

pub(crate) fn frame_from(device_id: &str, millis: u64) -> Frame {
    Frame {
        buffer: FrameBuffer::new(vec![0u8; 16], 4, 4, 4),
        device_id: device_id.to_string(),
        presentation_time: Duration::from_millis(millis),
    }
}

/// Poll `condition` for up to two seconds.
pub(crate) fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClassifyCall {
    pub orientation: Orientation,
    pub timestamp_millis: u64,
    pub tag: String,
}

#[derive(Default)]
pub(crate) struct RecordingClassifier {
    tag: String,
    delay: Option<Duration>,
    calls: Mutex<Vec<ClassifyCall>>,
}

impl RecordingClassifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn tagged(tag: &str) -> Arc<Self> {
        Arc::new(Self {
            tag: tag.to_string(),
            ..Self::default()
        })
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<ClassifyCall> {
        self.calls.lock().clone()
    }
}

impl FrameClassifier for RecordingClassifier {
    fn classify(&self, _frame: &FrameBuffer, orientation: Orientation, timestamp_millis: u64) {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.calls.lock().push(ClassifyCall {
            orientation,
            timestamp_millis,
            tag: self.tag.clone(),
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DelegateEvent {
    State(SessionState),
    ConfigurationFailed,
    PermissionDenied,
    Interrupted(bool),
    Resumed,
    RuntimeError(SessionError),
    ActiveDevice(String),
}

#[derive(Default)]
pub(crate) struct RecordingDelegate {
    events: Mutex<Vec<DelegateEvent>>,
}

impl RecordingDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<DelegateEvent> {
        self.events.lock().clone()
    }

    pub fn states(&self) -> Vec<SessionState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DelegateEvent::State(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn active_devices(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DelegateEvent::ActiveDevice(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

impl SessionDelegate for RecordingDelegate {
    fn on_state_changed(&self, state: &SessionState) {
        self.events.lock().push(DelegateEvent::State(*state));
    }

    fn on_configuration_failed(&self, _error: &SessionError) {
        self.events.lock().push(DelegateEvent::ConfigurationFailed);
    }

    fn on_permission_denied(&self) {
        self.events.lock().push(DelegateEvent::PermissionDenied);
    }

    fn on_session_interrupted(&self, resumable: bool) {
        self.events.lock().push(DelegateEvent::Interrupted(resumable));
    }

    fn on_session_resumed(&self) {
        self.events.lock().push(DelegateEvent::Resumed);
    }

    fn on_runtime_error(&self, error: &SessionError) {
        self.events.lock().push(DelegateEvent::RuntimeError(error.clone()));
    }

    fn on_active_device_changed(&self, device: &CaptureDevice) {
        self.events.lock().push(DelegateEvent::ActiveDevice(device.id.clone()));
    }
}
