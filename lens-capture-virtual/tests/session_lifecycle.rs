use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use parking_lot::Mutex;

use lens_capture_core::{
    Authorization, CaptureDevice, CaptureSessionManager, InterruptionReason, Position, RuntimeFault,
    SessionConfiguration, SessionDelegate, SessionError, SessionState,
};
use lens_capture_virtual::{VirtualCameraBackend, VirtualDiscovery, VirtualRig, VirtualRigConfig};

#[derive(Default)]
struct Events {
    states: Mutex<Vec<SessionState>>,
    devices: Mutex<Vec<String>>,
    errors: Mutex<Vec<SessionError>>,
    denied: Mutex<bool>,
}

impl SessionDelegate for Events {
    fn on_state_changed(&self, state: &SessionState) {
        self.states.lock().push(*state);
    }
    fn on_configuration_failed(&self, error: &SessionError) {
        self.errors.lock().push(error.clone());
    }
    fn on_permission_denied(&self) {
        *self.denied.lock() = true;
    }
    fn on_session_interrupted(&self, _resumable: bool) {}
    fn on_session_resumed(&self) {}
    fn on_runtime_error(&self, error: &SessionError) {
        self.errors.lock().push(error.clone());
    }
    fn on_active_device_changed(&self, device: &CaptureDevice) {
        self.devices.lock().push(device.id.clone());
    }
}

fn rig() -> VirtualRig {
    VirtualRig::handset(VirtualRigConfig {
        frame_width: 16,
        frame_height: 8,
        frame_interval: Duration::from_millis(2),
    })
    .unwrap()
}

fn session(rig: &VirtualRig) -> (CaptureSessionManager<VirtualCameraBackend>, Arc<Events>) {
    let manager = CaptureSessionManager::new(
        VirtualCameraBackend::new(rig),
        Arc::new(VirtualDiscovery::new(rig)),
        SessionConfiguration::default(),
    )
    .unwrap();
    let events = Arc::new(Events::default());
    manager.set_delegate(events.clone());
    (manager, events)
}

fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn catalog_drops_logical_triple_camera() {
    let rig = rig();
    let (manager, _) = session(&rig);

    let ids: Vec<_> = manager.catalog().list_devices().into_iter().map(|d| d.id).collect();
    assert_eq!(ids, ["back-ultra-wide", "back-telephoto", "back-wide", "front-wide"]);

    let zooms: Vec<_> = manager.catalog().lens_options().iter().map(|o| o.nominal_zoom).collect();
    assert_relative_eq!(zooms[0], 0.5);
    assert_relative_eq!(zooms[1], 0.9);
    assert_relative_eq!(zooms[2], 1.0);
    assert_relative_eq!(zooms[3], 3.0);
}

#[test]
fn two_x_request_lands_on_telephoto() {
    let rig = rig();
    let (manager, _) = session(&rig);

    let selected = manager.catalog().selector().select_for_zoom(2.0, Some(Position::Back)).unwrap();
    assert_eq!(selected.id, "back-telephoto");
    assert_relative_eq!(selected.nominal_zoom, 3.0);
}

#[test]
fn two_x_zoom_request_attaches_telephoto() {
    let rig = rig();
    let (manager, events) = session(&rig);
    manager.configure().wait().unwrap();
    manager.start().wait().unwrap();

    let applied = manager.request_zoom(2.0).wait().unwrap();

    assert_eq!(rig.attached_input().as_deref(), Some("back-telephoto"));
    assert_eq!(manager.current_device().unwrap().id, "back-telephoto");
    // 2.0 / 3.0 is below the telephoto range, so it clamps to 1.0.
    assert_relative_eq!(applied, 1.0);
    assert_eq!(*events.devices.lock(), vec!["back-wide", "back-telephoto"]);
}

#[test]
fn end_to_end_lifecycle() {
    let rig = rig();
    let (manager, events) = session(&rig);

    manager.configure().wait().unwrap();
    assert_eq!(rig.attached_input().as_deref(), Some("back-wide"));
    assert!(!rig.is_mirrored());

    manager.start().wait().unwrap();
    assert!(eventually(|| manager.diagnostics().frames_received > 5));

    manager
        .handle_interruption(InterruptionReason::VideoDeviceInUseByAnotherClient)
        .wait()
        .unwrap();
    assert_eq!(manager.state(), SessionState::Interrupted { resumable: true });
    manager.resume().wait().unwrap();

    let front = manager.toggle_position().wait().unwrap();
    assert_eq!(front.id, "front-wide");
    assert!(rig.is_mirrored());
    assert!(eventually(|| rig.frames_from("front-wide") > 0));

    manager.stop().wait().unwrap();
    assert!(!rig.is_running());

    assert_eq!(
        *events.states.lock(),
        vec![
            SessionState::ConfiguredStopped,
            SessionState::Running,
            SessionState::Interrupted { resumable: true },
            SessionState::Running,
            SessionState::ConfiguredStopped,
        ]
    );
    assert_eq!(*events.devices.lock(), vec!["back-wide", "front-wide"]);
}

#[test]
fn denied_camera_never_configures() {
    let rig = rig();
    rig.set_authorization(Authorization::NotDetermined);
    rig.set_grant_on_request(false);
    let (manager, events) = session(&rig);

    assert_eq!(manager.configure().wait(), Err(SessionError::PermissionDenied));
    assert_eq!(manager.state(), SessionState::PermissionDenied);
    assert!(*events.denied.lock());
    assert!(rig.attached_input().is_none());
    assert_eq!(manager.current_zoom_factor(), 1.0);
}

#[test]
fn failed_switch_keeps_previous_device_streaming() {
    let rig = rig();
    let (manager, _) = session(&rig);
    manager.configure().wait().unwrap();
    manager.start().wait().unwrap();

    rig.reject_input("back-telephoto");
    let tele = manager.catalog().device("back-telephoto").unwrap();
    let result = manager.switch_device(&tele).wait();
    assert!(matches!(result, Err(SessionError::SwitchFailed { .. })));

    assert_eq!(rig.attached_input().as_deref(), Some("back-wide"));
    assert_eq!(manager.current_device().unwrap().id, "back-wide");
    let before = rig.frames_from("back-wide");
    assert!(eventually(|| rig.frames_from("back-wide") > before));
    assert_eq!(manager.diagnostics().failed_switches, 1);
}

#[test]
fn queued_switches_finish_in_submission_order() {
    let rig = rig();
    let (manager, events) = session(&rig);
    manager.configure().wait().unwrap();
    manager.start().wait().unwrap();

    let catalog = manager.catalog().clone();
    let targets = ["back-telephoto", "front-wide", "back-ultra-wide", "back-wide", "back-telephoto"];
    let pending: Vec<_> = targets
        .iter()
        .map(|id| manager.switch_device(&catalog.device(id).unwrap()))
        .collect();
    for completion in pending {
        completion.wait().unwrap();
    }

    let devices = events.devices.lock().clone();
    assert_eq!(&devices[1..], targets);
    assert_eq!(rig.attached_input().as_deref(), Some("back-telephoto"));
}

#[test]
fn zoom_requests_clamp_and_move_lenses() {
    let rig = rig();
    let (manager, _) = session(&rig);
    manager.configure().wait().unwrap();

    assert_relative_eq!(manager.set_zoom_factor(50.0).wait().unwrap(), 6.0);
    assert_eq!(rig.zoom_of("back-wide"), Some(6.0));

    let applied = manager.request_zoom(9.0).wait().unwrap();
    assert_eq!(rig.attached_input().as_deref(), Some("back-telephoto"));
    assert_relative_eq!(applied, 3.0, epsilon = 1e-9);
    assert_eq!(rig.locked_devices(), 0);
}

#[test]
fn media_reset_restarts_capture() {
    let rig = rig();
    let (manager, events) = session(&rig);
    manager.configure().wait().unwrap();
    manager.start().wait().unwrap();

    rig.crash_capture();
    manager
        .handle_runtime_error(RuntimeFault::MediaServicesWereReset)
        .wait()
        .unwrap();

    assert!(rig.is_running());
    let produced = rig.frames_produced();
    assert!(eventually(|| rig.frames_produced() > produced));
    assert!(events.errors.lock().is_empty());
    assert_eq!(manager.state(), SessionState::Running);
}
