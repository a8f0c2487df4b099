//! Scripted walk through a capture session on the virtual handset rig.
//!
//! Run with `RUST_LOG=debug` to see every transition.

use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lens_capture_core::{
    CaptureDevice, CaptureSessionManager, DeviceOrientation, FrameBuffer, FrameClassifier, InterruptionReason,
    Orientation, RuntimeFault, SessionConfiguration, SessionDelegate, SessionError, SessionState,
};
use lens_capture_virtual::{VirtualCameraBackend, VirtualDiscovery, VirtualRig, VirtualRigConfig};

struct LoggingDelegate;

impl SessionDelegate for LoggingDelegate {
    fn on_state_changed(&self, state: &SessionState) {
        log::info!("state: {}", state.name());
    }

    fn on_configuration_failed(&self, error: &SessionError) {
        log::error!("configuration failed: {}", error);
    }

    fn on_permission_denied(&self) {
        log::warn!("camera permission denied");
    }

    fn on_session_interrupted(&self, resumable: bool) {
        log::info!("interrupted (resumable: {})", resumable);
    }

    fn on_session_resumed(&self) {
        log::info!("resumed");
    }

    fn on_runtime_error(&self, error: &SessionError) {
        log::error!("runtime error: {}", error);
    }

    fn on_active_device_changed(&self, device: &CaptureDevice) {
        log::info!("active device: {}", device);
    }
}

#[derive(Default)]
struct CountingClassifier {
    frames: AtomicU64,
}

impl FrameClassifier for CountingClassifier {
    fn classify(&self, frame: &FrameBuffer, orientation: Orientation, timestamp_millis: u64) {
        let n = self.frames.fetch_add(1, Ordering::Relaxed) + 1;
        if n % 10 == 0 {
            log::debug!(
                "classified frame {} ({}x{}, {:?}) at {} ms",
                n,
                frame.width,
                frame.height,
                orientation,
                timestamp_millis
            );
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let rig = VirtualRig::handset(VirtualRigConfig::default())?;
    let manager = CaptureSessionManager::new(
        VirtualCameraBackend::new(&rig),
        Arc::new(VirtualDiscovery::new(&rig)),
        SessionConfiguration::default(),
    )?;
    manager.set_delegate(Arc::new(LoggingDelegate));

    println!("{}", serde_json::to_string_pretty(&manager.catalog().list_devices())?);

    let classifier = Arc::new(CountingClassifier::default());
    manager.configure().wait()?;
    manager.register_classifier(classifier.clone()).wait()?;
    manager.start().wait()?;
    thread::sleep(Duration::from_millis(300));

    for nominal in [0.5, 2.0, 5.0, 1.0] {
        let applied = manager.request_zoom(nominal).wait()?;
        if let Some(device) = manager.current_device() {
            println!("{:.1}x → {} at zoom {:.2}", nominal, device.id, applied);
        }
        thread::sleep(Duration::from_millis(150));
    }

    manager.set_device_orientation(DeviceOrientation::LandscapeLeft);
    let front = manager.toggle_position().wait()?;
    println!("toggled to {}", front.id);
    thread::sleep(Duration::from_millis(150));

    manager
        .handle_interruption(InterruptionReason::VideoDeviceInUseByAnotherClient)
        .wait()?;
    manager.handle_interruption_ended().wait()?;

    rig.crash_capture();
    manager.handle_runtime_error(RuntimeFault::MediaServicesWereReset).wait()?;
    thread::sleep(Duration::from_millis(150));

    manager.stop().wait()?;
    println!("classified {} frames", classifier.frames.load(Ordering::Relaxed));
    println!("{}", manager.diagnostics().to_json());
    Ok(())
}
