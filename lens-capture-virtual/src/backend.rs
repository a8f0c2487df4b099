//! Virtual capture backend.
//!
//! Drives a `VirtualRig` the way a platform session drives camera hardware.
//! Frames are synthesized on a dedicated capture thread at the rig's frame
//! interval and pushed to the installed `FrameHandler`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use lens_capture_core::models::device::CaptureDevice;
use lens_capture_core::models::error::HardwareError;
use lens_capture_core::models::frame::{Frame, FrameBuffer};
use lens_capture_core::models::session_models::{Authorization, FrameOutput};
use lens_capture_core::traits::{CaptureBackend, FrameHandler};

use crate::rig::{VirtualRig, VirtualRigConfig};

pub struct VirtualCameraBackend {
    rig: VirtualRig,
    stop: Arc<AtomicBool>,
    producer: Option<thread::JoinHandle<()>>,
}

impl VirtualCameraBackend {
    pub fn new(rig: &VirtualRig) -> Self {
        Self {
            rig: rig.clone(),
            stop: Arc::new(AtomicBool::new(false)),
            producer: None,
        }
    }

    fn join_producer(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.producer.take() {
            let _ = handle.join();
        }
    }
}

impl CaptureBackend for VirtualCameraBackend {
    fn authorization_status(&self) -> Authorization {
        self.rig.state().authorization
    }

    fn request_access(&mut self) -> bool {
        let mut state = self.rig.state();
        if state.authorization != Authorization::NotDetermined {
            return state.authorization == Authorization::Authorized;
        }
        state.authorization = if state.grant_on_request {
            Authorization::Authorized
        } else {
            Authorization::Denied
        };
        log::info!("Virtual rig: access prompt answered {:?}", state.authorization);
        state.authorization == Authorization::Authorized
    }

    fn begin_configuration(&mut self) {
        self.rig.state().in_transaction = true;
    }

    fn commit_configuration(&mut self) {
        self.rig.state().in_transaction = false;
    }

    fn add_input(&mut self, device: &CaptureDevice) -> Result<(), HardwareError> {
        let mut state = self.rig.state();
        if !state.devices.iter().any(|d| d.id == device.id) || state.disconnected.contains(&device.id) {
            return Err(HardwareError::Unavailable);
        }
        if state.faults.reject_inputs.contains(&device.id) {
            return Err(HardwareError::InputRejected(device.id.clone()));
        }
        if let Some(current) = &state.input {
            return Err(HardwareError::InputRejected(format!(
                "{} while {} is attached",
                device.id, current
            )));
        }
        state.input = Some(device.id.clone());
        log::debug!("Virtual rig: input {} attached", device.id);
        Ok(())
    }

    fn remove_input(&mut self, device: &CaptureDevice) {
        let mut state = self.rig.state();
        if state.input.as_deref() == Some(device.id.as_str()) {
            state.input = None;
        }
    }

    fn add_frame_output(&mut self, handler: FrameHandler) -> Result<FrameOutput, HardwareError> {
        let mut state = self.rig.state();
        if state.faults.reject_output {
            return Err(HardwareError::OutputRejected("virtual video data output".into()));
        }
        state.handler = Some(handler);
        Ok(FrameOutput {
            id: "virtual-video-data".into(),
            discards_late_frames: true,
        })
    }

    fn set_mirrored(&mut self, mirrored: bool) {
        self.rig.state().mirrored = mirrored;
    }

    fn start_running(&mut self) -> Result<(), HardwareError> {
        {
            let mut state = self.rig.state();
            if state.faults.start_fails {
                return Err(HardwareError::StartFailed("virtual rig refused to start".into()));
            }
            if state.running && self.producer.is_some() {
                return Ok(());
            }
            state.running = true;
        }

        // A crashed producer has already exited; reap it before restarting.
        if let Some(handle) = self.producer.take() {
            let _ = handle.join();
        }

        self.stop = Arc::new(AtomicBool::new(false));
        let rig = self.rig.clone();
        let stop = Arc::clone(&self.stop);
        let handle = thread::Builder::new()
            .name("virtual-camera-capture".into())
            .spawn(move || produce_frames(rig, stop))
            .map_err(|e| {
                self.rig.state().running = false;
                HardwareError::StartFailed(format!("failed to spawn capture thread: {}", e))
            })?;
        self.producer = Some(handle);
        Ok(())
    }

    fn stop_running(&mut self) {
        self.rig.state().running = false;
        self.join_producer();
    }

    fn is_running(&self) -> bool {
        self.rig.state().running
    }

    fn lock_for_configuration(&mut self, device: &CaptureDevice) -> Result<(), HardwareError> {
        let mut state = self.rig.state();
        if state.faults.lock_unavailable {
            return Err(HardwareError::LockUnavailable(device.id.clone()));
        }
        state.locked.insert(device.id.clone());
        Ok(())
    }

    fn unlock_for_configuration(&mut self, device: &CaptureDevice) {
        self.rig.state().locked.remove(&device.id);
    }

    fn zoom_factor(&self, device: &CaptureDevice) -> f64 {
        self.rig.state().zoom.get(&device.id).copied().unwrap_or(1.0)
    }

    fn set_zoom_factor(&mut self, device: &CaptureDevice, factor: f64) {
        let mut state = self.rig.state();
        if !state.locked.contains(&device.id) {
            log::warn!("Virtual rig: zoom on {} ignored, device not locked", device.id);
            return;
        }
        state.zoom.insert(device.id.clone(), factor);
    }
}

impl Drop for VirtualCameraBackend {
    fn drop(&mut self) {
        self.join_producer();
    }
}

/// Capture loop running on a dedicated thread.
///
/// Emits one frame per interval from the attached input. No frames while a
/// configuration transaction is open or the input is disconnected.
fn produce_frames(rig: VirtualRig, stop: Arc<AtomicBool>) {
    let started = Instant::now();
    log::debug!("Virtual capture thread started");

    loop {
        let (interval, pending) = {
            let mut state = rig.state();
            if !state.running || stop.load(Ordering::SeqCst) {
                break;
            }

            let handler = state.handler.clone();
            let input = state
                .input
                .clone()
                .filter(|id| !state.in_transaction && !state.disconnected.contains(id));
            let pending = match (handler, input) {
                (Some(handler), Some(device_id)) => {
                    state.frames_produced += 1;
                    *state.frames_by_device.entry(device_id.clone()).or_default() += 1;
                    let buffer = synthesize(&state.config, state.frames_produced);
                    Some((handler, device_id, buffer))
                }
                _ => None,
            };
            (state.config.frame_interval, pending)
        };

        if let Some((handler, device_id, buffer)) = pending {
            handler(Frame {
                buffer,
                device_id,
                presentation_time: started.elapsed(),
            });
        }
        thread::sleep(interval);
    }

    log::debug!("Virtual capture thread exiting");
}

/// A flat BGRA frame whose gray level steps with the sequence number.
fn synthesize(config: &VirtualRigConfig, sequence: u64) -> FrameBuffer {
    let level = (sequence % 256) as u8;
    let stride = config.stride();
    let mut data = vec![level; (stride * config.frame_height) as usize];
    for alpha in data.iter_mut().skip(3).step_by(4) {
        *alpha = u8::MAX;
    }
    FrameBuffer::new(data, config.frame_width, config.frame_height, stride)
}
