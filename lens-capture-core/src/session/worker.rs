use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::catalog::{DeviceCatalog, LensSelector};
use crate::dispatch::classifier_slot::{BoundDevice, ClassifierBinding, ClassifierSlot, Rebind};
use crate::dispatch::frame_dispatcher::FrameDispatcher;
use crate::models::config::SessionConfiguration;
use crate::models::device::CaptureDevice;
use crate::models::error::{HardwareError, RuntimeFault, SessionError};
use crate::models::session_models::{ActiveConfiguration, Authorization, SessionDiagnostics};
use crate::models::state::{InterruptionReason, SessionState};
use crate::session::transaction::{ConfigurationTransaction, DeviceConfigurationLock};
use crate::traits::{CaptureBackend, ClassifierProvisioner, FrameClassifier, SessionDelegate};

/// State readable from any thread. Written only by the session worker.
struct Snapshot {
    state: SessionState,
    active: Option<Arc<ActiveConfiguration>>,
    zoom_factor: f64,
}

#[derive(Default)]
struct SwitchCounters {
    device_switches: u64,
    failed_switches: u64,
    media_service_restarts: u64,
    last_switch_at: Option<String>,
}

/// Session state shared between the manager facade and its worker.
pub(crate) struct SharedSession {
    pub(crate) session_id: Uuid,
    snapshot: RwLock<Snapshot>,
    counters: Mutex<SwitchCounters>,
    delegate: RwLock<Option<Arc<dyn SessionDelegate>>>,
    provisioner: RwLock<Option<Arc<dyn ClassifierProvisioner>>>,
}

impl SharedSession {
    pub(crate) fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            snapshot: RwLock::new(Snapshot {
                state: SessionState::Unconfigured,
                active: None,
                zoom_factor: 1.0,
            }),
            counters: Mutex::new(SwitchCounters::default()),
            delegate: RwLock::new(None),
            provisioner: RwLock::new(None),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.snapshot.read().state
    }

    pub(crate) fn active(&self) -> Option<Arc<ActiveConfiguration>> {
        self.snapshot.read().active.clone()
    }

    pub(crate) fn zoom_factor(&self) -> f64 {
        let snapshot = self.snapshot.read();
        if snapshot.active.is_some() {
            snapshot.zoom_factor
        } else {
            1.0
        }
    }

    pub(crate) fn set_delegate(&self, delegate: Arc<dyn SessionDelegate>) {
        *self.delegate.write() = Some(delegate);
    }

    pub(crate) fn set_provisioner(&self, provisioner: Arc<dyn ClassifierProvisioner>) {
        *self.provisioner.write() = Some(provisioner);
    }

    pub(crate) fn fill_diagnostics(&self, diagnostics: &mut SessionDiagnostics) {
        let counters = self.counters.lock();
        diagnostics.device_switches = counters.device_switches;
        diagnostics.failed_switches = counters.failed_switches;
        diagnostics.media_service_restarts = counters.media_service_restarts;
        diagnostics.last_switch_at = counters.last_switch_at.clone();
    }

    fn delegate(&self) -> Option<Arc<dyn SessionDelegate>> {
        self.delegate.read().clone()
    }
}

/// The worker-owned half of a capture session.
///
/// Lives on the session queue; every method runs there, one at a time.
pub(crate) struct SessionCore<B: CaptureBackend> {
    backend: B,
    catalog: DeviceCatalog,
    config: SessionConfiguration,
    shared: Arc<SharedSession>,
    slot: Arc<ClassifierSlot>,
    dispatcher: Arc<FrameDispatcher>,
}

impl<B: CaptureBackend> SessionCore<B> {
    pub(crate) fn new(
        backend: B,
        catalog: DeviceCatalog,
        config: SessionConfiguration,
        shared: Arc<SharedSession>,
        slot: Arc<ClassifierSlot>,
        dispatcher: Arc<FrameDispatcher>,
    ) -> Self {
        Self {
            backend,
            catalog,
            config,
            shared,
            slot,
            dispatcher,
        }
    }

    // --- Lifecycle ---

    /// Check access, attach the default device and frame output.
    /// Transitions: unconfigured → configured_stopped / permission_denied / configuration_failed.
    pub(crate) fn configure(&mut self) -> Result<(), SessionError> {
        match self.shared.state() {
            SessionState::Unconfigured => {}
            SessionState::PermissionDenied => return Err(SessionError::PermissionDenied),
            state => {
                return Err(SessionError::InvalidState(format!(
                    "cannot configure from {}",
                    state.name()
                )))
            }
        }

        let granted = match self.backend.authorization_status() {
            Authorization::Authorized => true,
            Authorization::NotDetermined => {
                log::info!("[{}] Requesting camera access", self.shared.session_id);
                self.backend.request_access()
            }
            Authorization::Denied | Authorization::Restricted => false,
        };
        if !granted {
            log::warn!("[{}] Camera access denied", self.shared.session_id);
            self.set_state(SessionState::PermissionDenied);
            if let Some(delegate) = self.shared.delegate() {
                delegate.on_permission_denied();
            }
            return Err(SessionError::PermissionDenied);
        }

        let Some(device) = self.catalog.default_device(self.config.default_position) else {
            return self.fail_configuration("no capture device available".into());
        };

        let handler = self.dispatcher.handler();
        let attached = {
            let mut tx = ConfigurationTransaction::begin(&mut self.backend);
            match tx.add_input(&device) {
                Err(e) => Err(format!("could not add input for {}: {}", device.id, e)),
                Ok(()) => match tx.add_frame_output(handler) {
                    Err(e) => {
                        tx.remove_input(&device);
                        Err(format!("could not add frame output: {}", e))
                    }
                    Ok(output) => {
                        tx.set_mirrored(device.position.is_front());
                        Ok(output)
                    }
                },
            }
        };
        let output = match attached {
            Ok(output) => output,
            Err(reason) => return self.fail_configuration(reason),
        };

        log::info!(
            "[{}] Session configured on {} (output {})",
            self.shared.session_id,
            device,
            output.id
        );
        let zoom = self.backend.zoom_factor(&device);
        let configuration = Arc::new(ActiveConfiguration::new(device.clone(), output));
        {
            let mut rebind = self.slot.rebind();
            self.publish(
                Some(SessionState::ConfiguredStopped),
                Some(configuration),
                zoom,
            );
            self.provision(&mut rebind, &device);
        }
        self.notify_state(SessionState::ConfiguredStopped);
        self.notify_active_device(&device);
        Ok(())
    }

    /// Transitions: configured_stopped → running.
    pub(crate) fn start(&mut self) -> Result<(), SessionError> {
        match self.ensure_configured()? {
            SessionState::Running => Ok(()),
            SessionState::Interrupted { .. } => Err(SessionError::InvalidState(
                "session is interrupted; resume it instead".into(),
            )),
            _ => {
                self.backend.start_running().map_err(runtime_error)?;
                log::info!("[{}] Session running", self.shared.session_id);
                self.set_state(SessionState::Running);
                Ok(())
            }
        }
    }

    /// Transitions: running / interrupted → configured_stopped.
    pub(crate) fn stop(&mut self) -> Result<(), SessionError> {
        match self.ensure_configured()? {
            SessionState::Running | SessionState::Interrupted { .. } => {
                self.backend.stop_running();
                log::info!("[{}] Session stopped", self.shared.session_id);
                self.set_state(SessionState::ConfiguredStopped);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Transitions: interrupted → running.
    pub(crate) fn resume(&mut self) -> Result<(), SessionError> {
        match self.ensure_configured()? {
            SessionState::Running => Ok(()),
            SessionState::Interrupted { .. } => self.restart_after_interruption(),
            state => Err(SessionError::InvalidState(format!(
                "cannot resume from {}",
                state.name()
            ))),
        }
    }

    pub(crate) fn handle_interruption(&mut self, reason: InterruptionReason) -> Result<(), SessionError> {
        let state = self.ensure_configured()?;
        if let SessionState::Interrupted { resumable: current } = state {
            // A later cause can only make the interruption less recoverable.
            let resumable = current && reason.is_resumable();
            if resumable != current {
                log::info!(
                    "[{}] Interruption now {:?} (resumable: false)",
                    self.shared.session_id,
                    reason
                );
                self.set_state(SessionState::Interrupted { resumable });
                if let Some(delegate) = self.shared.delegate() {
                    delegate.on_session_interrupted(resumable);
                }
            }
            return Ok(());
        }
        if !state.is_running() {
            log::warn!(
                "[{}] Ignoring interruption {:?} while {}",
                self.shared.session_id,
                reason,
                state.name()
            );
            return Ok(());
        }

        let resumable = reason.is_resumable();
        log::info!(
            "[{}] Session interrupted: {:?} (resumable: {})",
            self.shared.session_id,
            reason,
            resumable
        );
        self.set_state(SessionState::Interrupted { resumable });
        if let Some(delegate) = self.shared.delegate() {
            delegate.on_session_interrupted(resumable);
        }
        Ok(())
    }

    /// The platform released the camera. A session that was interrupted
    /// while running goes back to running.
    pub(crate) fn handle_interruption_ended(&mut self) -> Result<(), SessionError> {
        if !self.ensure_configured()?.is_interrupted() {
            return Ok(());
        }
        log::info!("[{}] Interruption ended", self.shared.session_id);
        let result = self.restart_after_interruption();
        if let Err(error) = &result {
            log::error!("[{}] Restart after interruption failed: {}", self.shared.session_id, error);
            if let Some(delegate) = self.shared.delegate() {
                delegate.on_runtime_error(error);
            }
        }
        result
    }

    /// Report a runtime fault. A media-services reset while running is
    /// recovered by restarting in place; everything else goes to the delegate.
    pub(crate) fn handle_runtime_error(&mut self, fault: RuntimeFault) -> Result<(), SessionError> {
        let error = SessionError::Runtime(fault.clone());
        log::error!("[{}] Capture session runtime error: {}", self.shared.session_id, fault);

        let state = self.shared.state();
        if fault == RuntimeFault::MediaServicesWereReset && state.is_running() {
            self.shared.counters.lock().media_service_restarts += 1;
            match self.backend.start_running() {
                Ok(()) => {
                    log::info!("[{}] Restarted after media services reset", self.shared.session_id);
                    return Ok(());
                }
                Err(e) => log::error!("[{}] Restart after reset failed: {}", self.shared.session_id, e),
            }
        }

        if state.is_running() && !self.backend.is_running() {
            self.set_state(SessionState::ConfiguredStopped);
        }
        if let Some(delegate) = self.shared.delegate() {
            delegate.on_runtime_error(&error);
        }
        Err(error)
    }

    // --- Device selection ---

    pub(crate) fn switch_device(&mut self, target: &CaptureDevice) -> Result<(), SessionError> {
        self.ensure_configured()?;
        let Some(device) = self.catalog.device(&target.id) else {
            log::warn!("[{}] Switch target {} is not in the catalog", self.shared.session_id, target.id);
            return Err(SessionError::DeviceNotAvailable);
        };
        self.switch_to(device)
    }

    pub(crate) fn toggle_position(&mut self) -> Result<CaptureDevice, SessionError> {
        self.ensure_configured()?;
        let active = self.active_configuration()?;
        let target = self
            .catalog
            .selector()
            .select_opposite(active.device.position)
            .ok_or(SessionError::DeviceNotAvailable)?;
        self.switch_to(target.clone())?;
        Ok(target)
    }

    /// Replace the active input, rolling back to the previous device on failure.
    fn switch_to(&mut self, target: CaptureDevice) -> Result<(), SessionError> {
        let active = self.active_configuration()?;
        let previous = &active.device;
        if previous.same_device(&target) {
            return Ok(());
        }

        // Deliveries stay held off until the new handle is installed.
        let mut rebind = self.slot.rebind();
        let outcome = {
            let mut tx = ConfigurationTransaction::begin(&mut self.backend);
            tx.remove_input(previous);
            match tx.add_input(&target) {
                Ok(()) => {
                    tx.set_mirrored(target.position.is_front());
                    SwitchOutcome::Switched
                }
                Err(e) => match tx.add_input(previous) {
                    Ok(()) => SwitchOutcome::RolledBack(e),
                    Err(rollback) => SwitchOutcome::InputLost { cause: e, rollback },
                },
            }
        };

        match outcome {
            SwitchOutcome::Switched => {}
            SwitchOutcome::RolledBack(e) => {
                drop(rebind);
                self.shared.counters.lock().failed_switches += 1;
                log::warn!(
                    "[{}] Switch from {} to {} failed: {}",
                    self.shared.session_id,
                    previous.id,
                    target.id,
                    e
                );
                return Err(SessionError::SwitchFailed {
                    target: target.id.clone(),
                    reason: e.to_string(),
                });
            }
            SwitchOutcome::InputLost { cause, rollback } => {
                self.shared.counters.lock().failed_switches += 1;
                log::error!(
                    "[{}] Switch to {} failed ({}) and rollback to {} failed ({}); session has no input",
                    self.shared.session_id,
                    target.id,
                    cause,
                    previous.id,
                    rollback
                );
                if self.backend.is_running() {
                    self.backend.stop_running();
                }
                self.publish(Some(SessionState::ConfigurationFailed), None, 1.0);
                rebind.install(None);
                drop(rebind);

                let error = SessionError::SwitchFailed {
                    target: target.id.clone(),
                    reason: format!("{}; rollback to {} failed: {}", cause, previous.id, rollback),
                };
                self.notify_state(SessionState::ConfigurationFailed);
                if let Some(delegate) = self.shared.delegate() {
                    delegate.on_runtime_error(&error);
                }
                return Err(error);
            }
        }

        let zoom = self.backend.zoom_factor(&target);
        let configuration = Arc::new(ActiveConfiguration::new(target.clone(), active.output.clone()));
        {
            let mut counters = self.shared.counters.lock();
            counters.device_switches += 1;
            counters.last_switch_at = Some(configuration.activated_at.to_rfc3339());
        }
        self.publish(None, Some(configuration), zoom);
        self.provision(&mut rebind, &target);
        drop(rebind);

        log::info!(
            "[{}] Switched {} → {}",
            self.shared.session_id,
            previous.id,
            target
        );
        self.notify_active_device(&target);
        Ok(())
    }

    // --- Zoom ---

    /// Apply `value` clamped into the active device's zoom range.
    pub(crate) fn set_zoom_factor(&mut self, value: f64) -> Result<f64, SessionError> {
        let active = self.active_configuration()?;
        let device = &active.device;
        let clamped = device.zoom_range.clamp(value);

        let applied = {
            let mut lock = DeviceConfigurationLock::acquire(&mut self.backend, device)
                .map_err(|e| SessionError::ConfigurationLockFailed(e.to_string()))?;
            lock.set_zoom_factor(clamped);
            lock.zoom_factor()
        };

        if clamped != value {
            log::debug!(
                "[{}] Zoom {} clamped to {} on {}",
                self.shared.session_id,
                value,
                clamped,
                device.id
            );
        }
        self.snapshot_zoom(applied);
        Ok(applied)
    }

    /// Move to the lens nearest `nominal` at the active position, then apply
    /// the zoom factor that realizes `nominal` on it.
    pub(crate) fn request_zoom(&mut self, nominal: f64) -> Result<f64, SessionError> {
        self.ensure_configured()?;
        let active = self.active_configuration()?;
        let target = self
            .catalog
            .selector()
            .select_for_zoom(nominal, Some(active.device.position))
            .ok_or(SessionError::DeviceNotAvailable)?;
        self.switch_to(target.clone())?;
        self.set_zoom_factor(nominal / target.nominal_zoom)
    }

    /// Live pinch update: `scale` multiplies the current zoom factor.
    pub(crate) fn pinch_changed(&mut self, scale: f64) -> Result<f64, SessionError> {
        let current = self.shared.zoom_factor();
        if scale.is_nan() || scale <= 0.0 {
            return Ok(current);
        }
        self.set_zoom_factor(current * scale)
    }

    /// Pinch finished: adopt a better-suited lens if one clears the
    /// hysteresis, switching first and then applying the zoom.
    pub(crate) fn pinch_ended(&mut self) -> Result<f64, SessionError> {
        let active = self.active_configuration()?;
        let current = self.shared.zoom_factor();
        let effective = active.device.nominal_zoom * current;

        let Some(candidate) = self
            .catalog
            .selector()
            .select_for_zoom(effective, Some(active.device.position))
        else {
            return Ok(current);
        };
        if candidate.same_device(&active.device) {
            return Ok(current);
        }

        let gain = LensSelector::distance(&active.device, effective)
            - LensSelector::distance(&candidate, effective);
        if gain <= self.config.lens_switch_hysteresis {
            return Ok(current);
        }

        log::debug!(
            "[{}] Pinch settled at {:.2}x, moving to {}",
            self.shared.session_id,
            effective,
            candidate.id
        );
        self.switch_to(candidate.clone())?;
        self.set_zoom_factor(effective / candidate.nominal_zoom)
    }

    // --- Classification handle ---

    pub(crate) fn register_classifier(&mut self, classifier: Arc<dyn FrameClassifier>) -> Result<(), SessionError> {
        let device = self.shared.active().map(|a| BoundDevice::from(&a.device));
        self.slot.rebind().install(Some(ClassifierBinding { classifier, device }));
        Ok(())
    }

    pub(crate) fn unregister_classifier(&mut self) -> Result<(), SessionError> {
        self.slot.rebind().install(None);
        Ok(())
    }

    // --- Internal helpers ---

    fn ensure_configured(&self) -> Result<SessionState, SessionError> {
        match self.shared.state() {
            SessionState::Unconfigured => Err(SessionError::NotConfigured),
            SessionState::PermissionDenied => Err(SessionError::PermissionDenied),
            SessionState::ConfigurationFailed => Err(SessionError::ConfigurationFailed(
                "session configuration failed earlier".into(),
            )),
            state => Ok(state),
        }
    }

    fn active_configuration(&self) -> Result<Arc<ActiveConfiguration>, SessionError> {
        self.shared.active().ok_or(SessionError::NoActiveDevice)
    }

    fn restart_after_interruption(&mut self) -> Result<(), SessionError> {
        if !self.backend.is_running() {
            self.backend.start_running().map_err(runtime_error)?;
        }
        self.set_state(SessionState::Running);
        if let Some(delegate) = self.shared.delegate() {
            delegate.on_session_resumed();
        }
        Ok(())
    }

    fn fail_configuration(&mut self, reason: String) -> Result<(), SessionError> {
        log::error!("[{}] Session configuration failed: {}", self.shared.session_id, reason);
        let error = SessionError::ConfigurationFailed(reason);
        self.set_state(SessionState::ConfigurationFailed);
        if let Some(delegate) = self.shared.delegate() {
            delegate.on_configuration_failed(&error);
        }
        Err(error)
    }

    /// Bind the classifier for `device` while deliveries are held off.
    fn provision(&self, rebind: &mut Rebind<'_>, device: &CaptureDevice) {
        let bound = Some(BoundDevice::from(device));
        let provisioner = self.shared.provisioner.read().clone();
        let binding = match provisioner {
            Some(provisioner) => provisioner
                .provision(device)
                .map(|classifier| ClassifierBinding { classifier, device: bound }),
            None => rebind.current().map(|existing| ClassifierBinding {
                classifier: Arc::clone(&existing.classifier),
                device: bound,
            }),
        };
        rebind.install(binding);
    }

    fn publish(&self, state: Option<SessionState>, active: Option<Arc<ActiveConfiguration>>, zoom: f64) {
        let mut snapshot = self.shared.snapshot.write();
        if let Some(state) = state {
            snapshot.state = state;
        }
        snapshot.active = active;
        snapshot.zoom_factor = zoom;
    }

    fn snapshot_zoom(&self, zoom: f64) {
        self.shared.snapshot.write().zoom_factor = zoom;
    }

    fn set_state(&self, state: SessionState) {
        self.shared.snapshot.write().state = state;
        self.notify_state(state);
    }

    fn notify_state(&self, state: SessionState) {
        log::debug!("[{}] State → {}", self.shared.session_id, state.name());
        if let Some(delegate) = self.shared.delegate() {
            delegate.on_state_changed(&state);
        }
    }

    fn notify_active_device(&self, device: &CaptureDevice) {
        if let Some(delegate) = self.shared.delegate() {
            delegate.on_active_device_changed(device);
        }
    }
}

enum SwitchOutcome {
    Switched,
    /// The target was rejected and the previous input is attached again.
    RolledBack(HardwareError),
    /// Neither the target nor the previous input could be attached.
    InputLost {
        cause: HardwareError,
        rollback: HardwareError,
    },
}

fn runtime_error(e: HardwareError) -> SessionError {
    SessionError::Runtime(RuntimeFault::Other(e.to_string()))
}
