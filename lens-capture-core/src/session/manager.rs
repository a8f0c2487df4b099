use std::sync::Arc;

use crate::catalog::DeviceCatalog;
use crate::dispatch::classifier_slot::ClassifierSlot;
use crate::dispatch::frame_dispatcher::FrameDispatcher;
use crate::models::config::SessionConfiguration;
use crate::models::device::CaptureDevice;
use crate::models::error::{RuntimeFault, SessionError};
use crate::models::frame::DeviceOrientation;
use crate::models::session_models::{ActiveConfiguration, SessionDiagnostics};
use crate::models::state::{InterruptionReason, SessionState};
use crate::session::completion::Completion;
use crate::session::worker::{SessionCore, SharedSession};
use crate::session::queue::SessionQueue;
use crate::traits::{CaptureBackend, ClassifierProvisioner, DeviceDiscovery, FrameClassifier, SessionDelegate};

/// Owns the single capture session: its backend, active device, frame
/// output and lifecycle state.
///
/// Every mutating call is queued onto one session worker and returns a
/// [`Completion`]. Calls run strictly in arrival order, so a later request
/// always observes the full effect of an earlier one. Reads (`state`,
/// `active_configuration`, `current_zoom_factor`) are answered from a
/// snapshot and never wait for the queue.
///
/// Delegate callbacks run on the session worker. A delegate must not block
/// on a completion from inside a callback.
pub struct CaptureSessionManager<B: CaptureBackend> {
    // Dropped first: the worker drains and releases the backend before the
    // dispatcher thread is stopped.
    queue: SessionQueue<SessionCore<B>>,
    dispatcher: Arc<FrameDispatcher>,
    shared: Arc<SharedSession>,
    slot: Arc<ClassifierSlot>,
    catalog: DeviceCatalog,
}

impl<B: CaptureBackend> CaptureSessionManager<B> {
    pub fn new(
        backend: B,
        discovery: Arc<dyn DeviceDiscovery>,
        config: SessionConfiguration,
    ) -> Result<Self, SessionError> {
        config.validate().map_err(SessionError::InvalidConfiguration)?;

        let catalog = DeviceCatalog::new(discovery, config.fallback_zoom);
        let shared = Arc::new(SharedSession::new());
        let slot = Arc::new(ClassifierSlot::new());
        let dispatcher = Arc::new(FrameDispatcher::spawn(Arc::clone(&slot), config.max_pending_frames));

        log::info!(
            "[{}] Capture session created ({} devices)",
            shared.session_id,
            catalog.list_devices().len()
        );

        let label = config.queue_label.clone();
        let core = SessionCore::new(
            backend,
            catalog.clone(),
            config,
            Arc::clone(&shared),
            Arc::clone(&slot),
            Arc::clone(&dispatcher),
        );

        Ok(Self {
            queue: SessionQueue::spawn(&label, core),
            dispatcher,
            shared,
            slot,
            catalog,
        })
    }

    pub fn session_id(&self) -> uuid::Uuid {
        self.shared.session_id
    }

    pub fn set_delegate(&self, delegate: Arc<dyn SessionDelegate>) {
        self.shared.set_delegate(delegate);
    }

    /// Install a factory that produces the classification handle for each
    /// newly active device.
    pub fn set_provisioner(&self, provisioner: Arc<dyn ClassifierProvisioner>) {
        self.shared.set_provisioner(provisioner);
    }

    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    pub fn active_configuration(&self) -> Option<Arc<ActiveConfiguration>> {
        self.shared.active()
    }

    pub fn current_device(&self) -> Option<CaptureDevice> {
        self.shared.active().map(|a| a.device.clone())
    }

    /// 1.0 when no device is active.
    pub fn current_zoom_factor(&self) -> f64 {
        self.shared.zoom_factor()
    }

    pub fn set_device_orientation(&self, orientation: DeviceOrientation) {
        self.dispatcher.set_device_orientation(orientation);
    }

    pub fn diagnostics(&self) -> SessionDiagnostics {
        let mut diagnostics = SessionDiagnostics::default();
        self.dispatcher.fill_diagnostics(&mut diagnostics);
        self.shared.fill_diagnostics(&mut diagnostics);
        diagnostics
    }

    /// Whether a classification handle is currently installed.
    pub fn has_classifier(&self) -> bool {
        self.slot.is_attached()
    }

    // --- Lifecycle ---

    /// Check camera access and attach the default device and frame output.
    pub fn configure(&self) -> Completion<()> {
        self.queue.submit(|core| core.configure())
    }

    pub fn start(&self) -> Completion<()> {
        self.queue.submit(|core| core.start())
    }

    pub fn stop(&self) -> Completion<()> {
        self.queue.submit(|core| core.stop())
    }

    pub fn resume(&self) -> Completion<()> {
        self.queue.submit(|core| core.resume())
    }

    pub fn handle_interruption(&self, reason: InterruptionReason) -> Completion<()> {
        self.queue.submit(move |core| core.handle_interruption(reason))
    }

    pub fn handle_interruption_ended(&self) -> Completion<()> {
        self.queue.submit(|core| core.handle_interruption_ended())
    }

    pub fn handle_runtime_error(&self, fault: RuntimeFault) -> Completion<()> {
        self.queue.submit(move |core| core.handle_runtime_error(fault))
    }

    // --- Device selection ---

    /// Make `target` the active input. A no-op when it already is; on
    /// failure the previous device stays active. If the previous input cannot
    /// be reattached either, the session moves to `ConfigurationFailed` with
    /// no active device and the delegate gets a runtime error.
    pub fn switch_device(&self, target: &CaptureDevice) -> Completion<()> {
        let target = target.clone();
        self.queue.submit(move |core| core.switch_device(&target))
    }

    /// Switch between front and back cameras. Resolves with the new device.
    pub fn toggle_position(&self) -> Completion<CaptureDevice> {
        self.queue.submit(|core| core.toggle_position())
    }

    // --- Zoom ---

    /// Set the active device's zoom factor, clamped into its range.
    /// Resolves with the factor actually applied.
    pub fn set_zoom_factor(&self, value: f64) -> Completion<f64> {
        self.queue.submit(move |core| core.set_zoom_factor(value))
    }

    /// Zoom to a magnification relative to the wide lens, changing lenses
    /// when another one is closer.
    pub fn request_zoom(&self, nominal: f64) -> Completion<f64> {
        self.queue.submit(move |core| core.request_zoom(nominal))
    }

    pub fn pinch_changed(&self, scale: f64) -> Completion<f64> {
        self.queue.submit(move |core| core.pinch_changed(scale))
    }

    pub fn pinch_ended(&self) -> Completion<f64> {
        self.queue.submit(|core| core.pinch_ended())
    }

    // --- Classification handle ---

    pub fn register_classifier(&self, classifier: Arc<dyn FrameClassifier>) -> Completion<()> {
        self.queue.submit(move |core| core.register_classifier(classifier))
    }

    pub fn unregister_classifier(&self) -> Completion<()> {
        self.queue.submit(|core| core.unregister_classifier())
    }
}
