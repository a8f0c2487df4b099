use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::dispatch::classifier_slot::ClassifierSlot;
use crate::models::frame::{DeviceOrientation, Frame, Orientation};
use crate::models::session_models::SessionDiagnostics;
use crate::traits::capture_backend::FrameHandler;

const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

#[derive(Default)]
struct FrameCounters {
    received: AtomicU64,
    delivered: AtomicU64,
    dropped_no_consumer: AtomicU64,
    dropped_backpressure: AtomicU64,
    dropped_stale: AtomicU64,
}

struct Inner {
    slot: Arc<ClassifierSlot>,
    orientation: AtomicU8,
    counters: FrameCounters,
    shutdown: AtomicBool,
}

/// Forwards captured frames to the registered classifier off the capture thread.
///
/// ```text
/// [capture thread] → try_send → [bounded channel] → [dispatch thread] → classifier
///        └─ full / no consumer: frame dropped
/// ```
///
/// The capture side never blocks: a frame is dropped when no classifier is
/// attached or when `max_pending` frames are already waiting.
pub struct FrameDispatcher {
    inner: Arc<Inner>,
    sender: Mutex<Option<SyncSender<Frame>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl FrameDispatcher {
    pub fn spawn(slot: Arc<ClassifierSlot>, max_pending: usize) -> Self {
        let (sender, receiver) = mpsc::sync_channel::<Frame>(max_pending.max(1));
        let inner = Arc::new(Inner {
            slot,
            orientation: AtomicU8::new(DeviceOrientation::default().to_raw()),
            counters: FrameCounters::default(),
            shutdown: AtomicBool::new(false),
        });

        let worker_inner = Arc::clone(&inner);
        let worker = thread::Builder::new()
            .name("frame-dispatch".into())
            .spawn(move || loop {
                match receiver.recv_timeout(SHUTDOWN_POLL) {
                    Ok(frame) => worker_inner.deliver(frame),
                    Err(RecvTimeoutError::Timeout) => {
                        if worker_inner.shutdown.load(Ordering::Acquire) {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .expect("failed to spawn frame dispatch thread");

        Self {
            inner,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// The callback to install on the capture backend's frame output.
    pub fn handler(&self) -> FrameHandler {
        let inner = Arc::clone(&self.inner);
        let sender = self.sender.lock().clone();
        Arc::new(move |frame: Frame| {
            let counters = &inner.counters;
            counters.received.fetch_add(1, Ordering::Relaxed);

            if !inner.slot.is_attached() {
                counters.dropped_no_consumer.fetch_add(1, Ordering::Relaxed);
                return;
            }
            let Some(sender) = &sender else {
                counters.dropped_no_consumer.fetch_add(1, Ordering::Relaxed);
                return;
            };
            match sender.try_send(frame) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    counters.dropped_backpressure.fetch_add(1, Ordering::Relaxed);
                }
                Err(TrySendError::Disconnected(_)) => {
                    counters.dropped_no_consumer.fetch_add(1, Ordering::Relaxed);
                }
            }
        })
    }

    pub fn set_device_orientation(&self, orientation: DeviceOrientation) {
        self.inner.orientation.store(orientation.to_raw(), Ordering::Relaxed);
    }

    pub fn device_orientation(&self) -> DeviceOrientation {
        DeviceOrientation::from_raw(self.inner.orientation.load(Ordering::Relaxed))
    }

    /// Copy the frame counters into `diagnostics`.
    pub fn fill_diagnostics(&self, diagnostics: &mut SessionDiagnostics) {
        let counters = &self.inner.counters;
        diagnostics.frames_received = counters.received.load(Ordering::Relaxed);
        diagnostics.frames_delivered = counters.delivered.load(Ordering::Relaxed);
        diagnostics.frames_dropped_no_consumer = counters.dropped_no_consumer.load(Ordering::Relaxed);
        diagnostics.frames_dropped_backpressure = counters.dropped_backpressure.load(Ordering::Relaxed);
        diagnostics.frames_dropped_stale = counters.dropped_stale.load(Ordering::Relaxed);
    }

    /// Stop the dispatch thread. Frames still queued are discarded.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Release);
        self.sender.lock().take();
        if let Some(worker) = self.worker.lock().take() {
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

impl Drop for FrameDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Inner {
    fn deliver(&self, frame: Frame) {
        if self.shutdown.load(Ordering::Acquire) {
            return;
        }
        let binding = self.slot.read();
        let Some(binding) = binding.as_ref() else {
            self.counters.dropped_no_consumer.fetch_add(1, Ordering::Relaxed);
            return;
        };
        let Some(device) = binding.device.as_ref().filter(|d| d.id == frame.device_id) else {
            log::trace!("Dropping frame from {}: classifier bound elsewhere", frame.device_id);
            self.counters.dropped_stale.fetch_add(1, Ordering::Relaxed);
            return;
        };

        let orientation = Orientation::for_capture(
            DeviceOrientation::from_raw(self.orientation.load(Ordering::Relaxed)),
            device.position,
        );
        binding
            .classifier
            .classify(&frame.buffer, orientation, frame.timestamp_millis());
        self.counters.delivered.fetch_add(1, Ordering::Relaxed);
    }
}
