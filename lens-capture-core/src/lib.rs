//! # lens-capture-core
//!
//! Platform-agnostic camera capture core library.
//!
//! Provides device enumeration and lens selection, the capture session
//! lifecycle, and non-blocking frame dispatch to a classification consumer.
//! Platform backends implement the `CaptureBackend` and `DeviceDiscovery`
//! traits and plug into the generic `CaptureSessionManager`.
//!
//! ## Architecture
//!
//! ```text
//! lens-capture-core (this crate)
//! ├── traits/     ← CaptureBackend, DeviceDiscovery, SessionDelegate, FrameClassifier
//! ├── models/     ← SessionError, SessionState, SessionConfiguration, CaptureDevice, Frame
//! ├── catalog/    ← DeviceCatalog, LensSelector
//! ├── dispatch/   ← FrameDispatcher, ClassifierSlot
//! └── session/    ← CaptureSessionManager (serialized session queue), Completion
//! ```
//!
//! ## Threads
//!
//! ```text
//! [caller] ──submit──▶ [session queue] ──owns──▶ CaptureBackend
//!                                      └─rebind─▶ ClassifierSlot (write)
//! [capture thread] ──try_send──▶ [frame-dispatch] ──read──▶ ClassifierSlot
//!                                                 └──────▶ FrameClassifier::classify
//! ```

pub mod catalog;
pub mod dispatch;
pub mod models;
pub mod session;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience.
pub use catalog::{DeviceCatalog, LensSelector};
pub use dispatch::{BoundDevice, ClassifierSlot, FrameDispatcher};
pub use models::config::{FallbackZoomTable, SessionConfiguration};
pub use models::device::{CaptureDevice, Capability, DeviceType, LensOption, Position, ZoomRange};
pub use models::error::{HardwareError, RuntimeFault, SessionError};
pub use models::frame::{DeviceOrientation, Frame, FrameBuffer, Orientation};
pub use models::session_models::{ActiveConfiguration, Authorization, FrameOutput, SessionDiagnostics};
pub use models::state::{InterruptionReason, SessionState};
pub use session::{CaptureSessionManager, Completion};
pub use traits::{CaptureBackend, ClassifierProvisioner, DeviceDiscovery, FrameClassifier, FrameHandler, SessionDelegate};
