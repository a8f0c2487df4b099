//! # lens-capture-virtual
//!
//! Virtual multi-lens camera backend for lens-capture-core.
//!
//! Provides:
//! - `VirtualRig` — simulated camera hardware with scripted faults
//! - `VirtualDiscovery` — device enumeration over the rig
//! - `VirtualCameraBackend` — capture session with a frame producer thread
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use lens_capture_core::{CaptureSessionManager, SessionConfiguration};
//! use lens_capture_virtual::{VirtualCameraBackend, VirtualDiscovery, VirtualRig, VirtualRigConfig};
//!
//! let rig = VirtualRig::handset(VirtualRigConfig::default()).unwrap();
//! let manager = CaptureSessionManager::new(
//!     VirtualCameraBackend::new(&rig),
//!     Arc::new(VirtualDiscovery::new(&rig)),
//!     SessionConfiguration::default(),
//! )
//! .unwrap();
//! manager.configure().wait().unwrap();
//! manager.start().wait().unwrap();
//! ```

pub mod backend;
pub mod discovery;
pub mod rig;

pub use backend::VirtualCameraBackend;
pub use discovery::VirtualDiscovery;
pub use rig::{Faults, RigError, VirtualRig, VirtualRigConfig};
