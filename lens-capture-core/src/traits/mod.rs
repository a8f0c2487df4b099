pub mod capture_backend;
pub mod device_discovery;
pub mod frame_classifier;
pub mod session_delegate;

pub use capture_backend::{CaptureBackend, FrameHandler};
pub use device_discovery::DeviceDiscovery;
pub use frame_classifier::{ClassifierProvisioner, FrameClassifier};
pub use session_delegate::SessionDelegate;
