use thiserror::Error;

/// Faults the capture session can report while running.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeFault {
    /// The platform media daemon restarted; the session may be restarted in place.
    #[error("media services were reset")]
    MediaServicesWereReset,

    #[error("device disconnected")]
    DeviceDisconnected,

    #[error("{0}")]
    Other(String),
}

/// Errors reported by a [`CaptureBackend`](crate::traits::CaptureBackend).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HardwareError {
    #[error("input rejected: {0}")]
    InputRejected(String),

    #[error("output rejected: {0}")]
    OutputRejected(String),

    #[error("device lock unavailable: {0}")]
    LockUnavailable(String),

    #[error("session failed to start: {0}")]
    StartFailed(String),

    #[error("hardware unavailable")]
    Unavailable,
}

/// Errors that can occur during capture session operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("camera access denied")]
    PermissionDenied,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("session not configured")]
    NotConfigured,

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("device not available")]
    DeviceNotAvailable,

    #[error("no active device")]
    NoActiveDevice,

    #[error("switch to {target} failed: {reason}")]
    SwitchFailed { target: String, reason: String },

    #[error("could not lock device for configuration: {0}")]
    ConfigurationLockFailed(String),

    #[error("runtime error: {0}")]
    Runtime(RuntimeFault),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("session queue closed")]
    QueueClosed,
}

impl SessionError {
    /// Errors after which the session instance can no longer be used.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::ConfigurationFailed(_))
    }
}
