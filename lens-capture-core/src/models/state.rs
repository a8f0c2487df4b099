use serde::Serialize;

/// Why the platform paused a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptionReason {
    /// Another client took the camera; capture can resume when it lets go.
    VideoDeviceInUseByAnotherClient,
    /// Camera unavailable while several apps share the foreground.
    VideoDeviceNotAvailableWithMultipleForegroundApps,
    /// Camera unavailable while the app is in the background.
    VideoDeviceNotAvailableInBackground,
    /// Audio hardware taken by another client.
    AudioDeviceInUseByAnotherClient,
}

impl InterruptionReason {
    /// Only contention with another client can be resumed from this process.
    pub fn is_resumable(self) -> bool {
        matches!(self, Self::VideoDeviceInUseByAnotherClient)
    }
}

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// unconfigured ─┬→ permission_denied
///               ├→ configuration_failed
///               └→ configured_stopped ⇄ running ⇄ interrupted
///                          ↑                          │
///                          └──────── stop ────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Unconfigured,
    PermissionDenied,
    ConfigurationFailed,
    ConfiguredStopped,
    Running,
    Interrupted { resumable: bool },
}

impl SessionState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::ConfigurationFailed)
    }

    /// States in which exactly one device is active.
    pub fn has_active_device(&self) -> bool {
        matches!(
            self,
            Self::ConfiguredStopped | Self::Running | Self::Interrupted { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::PermissionDenied => "permission_denied",
            Self::ConfigurationFailed => "configuration_failed",
            Self::ConfiguredStopped => "configured_stopped",
            Self::Running => "running",
            Self::Interrupted { .. } => "interrupted",
        }
    }
}
