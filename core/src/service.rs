// Service launch commands.
//
// The long-running background service lives in the host application; this
// module only models the commands the bridge issues to it. The platform
// service can only be messaged through its start entry point, so stopping
// is expressed as a start command tagged for shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest host API level that provides the foreground-privileged start
/// entry point. Below it, plain service starts are the only option.
pub const FOREGROUND_LAUNCH_MIN_API: u32 = 26;

/// What a launch command asks the service to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
pub enum ServiceAction {
    /// Bring the service up.
    Start,
    /// Deliver the shutdown tag; the service stops itself on receipt.
    Shutdown,
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceAction::Start => write!(f, "start"),
            ServiceAction::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// How a command is submitted to the platform service manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
pub enum LaunchMode {
    /// Foreground-privileged start, required on newer API levels.
    Foreground,
    /// Plain service start, used below [`FOREGROUND_LAUNCH_MIN_API`].
    Plain,
}

impl LaunchMode {
    /// Select the launch mode the host API level requires.
    pub fn for_api_level(api_level: u32) -> Self {
        if api_level >= FOREGROUND_LAUNCH_MIN_API {
            LaunchMode::Foreground
        } else {
            LaunchMode::Plain
        }
    }
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchMode::Foreground => write!(f, "foreground"),
            LaunchMode::Plain => write!(f, "plain"),
        }
    }
}

/// One fire-and-forget command handed to `HostPlatform::launch_service`.
///
/// Completion is never reported back; the caller treats submission as
/// success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct ServiceLaunch {
    pub action: ServiceAction,
    pub mode: LaunchMode,
}

impl ServiceLaunch {
    /// Start command for a host running at `api_level`.
    pub fn start(api_level: u32) -> Self {
        Self {
            action: ServiceAction::Start,
            mode: LaunchMode::for_api_level(api_level),
        }
    }

    /// Shutdown-tagged command for a host running at `api_level`.
    pub fn shutdown(api_level: u32) -> Self {
        Self {
            action: ServiceAction::Shutdown,
            mode: LaunchMode::for_api_level(api_level),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
