// Staywake Core - background execution bridge for embedded host apps
//
// "Keep the application alive in the background without the host
//  framework having to know how the platform does it."
//
// Everything platform-specific stays behind the callback traits in
// `platform`; this crate owns the request contract, the permission
// gating and the configuration bookkeeping.

pub mod bridge;
pub mod config;
pub mod permissions;
pub mod platform;
pub mod service;

use thiserror::Error;

pub use bridge::{
    BackgroundBridge, MethodCall, MethodReply, MethodResponder, MethodResultHandler, ABANDONED_CODE,
    CHANNEL_NAME,
};
pub use config::{
    current_notification_config, process_config, ConfigStore, ConfigUpdate, NotificationConfig,
    NotificationImportance,
};
pub use permissions::PermissionGate;
pub use platform::{HostPlatform, UiSurface};
pub use service::{LaunchMode, ServiceAction, ServiceLaunch, FOREGROUND_LAUNCH_MIN_API};

// UniFFI scaffolding (proc-macro mode)
uniffi::setup_scaffolding!("staywake");

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Failure kinds surfaced to the calling side of the bridge.
///
/// Every variant maps to a stable wire code via [`BridgeError::code`]; the
/// human-readable message is the `Display` rendering.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// A required platform permission is missing.
    #[error("{message}")]
    Permission { message: String },
    /// The operation needs a UI surface and none is attached.
    #[error("The background execution bridge is not attached to a UI surface.")]
    NoUiSurface { details: String },
    /// A declared notification resource could not be resolved.
    #[error("The resource {def_type}/{name} could not be found. Make sure it has been added to the application's resources.")]
    Resource { name: String, def_type: String },
}

impl BridgeError {
    pub(crate) fn wake_lock_missing() -> Self {
        BridgeError::Permission {
            message: "The WAKE_LOCK permission is not declared. Add it to the application \
                      manifest in order to use background execution."
                .to_string(),
        }
    }

    pub(crate) fn battery_optimizations_active() -> Self {
        BridgeError::Permission {
            message: "The battery optimizations are not turned off.".to_string(),
        }
    }

    pub(crate) fn ui_surface_detached(details: impl Into<String>) -> Self {
        BridgeError::NoUiSurface {
            details: details.into(),
        }
    }

    pub(crate) fn resource(name: impl Into<String>, def_type: impl Into<String>) -> Self {
        BridgeError::Resource {
            name: name.into(),
            def_type: def_type.into(),
        }
    }

    /// Stable machine-readable code carried in error replies.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::Permission { .. } => "PermissionError",
            BridgeError::NoUiSurface { .. } => "NoActivityError",
            BridgeError::Resource { .. } => "ResourceError",
        }
    }

    /// Optional extra context carried in error replies.
    pub fn details(&self) -> Option<String> {
        match self {
            BridgeError::NoUiSurface { details } => Some(details.clone()),
            _ => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
