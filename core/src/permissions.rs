// Permission gate.
//
// Lives exactly as long as a UI surface is attached. Queries the two
// platform permissions live and owns the one UI-driven flow: the
// battery-optimization exemption dialog. The flow is single-fire per
// request: NotRequested -> DialogShown -> DialogResolved -> result
// returned, with no retries.

use crate::bridge::MethodResponder;
use crate::platform::{HostPlatform, UiSurface};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

pub struct PermissionGate {
    host: Arc<dyn HostPlatform>,
    ui: Arc<dyn UiSurface>,
    /// Responder of the in-flight exemption request, if any. Taken exactly
    /// once on resolution; dropped unresolved if the surface detaches.
    pending: Mutex<Option<Box<dyn MethodResponder>>>,
}

impl PermissionGate {
    pub fn new(host: Arc<dyn HostPlatform>, ui: Arc<dyn UiSurface>) -> Self {
        Self {
            host,
            ui,
            pending: Mutex::new(None),
        }
    }

    /// Whether the wake-lock permission is declared for the application.
    pub fn is_wake_lock_granted(&self) -> bool {
        self.host.is_wake_lock_granted()
    }

    /// Whether the battery-optimization exemption is currently granted.
    pub fn is_ignoring_battery_optimizations(&self) -> bool {
        self.host.is_ignoring_battery_optimizations()
    }

    /// Both permissions at once; the `hasPermissions` answer.
    pub fn has_permissions(&self) -> bool {
        self.is_wake_lock_granted() && self.is_ignoring_battery_optimizations()
    }

    /// Park `responder` and show the system exemption dialog.
    ///
    /// A second request while one is pending supersedes it; the superseded
    /// call never resolves.
    pub fn request_battery_optimizations_off(&self, responder: Box<dyn MethodResponder>) {
        let superseded = {
            let mut pending = self.pending.lock();
            pending.replace(responder)
        };
        if superseded.is_some() {
            tracing::warn!(
                "battery exemption request superseded a pending one; the earlier call will never resolve"
            );
        }
        self.ui.show_battery_exemption_dialog();
    }

    /// Deliver the dialog outcome to the parked responder, exactly once.
    ///
    /// The request itself succeeds whether the user granted or denied the
    /// exemption; callers re-check with `hasPermissions`. Returns whether a
    /// responder was pending.
    pub fn resolve_exemption(&self, granted: bool) -> bool {
        let responder = self.pending.lock().take();
        match responder {
            Some(responder) => {
                tracing::info!(granted, "battery exemption dialog resolved");
                responder.success(Value::Bool(true));
                true
            }
            None => {
                tracing::debug!(granted, "exemption result without a pending request, ignoring");
                false
            }
        }
    }

    pub fn has_pending_request(&self) -> bool {
        self.pending.lock().is_some()
    }
}

// ============================================================================
// TESTS
// ============================================================================
