// Method-call bridge.
//
// The host glue forwards channel traffic here as (method, argument bundle)
// pairs and receives exactly one reply per call through a responder
// callback. Construction binds the bridge to its host platform (engine
// attach); `attach_ui_surface` / `detach_ui_surface` track the foreground
// surface the permission gate needs.

use crate::config::{process_config, ConfigStore, ConfigUpdate};
use crate::permissions::PermissionGate;
use crate::platform::{HostPlatform, UiSurface};
use crate::service::ServiceLaunch;
use crate::BridgeError;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Channel name the host glue registers for bridge traffic.
pub const CHANNEL_NAME: &str = "staywake";

/// Code of the locally synthesized reply [`BackgroundBridge::handle_call`]
/// returns when a completion is abandoned. Never sent over the wire.
pub const ABANDONED_CODE: &str = "AbandonedError";

/// Method names the bridge understands.
pub mod methods {
    pub const GET_PLATFORM_VERSION: &str = "getPlatformVersion";
    pub const HAS_PERMISSIONS: &str = "hasPermissions";
    pub const INITIALIZE: &str = "initialize";
    pub const ENABLE_BACKGROUND_EXECUTION: &str = "enableBackgroundExecution";
    pub const DISABLE_BACKGROUND_EXECUTION: &str = "disableBackgroundExecution";

    pub const ALL: &[&str] = &[
        GET_PLATFORM_VERSION,
        HAS_PERMISSIONS,
        INITIALIZE,
        ENABLE_BACKGROUND_EXECUTION,
        DISABLE_BACKGROUND_EXECUTION,
    ];
}

// ============================================================================
// CALL PROTOCOL
// ============================================================================

/// One inbound request: a method name plus its JSON argument bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: Value::Null,
        }
    }

    pub fn with_arguments(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// The reply a call produces, delivered exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodReply {
    Success(Value),
    Error {
        code: String,
        message: String,
        details: Option<String>,
    },
    NotImplemented,
}

/// Per-call completion callback.
///
/// Invoked at most once per call, possibly from a different thread than the
/// one that issued the call (the exemption flow resolves from the platform
/// callback thread).
pub trait MethodResponder: Send {
    fn success(&self, result: Value);
    fn error(&self, code: String, message: String, details: Option<String>);
    fn not_implemented(&self);
}

/// Foreign-side result callback, mirroring [`MethodResponder`] with the
/// result value JSON-encoded for the binding layer.
#[uniffi::export(callback_interface)]
pub trait MethodResultHandler: Send + Sync {
    fn success(&self, result_json: Option<String>);
    fn error(&self, code: String, message: String, details: Option<String>);
    fn not_implemented(&self);
}

struct HandlerResponder {
    handler: Box<dyn MethodResultHandler>,
}

impl MethodResponder for HandlerResponder {
    fn success(&self, result: Value) {
        let encoded = if result.is_null() {
            None
        } else {
            Some(result.to_string())
        };
        self.handler.success(encoded);
    }

    fn error(&self, code: String, message: String, details: Option<String>) {
        self.handler.error(code, message, details);
    }

    fn not_implemented(&self) {
        self.handler.not_implemented();
    }
}

/// Responder backing [`BackgroundBridge::handle_call`].
struct OneshotResponder {
    tx: Mutex<Option<oneshot::Sender<MethodReply>>>,
}

impl OneshotResponder {
    fn new(tx: oneshot::Sender<MethodReply>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }

    fn deliver(&self, reply: MethodReply) {
        if let Some(tx) = self.tx.lock().take() {
            let _ = tx.send(reply);
        }
    }
}

impl MethodResponder for OneshotResponder {
    fn success(&self, result: Value) {
        self.deliver(MethodReply::Success(result));
    }

    fn error(&self, code: String, message: String, details: Option<String>) {
        self.deliver(MethodReply::Error {
            code,
            message,
            details,
        });
    }

    fn not_implemented(&self) {
        self.deliver(MethodReply::NotImplemented);
    }
}

fn respond_error(responder: Box<dyn MethodResponder>, error: BridgeError) {
    tracing::debug!(code = error.code(), %error, "method call failed");
    responder.error(error.code().to_string(), error.to_string(), error.details());
}

// ============================================================================
// BRIDGE
// ============================================================================

/// The engine-side bridge object.
///
/// Construction corresponds to engine attach and binds the host platform
/// for the bridge's whole lifetime; dropping it is the engine detach.
#[derive(uniffi::Object)]
pub struct BackgroundBridge {
    host: Arc<dyn HostPlatform>,
    /// Permission gate, present exactly while a UI surface is attached.
    gate: Mutex<Option<Arc<PermissionGate>>>,
    config: &'static ConfigStore,
}

impl BackgroundBridge {
    /// Bind the bridge to its host platform.
    pub fn new(host: Arc<dyn HostPlatform>) -> Self {
        Self::with_config_store(host, process_config())
    }

    /// Bind with an explicit configuration store. Tests use isolated stores
    /// so they do not race on the process-wide one.
    pub fn with_config_store(host: Arc<dyn HostPlatform>, config: &'static ConfigStore) -> Self {
        // Initialize tracing (idempotent)
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .try_init();

        tracing::info!("background bridge attached to host");
        Self {
            host,
            gate: Mutex::new(None),
            config,
        }
    }

    fn gate(&self) -> Option<Arc<PermissionGate>> {
        self.gate.lock().clone()
    }

    /// Handle one method call, delivering the reply through `responder`.
    ///
    /// Never blocks: platform commands are fire-and-forget and the
    /// exemption flow parks its responder until the dialog outcome arrives.
    pub fn handle(&self, call: MethodCall, responder: Box<dyn MethodResponder>) {
        tracing::debug!(method = %call.method, "method call received");
        match call.method.as_str() {
            methods::GET_PLATFORM_VERSION => {
                responder.success(Value::String(self.host.os_version()));
            }
            methods::HAS_PERMISSIONS => self.has_permissions(responder),
            methods::INITIALIZE => self.initialize(&call.arguments, responder),
            methods::ENABLE_BACKGROUND_EXECUTION => self.enable_background_execution(responder),
            methods::DISABLE_BACKGROUND_EXECUTION => self.disable_background_execution(responder),
            other => {
                tracing::warn!(method = other, "unhandled method");
                responder.not_implemented();
            }
        }
    }

    /// Async convenience over [`handle`](Self::handle) for Rust callers.
    ///
    /// If the completion is abandoned (the UI surface detached or the
    /// request was superseded while parked), a local reply with code
    /// [`ABANDONED_CODE`] is synthesized so the future still resolves.
    pub async fn handle_call(&self, call: MethodCall) -> MethodReply {
        let (tx, rx) = oneshot::channel();
        self.handle(call, Box::new(OneshotResponder::new(tx)));
        rx.await.unwrap_or_else(|_| MethodReply::Error {
            code: ABANDONED_CODE.to_string(),
            message: "the call was abandoned before a reply was delivered".to_string(),
            details: None,
        })
    }

    fn has_permissions(&self, responder: Box<dyn MethodResponder>) {
        match self.gate() {
            Some(gate) => responder.success(Value::Bool(gate.has_permissions())),
            None => respond_error(
                responder,
                BridgeError::ui_surface_detached(
                    "permission state can only be checked while a UI surface is attached",
                ),
            ),
        }
    }

    fn initialize(&self, arguments: &Value, responder: Box<dyn MethodResponder>) {
        let update = ConfigUpdate::from_arguments(arguments);

        // Validate a supplied icon before committing anything.
        if update.touches_icon() {
            let (name, def_type) = self.config.effective_icon(&update);
            if !self.host.has_resource(name.clone(), def_type.clone()) {
                respond_error(responder, BridgeError::resource(name, def_type));
                return;
            }
        }

        // The merge is committed before the permission cascade, so a
        // permission failure still leaves the supplied fields stored.
        let config = self.config.apply(&update);
        tracing::info!(
            title = %config.title,
            importance = %config.importance,
            "notification configuration updated"
        );

        let Some(gate) = self.gate() else {
            respond_error(
                responder,
                BridgeError::ui_surface_detached(
                    "initialization verifies permissions, which needs an attached UI surface",
                ),
            );
            return;
        };
        if !gate.is_wake_lock_granted() {
            respond_error(responder, BridgeError::wake_lock_missing());
            return;
        }
        if gate.is_ignoring_battery_optimizations() {
            responder.success(Value::Bool(true));
            return;
        }
        // Resolves later, through on_battery_exemption_result.
        gate.request_battery_optimizations_off(responder);
    }

    fn enable_background_execution(&self, responder: Box<dyn MethodResponder>) {
        let Some(gate) = self.gate() else {
            respond_error(
                responder,
                BridgeError::ui_surface_detached(
                    "background execution can only be enabled while a UI surface is attached",
                ),
            );
            return;
        };
        if !gate.is_wake_lock_granted() {
            respond_error(responder, BridgeError::wake_lock_missing());
            return;
        }
        if !gate.is_ignoring_battery_optimizations() {
            respond_error(responder, BridgeError::battery_optimizations_active());
            return;
        }

        let launch = ServiceLaunch::start(self.host.api_level());
        tracing::info!(mode = %launch.mode, "issuing background service start");
        self.host.launch_service(launch);
        responder.success(Value::Bool(true));
    }

    /// Always succeeds: the shutdown tag is safe to send whether or not the
    /// service is running, and needs neither permissions nor a UI surface.
    fn disable_background_execution(&self, responder: Box<dyn MethodResponder>) {
        let launch = ServiceLaunch::shutdown(self.host.api_level());
        tracing::info!(mode = %launch.mode, "issuing background service shutdown");
        self.host.launch_service(launch);
        responder.success(Value::Bool(true));
    }
}

impl Drop for BackgroundBridge {
    fn drop(&mut self) {
        tracing::debug!("background bridge detached from host");
    }
}

// ============================================================================
// EXPORTED SURFACE
// ============================================================================

#[uniffi::export]
impl BackgroundBridge {
    /// Bind a freshly attached engine to its host platform.
    #[uniffi::constructor]
    pub fn create(host: Box<dyn HostPlatform>) -> Arc<Self> {
        Arc::new(Self::new(Arc::from(host)))
    }

    /// Entry point for channel traffic from the host glue.
    ///
    /// `arguments_json` is the JSON-encoded argument bundle, if any. A
    /// malformed bundle is treated as empty rather than failing the call.
    pub fn call(
        &self,
        method: String,
        arguments_json: Option<String>,
        handler: Box<dyn MethodResultHandler>,
    ) {
        let arguments = match arguments_json {
            None => Value::Null,
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(%err, "malformed argument bundle, treating as empty");
                    Value::Null
                }
            },
        };
        self.handle(
            MethodCall { method, arguments },
            Box::new(HandlerResponder { handler }),
        );
    }

    /// A UI surface came up. Reattachment after a configuration change is
    /// an ordinary attach.
    pub fn attach_ui_surface(&self, ui: Box<dyn UiSurface>) {
        let gate = Arc::new(PermissionGate::new(self.host.clone(), Arc::from(ui)));
        let previous = self.gate.lock().replace(gate);
        if previous.is_some() {
            tracing::debug!("ui surface replaced");
        } else {
            tracing::info!("ui surface attached");
        }
    }

    /// The UI surface went away. A pending exemption completion is
    /// abandoned with it and will never resolve.
    pub fn detach_ui_surface(&self) {
        let detached = self.gate.lock().take();
        if let Some(gate) = detached {
            if gate.has_pending_request() {
                tracing::warn!(
                    "ui surface detached with a pending exemption request; that call will never resolve"
                );
            }
            tracing::info!("ui surface detached");
        }
    }

    /// Platform callback with the exemption dialog outcome.
    pub fn on_battery_exemption_result(&self, granted: bool) {
        match self.gate() {
            Some(gate) => {
                gate.resolve_exemption(granted);
            }
            None => {
                tracing::debug!(granted, "exemption result with no ui surface attached, ignoring");
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
