//! Integration tests: full bridge flows against an in-process fake host.
//!
//! These tests exercise the public `BackgroundBridge` API end-to-end: the
//! permission ladder, the exemption dialog round trip, configuration
//! round-trips and the service command sequence. No real platform APIs are
//! involved; every hook is faked in-process.
//!
//! Run with:
//!   cargo test --test integration_bridge_flow

use parking_lot::Mutex;
use serde_json::{json, Value};
use staywake_core::config::DEFAULT_NOTIFICATION_TEXT;
use staywake_core::{
    BackgroundBridge, ConfigStore, HostPlatform, LaunchMode, MethodCall, MethodReply,
    MethodResponder, NotificationImportance, ServiceAction, ServiceLaunch, UiSurface,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Fixtures
// ============================================================================

/// Fake platform: permission state is mutable so tests can simulate the
/// user granting the exemption, and every service command is recorded.
struct FakeHost {
    api_level: u32,
    wake: AtomicBool,
    battery: AtomicBool,
    launches: Mutex<Vec<ServiceLaunch>>,
}

impl FakeHost {
    fn new(api_level: u32, wake: bool, battery: bool) -> Arc<Self> {
        Arc::new(Self {
            api_level,
            wake: AtomicBool::new(wake),
            battery: AtomicBool::new(battery),
            launches: Mutex::new(Vec::new()),
        })
    }

    fn launches(&self) -> Vec<ServiceLaunch> {
        self.launches.lock().clone()
    }
}

impl HostPlatform for FakeHost {
    fn os_version(&self) -> String {
        "FakeOS 14".to_string()
    }

    fn api_level(&self) -> u32 {
        self.api_level
    }

    fn is_wake_lock_granted(&self) -> bool {
        self.wake.load(Ordering::SeqCst)
    }

    fn is_ignoring_battery_optimizations(&self) -> bool {
        self.battery.load(Ordering::SeqCst)
    }

    fn has_resource(&self, name: String, _def_type: String) -> bool {
        name != "ic_missing"
    }

    fn launch_service(&self, launch: ServiceLaunch) {
        self.launches.lock().push(launch);
    }
}

#[derive(Clone)]
struct FakeUi {
    dialogs: Arc<AtomicUsize>,
}

impl FakeUi {
    fn new() -> Self {
        Self {
            dialogs: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl UiSurface for FakeUi {
    fn show_battery_exemption_dialog(&self) {
        self.dialogs.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
struct Recorder {
    replies: Arc<Mutex<Vec<MethodReply>>>,
}

impl Recorder {
    fn replies(&self) -> Vec<MethodReply> {
        self.replies.lock().clone()
    }
}

impl MethodResponder for Recorder {
    fn success(&self, result: Value) {
        self.replies.lock().push(MethodReply::Success(result));
    }
    fn error(&self, code: String, message: String, details: Option<String>) {
        self.replies.lock().push(MethodReply::Error {
            code,
            message,
            details,
        });
    }
    fn not_implemented(&self) {
        self.replies.lock().push(MethodReply::NotImplemented);
    }
}

/// Isolated configuration store; keeps tests away from the process-wide one.
fn isolated_store() -> &'static ConfigStore {
    Box::leak(Box::new(ConfigStore::new()))
}

/// Bridge bound to `host` with a UI surface already attached.
fn attached_bridge(host: &Arc<FakeHost>) -> (BackgroundBridge, FakeUi) {
    let bridge = BackgroundBridge::with_config_store(host.clone(), isolated_store());
    let ui = FakeUi::new();
    bridge.attach_ui_surface(Box::new(ui.clone()));
    (bridge, ui)
}

fn code_of(reply: &MethodReply) -> &str {
    match reply {
        MethodReply::Error { code, .. } => code,
        other => panic!("expected an error reply, got {other:?}"),
    }
}

// ============================================================================
// Test 1: the full grant walkthrough
// ============================================================================

/// An app starts with the exemption not yet granted, initializes (which
/// shows the dialog), the user grants it, and background execution is
/// enabled and later disabled. The host must see exactly one start command
/// followed by one shutdown command.
#[tokio::test]
async fn test_full_grant_walkthrough() {
    let host = FakeHost::new(33, true, false);
    let (bridge, ui) = attached_bridge(&host);

    // initialize parks its completion behind the dialog
    let init = Recorder::default();
    bridge.handle(
        MethodCall::with_arguments(
            "initialize",
            json!({ "notificationTitle": "Tracking run" }),
        ),
        Box::new(init.clone()),
    );
    assert_eq!(ui.dialogs.load(Ordering::SeqCst), 1, "dialog must be shown");
    assert!(init.replies().is_empty(), "must not resolve before the user does");

    // the user grants the exemption
    host.battery.store(true, Ordering::SeqCst);
    bridge.on_battery_exemption_result(true);
    assert_eq!(
        init.replies(),
        vec![MethodReply::Success(Value::Bool(true))],
        "initialize must resolve with success after the dialog"
    );

    let has = bridge
        .handle_call(MethodCall::new("hasPermissions"))
        .await;
    assert_eq!(has, MethodReply::Success(Value::Bool(true)));

    let enabled = bridge
        .handle_call(MethodCall::new("enableBackgroundExecution"))
        .await;
    assert_eq!(enabled, MethodReply::Success(Value::Bool(true)));

    let disabled = bridge
        .handle_call(MethodCall::new("disableBackgroundExecution"))
        .await;
    assert_eq!(disabled, MethodReply::Success(Value::Bool(true)));

    assert_eq!(
        host.launches(),
        vec![
            ServiceLaunch {
                action: ServiceAction::Start,
                mode: LaunchMode::Foreground,
            },
            ServiceLaunch {
                action: ServiceAction::Shutdown,
                mode: LaunchMode::Foreground,
            },
        ],
        "exactly one start and one shutdown, in order"
    );
}

// ============================================================================
// Test 2: the permission ladder
// ============================================================================

/// With both permissions missing the wake-lock error wins; with only the
/// exemption missing the battery message is reported. No service command
/// may be issued either way.
#[tokio::test]
async fn test_enable_permission_ladder() {
    let host = FakeHost::new(33, false, false);
    let (bridge, _ui) = attached_bridge(&host);

    let reply = bridge
        .handle_call(MethodCall::new("enableBackgroundExecution"))
        .await;
    match &reply {
        MethodReply::Error { code, message, .. } => {
            assert_eq!(code, "PermissionError");
            assert!(message.contains("WAKE_LOCK"), "{message}");
        }
        other => panic!("expected an error reply, got {other:?}"),
    }

    host.wake.store(true, Ordering::SeqCst);
    let reply = bridge
        .handle_call(MethodCall::new("enableBackgroundExecution"))
        .await;
    match &reply {
        MethodReply::Error { code, message, .. } => {
            assert_eq!(code, "PermissionError");
            assert!(message.contains("battery optimizations"), "{message}");
        }
        other => panic!("expected an error reply, got {other:?}"),
    }

    assert!(host.launches().is_empty(), "no command without permissions");
}

// ============================================================================
// Test 3: exemption resolution fires exactly once, even on deny
// ============================================================================

#[test]
fn test_exemption_resolves_once_even_when_denied() {
    let host = FakeHost::new(33, true, false);
    let (bridge, ui) = attached_bridge(&host);

    let init = Recorder::default();
    bridge.handle(MethodCall::new("initialize"), Box::new(init.clone()));
    assert_eq!(ui.dialogs.load(Ordering::SeqCst), 1);

    // the user denies; the call still resolves with success and the app is
    // expected to re-check hasPermissions
    bridge.on_battery_exemption_result(false);
    bridge.on_battery_exemption_result(false);
    bridge.on_battery_exemption_result(true);

    assert_eq!(
        init.replies(),
        vec![MethodReply::Success(Value::Bool(true))],
        "only the first dialog outcome may resolve the call"
    );

    let has = Recorder::default();
    bridge.handle(MethodCall::new("hasPermissions"), Box::new(has.clone()));
    assert_eq!(
        has.replies(),
        vec![MethodReply::Success(Value::Bool(false))],
        "a denied exemption leaves hasPermissions false"
    );
}

// ============================================================================
// Test 4: detaching the surface abandons the pending completion
// ============================================================================

#[test]
fn test_detach_abandons_pending_completion() {
    let host = FakeHost::new(33, true, false);
    let (bridge, ui) = attached_bridge(&host);

    let init = Recorder::default();
    bridge.handle(MethodCall::new("initialize"), Box::new(init.clone()));
    assert_eq!(ui.dialogs.load(Ordering::SeqCst), 1);

    bridge.detach_ui_surface();
    bridge.on_battery_exemption_result(true);
    assert!(
        init.replies().is_empty(),
        "a completion abandoned by detach must never resolve"
    );

    // a fresh surface starts clean: the old completion stays abandoned
    bridge.attach_ui_surface(Box::new(FakeUi::new()));
    bridge.on_battery_exemption_result(true);
    assert!(init.replies().is_empty());
}

// ============================================================================
// Test 5: configuration round-trips through initialize
// ============================================================================

/// Every supplied field must be stored verbatim, and omitted fields must
/// keep their previous values on later calls, the text field included.
#[test]
fn test_configuration_round_trip_and_partial_update() {
    let host = FakeHost::new(33, true, true);
    let store = isolated_store();
    let bridge = BackgroundBridge::with_config_store(host.clone(), store);
    bridge.attach_ui_surface(Box::new(FakeUi::new()));

    let first = Recorder::default();
    bridge.handle(
        MethodCall::with_arguments(
            "initialize",
            json!({
                "notificationTitle": "Workout active",
                "notificationText": "Distance is being recorded",
                "notificationImportance": -1,
                "notificationIconName": "ic_run",
                "notificationIconDefType": "drawable",
            }),
        ),
        Box::new(first.clone()),
    );
    assert_eq!(first.replies(), vec![MethodReply::Success(Value::Bool(true))]);

    let stored = store.snapshot();
    assert_eq!(stored.title, "Workout active");
    assert_eq!(stored.text, "Distance is being recorded");
    assert_eq!(stored.importance, NotificationImportance::Low);
    assert_eq!(stored.icon_name, "ic_run");
    assert_eq!(stored.icon_def_type, "drawable");

    // a later partial update keeps everything it does not name
    let second = Recorder::default();
    bridge.handle(
        MethodCall::with_arguments(
            "initialize",
            json!({ "notificationTitle": "Cooling down" }),
        ),
        Box::new(second.clone()),
    );
    assert_eq!(second.replies(), vec![MethodReply::Success(Value::Bool(true))]);

    let updated = store.snapshot();
    assert_eq!(updated.title, "Cooling down");
    assert_eq!(updated.text, "Distance is being recorded");
    assert_eq!(updated.importance, NotificationImportance::Low);
    assert_eq!(updated.icon_name, "ic_run");
}

// ============================================================================
// Test 6: disable needs neither permissions nor a surface
// ============================================================================

#[tokio::test]
async fn test_disable_works_without_surface_or_permissions() {
    let host = FakeHost::new(24, false, false);
    let bridge = BackgroundBridge::with_config_store(host.clone(), isolated_store());

    let reply = bridge
        .handle_call(MethodCall::new("disableBackgroundExecution"))
        .await;
    assert_eq!(reply, MethodReply::Success(Value::Bool(true)));

    assert_eq!(
        host.launches(),
        vec![ServiceLaunch {
            action: ServiceAction::Shutdown,
            mode: LaunchMode::Plain,
        }],
        "below the threshold the shutdown must use a plain start"
    );
}

// ============================================================================
// Test 7: unresolvable icons are rejected before anything is stored
// ============================================================================

#[tokio::test]
async fn test_unresolvable_icon_is_rejected_then_recoverable() {
    let host = FakeHost::new(33, true, true);
    let store = isolated_store();
    let bridge = BackgroundBridge::with_config_store(host.clone(), store);
    bridge.attach_ui_surface(Box::new(FakeUi::new()));

    let reply = bridge
        .handle_call(MethodCall::with_arguments(
            "initialize",
            json!({
                "notificationTitle": "Must not stick",
                "notificationIconName": "ic_missing",
            }),
        ))
        .await;
    assert_eq!(code_of(&reply), "ResourceError");
    assert_eq!(store.snapshot().text, DEFAULT_NOTIFICATION_TEXT);
    assert_ne!(store.snapshot().title, "Must not stick");

    // the same call with a resolvable icon goes through
    let reply = bridge
        .handle_call(MethodCall::with_arguments(
            "initialize",
            json!({
                "notificationTitle": "Sticks now",
                "notificationIconName": "ic_present",
            }),
        ))
        .await;
    assert_eq!(reply, MethodReply::Success(Value::Bool(true)));
    assert_eq!(store.snapshot().title, "Sticks now");
    assert_eq!(store.snapshot().icon_name, "ic_present");
}

// ============================================================================
// Test 8: version query and unknown methods
// ============================================================================

#[tokio::test]
async fn test_version_query_and_unknown_methods() {
    let host = FakeHost::new(33, true, true);
    let (bridge, _ui) = attached_bridge(&host);

    let version = bridge
        .handle_call(MethodCall::new("getPlatformVersion"))
        .await;
    assert_eq!(
        version,
        MethodReply::Success(Value::String("FakeOS 14".to_string()))
    );

    let unknown = bridge.handle_call(MethodCall::new("stopGps")).await;
    assert_eq!(unknown, MethodReply::NotImplemented);
}
