// Demo: Background Execution Bridge
//
// Drives the bridge with a simulated host platform: queries the version,
// walks the permission flow (including the exemption dialog round trip),
// enables background execution and shuts it down again. No real device
// APIs are involved; every platform hook is faked in-process.

use serde_json::json;
use staywake_core::{
    current_notification_config, BackgroundBridge, HostPlatform, MethodCall, ServiceLaunch,
    UiSurface,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct SimHost {
    api_level: u32,
    wake: AtomicBool,
    battery: AtomicBool,
}

impl HostPlatform for SimHost {
    fn os_version(&self) -> String {
        "SimOS 14 (demo build)".to_string()
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

    fn has_resource(&self, name: String, def_type: String) -> bool {
        println!("   [host] resource lookup: {def_type}/{name} -> found");
        true
    }

    fn launch_service(&self, launch: ServiceLaunch) {
        println!(
            "   [host] service command received: {} ({} start)",
            launch.action, launch.mode
        );
    }
}

struct SimUi;

impl UiSurface for SimUi {
    fn show_battery_exemption_dialog(&self) {
        println!("   [ui] system exemption dialog is on screen");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("📱 Staywake Bridge Demo");
    println!("=======================\n");

    let host = Arc::new(SimHost {
        api_level: 30,
        wake: AtomicBool::new(true),
        battery: AtomicBool::new(false),
    });
    let bridge = Arc::new(BackgroundBridge::new(host.clone()));
    bridge.attach_ui_surface(Box::new(SimUi));

    println!("🔍 Step 1: Platform version");
    let version = bridge
        .handle_call(MethodCall::new("getPlatformVersion"))
        .await;
    println!("   reply: {version:?}\n");

    println!("🔍 Step 2: Permission state before the exemption");
    let has = bridge.handle_call(MethodCall::new("hasPermissions")).await;
    println!("   reply: {has:?}\n");

    println!("🔋 Step 3: Initialize (triggers the exemption dialog)");
    let pending = tokio::spawn({
        let bridge = bridge.clone();
        async move {
            bridge
                .handle_call(MethodCall::with_arguments(
                    "initialize",
                    json!({
                        "notificationTitle": "Demo tracker",
                        "notificationText": "Recording in the background",
                        "notificationImportance": 1,
                        "notificationIconName": "ic_demo",
                        "notificationIconDefType": "drawable",
                    }),
                ))
                .await
        }
    });

    // give the call time to park behind the dialog
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("   (the user taps \"allow\")");
    host.battery.store(true, Ordering::SeqCst);
    bridge.on_battery_exemption_result(true);

    let reply = pending.await?;
    println!("   reply: {reply:?}\n");

    println!("🔍 Step 4: Permission state after the grant");
    let has = bridge.handle_call(MethodCall::new("hasPermissions")).await;
    println!("   reply: {has:?}\n");

    println!("✅ Step 5: Enable background execution");
    let enabled = bridge
        .handle_call(MethodCall::new("enableBackgroundExecution"))
        .await;
    println!("   reply: {enabled:?}");
    let config = current_notification_config();
    println!(
        "   service notification: \"{}\" / \"{}\" ({})\n",
        config.title, config.text, config.importance
    );

    println!("🛑 Step 6: Disable background execution");
    let disabled = bridge
        .handle_call(MethodCall::new("disableBackgroundExecution"))
        .await;
    println!("   reply: {disabled:?}\n");

    println!("✨ Demo Complete!");
    println!("Try the integration tests for more:");
    println!("  cargo test --test integration_bridge_flow -- --nocapture\n");

    Ok(())
}
