// Host platform hooks.
//
// The embedding application implements these callback interfaces and hands
// them to the bridge. Every permission query and service command goes
// through them, which keeps the core free of any direct platform calls.

use crate::service::ServiceLaunch;

/// Platform queries and commands, implemented by the embedder's glue code.
///
/// All methods are synchronous and must return promptly; none of them may
/// block on user interaction or IPC round trips.
#[uniffi::export(callback_interface)]
pub trait HostPlatform: Send + Sync {
    /// Human-readable OS version of the host device.
    fn os_version(&self) -> String;

    /// Platform API level, used to pick the service start variant.
    fn api_level(&self) -> u32;

    /// Whether the wake-lock permission is declared for the application.
    fn is_wake_lock_granted(&self) -> bool;

    /// Whether the application is currently exempt from battery
    /// optimizations. Queried live on every use, never cached.
    fn is_ignoring_battery_optimizations(&self) -> bool;

    /// Whether `def_type/name` resolves in the application's resource table.
    fn has_resource(&self, name: String, def_type: String) -> bool;

    /// Submit a service command. Fire-and-forget: the host must not block
    /// and never reports completion back.
    fn launch_service(&self, launch: ServiceLaunch);
}

/// A foreground UI surface able to present the system exemption dialog.
#[uniffi::export(callback_interface)]
pub trait UiSurface: Send + Sync {
    /// Present the battery-optimization exemption dialog and return
    /// immediately. The outcome arrives later through
    /// `BackgroundBridge::on_battery_exemption_result`.
    fn show_battery_exemption_dialog(&self);
}
