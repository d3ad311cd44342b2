// Notification configuration for the background service.
//
// The values live in process-wide state: the bridge writes them during
// `initialize`, the background service reads them later when it builds its
// persistent notification. The two sides never run concurrently in
// practice (the RPC thread writes before the service is started), so the
// store assumes a single writer and does not arbitrate beyond the lock.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const DEFAULT_NOTIFICATION_TITLE: &str = "staywake foreground service";
pub const DEFAULT_NOTIFICATION_TEXT: &str = "Keeps the application running in the background";
pub const DEFAULT_ICON_NAME: &str = "ic_launcher";
pub const DEFAULT_ICON_DEF_TYPE: &str = "mipmap";

/// Wire keys of the `initialize` argument bundle.
pub mod keys {
    pub const NOTIFICATION_TITLE: &str = "notificationTitle";
    pub const NOTIFICATION_TEXT: &str = "notificationText";
    pub const NOTIFICATION_IMPORTANCE: &str = "notificationImportance";
    pub const NOTIFICATION_ICON_NAME: &str = "notificationIconName";
    pub const NOTIFICATION_ICON_DEF_TYPE: &str = "notificationIconDefType";
}

// ============================================================================
// IMPORTANCE
// ============================================================================

/// Notification importance, carried on the wire as a signed ordinal
/// (-2 ..= 2) matching the platform's priority constants.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum,
)]
pub enum NotificationImportance {
    Min,
    Low,
    #[default]
    Default,
    High,
    Max,
}

impl NotificationImportance {
    /// The wire ordinal of this level.
    pub fn ordinal(self) -> i32 {
        match self {
            NotificationImportance::Min => -2,
            NotificationImportance::Low => -1,
            NotificationImportance::Default => 0,
            NotificationImportance::High => 1,
            NotificationImportance::Max => 2,
        }
    }

    /// Parse a wire ordinal. Returns `None` for values outside -2 ..= 2.
    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        match ordinal {
            -2 => Some(NotificationImportance::Min),
            -1 => Some(NotificationImportance::Low),
            0 => Some(NotificationImportance::Default),
            1 => Some(NotificationImportance::High),
            2 => Some(NotificationImportance::Max),
            _ => None,
        }
    }
}

impl fmt::Display for NotificationImportance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationImportance::Min => "min",
            NotificationImportance::Low => "low",
            NotificationImportance::Default => "default",
            NotificationImportance::High => "high",
            NotificationImportance::Max => "max",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// The persistent-notification settings the background service renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct NotificationConfig {
    pub title: String,
    pub text: String,
    pub importance: NotificationImportance,
    /// Resource name of the notification icon, e.g. `ic_launcher`.
    pub icon_name: String,
    /// Resource category the icon lives in, e.g. `mipmap` or `drawable`.
    pub icon_def_type: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_NOTIFICATION_TITLE.to_string(),
            text: DEFAULT_NOTIFICATION_TEXT.to_string(),
            importance: NotificationImportance::Default,
            icon_name: DEFAULT_ICON_NAME.to_string(),
            icon_def_type: DEFAULT_ICON_DEF_TYPE.to_string(),
        }
    }
}

/// A partial configuration parsed from an `initialize` argument bundle.
/// Absent fields keep the previously stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub title: Option<String>,
    pub text: Option<String>,
    pub importance: Option<NotificationImportance>,
    pub icon_name: Option<String>,
    pub icon_def_type: Option<String>,
}

impl ConfigUpdate {
    /// Extract the known wire keys from a JSON argument bundle.
    ///
    /// Parsing is lenient: absent keys, nulls and wrong-typed values all
    /// mean "keep the previous value" (wrong types are logged).
    pub fn from_arguments(arguments: &Value) -> Self {
        let importance = match arguments.get(keys::NOTIFICATION_IMPORTANCE) {
            None | Some(Value::Null) => None,
            Some(raw) => {
                let parsed = raw
                    .as_i64()
                    .and_then(|ordinal| i32::try_from(ordinal).ok())
                    .and_then(NotificationImportance::from_ordinal);
                if parsed.is_none() {
                    tracing::warn!(value = %raw, "ignoring unrecognized notification importance");
                }
                parsed
            }
        };

        Self {
            title: string_field(arguments, keys::NOTIFICATION_TITLE),
            text: string_field(arguments, keys::NOTIFICATION_TEXT),
            importance,
            icon_name: string_field(arguments, keys::NOTIFICATION_ICON_NAME),
            icon_def_type: string_field(arguments, keys::NOTIFICATION_ICON_DEF_TYPE),
        }
    }

    /// Whether the update changes the notification icon.
    pub fn touches_icon(&self) -> bool {
        self.icon_name.is_some() || self.icon_def_type.is_some()
    }
}

fn string_field(arguments: &Value, key: &str) -> Option<String> {
    match arguments.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => {
            tracing::warn!(key, value = %other, "ignoring wrong-typed configuration field");
            None
        }
    }
}

// ============================================================================
// PROCESS-WIDE STORE
// ============================================================================

/// Holder for the process-wide notification configuration.
///
/// The slot starts empty and materializes the defaults on first read or
/// write, which keeps the static const-constructible.
pub struct ConfigStore {
    slot: RwLock<Option<NotificationConfig>>,
}

static PROCESS_CONFIG: ConfigStore = ConfigStore::new();

impl ConfigStore {
    pub const fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Current configuration (defaults until the first `apply`).
    pub fn snapshot(&self) -> NotificationConfig {
        self.slot.read().clone().unwrap_or_default()
    }

    /// Merge an update into the stored configuration and return the result.
    pub fn apply(&self, update: &ConfigUpdate) -> NotificationConfig {
        let mut slot = self.slot.write();
        let mut config = slot.take().unwrap_or_default();
        if let Some(title) = &update.title {
            config.title = title.clone();
        }
        if let Some(text) = &update.text {
            config.text = text.clone();
        }
        if let Some(importance) = update.importance {
            config.importance = importance;
        }
        if let Some(icon_name) = &update.icon_name {
            config.icon_name = icon_name.clone();
        }
        if let Some(icon_def_type) = &update.icon_def_type {
            config.icon_def_type = icon_def_type.clone();
        }
        *slot = Some(config.clone());
        config
    }

    /// The icon `(name, def_type)` that would be in effect after `update`,
    /// without committing anything. Used to validate icons up front.
    pub fn effective_icon(&self, update: &ConfigUpdate) -> (String, String) {
        let current = self.snapshot();
        (
            update.icon_name.clone().unwrap_or(current.icon_name),
            update.icon_def_type.clone().unwrap_or(current.icon_def_type),
        )
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The store the bridge and the background service share by default.
pub fn process_config() -> &'static ConfigStore {
    &PROCESS_CONFIG
}

/// Snapshot of the process-wide configuration, exported for the
/// service-side notification builder.
#[uniffi::export]
pub fn current_notification_config() -> NotificationConfig {
    process_config().snapshot()
}

// ============================================================================
// TESTS
// ============================================================================
