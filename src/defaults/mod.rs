use crate::error::{Result, SyncError};
use crate::models::Settings;
use once_cell::sync::Lazy;
use serde_json::Value as JsonValue;

// Embed the default settings YAML file at compile time
const DEFAULT_SETTINGS_YAML: &str = include_str!("settings.yaml");

/// Body of the issue filed for a plugin that could not be resolved
pub const ISSUE_BODY_TEMPLATE: &str = include_str!("issue_body.md.j2");

// Parse the default settings once at startup
pub static DEFAULT_SETTINGS: Lazy<Settings> = Lazy::new(|| {
    serde_yaml::from_str(DEFAULT_SETTINGS_YAML)
        .expect("Failed to parse default settings - this is a bug")
});

/// Merge user settings over the defaults.
///
/// Mappings merge key by key; any other value (including lists) replaces the
/// default wholesale. Null values are ignored.
pub fn merge_with_defaults(user: JsonValue) -> Result<Settings> {
    let mut base = serde_json::to_value(&*DEFAULT_SETTINGS)
        .map_err(|e| SyncError::Config(format!("cannot serialize defaults: {e}")))?;
    merge_values(&mut base, user);
    serde_json::from_value(base).map_err(|e| SyncError::Config(e.to_string()))
}

fn merge_values(base: &mut JsonValue, overrides: JsonValue) {
    match (base, overrides) {
        (JsonValue::Object(base_obj), JsonValue::Object(override_obj)) => {
            for (key, value) in override_obj {
                if value.is_null() {
                    continue;
                }
                match base_obj.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_obj.insert(key, value);
                    }
                }
            }
        }
        (base, value) => *base = value,
    }
}
