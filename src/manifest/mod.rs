//! The composer.json document and the rules for editing it

pub mod builder;
pub mod store;

use crate::models::Settings;
use serde_json::{Map as JsonMap, Value as JsonValue, json};

pub use builder::{BuildMode, BuildOutcome, ManifestBuilder, PluginReport, PluginStatus};

pub const MANIFEST_FILE: &str = "composer.json";

/// A composer.json document.
///
/// Backed by an insertion-ordered JSON object so that keys this tool does not
/// manage survive a load/store cycle in their original position.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    doc: JsonMap<String, JsonValue>,
}

/// A `{type, url}` entry of the `repositories` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub kind: String,
    pub url: String,
}

impl Manifest {
    /// The document written when a site has no composer.json yet
    pub fn skeleton(name: &str, settings: &Settings) -> Self {
        let composer = &settings.composer;
        let mut doc = JsonMap::new();
        doc.insert("name".to_string(), json!(name));
        doc.insert("description".to_string(), json!(settings.description));
        doc.insert(
            "repositories".to_string(),
            json!([{ "type": "composer", "url": composer.public_repository }]),
        );
        doc.insert(
            "require".to_string(),
            json!({ (composer.installers_package.clone()): composer.installers_version }),
        );
        doc.insert(
            "extra".to_string(),
            json!({ "ignore": [], "installer-paths": installer_paths() }),
        );
        Self { doc }
    }

    pub(crate) fn from_object(doc: JsonMap<String, JsonValue>) -> Self {
        Self { doc }
    }

    pub fn as_value(&self) -> JsonValue {
        JsonValue::Object(self.doc.clone())
    }

    pub fn name(&self) -> Option<&str> {
        self.doc.get("name").and_then(JsonValue::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.doc.get(key)
    }

    /// Plugins listed in `extra.ignore`
    pub fn ignored(&self) -> Vec<&str> {
        self.doc
            .get("extra")
            .and_then(|extra| extra.get("ignore"))
            .and_then(JsonValue::as_array)
            .map(|list| list.iter().filter_map(JsonValue::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_ignored(&self, plugin: &str) -> bool {
        self.ignored().contains(&plugin)
    }

    /// The `require` key whose package part equals `plugin`, if any
    pub fn required_key(&self, plugin: &str) -> Option<&str> {
        self.doc
            .get("require")
            .and_then(JsonValue::as_object)?
            .keys()
            .find(|key| key.split('/').nth(1) == Some(plugin))
            .map(String::as_str)
    }

    pub fn requires(&self, package: &str) -> bool {
        self.doc
            .get("require")
            .and_then(|require| require.get(package))
            .is_some()
    }

    pub fn require_count(&self) -> usize {
        self.doc
            .get("require")
            .and_then(JsonValue::as_object)
            .map(JsonMap::len)
            .unwrap_or(0)
    }

    pub fn repositories(&self) -> Vec<Repository> {
        self.doc
            .get("repositories")
            .and_then(JsonValue::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|entry| {
                        Some(Repository {
                            kind: entry.get("type")?.as_str()?.to_string(),
                            url: entry.get("url")?.as_str()?.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_repository_url(&self, url: &str) -> bool {
        self.repositories().iter().any(|repo| repo.url == url)
    }

    /// Append a repository entry unconditionally
    pub fn push_repository(&mut self, kind: &str, url: &str) {
        let entry = json!({ "type": kind, "url": url });
        let slot = self
            .doc
            .entry("repositories".to_string())
            .or_insert_with(|| JsonValue::Array(Vec::new()));
        if let JsonValue::Array(list) = slot {
            list.push(entry);
        } else {
            *slot = JsonValue::Array(vec![entry]);
        }
    }

    /// Insert or overwrite a `require` entry
    pub fn require(&mut self, package: String, constraint: &str) {
        let constraint = JsonValue::String(constraint.to_string());
        let slot = self
            .doc
            .entry("require".to_string())
            .or_insert_with(|| JsonValue::Object(JsonMap::new()));
        if let JsonValue::Object(map) = slot {
            map.insert(package, constraint);
        } else {
            let mut map = JsonMap::new();
            map.insert(package, constraint);
            *slot = JsonValue::Object(map);
        }
    }
}

/// Install targets for WordPress package types
pub fn installer_paths() -> JsonValue {
    json!({
        "wp-content/mu-plugins/{$name}/": ["type:wordpress-muplugin"],
        "wp-content/plugins/{$name}/": ["type:wordpress-plugin"],
    })
}

/// Check the shape of the keys this tool edits.
///
/// A loaded document that passes is never silently rewritten by the
/// `push_repository` or `require`.
pub(crate) fn check_shape(doc: &JsonMap<String, JsonValue>) -> Result<(), String> {
    if let Some(repositories) = doc.get("repositories")
        && !repositories.is_array()
    {
        return Err("`repositories` must be a list".to_string());
    }

    if let Some(require) = doc.get("require")
        && !require.is_object()
    {
        return Err("`require` must be an object".to_string());
    }

    if let Some(ignore) = doc.get("extra").and_then(|extra| extra.get("ignore")) {
        let valid = ignore
            .as_array()
            .is_some_and(|list| list.iter().all(JsonValue::is_string));
        if !valid {
            return Err("`extra.ignore` must be a list of plugin names".to_string());
        }
    }

    Ok(())
}
