//! Creating and amending composer.json from the plugin inventory
//!
//! A build is a fold over the inventory: each plugin is classified once and
//! [`apply`] turns `(manifest, plugin, classification)` into the next
//! manifest. Generation starts from the skeleton; an update starts from the
//! existing file and first skips plugins that are ignored or already required.

use super::Manifest;
use crate::models::Settings;
use crate::registry::{Classification, PluginProbe, classify};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Fresh manifest from the skeleton
    Generate,
    /// Amend an existing manifest
    Update,
}

/// What happened to one plugin during a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginStatus {
    /// Listed in `extra.ignore`
    Ignored,
    /// Already required under the given package name
    Present(String),
    Classified(Classification),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginReport {
    pub plugin: String,
    pub status: PluginStatus,
}

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub manifest: Manifest,
    /// Plugins that could not be resolved in this run, in inventory order
    pub failed: Vec<String>,
    pub report: Vec<PluginReport>,
}

pub struct ManifestBuilder<'a, P: PluginProbe + ?Sized> {
    probe: &'a P,
    settings: &'a Settings,
}

impl<'a, P: PluginProbe + ?Sized> ManifestBuilder<'a, P> {
    pub fn new(probe: &'a P, settings: &'a Settings) -> Self {
        Self { probe, settings }
    }

    /// Build a new manifest for the project `name`
    pub async fn generate(&self, name: &str, plugins: &[String]) -> BuildOutcome {
        let skeleton = Manifest::skeleton(name, self.settings);
        self.fold(skeleton, plugins, BuildMode::Generate).await
    }

    /// Add plugins missing from `existing`
    pub async fn update(&self, existing: Manifest, plugins: &[String]) -> BuildOutcome {
        self.fold(existing, plugins, BuildMode::Update).await
    }

    pub async fn fold(
        &self,
        initial: Manifest,
        plugins: &[String],
        mode: BuildMode,
    ) -> BuildOutcome {
        let mut manifest = initial;
        let mut failed = Vec::new();
        let mut report = Vec::with_capacity(plugins.len());

        for plugin in plugins {
            if mode == BuildMode::Update {
                if manifest.is_ignored(plugin) {
                    tracing::info!("Plugin is ignored: {plugin}");
                    report.push(PluginReport {
                        plugin: plugin.clone(),
                        status: PluginStatus::Ignored,
                    });
                    continue;
                }

                if let Some(key) = manifest.required_key(plugin) {
                    tracing::info!("Plugin already exists in Composer: {plugin}");
                    let status = PluginStatus::Present(key.to_string());
                    report.push(PluginReport {
                        plugin: plugin.clone(),
                        status,
                    });
                    continue;
                }
            }

            let classification = classify(self.probe, plugin).await;
            if !apply(&mut manifest, plugin, classification, self.settings) {
                failed.push(plugin.clone());
            }
            report.push(PluginReport {
                plugin: plugin.clone(),
                status: PluginStatus::Classified(classification),
            });
        }

        BuildOutcome {
            manifest,
            failed,
            report,
        }
    }
}

/// Record one classified plugin in the manifest.
///
/// Returns false for unresolved plugins, which leave the manifest as is.
pub fn apply(
    manifest: &mut Manifest,
    plugin: &str,
    classification: Classification,
    settings: &Settings,
) -> bool {
    let composer = &settings.composer;

    match classification {
        Classification::Internal => {
            // One VCS repository per internal plugin
            manifest.push_repository("vcs", &settings.internal_repository_url(plugin));
            manifest.require(composer.internal_package(plugin), &composer.constraint);
            tracing::info!("Added internal plugin: {plugin}");
            true
        }
        Classification::Public => {
            if !manifest.has_repository_url(&composer.public_repository) {
                manifest.push_repository("composer", &composer.public_repository);
            }
            manifest.require(composer.public_package(plugin), &composer.constraint);
            tracing::info!("Added public plugin: {plugin}");
            true
        }
        Classification::Unresolved(reason) => {
            tracing::warn!("Could not resolve plugin {plugin} ({reason:?})");
            false
        }
    }
}
