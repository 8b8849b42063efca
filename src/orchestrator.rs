//! The sync run: inventory, manifest, issues, pull request

use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::github::HostingApi;
use crate::inventory;
use crate::issues::IssueFiler;
use crate::manifest::{BuildMode, BuildOutcome, ManifestBuilder, store};
use crate::models::Settings;
use crate::publish::{DelayPolicy, PublishPlan, PublishReport, Publisher, WorkingTree};
use crate::registry::PluginProbe;

/// Result of building the manifest for a site, before anything is written
#[derive(Debug, Clone)]
pub struct ManifestRun {
    pub mode: BuildMode,
    pub outcome: BuildOutcome,
}

/// Check the layout, take the inventory and create or update the manifest.
///
/// Updates when `root/composer.json` exists, otherwise generates one for
/// the project `name`.
pub async fn build_manifest(
    root: &Path,
    name: &str,
    settings: &Settings,
    probe: &dyn PluginProbe,
) -> Result<ManifestRun> {
    info!("Checking if is WordPress repo");
    inventory::check_layout(root)?;

    let plugins = inventory::list_plugins(root)?;
    let builder = ManifestBuilder::new(probe, settings);

    let run = if store::exists(root) {
        info!("Updating composer file");
        let existing = store::load(root)?;
        ManifestRun {
            mode: BuildMode::Update,
            outcome: builder.update(existing, &plugins).await,
        }
    } else {
        info!("Generating composer file");
        ManifestRun {
            mode: BuildMode::Generate,
            outcome: builder.generate(name, &plugins).await,
        }
    };

    Ok(run)
}

/// The hosted side of a run
pub struct Remote<'a> {
    pub api: &'a dyn HostingApi,
    /// Second identity; when present the pull request is approved and merged
    pub approver: Option<&'a dyn HostingApi>,
    pub base_branch: String,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mode: BuildMode,
    pub manifest_path: PathBuf,
    pub failed: Vec<String>,
    pub issues_created: Vec<String>,
    /// `None` when the manifest did not change
    pub publish: Option<PublishReport>,
}

pub struct Orchestrator<'a> {
    root: &'a Path,
    name: &'a str,
    settings: &'a Settings,
    probe: &'a dyn PluginProbe,
    delays: DelayPolicy,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        root: &'a Path,
        name: &'a str,
        settings: &'a Settings,
        probe: &'a dyn PluginProbe,
    ) -> Self {
        Self {
            root,
            name,
            settings,
            probe,
            delays: settings.publish.delays.into(),
        }
    }

    pub fn with_delays(mut self, delays: DelayPolicy) -> Self {
        self.delays = delays;
        self
    }

    pub async fn run(&self, tree: &dyn WorkingTree, remote: &Remote<'_>) -> Result<RunSummary> {
        let ManifestRun { mode, outcome } =
            build_manifest(self.root, self.name, self.settings, self.probe).await?;

        info!("Creating issues for missing plugins");
        let filer = IssueFiler::new(&self.settings.issues)?;
        let issues_created = filer.file(remote.api, &outcome.failed).await?;

        info!("Writing new Composer file to repo");
        let manifest_path = store::store(self.root, &outcome.manifest)?;

        let publish = if tree.has_changes().await? {
            info!("Creating branch");
            let plan = PublishPlan {
                branch: format!("{}/{}", self.settings.publish.branch_prefix, Uuid::new_v4()),
                base: remote.base_branch.clone(),
                message: self.settings.publish.commit_message.clone(),
            };

            let report = Publisher::new(tree, remote.api)
                .with_approver(remote.approver)
                .with_delays(self.delays)
                .publish(&plan)
                .await?;
            info!("Finished updating Composer file.");
            Some(report)
        } else {
            info!("No changes found. Finishing up.");
            None
        };

        Ok(RunSummary {
            mode,
            manifest_path,
            failed: outcome.failed,
            issues_created,
            publish,
        })
    }
}
