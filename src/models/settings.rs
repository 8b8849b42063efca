use serde::{Deserialize, Serialize};

/// Tunable settings for a sync run.
///
/// Built-in values live in `defaults/settings.yaml`; a user file only needs to
/// contain the keys it wants to change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// GitHub organisation that hosts internal plugins
    pub organization: String,

    /// Description written into a freshly generated composer.json
    pub description: String,

    pub composer: ComposerSettings,
    pub endpoints: Endpoints,
    pub issues: IssueSettings,
    pub publish: PublishSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComposerSettings {
    pub internal_namespace: String,
    pub public_namespace: String,
    pub public_repository: String,
    pub installers_package: String,
    pub installers_version: String,
    pub constraint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Endpoints {
    pub github_api: String,
    pub github_web: String,
    pub wordpress_org: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IssueSettings {
    /// MiniJinja template, rendered with `plugin`
    pub title: String,

    /// Overrides the built-in body template when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishSettings {
    pub branch_prefix: String,
    pub commit_message: String,
    pub delays: DelaySettings,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DelaySettings {
    pub approve_ms: u64,
    pub merge_ms: u64,
    pub delete_branch_ms: u64,
}

impl ComposerSettings {
    pub fn internal_package(&self, plugin: &str) -> String {
        format!("{}/{plugin}", self.internal_namespace)
    }

    pub fn public_package(&self, plugin: &str) -> String {
        format!("{}/{plugin}", self.public_namespace)
    }
}

impl Settings {
    /// VCS url of an internal plugin's repository
    pub fn internal_repository_url(&self, plugin: &str) -> String {
        format!(
            "{}/{}/{plugin}",
            self.endpoints.github_web.trim_end_matches('/'),
            self.organization
        )
    }
}
