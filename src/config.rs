//! Run configuration: repository coordinates, credentials, settings file

use crate::defaults::merge_with_defaults;
use crate::error::{Result, SyncError};
use crate::models::Settings;
use secrecy::SecretString;
use serde_json::Value as JsonValue;
use std::fmt;
use std::path::Path;

/// Settings file picked up from the working directory when present
pub const DEFAULT_SETTINGS_FILE: &str = "composer-sync.yml";

/// `owner/repo` of the site repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub owner: String,
    pub name: String,
}

impl RepoCoordinates {
    pub fn parse(value: &str) -> Result<Self> {
        match value.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(SyncError::Config(format!(
                "repository must look like owner/repo, got '{value}'"
            ))),
        }
    }
}

impl fmt::Display for RepoCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Branch name from a ref such as `refs/heads/feature/x`
pub fn branch_from_ref(git_ref: &str) -> Result<String> {
    let branch = git_ref
        .strip_prefix("refs/heads/")
        .or_else(|| (!git_ref.starts_with("refs/")).then_some(git_ref))
        .filter(|branch| !branch.is_empty());

    branch.map(str::to_string).ok_or_else(|| {
        SyncError::Config(format!("'{git_ref}' does not name a branch"))
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

pub struct Credentials {
    pub token: SecretString,
    /// Second identity used to approve the pull request; enables auto-merge
    pub approval_token: Option<SecretString>,
}

impl Credentials {
    /// Empty strings count as absent, as GitHub Actions passes unset inputs that way
    pub fn new(token: String, approval_token: Option<String>) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(SyncError::Config("a GitHub token is required".to_string()));
        }
        Ok(Self {
            token: SecretString::from(token),
            approval_token: approval_token
                .filter(|value| !value.trim().is_empty())
                .map(SecretString::from),
        })
    }
}

/// Load settings, layering an optional YAML file over the built-in defaults.
///
/// An explicitly given file must exist; without one, `composer-sync.yml` in
/// the current directory is used if present.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let candidate = match path {
        Some(path) => {
            if !path.is_file() {
                return Err(SyncError::not_found("settings file", path));
            }
            Some(path.to_path_buf())
        }
        None => Some(Path::new(DEFAULT_SETTINGS_FILE).to_path_buf()).filter(|p| p.is_file()),
    };

    let Some(file) = candidate else {
        return merge_with_defaults(JsonValue::Object(Default::default()));
    };

    tracing::debug!("Reading settings from {}", file.display());
    let content = std::fs::read_to_string(&file).map_err(|e| SyncError::io(&file, e))?;
    if content.trim().is_empty() {
        return merge_with_defaults(JsonValue::Object(Default::default()));
    }

    let overrides: JsonValue = serde_yaml::from_str(&content)
        .map_err(|e| SyncError::Config(format!("{}: {e}", file.display())))?;
    merge_with_defaults(overrides)
}
