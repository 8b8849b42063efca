//! Plugin classification against the organisation's GitHub and wordpress.org
//!
//! Both lookups sit behind [`PluginProbe`] so the manifest builder can be
//! driven by a deterministic fake in tests.

mod http;

pub use http::HttpProbe;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Directory names that can be looked up remotely
static PLUGIN_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("valid slug regex"));

/// Answer of the public registry lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicProbe {
    /// Plugin page served directly
    Found,
    /// wordpress.org sends unknown slugs to its search page
    Redirected,
    /// Explicit not-found response
    Missing,
    /// Transport failure or server error; says nothing about the plugin
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    NotFound,
    ProbeFailed,
    InvalidName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Internal,
    Public,
    Unresolved(UnresolvedReason),
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Internal => write!(f, "internal"),
            Classification::Public => write!(f, "public"),
            Classification::Unresolved(UnresolvedReason::NotFound) => write!(f, "not found"),
            Classification::Unresolved(UnresolvedReason::ProbeFailed) => {
                write!(f, "lookup failed")
            }
            Classification::Unresolved(UnresolvedReason::InvalidName) => {
                write!(f, "invalid name")
            }
        }
    }
}

#[async_trait]
pub trait PluginProbe: Send + Sync {
    /// Whether the organisation hosts a repository named after the plugin
    async fn probe_internal(&self, plugin: &str) -> bool;

    /// Look the plugin up in the public registry
    async fn probe_public(&self, plugin: &str) -> PublicProbe;
}

pub fn is_valid_slug(plugin: &str) -> bool {
    PLUGIN_SLUG.is_match(plugin)
}

/// Classify one plugin. The internal lookup runs first and wins.
pub async fn classify<P>(probe: &P, plugin: &str) -> Classification
where
    P: PluginProbe + ?Sized,
{
    if !is_valid_slug(plugin) {
        tracing::warn!("Not looking up '{plugin}': not a valid plugin slug");
        return Classification::Unresolved(UnresolvedReason::InvalidName);
    }

    let classification = if probe.probe_internal(plugin).await {
        Classification::Internal
    } else {
        match probe.probe_public(plugin).await {
            PublicProbe::Found => Classification::Public,
            PublicProbe::Redirected | PublicProbe::Missing => {
                Classification::Unresolved(UnresolvedReason::NotFound)
            }
            PublicProbe::Failed => Classification::Unresolved(UnresolvedReason::ProbeFailed),
        }
    };
    tracing::debug!("Plugin {plugin} classified as {classification}");
    classification
}
