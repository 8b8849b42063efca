//! Error types with miette integration

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = SyncError> = std::result::Result<T, E>;

#[derive(Error, Debug, Diagnostic)]
pub enum SyncError {
    /// The repository does not look like a WordPress site, or a file is missing
    #[error("Missing {what}: {}", path.display())]
    #[diagnostic(
        code(composer_sync::not_found),
        help("composer-sync expects a WordPress root with a wp-content/plugins folder")
    )]
    NotFound { what: String, path: PathBuf },

    #[error("Failed to parse {}", path.display())]
    #[diagnostic(
        code(composer_sync::parse),
        help("Fix the JSON by hand; the file is never regenerated from scratch")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} is not a usable composer manifest: {reason}", path.display())]
    #[diagnostic(code(composer_sync::invalid_manifest))]
    InvalidManifest { path: PathBuf, reason: String },

    #[error("Failed to render {name} template")]
    #[diagnostic(
        code(composer_sync::template),
        help("Templates are MiniJinja; `plugin` is the only variable available")
    )]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("I/O error on {}", path.display())]
    #[diagnostic(code(composer_sync::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Registry probe for '{plugin}' failed: {message}")]
    #[diagnostic(code(composer_sync::probe))]
    Probe { plugin: String, message: String },

    #[error("GitHub API call '{action}' failed with status {status}: {body}")]
    #[diagnostic(code(composer_sync::publish))]
    Publish {
        action: String,
        status: u16,
        body: String,
    },

    #[error("GitHub API call '{action}' could not be sent")]
    #[diagnostic(code(composer_sync::http))]
    Http {
        action: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("git {command} failed: {stderr}")]
    #[diagnostic(code(composer_sync::git))]
    Git { command: String, stderr: String },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(composer_sync::config))]
    Config(String),
}

impl SyncError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn not_found(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            what: what.into(),
            path: path.into(),
        }
    }
}
