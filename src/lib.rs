pub mod config;
pub mod defaults;
pub mod error;
pub mod git;
pub mod github;
pub mod inventory;
pub mod issues;
pub mod manifest;
pub mod models;
pub mod orchestrator;
pub mod publish;
pub mod registry;

pub use error::{Result, SyncError};

/// Sent with every HTTP request
pub const USER_AGENT: &str = concat!("composer-sync/", env!("CARGO_PKG_VERSION"));
