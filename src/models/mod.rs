pub mod settings;

// Re-export commonly used types
pub use settings::{
    ComposerSettings, DelaySettings, Endpoints, IssueSettings, PublishSettings, Settings,
};
