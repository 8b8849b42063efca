mod generate;
mod list;
mod run;

pub use generate::{GenerateArgs, generate_command};
pub use list::{ListArgs, list_command};
pub use run::{RunArgs, run_command};

use std::path::Path;

use composer_sync::models::Settings;

/// `<organization>/<directory name>` for sites without an explicit name
fn default_project_name(root: &Path, settings: &Settings) -> String {
    let dir_name = std::fs::canonicalize(root)
        .ok()
        .and_then(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "site".to_string());
    format!("{}/{dir_name}", settings.organization)
}
