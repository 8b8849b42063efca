//! Discovery of the plugin directories of a WordPress site

use crate::error::{Result, SyncError};
use std::path::{Path, PathBuf};

pub const CONTENT_DIR: &str = "wp-content";
pub const PLUGINS_DIR: &str = "plugins";

/// Path of the plugins folder below a WordPress root
pub fn plugins_path(root: &Path) -> PathBuf {
    root.join(CONTENT_DIR).join(PLUGINS_DIR)
}

/// Verify that `root` looks like a WordPress site.
///
/// Nothing may be touched when this fails.
pub fn check_layout(root: &Path) -> Result<()> {
    let content = root.join(CONTENT_DIR);
    if !content.is_dir() {
        return Err(SyncError::not_found(format!("folder {CONTENT_DIR}"), content));
    }

    let plugins = plugins_path(root);
    if !plugins.is_dir() {
        return Err(SyncError::not_found(
            format!("folder {CONTENT_DIR}/{PLUGINS_DIR}"),
            plugins,
        ));
    }

    Ok(())
}

/// List plugin names, one per directory in `wp-content/plugins`.
///
/// Files are skipped. Order follows the directory listing.
pub fn list_plugins(root: &Path) -> Result<Vec<String>> {
    let dir = plugins_path(root);
    let mut plugins = Vec::new();

    for entry in std::fs::read_dir(&dir).map_err(|e| SyncError::io(&dir, e))? {
        let entry = entry.map_err(|e| SyncError::io(&dir, e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| SyncError::io(entry.path(), e))?;

        if !file_type.is_dir() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => plugins.push(name),
            Err(raw) => {
                tracing::warn!("Skipping plugin directory with non UTF-8 name: {raw:?}");
            }
        }
    }

    tracing::debug!("Found {} plugin directories in {}", plugins.len(), dir.display());
    Ok(plugins)
}
