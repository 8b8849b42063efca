//! Reading and writing composer.json

use super::{MANIFEST_FILE, Manifest, check_shape};
use crate::error::{Result, SyncError};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE)
}

pub fn exists(dir: &Path) -> bool {
    manifest_path(dir).is_file()
}

/// Read and parse `dir/composer.json`
pub fn load(dir: &Path) -> Result<Manifest> {
    let path = manifest_path(dir);
    if !path.exists() {
        return Err(SyncError::not_found(MANIFEST_FILE, path));
    }

    let content = std::fs::read_to_string(&path).map_err(|e| SyncError::io(&path, e))?;
    let value: JsonValue = serde_json::from_str(&content).map_err(|source| SyncError::Parse {
        path: path.clone(),
        source,
    })?;

    let JsonValue::Object(doc) = value else {
        return Err(SyncError::InvalidManifest {
            path,
            reason: "top level must be an object".to_string(),
        });
    };
    check_shape(&doc).map_err(|reason| SyncError::InvalidManifest {
        path: path.clone(),
        reason,
    })?;

    tracing::debug!("Loaded {}", path.display());
    Ok(Manifest::from_object(doc))
}

/// Render a manifest the way it is stored: two-space indent, document key order
pub fn render(manifest: &Manifest) -> Result<String> {
    serde_json::to_string_pretty(&manifest.as_value())
        .map_err(|e| SyncError::Config(format!("cannot serialize manifest: {e}")))
}

/// Write `dir/composer.json`, replacing any previous file.
///
/// The content goes to a sibling temporary file first and is renamed into
/// place, so readers never observe a half-written manifest.
pub fn store(dir: &Path, manifest: &Manifest) -> Result<PathBuf> {
    let path = manifest_path(dir);
    let staging = dir.join(format!(".{MANIFEST_FILE}.{}.tmp", std::process::id()));
    let content = render(manifest)?;

    std::fs::write(&staging, content).map_err(|e| SyncError::io(&staging, e))?;
    if let Err(e) = std::fs::rename(&staging, &path) {
        let _ = std::fs::remove_file(&staging);
        return Err(SyncError::io(&path, e));
    }

    tracing::debug!("Wrote {}", path.display());
    Ok(path)
}
