//! JSON file persistence shared by every store, log and queue.
//!
//! Writes go through a temporary sibling file that is fsynced and then
//! renamed over the target, so the external process never observes a
//! half-written document.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};


/// Serialize `value` as pretty JSON and atomically replace `path`.
///
/// Parent directories are created on demand.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let tmp_path = temp_path_for(path);
    {
        let mut tmp_file = File::create(&tmp_path)
            .with_context(|| format!("Failed to create temporary file {}", tmp_path.display()))?;
        tmp_file
            .write_all(json.as_bytes())
            .context("Failed to write JSON data")?;
        tmp_file
            .sync_all()
            .context("Failed to sync JSON file to disk")?;
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }

    Ok(())
}

/// Load and deserialize a JSON document.
///
/// A missing file is `Ok(None)`; unreadable or malformed content is an error.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    let value = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;

    Ok(Some(value))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document.json");
    let tmp_name = format!("{}.tmp", file_name);
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}
