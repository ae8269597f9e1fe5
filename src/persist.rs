//! Saving and loading index snapshots.
//!
//! The snapshot is a versioned JSON document holding every `FileRecord`.
//! Records are validated on load; a file whose symbols break the scope
//! invariants is dropped so the next cycle re-extracts it.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::symbol::{FileRecord, IndexSnapshot};

/// Bumped whenever the record layout changes
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotOut<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    files: Vec<&'a FileRecord>,
}

#[derive(Deserialize)]
struct SnapshotIn {
    version: u32,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    files: Vec<FileRecord>,
}

/// Write `snapshot` to `path`, replacing any previous file atomically.
pub fn save_snapshot(path: &Path, snapshot: &IndexSnapshot) -> Result<()> {
    let mut files: Vec<&FileRecord> = snapshot.files().collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let document = SnapshotOut {
        version: SNAPSHOT_VERSION,
        saved_at: Utc::now(),
        files,
    };
    let json = serde_json::to_vec(&document).context("Failed to serialize index snapshot")?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, &json)
        .with_context(|| format!("Failed to write snapshot to {:?}", tmp_path))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to move snapshot into place at {:?}", path))?;

    debug!(
        "Saved {} files ({} bytes) to {:?}",
        document.files.len(),
        json.len(),
        path
    );
    Ok(())
}

/// Read the records saved at `path`.
///
/// Returns `None` when there is no snapshot or it was written by an
/// incompatible version; the caller then starts from an empty index.
pub fn load_snapshot(path: &Path) -> Result<Option<Vec<FileRecord>>> {
    if !path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(path).with_context(|| format!("Failed to read snapshot {:?}", path))?;
    let document: SnapshotIn = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse snapshot {:?}", path))?;

    if document.version != SNAPSHOT_VERSION {
        warn!(
            "Ignoring snapshot {:?}: version {} (expected {})",
            path, document.version, SNAPSHOT_VERSION
        );
        return Ok(None);
    }

    let total = document.files.len();
    let files: Vec<FileRecord> = document
        .files
        .into_iter()
        .filter(|record| match record.validate() {
            Ok(()) => true,
            Err(violation) => {
                warn!("Dropping {} from snapshot: {}", record.path, violation);
                false
            }
        })
        .collect();

    info!(
        "Loaded {} of {} files from snapshot{}",
        files.len(),
        total,
        document
            .saved_at
            .map(|at| format!(" saved at {}", at.to_rfc3339()))
            .unwrap_or_default()
    );
    Ok(Some(files))
}
