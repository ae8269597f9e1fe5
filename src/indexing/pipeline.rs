//! Data passed between the stages of an update cycle

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::FileReadError;
use crate::source::{Fingerprint, SourceFile};
use crate::symbol::{ExtractionWarning, FileRecord};

/// Why a file is being (re-)extracted this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
}

/// Difference between the files on disk and the files in the index.
#[derive(Debug, Default)]
pub struct ChangeSet {
    pub added: Vec<SourceFile>,
    pub modified: Vec<SourceFile>,
    /// Index keys of files no longer present
    pub removed: Vec<String>,
    pub unchanged: usize,
}

impl ChangeSet {
    /// Compare a fresh enumeration against the last known fingerprints.
    ///
    /// Known files under a path that failed to enumerate are neither removed
    /// nor re-extracted; they keep their previous records until a later cycle
    /// can read them. A failure without a path protects every known file.
    pub fn compute(
        scanned: Vec<SourceFile>,
        known: &HashMap<String, Fingerprint>,
        failed: &[FileReadError],
    ) -> Self {
        let mut changes = ChangeSet::default();
        let mut seen: HashSet<&str> = HashSet::with_capacity(scanned.len());

        for file in &scanned {
            seen.insert(file.relative_path.as_str());
        }

        let mut removed: Vec<String> = known
            .keys()
            .filter(|path| !seen.contains(path.as_str()))
            .filter(|path| !failed.iter().any(|failure| covers(&failure.path, path)))
            .cloned()
            .collect();
        removed.sort();
        changes.removed = removed;

        for file in scanned {
            match known.get(&file.relative_path) {
                None => changes.added.push(file),
                Some(fingerprint) if *fingerprint != file.fingerprint => {
                    changes.modified.push(file)
                }
                Some(_) => changes.unchanged += 1,
            }
        }

        changes.added.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        changes.modified.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        changes
    }

    /// Files to extract, tagged with the reason.
    pub fn into_jobs(self) -> (Vec<String>, Vec<(SourceFile, ChangeKind)>) {
        let jobs = self
            .added
            .into_iter()
            .map(|file| (file, ChangeKind::Added))
            .chain(self.modified.into_iter().map(|file| (file, ChangeKind::Modified)))
            .collect();
        (self.removed, jobs)
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    pub fn total_changes(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }
}

/// Whether a failure at `failed` hides `path` from this cycle's enumeration.
fn covers(failed: &str, path: &str) -> bool {
    if failed.is_empty() {
        return true;
    }
    path == failed
        || path
            .strip_prefix(failed)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// A file extracted by a worker, waiting to be applied.
#[derive(Debug)]
pub struct ExtractedFile {
    pub record: FileRecord,
    pub change: ChangeKind,
}

/// Something that went wrong with one file during a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CycleWarning {
    /// File skipped this cycle; retried on the next one
    FileRead(FileReadError),
    /// File indexed with partial results
    Extraction {
        path: String,
        #[serde(flatten)]
        warning: ExtractionWarning,
    },
}

impl CycleWarning {
    pub fn path(&self) -> &str {
        match self {
            CycleWarning::FileRead(err) => &err.path,
            CycleWarning::Extraction { path, .. } => path,
        }
    }
}

impl std::fmt::Display for CycleWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleWarning::FileRead(err) => write!(f, "{}", err),
            CycleWarning::Extraction { path, warning } => write!(f, "{}: {}", path, warning),
        }
    }
}

/// Result of one update cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    /// Files enumerated with a fingerprint
    pub files_scanned: usize,
    pub files_added: usize,
    pub files_modified: usize,
    pub files_removed: usize,
    pub files_unchanged: usize,
    /// Added, modified and removed files actually applied to the index
    pub files_changed: usize,
    /// Files that could not be enumerated or read
    pub files_failed: usize,
    /// Symbols in the records applied this cycle
    pub symbols_indexed: usize,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub warnings: Vec<CycleWarning>,
}

impl CycleSummary {
    /// Get a summary string of the results
    pub fn summary(&self) -> String {
        let mut text = format!(
            "Scanned {} files: {} added, {} modified, {} removed, {} unchanged ({} symbols indexed)",
            self.files_scanned,
            self.files_added,
            self.files_modified,
            self.files_removed,
            self.files_unchanged,
            self.symbols_indexed
        );
        if self.files_failed > 0 {
            text.push_str(&format!(", {} failed", self.files_failed));
        }
        if self.cancelled {
            text.push_str(" [cancelled]");
        }
        text
    }
}
