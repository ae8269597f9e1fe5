//! Error taxonomy for the indexing core.
//!
//! Only root-level failures abort a cycle. Per-file problems are reported as
//! data ([`FileReadError`], [`crate::symbol::ExtractionWarning`]) inside the
//! cycle summary, and "not found" is never an error.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an indexing cycle.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The root directory could not be opened or listed.
    #[error("Root {path} is unreadable: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The root exists but is not a directory.
    #[error("Root {0} is not a directory")]
    NotADirectory(PathBuf),

    /// A background worker died while the cycle was running.
    #[error("Indexing worker failed: {0}")]
    Worker(String),
}

/// A single file that could not be read this cycle.
///
/// The file is skipped and retried on the next cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Failed to read {path}: {reason}")]
pub struct FileReadError {
    /// Path relative to the index root (or the raw path when it lies outside it)
    pub path: String,
    pub reason: String,
}

impl FileReadError {
    pub fn new(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Malformed query input, rejected before the store is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Empty {query_kind} query")]
    EmptyQuery { query_kind: &'static str },
}
