//! Cheap change detection for source files.

use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;
use xxhash_rust::xxh3::xxh3_64;

/// How fingerprints are computed during a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintMode {
    /// File size plus modification time (no content read)
    #[default]
    Metadata,
    /// File size plus a hash of the content
    Content,
}

impl std::fmt::Display for FingerprintMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FingerprintMode::Metadata => write!(f, "metadata"),
            FingerprintMode::Content => write!(f, "content"),
        }
    }
}

/// Value compared across cycles to decide whether a file must be re-parsed.
///
/// Fingerprints of different modes never compare equal, so switching modes
/// re-indexes every file once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Fingerprint {
    Metadata { size: u64, modified_ns: u64 },
    Content { size: u64, hash: u64 },
}

impl Fingerprint {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let modified_ns = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0);

        Fingerprint::Metadata {
            size: metadata.len(),
            modified_ns,
        }
    }

    pub fn from_content(content: &[u8]) -> Self {
        Fingerprint::Content {
            size: content.len() as u64,
            hash: xxh3_64(content),
        }
    }

    /// Compute the fingerprint for `path` in the requested mode.
    pub fn compute(path: &Path, metadata: &Metadata, mode: FingerprintMode) -> io::Result<Self> {
        match mode {
            FingerprintMode::Metadata => Ok(Self::from_metadata(metadata)),
            FingerprintMode::Content => {
                let content = std::fs::read(path)?;
                Ok(Self::from_content(&content))
            }
        }
    }
}
