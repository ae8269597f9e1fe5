//! Source reader: enumerates indexable files under a root and fingerprints them.

pub mod fingerprint;
pub mod walker;

pub use fingerprint::{Fingerprint, FingerprintMode};
pub use walker::{relative_path, SourceFile, Walker, IGNORE_FILE_NAME};
