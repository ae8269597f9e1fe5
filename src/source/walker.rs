use ignore::WalkBuilder;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::config::IndexerConfig;
use crate::error::{FileReadError, ScanError};

use super::fingerprint::{Fingerprint, FingerprintMode};

/// Project-specific ignore file, read in addition to `.gitignore`
pub const IGNORE_FILE_NAME: &str = ".symdexignore";

/// A regular file selected for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the walk root, `/`-separated; the index key
    pub relative_path: String,
    pub fingerprint: Fingerprint,
}

/// Walks the filesystem respecting .gitignore and custom ignore patterns
pub struct Walker {
    root: PathBuf,
    extensions: HashSet<String>,
    ignore_patterns: Vec<String>,
    fingerprint_mode: FingerprintMode,
    follow_links: bool,
    include_hidden: bool,
}

impl Walker {
    /// Create a new Walker with the given root directory and configuration
    pub fn new(root: PathBuf, config: &IndexerConfig) -> Self {
        Self {
            root,
            extensions: config
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            ignore_patterns: config.ignore_patterns.clone(),
            fingerprint_mode: config.fingerprint,
            follow_links: config.follow_links,
            include_hidden: config.include_hidden,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fail with [`ScanError`] unless the root is a listable directory.
    pub fn check_root(&self) -> Result<(), ScanError> {
        let metadata = fs::metadata(&self.root).map_err(|source| ScanError::RootUnreadable {
            path: self.root.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }
        fs::read_dir(&self.root).map_err(|source| ScanError::RootUnreadable {
            path: self.root.clone(),
            source,
        })?;
        Ok(())
    }

    /// Walk the directory tree lazily, yielding each matching file with its
    /// fingerprint.
    ///
    /// This respects:
    /// - .gitignore files (also outside git repositories) and `.symdexignore`
    /// - Custom ignore patterns from config
    /// - File extension filtering
    ///
    /// Unreadable files and directories are yielded as errors; they never end
    /// the walk. Enumeration order is unspecified.
    pub fn walk(&self) -> impl Iterator<Item = Result<SourceFile, FileReadError>> + '_ {
        let mut builder = WalkBuilder::new(&self.root);

        builder
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .hidden(!self.include_hidden)
            .follow_links(self.follow_links)
            .add_custom_ignore_filename(IGNORE_FILE_NAME);

        // Custom ignore patterns: `!pattern` in an override excludes matches
        let mut override_builder = ignore::overrides::OverrideBuilder::new(&self.root);
        for pattern in &self.ignore_patterns {
            for glob in [format!("!{}", pattern), format!("!{}/**", pattern)] {
                if let Err(e) = override_builder.add(&glob) {
                    warn!("Ignoring invalid ignore pattern '{}': {}", pattern, e);
                }
            }
        }

        match override_builder.build() {
            Ok(overrides) => {
                builder.overrides(overrides);
            }
            Err(e) => warn!("Failed to build ignore overrides: {}", e),
        }

        builder.build().filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = error_path(&e)
                        .map(|p| relative_path(&self.root, p))
                        .unwrap_or_default();
                    return Some(Err(FileReadError::new(path, e)));
                }
            };

            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                return None;
            }
            if !self.has_indexed_extension(entry.path()) {
                return None;
            }

            Some(self.source_file(entry.into_path()))
        })
    }

    /// Collect all readable files into a Vec
    pub fn collect_files(&self) -> Vec<SourceFile> {
        self.walk().filter_map(Result::ok).collect()
    }

    fn has_indexed_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    fn source_file(&self, path: PathBuf) -> Result<SourceFile, FileReadError> {
        let relative = relative_path(&self.root, &path);
        let fingerprint = fs::metadata(&path)
            .and_then(|metadata| Fingerprint::compute(&path, &metadata, self.fingerprint_mode))
            .map_err(|e| {
                debug!("Failed to fingerprint {:?}: {}", path, e);
                FileReadError::new(relative.clone(), e)
            })?;

        Ok(SourceFile {
            path,
            relative_path: relative,
            fingerprint,
        })
    }
}

/// Index key for `path`: relative to `root`, normal components joined by `/`.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        _ => None,
    }
}
