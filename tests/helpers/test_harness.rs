use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use symdex::extractor::FileExtractor;
use symdex::source::FingerprintMode;
use symdex::{Config, IndexSession};
use tempfile::TempDir;

/// A temporary source tree plus a session indexing it.
pub struct TestHarness {
    pub temp_dir: TempDir,
    pub session: IndexSession,
}

impl TestHarness {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let session = IndexSession::new(temp_dir.path(), Self::config())?;
        Ok(Self { temp_dir, session })
    }

    pub fn with_extractor(extractor: Arc<dyn FileExtractor>) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let session = IndexSession::with_extractor(temp_dir.path(), Self::config(), extractor)?;
        Ok(Self { temp_dir, session })
    }

    /// Content hashing, so edits within one mtime tick are still seen.
    pub fn config() -> Config {
        let mut config = Config::default();
        config.indexer.fingerprint = FingerprintMode::Content;
        config.indexer.parallel_threads = Some(4);
        config
    }

    pub fn write(&self, path: &str, content: &str) -> Result<PathBuf> {
        let file_path = self.temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, content)?;
        Ok(file_path)
    }

    pub fn remove(&self, path: &str) -> Result<()> {
        fs::remove_file(self.temp_dir.path().join(path))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}
