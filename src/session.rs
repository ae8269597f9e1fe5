//! One indexing session: a source root, its index and the operations on it.
//!
//! The session is the surface exposed to callers (the CLI, or any tool or
//! transport layer on top): four queries, `trigger_reindex` and `status`.
//! Sessions own their store, so independent sessions can coexist.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::Config;
use crate::error::{QueryError, ScanError};
use crate::extractor::{FileExtractor, SymbolExtractor};
use crate::indexing::{CycleSummary, IncrementalUpdater};
use crate::persist;
use crate::symbol::{IndexStore, QueryResolver, SearchOptions, SymbolDescriptor};

/// Snapshot of the session's health for `status()`
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    /// When the last cycle finished, `None` before the first one
    pub last_cycle_time: Option<DateTime<Utc>>,
    pub file_count: usize,
    pub symbol_count: usize,
    /// Number of index mutations so far
    pub generation: u64,
    pub last_cycle: Option<CycleSummary>,
}

pub struct IndexSession {
    root: PathBuf,
    config: Config,
    store: Arc<IndexStore>,
    updater: IncrementalUpdater,
    resolver: QueryResolver,
}

impl IndexSession {
    /// Session with an empty index and the built-in extractor.
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Result<Self, ScanError> {
        Self::with_extractor(root, config, Arc::new(SymbolExtractor::new()))
    }

    /// Session with an empty index and a custom extractor.
    pub fn with_extractor(
        root: impl Into<PathBuf>,
        config: Config,
        extractor: Arc<dyn FileExtractor>,
    ) -> Result<Self, ScanError> {
        Self::with_store(root, config, Arc::new(IndexStore::new()), extractor)
    }

    fn with_store(
        root: impl Into<PathBuf>,
        config: Config,
        store: Arc<IndexStore>,
        extractor: Arc<dyn FileExtractor>,
    ) -> Result<Self, ScanError> {
        let updater =
            IncrementalUpdater::new(Arc::clone(&store), extractor, config.indexer.clone())?;
        let resolver = QueryResolver::new(Arc::clone(&store), &config.search);

        Ok(Self {
            root: root.into(),
            config,
            store,
            updater,
            resolver,
        })
    }

    /// Open the project at `root`: its config plus the last saved snapshot.
    ///
    /// An unreadable snapshot is logged and replaced by an empty index.
    pub fn open(root: &Path) -> Result<Self> {
        let config = Config::load(root)?;
        let snapshot_path = config.snapshot_path(root);

        let records = match persist::load_snapshot(&snapshot_path) {
            Ok(records) => records.unwrap_or_default(),
            Err(e) => {
                warn!("{:#}; starting from an empty index", e);
                Vec::new()
            }
        };

        let store = Arc::new(IndexStore::from_records(records));
        Self::with_store(root, config, store, Arc::new(SymbolExtractor::new()))
            .context("Failed to start index session")
    }

    /// Persist the current index to the configured snapshot file.
    pub fn save(&self) -> Result<()> {
        let path = self.config.snapshot_path(&self.root);
        persist::save_snapshot(&path, &self.store.snapshot())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub fn resolver(&self) -> &QueryResolver {
        &self.resolver
    }

    pub fn find_by_name(&self, name: &str) -> Result<Vec<SymbolDescriptor>, QueryError> {
        self.resolver.find_by_name(name)
    }

    pub fn find_by_qualified_path(
        &self,
        qualified_path: &str,
    ) -> Result<Vec<SymbolDescriptor>, QueryError> {
        self.resolver.find_by_qualified_path(qualified_path)
    }

    pub fn search(&self, pattern: &str) -> Result<Vec<SymbolDescriptor>, QueryError> {
        self.resolver.search(pattern)
    }

    pub fn search_with(
        &self,
        pattern: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SymbolDescriptor>, QueryError> {
        self.resolver.search_with(pattern, options)
    }

    pub fn file_symbols(&self, file_path: &str) -> Result<Vec<SymbolDescriptor>, QueryError> {
        self.resolver.file_symbols(file_path)
    }

    /// Run one update cycle over the session root.
    ///
    /// The root is the one the session was created with; each session
    /// indexes exactly one tree. Open another session for another root.
    pub async fn trigger_reindex(&self) -> Result<CycleSummary, ScanError> {
        self.trigger_reindex_with(&CancellationToken::new()).await
    }

    /// Run one update cycle that stops early once `cancel` fires.
    pub async fn trigger_reindex_with(
        &self,
        cancel: &CancellationToken,
    ) -> Result<CycleSummary, ScanError> {
        self.updater.run_cycle(&self.root, cancel).await
    }

    pub fn status(&self) -> IndexStatus {
        let snapshot = self.store.snapshot();
        let last_cycle = self.updater.last_cycle();

        IndexStatus {
            last_cycle_time: last_cycle.as_ref().map(|cycle| {
                let elapsed = i64::try_from(cycle.duration_ms).unwrap_or(i64::MAX);
                cycle.started_at + Duration::milliseconds(elapsed)
            }),
            file_count: snapshot.file_count(),
            symbol_count: snapshot.symbol_count(),
            generation: snapshot.generation(),
            last_cycle,
        }
    }
}
