//! Incremental update cycles using Rayon workers and a single index writer

use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::IndexerConfig;
use crate::error::{FileReadError, ScanError};
use crate::extractor::FileExtractor;
use crate::source::{Fingerprint, SourceFile, Walker};
use crate::symbol::{FileRecord, IndexStore};

use super::errors::{log_summary, WarningCollector};
use super::pipeline::{ChangeKind, ChangeSet, CycleSummary, CycleWarning, ExtractedFile};

/// Keeps an [`IndexStore`] in sync with a source tree.
///
/// Each cycle enumerates the tree, diffs it against the indexed
/// fingerprints, extracts new and changed files on a worker pool and applies
/// the results one file at a time. Unchanged files are never read.
pub struct IncrementalUpdater {
    store: Arc<IndexStore>,
    extractor: Arc<dyn FileExtractor>,
    config: IndexerConfig,
    pool: Arc<rayon::ThreadPool>,
    /// Held for the whole cycle; cycles never overlap
    cycle_lock: Mutex<()>,
    last_cycle: RwLock<Option<CycleSummary>>,
}

impl IncrementalUpdater {
    /// Create an updater with its own extraction pool.
    pub fn new(
        store: Arc<IndexStore>,
        extractor: Arc<dyn FileExtractor>,
        config: IndexerConfig,
    ) -> Result<Self, ScanError> {
        let threads = config.worker_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("symdex-extract-{}", i))
            .build()
            .map_err(|e| ScanError::Worker(format!("failed to start extraction pool: {}", e)))?;
        debug!("Using {} threads for extraction", threads);

        Ok(Self {
            store,
            extractor,
            config,
            pool: Arc::new(pool),
            cycle_lock: Mutex::new(()),
            last_cycle: RwLock::new(None),
        })
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Summary of the most recent completed or cancelled cycle.
    pub fn last_cycle(&self) -> Option<CycleSummary> {
        self.last_cycle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run one full cycle over `root`.
    ///
    /// Fails with [`ScanError`] only when the root itself cannot be listed,
    /// in which case the index is left untouched. Per-file problems end up
    /// in the summary's warnings. Cancellation is checked before every
    /// removal, extraction and apply; a cancelled cycle keeps everything it
    /// already applied.
    pub async fn run_cycle(
        &self,
        root: &Path,
        cancel: &CancellationToken,
    ) -> Result<CycleSummary, ScanError> {
        let _cycle = self.cycle_lock.lock().await;
        let started_at = Utc::now();
        let start = Instant::now();

        let walker = Walker::new(root.to_path_buf(), &self.config);
        walker.check_root()?;
        info!("Starting index cycle for {}", root.display());

        let (scanned, enumeration_failures) = tokio::task::spawn_blocking(move || {
            let mut files = Vec::new();
            let mut failures = Vec::new();
            for entry in walker.walk() {
                match entry {
                    Ok(file) => files.push(file),
                    Err(e) => failures.push(e),
                }
            }
            (files, failures)
        })
        .await
        .map_err(|e| ScanError::Worker(format!("enumeration task failed: {}", e)))?;

        let collector = WarningCollector::new();
        for failure in &enumeration_failures {
            warn!("Skipping {}: {}", failure.path, failure.reason);
            collector.record(CycleWarning::FileRead(failure.clone()));
        }

        let files_scanned = scanned.len();
        let known = self.store.snapshot().fingerprints();
        let changes = ChangeSet::compute(scanned, &known, &enumeration_failures);
        info!(
            "{} files found: {} new, {} modified, {} removed, {} unchanged",
            files_scanned,
            changes.added.len(),
            changes.modified.len(),
            changes.removed.len(),
            changes.unchanged
        );

        let mut summary = CycleSummary {
            files_scanned,
            files_added: 0,
            files_modified: 0,
            files_removed: 0,
            files_unchanged: changes.unchanged,
            files_changed: 0,
            files_failed: 0,
            symbols_indexed: 0,
            cancelled: false,
            started_at,
            duration_ms: 0,
            warnings: Vec::new(),
        };

        let (removed, jobs) = changes.into_jobs();

        for path in &removed {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            if self.store.remove(path) {
                summary.files_removed += 1;
            }
        }

        if !summary.cancelled && !jobs.is_empty() {
            self.extract_and_apply(jobs, cancel, &collector, &mut summary)
                .await?;
        }

        summary.files_changed = summary.files_added + summary.files_modified + summary.files_removed;
        summary.files_failed = collector.failed_count();
        summary.warnings = collector.take();
        summary.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        if summary.cancelled {
            info!("Index cycle cancelled: {}", summary.summary());
        } else {
            info!(
                "Index cycle completed in {:.2}s: {}",
                start.elapsed().as_secs_f64(),
                summary.summary()
            );
        }
        log_summary(&summary.warnings);

        *self
            .last_cycle
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(summary.clone());

        Ok(summary)
    }

    /// Extract `jobs` on the worker pool and apply each result as it arrives.
    async fn extract_and_apply(
        &self,
        jobs: Vec<(SourceFile, ChangeKind)>,
        cancel: &CancellationToken,
        collector: &WarningCollector,
        summary: &mut CycleSummary,
    ) -> Result<(), ScanError> {
        let (tx, mut rx) = mpsc::channel::<ExtractedFile>(self.config.channel_capacity.max(1));

        let pool = Arc::clone(&self.pool);
        let extractor = Arc::clone(&self.extractor);
        let token = cancel.clone();
        let worker_collector = collector.clone();

        let producer = tokio::task::spawn_blocking(move || {
            pool.install(|| {
                jobs.into_par_iter().for_each_with(tx, |tx, (file, change)| {
                    if token.is_cancelled() {
                        return;
                    }
                    match extract_file(extractor.as_ref(), &file) {
                        Ok(record) => {
                            // Receiver gone means the writer stopped
                            let _ = tx.blocking_send(ExtractedFile { record, change });
                        }
                        Err(e) => {
                            warn!("Skipping {}: {}", e.path, e.reason);
                            worker_collector.record(CycleWarning::FileRead(e));
                        }
                    }
                });
            });
        });

        while let Some(extracted) = rx.recv().await {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let ExtractedFile { record, change } = extracted;
            for warning in &record.warnings {
                debug!("{}: {}", record.path, warning);
                collector.record(CycleWarning::Extraction {
                    path: record.path.clone(),
                    warning: warning.clone(),
                });
            }

            summary.symbols_indexed += record.symbol_count();
            match change {
                ChangeKind::Added => summary.files_added += 1,
                ChangeKind::Modified => summary.files_modified += 1,
            }
            self.store.apply(record);
        }
        drop(rx);

        producer
            .await
            .map_err(|e| ScanError::Worker(format!("extraction worker failed: {}", e)))?;

        if cancel.is_cancelled() {
            summary.cancelled = true;
        }
        Ok(())
    }
}

/// Read one file and turn it into a record. Runs on a worker thread.
fn extract_file(
    extractor: &dyn FileExtractor,
    file: &SourceFile,
) -> Result<FileRecord, FileReadError> {
    let bytes = fs::read(&file.path)
        .map_err(|e| FileReadError::new(file.relative_path.clone(), e))?;

    // Hash what was actually parsed, not what the walker saw earlier
    let fingerprint = match file.fingerprint {
        Fingerprint::Content { .. } => Fingerprint::from_content(&bytes),
        metadata => metadata,
    };

    let source = String::from_utf8(bytes)
        .map_err(|_| FileReadError::new(file.relative_path.clone(), "not valid UTF-8"))?;

    let extraction = extractor.extract(&file.relative_path, &source);
    Ok(FileRecord {
        path: file.relative_path.clone(),
        language: extraction.language.map(str::to_string),
        fingerprint,
        symbols: extraction.symbols,
        warnings: extraction.warnings,
    })
}
