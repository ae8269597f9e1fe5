use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use symdex::extractor::{FileExtractor, SymbolExtractor};
use symdex::source::{Fingerprint, FingerprintMode};
use symdex::symbol::{FileRecord, IndexStore, QueryResolver};
use symdex::{Config, IndexSession};
use tokio_util::sync::CancellationToken;

use crate::helpers::test_harness::TestHarness;

fn class_file(version: usize) -> String {
    let mut source = format!("class Service{}:\n", version);
    for method in 0..20 {
        source.push_str(&format!("    def op_{}(self): pass\n", method));
    }
    source
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_partial_files() -> Result<()> {
    let harness = TestHarness::new()?;
    for i in 0..8 {
        harness.write(&format!("svc_{}.py", i), &class_file(0))?;
    }
    harness.session.trigger_reindex().await?;

    let store = Arc::clone(harness.session.store());
    let stop = Arc::new(AtomicBool::new(false));

    let mut readers = Vec::new();
    for _ in 0..4 {
        let store = Arc::clone(&store);
        let stop = Arc::clone(&stop);
        readers.push(tokio::task::spawn_blocking(move || {
            let mut checks = 0usize;
            while !stop.load(Ordering::Relaxed) {
                let snapshot = store.snapshot();
                snapshot.verify_consistency().map_err(anyhow::Error::msg)?;
                for record in snapshot.files() {
                    // Every file is either the old or the new version, in full
                    anyhow::ensure!(record.symbols.len() == 21, "{} is torn", record.path);
                }
                checks += 1;
            }
            Ok::<usize, anyhow::Error>(checks)
        }));
    }

    for version in 1..=10 {
        for i in 0..8 {
            harness.write(&format!("svc_{}.py", i), &class_file(version))?;
        }
        let summary = harness.session.trigger_reindex().await?;
        assert_eq!(summary.files_modified, 8);
    }
    stop.store(true, Ordering::Relaxed);

    for reader in readers {
        reader.await??;
    }

    assert_eq!(harness.session.find_by_name("Service10")?.len(), 8);
    assert!(harness.session.find_by_name("Service9")?.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_triggers_are_serialized() -> Result<()> {
    let harness = TestHarness::new()?;
    for i in 0..30 {
        harness.write(&format!("pkg/m_{}.py", i), &format!("def f_{}(): pass\n", i))?;
    }
    let session = Arc::new(IndexSession::new(harness.path(), TestHarness::config())?);

    let (first, second) = tokio::join!(session.trigger_reindex(), session.trigger_reindex());
    let (first, second) = (first?, second?);

    // One cycle did the work, the other found nothing left to do
    assert_eq!(first.files_added + second.files_added, 30);
    assert_eq!(first.files_changed.min(second.files_changed), 0);
    assert_eq!(session.status().file_count, 30);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_during_cycle_keeps_whole_files() -> Result<()> {
    let harness = TestHarness::new()?;
    for i in 0..200 {
        harness.write(&format!("bulk/f_{:03}.py", i), &class_file(i))?;
    }

    let mut config = Config::default();
    config.indexer.fingerprint = FingerprintMode::Content;
    config.indexer.parallel_threads = Some(1);
    config.indexer.channel_capacity = 1;
    let session = Arc::new(IndexSession::new(harness.path(), config)?);

    let token = CancellationToken::new();
    let cycle = {
        let session = Arc::clone(&session);
        let token = token.clone();
        tokio::spawn(async move { session.trigger_reindex_with(&token).await })
    };
    tokio::task::yield_now().await;
    token.cancel();

    let summary = cycle.await??;
    let snapshot = session.store().snapshot();
    snapshot.verify_consistency().map_err(anyhow::Error::msg)?;
    assert_eq!(snapshot.file_count(), summary.files_added);
    assert!(snapshot.files().all(|record| record.symbols.len() == 21));

    let resumed = session.trigger_reindex().await?;
    assert!(!resumed.cancelled);
    assert_eq!(session.status().file_count, 200);
    Ok(())
}

#[test]
fn test_snapshot_taken_before_apply_is_unchanged() {
    let store = Arc::new(IndexStore::new());
    let resolver = QueryResolver::new(Arc::clone(&store), &Config::default().search);

    let extractor = SymbolExtractor::new();
    let record = |source: &str| {
        let extracted = extractor.extract("m.py", source);
        FileRecord {
            path: "m.py".to_string(),
            language: extracted.language.map(str::to_string),
            fingerprint: Fingerprint::from_content(source.as_bytes()),
            symbols: extracted.symbols,
            warnings: extracted.warnings,
        }
    };

    store.apply(record("def before(): pass\n"));
    let old = store.snapshot();

    store.apply(record("def after(): pass\n"));

    assert_eq!(old.lookup_by_name("before").len(), 1);
    assert!(old.lookup_by_name("after").is_empty());
    assert_eq!(resolver.find_by_name("after").map(|r| r.len()), Ok(1));
    assert_eq!(resolver.find_by_name("before").map(|r| r.len()), Ok(0));
}
