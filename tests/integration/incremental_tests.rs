use anyhow::Result;

use symdex::indexing::CycleWarning;
use symdex::{ScanError, SymbolKind};
use tokio_util::sync::CancellationToken;

use crate::helpers::counting_extractor::CountingExtractor;
use crate::helpers::test_harness::TestHarness;

#[tokio::test]
async fn test_method_and_function_with_same_name() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.write("a.py", "class Foo:\n    def bar(self): pass\n")?;
    harness.write("b.py", "def bar(): pass\n")?;

    harness.session.trigger_reindex().await?;

    let results = harness.session.find_by_name("bar")?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].file_path, "a.py");
    assert_eq!(results[0].qualified_path, "Foo.bar");
    assert_eq!(results[0].kind, SymbolKind::Method);
    assert_eq!(results[1].file_path, "b.py");
    assert_eq!(results[1].qualified_path, "bar");
    assert_eq!(results[1].kind, SymbolKind::Function);

    harness.write("b.py", "def baz(): pass\n")?;
    let summary = harness.session.trigger_reindex().await?;
    assert_eq!(summary.files_modified, 1);
    assert_eq!(summary.files_unchanged, 1);

    let results = harness.session.find_by_name("bar")?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].file_path, "a.py");
    assert_eq!(harness.session.find_by_name("baz")?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_rescan_without_changes_extracts_nothing() -> Result<()> {
    let extractor = CountingExtractor::new();
    let harness = TestHarness::with_extractor(extractor.clone())?;
    harness.write("src/app.py", "class App:\n    def run(self): pass\n")?;
    harness.write("src/util.js", "export function helper() {}\n")?;
    harness.write("lib/core.rs", "pub struct Core;\nimpl Core { fn new() -> Self { Core } }\n")?;

    let first = harness.session.trigger_reindex().await?;
    assert_eq!(first.files_added, 3);
    assert_eq!(extractor.calls(), 3);

    let before = harness.session.store().snapshot();
    extractor.reset();

    let second = harness.session.trigger_reindex().await?;
    assert_eq!(extractor.calls(), 0);
    assert_eq!(second.files_changed, 0);
    assert_eq!(second.files_unchanged, 3);

    let after = harness.session.store().snapshot();
    assert_eq!(after.generation(), before.generation());
    assert_eq!(after.symbol_count(), before.symbol_count());
    for record in before.files() {
        assert_eq!(after.file(&record.path), Some(record));
    }

    Ok(())
}

#[tokio::test]
async fn test_only_changed_files_are_extracted() -> Result<()> {
    let extractor = CountingExtractor::new();
    let harness = TestHarness::with_extractor(extractor.clone())?;
    for i in 0..10 {
        harness.write(&format!("mod_{}.py", i), &format!("def func_{}(): pass\n", i))?;
    }
    harness.session.trigger_reindex().await?;
    extractor.reset();

    harness.write("mod_3.py", "def renamed(): pass\n")?;
    harness.write("mod_new.py", "VALUE = 1\n")?;
    let summary = harness.session.trigger_reindex().await?;

    assert_eq!(extractor.calls(), 2);
    assert_eq!(summary.files_added, 1);
    assert_eq!(summary.files_modified, 1);
    assert_eq!(summary.files_unchanged, 9);

    Ok(())
}

#[tokio::test]
async fn test_deleted_file_leaves_no_symbols() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.write("keep.py", "def kept(): pass\n")?;
    harness.write(
        "gone.py",
        "import os\nclass Gone:\n    size = 3\n    def shared(self): pass\ndef shared(): pass\n",
    )?;
    harness.session.trigger_reindex().await?;
    assert_eq!(harness.session.file_symbols("gone.py")?.len(), 5);

    harness.remove("gone.py")?;
    let summary = harness.session.trigger_reindex().await?;
    assert_eq!(summary.files_removed, 1);

    for name in ["os", "Gone", "size", "shared"] {
        assert!(harness.session.find_by_name(name)?.is_empty(), "{} survived", name);
    }
    assert!(harness.session.find_by_qualified_path("Gone.shared")?.is_empty());
    assert!(harness.session.search("Gon")?.is_empty());
    assert!(harness.session.file_symbols("gone.py")?.is_empty());
    assert_eq!(harness.session.find_by_name("kept")?.len(), 1);

    let snapshot = harness.session.store().snapshot();
    assert!(!snapshot.contains_file("gone.py"));
    assert!(snapshot.names().all(|name| name != "Gone"));
    assert!(snapshot.verify_consistency().is_ok());

    Ok(())
}

#[tokio::test]
async fn test_unreadable_file_keeps_previous_record() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.write("data.py", "def original(): pass\n")?;
    harness.session.trigger_reindex().await?;

    std::fs::write(harness.path().join("data.py"), [0xc3, 0x28, 0xa0, 0xa1])?;
    let summary = harness.session.trigger_reindex().await?;

    assert_eq!(summary.files_failed, 1);
    assert!(summary
        .warnings
        .iter()
        .any(|w| matches!(w, CycleWarning::FileRead(e) if e.path == "data.py")));
    assert_eq!(harness.session.find_by_name("original")?.len(), 1);

    harness.write("data.py", "def fixed(): pass\n")?;
    let summary = harness.session.trigger_reindex().await?;
    assert_eq!(summary.files_failed, 0);
    assert!(harness.session.find_by_name("original")?.is_empty());
    assert_eq!(harness.session.find_by_name("fixed")?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_syntax_error_reported_and_prefix_kept() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.write("broken.py", "def ok(): pass\n\ndef broken(:\n    pass\n")?;

    let summary = harness.session.trigger_reindex().await?;

    assert_eq!(summary.files_added, 1);
    assert_eq!(summary.files_failed, 0);
    assert!(summary
        .warnings
        .iter()
        .any(|w| matches!(w, CycleWarning::Extraction { path, .. } if path == "broken.py")));
    assert_eq!(harness.session.find_by_name("ok")?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_scan_error_leaves_index_untouched() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.write("a.py", "def alpha(): pass\n")?;
    harness.session.trigger_reindex().await?;
    let generation = harness.session.status().generation;

    // Replace the root directory with a plain file
    let root = harness.path().to_path_buf();
    std::fs::remove_dir_all(&root)?;
    std::fs::write(&root, "not a directory")?;

    let result = harness.session.trigger_reindex().await;
    assert!(matches!(result, Err(ScanError::NotADirectory(_))));

    let status = harness.session.status();
    assert_eq!(status.generation, generation);
    assert_eq!(status.file_count, 1);
    assert_eq!(harness.session.find_by_name("alpha")?.len(), 1);

    std::fs::remove_file(&root)?;
    std::fs::create_dir(&root)?;
    Ok(())
}

#[tokio::test]
async fn test_cancelled_cycle_is_consistent_and_resumable() -> Result<()> {
    let harness = TestHarness::new()?;
    for i in 0..50 {
        harness.write(
            &format!("pkg/file_{:02}.py", i),
            &format!("class Widget{i}:\n    def render(self): pass\n"),
        )?;
    }

    let token = CancellationToken::new();
    token.cancel();
    let cancelled = harness.session.trigger_reindex_with(&token).await?;
    assert!(cancelled.cancelled);

    let snapshot = harness.session.store().snapshot();
    assert!(snapshot.verify_consistency().is_ok());
    for record in snapshot.files() {
        assert_eq!(record.symbols.len(), 2, "{} is torn", record.path);
    }

    let resumed = harness.session.trigger_reindex().await?;
    assert!(!resumed.cancelled);
    assert_eq!(harness.session.status().file_count, 50);
    assert_eq!(harness.session.find_by_name("render")?.len(), 50);

    Ok(())
}

#[tokio::test]
async fn test_sessions_are_independent() -> Result<()> {
    let first = TestHarness::new()?;
    let second = TestHarness::new()?;
    first.write("one.py", "def only_here(): pass\n")?;
    second.write("two.py", "def elsewhere(): pass\n")?;

    first.session.trigger_reindex().await?;
    second.session.trigger_reindex().await?;

    assert_eq!(first.session.find_by_name("only_here")?.len(), 1);
    assert!(second.session.find_by_name("only_here")?.is_empty());
    assert!(first.session.find_by_name("elsewhere")?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_ignore_file_excludes_paths() -> Result<()> {
    let extractor = CountingExtractor::new();
    let harness = TestHarness::with_extractor(extractor.clone())?;
    harness.write(".symdexignore", "generated/\n")?;
    harness.write("generated/out.py", "def generated(): pass\n")?;
    harness.write("main.py", "def main(): pass\n")?;

    harness.session.trigger_reindex().await?;

    assert_eq!(extractor.calls(), 1);
    assert!(harness.session.find_by_name("generated")?.is_empty());
    assert_eq!(harness.session.find_by_name("main")?.len(), 1);

    Ok(())
}
