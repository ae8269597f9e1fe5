use anyhow::Result;

use symdex::indexing::CycleWarning;
use symdex::symbol::WarningKind;
use symdex::SymbolKind;

use crate::helpers::test_harness::TestHarness;

const PYTHON_SOURCE: &str = r#"import os
from typing import List as L

TIMEOUT = 30

class Repository:
    cache = {}

    def __init__(self, path):
        self.path = path
        local = 1

    @property
    def name(self):
        return os.path.basename(self.path)

    class Meta:
        ordering = ["name"]

def load(path):
    def helper():
        pass
    return Repository(path)
"#;

const TYPESCRIPT_SOURCE: &str = r#"import { readFile as read } from "fs";

export interface Options {
  verbose: boolean;
}

export class Loader {
  private cache = new Map();

  load(path: string): string {
    return read(path);
  }
}

export const create = (opts: Options) => new Loader();
"#;

const RUST_SOURCE: &str = r#"use std::collections::HashMap;

pub const LIMIT: usize = 8;

pub struct Registry {
    items: HashMap<String, u32>,
}

impl Registry {
    pub fn new() -> Self {
        Self { items: HashMap::new() }
    }
}

pub mod helpers {
    pub fn clean() {}
}
"#;

fn outline(harness: &TestHarness, path: &str) -> Result<Vec<(String, SymbolKind)>> {
    Ok(harness
        .session
        .file_symbols(path)?
        .into_iter()
        .map(|s| (s.qualified_path, s.kind))
        .collect())
}

#[tokio::test]
async fn test_python_outline() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.write("repo.py", PYTHON_SOURCE)?;
    harness.session.trigger_reindex().await?;

    let outline = outline(&harness, "repo.py")?;
    let expected = vec![
        ("os", SymbolKind::Import),
        ("L", SymbolKind::Import),
        ("TIMEOUT", SymbolKind::Variable),
        ("Repository", SymbolKind::Class),
        ("Repository.cache", SymbolKind::Variable),
        ("Repository.__init__", SymbolKind::Method),
        ("Repository.name", SymbolKind::Method),
        ("Repository.Meta", SymbolKind::Class),
        ("Repository.Meta.ordering", SymbolKind::Variable),
        ("load", SymbolKind::Function),
        ("load.helper", SymbolKind::Function),
    ];
    let expected: Vec<(String, SymbolKind)> = expected
        .into_iter()
        .map(|(path, kind)| (path.to_string(), kind))
        .collect();
    assert_eq!(outline, expected);

    // Decorators belong to the definition's span
    let name = harness.session.find_by_qualified_path("Repository.name")?;
    assert_eq!(name[0].line_range.start, 13);

    Ok(())
}

#[tokio::test]
async fn test_typescript_outline() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.write("src/loader.ts", TYPESCRIPT_SOURCE)?;
    harness.session.trigger_reindex().await?;

    let outline = outline(&harness, "src/loader.ts")?;
    let paths: Vec<&str> = outline.iter().map(|(path, _)| path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "read",
            "Options",
            "Options.verbose",
            "Loader",
            "Loader.cache",
            "Loader.load",
            "create",
        ]
    );
    assert_eq!(outline[5].1, SymbolKind::Method);
    assert_eq!(outline[6].1, SymbolKind::Function);

    Ok(())
}

#[tokio::test]
async fn test_rust_outline() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.write("src/registry.rs", RUST_SOURCE)?;
    harness.session.trigger_reindex().await?;

    let outline = outline(&harness, "src/registry.rs")?;
    let paths: Vec<&str> = outline.iter().map(|(path, _)| path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["HashMap", "LIMIT", "Registry", "Registry.new", "helpers", "helpers.clean"]
    );

    let new = harness.session.find_by_qualified_path("Registry.new")?;
    assert_eq!(new[0].kind, SymbolKind::Method);
    assert_eq!(new[0].line_range.start, 10);
    assert_eq!(new[0].line_range.end, 12);

    Ok(())
}

#[tokio::test]
async fn test_every_indexed_file_keeps_scope_integrity() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.write("repo.py", PYTHON_SOURCE)?;
    harness.write("src/loader.ts", TYPESCRIPT_SOURCE)?;
    harness.write("src/registry.rs", RUST_SOURCE)?;
    harness.write("partial.py", "class Open:\n    def method(self:\n")?;
    harness.session.trigger_reindex().await?;

    let snapshot = harness.session.store().snapshot();
    assert_eq!(snapshot.file_count(), 4);
    for record in snapshot.files() {
        record.validate()?;
        for symbol in &record.symbols {
            assert_eq!(symbol.file_path, record.path);
            assert!(symbol.line_range.start <= symbol.line_range.end);
            assert!(symbol.span.start <= symbol.span.end);
        }
    }
    snapshot.verify_consistency().map_err(anyhow::Error::msg)?;

    Ok(())
}

#[tokio::test]
async fn test_deep_nesting_is_partial() -> Result<()> {
    let harness = TestHarness::new()?;
    let mut source = String::from("def before(): pass\n\n");
    for depth in 0..600 {
        source.push_str(&"    ".repeat(depth));
        source.push_str(&format!("class C{}:\n", depth));
    }
    source.push_str(&"    ".repeat(600));
    source.push_str("pass\n");
    harness.write("deep.py", &source)?;

    let summary = harness.session.trigger_reindex().await?;

    assert_eq!(summary.files_added, 1);
    assert!(summary.warnings.iter().any(|w| matches!(
        w,
        CycleWarning::Extraction { warning, .. } if warning.kind == WarningKind::Partial
    )));
    assert_eq!(harness.session.find_by_name("before")?.len(), 1);
    assert!(harness.session.find_by_name("C599")?.is_empty());

    let snapshot = harness.session.store().snapshot();
    let record = snapshot.file("deep.py").expect("deep.py is indexed");
    record.validate()?;

    Ok(())
}

#[tokio::test]
async fn test_deep_malformed_file_does_not_stop_cycle() -> Result<()> {
    let harness = TestHarness::new()?;
    let depth = 100_000;
    let source = format!("x = {}1 +{}\n", "[".repeat(depth), "]".repeat(depth));
    harness.write("deep_broken.py", &source)?;
    harness.write("fine.py", "def fine(): pass\n")?;

    let summary = harness.session.trigger_reindex().await?;

    assert_eq!(summary.files_added, 2);
    assert!(summary.warnings.iter().any(|w| matches!(
        w,
        CycleWarning::Extraction { path, warning }
            if path == "deep_broken.py" && warning.kind == WarningKind::SyntaxError
    )));
    assert_eq!(harness.session.find_by_name("fine")?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_unsupported_files_are_indexed_without_symbols() -> Result<()> {
    let mut config = TestHarness::config();
    config.indexer.extensions.push("txt".to_string());
    let harness = TestHarness::new()?;
    let session = symdex::IndexSession::new(harness.path(), config)?;
    harness.write("notes.txt", "def not_code(): pass\n")?;

    let summary = session.trigger_reindex().await?;

    assert_eq!(summary.files_added, 1);
    assert_eq!(summary.symbols_indexed, 0);
    assert!(session.find_by_name("not_code")?.is_empty());
    Ok(())
}
