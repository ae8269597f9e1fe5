//! CLI command implementations.
//!
//! Every command opens the project's session, brings the index up to date
//! with one incremental cycle, answers, and saves the snapshot.

pub mod index;
pub mod init;
pub mod query;
pub mod status;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::GlobalArgs;
use crate::indexing::CycleSummary;
use crate::session::IndexSession;
use crate::symbol::SymbolDescriptor;

/// Absolute project root for the `--root` argument.
pub fn resolve_root(root: &Path) -> Result<PathBuf> {
    root.canonicalize()
        .with_context(|| format!("Cannot access project root {}", root.display()))
}

/// Open the session for `--root` and run one cycle with a spinner.
pub async fn open_and_refresh(global: &GlobalArgs) -> Result<(IndexSession, CycleSummary)> {
    let root = resolve_root(&global.root)?;
    let session = IndexSession::open(&root)?;

    let spinner = if global.json {
        ProgressBar::hidden()
    } else {
        create_spinner("Indexing")
    };

    let result = session.trigger_reindex().await;
    spinner.finish_and_clear();
    let summary = result.with_context(|| format!("Failed to index {}", root.display()))?;

    if summary.files_changed > 0 {
        session.save()?;
    }
    Ok((session, summary))
}

fn create_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .template(&format!("{{spinner:.green}} [{{elapsed_precise}}] {}: {{msg}}", label))
    {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print query results as a table or JSON.
pub fn print_symbols(results: &[SymbolDescriptor], json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(results).context("Failed to serialize results")?
        );
        return Ok(());
    }

    if results.is_empty() {
        println!("No symbols found.");
        return Ok(());
    }

    for symbol in results {
        println!(
            "{:<8} {:<40} {}:{}-{}",
            symbol.kind.as_str(),
            symbol.qualified_path,
            symbol.file_path,
            symbol.line_range.start,
            symbol.line_range.end
        );
    }
    println!("\n{} symbol(s)", results.len());
    Ok(())
}
