//! Index command implementation.
//!
//! Runs one incremental cycle and reports what changed.

use anyhow::{Context, Result};

use super::open_and_refresh;
use crate::cli::GlobalArgs;

pub async fn run(global: &GlobalArgs) -> Result<()> {
    let (session, summary) = open_and_refresh(global).await?;

    if global.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
        );
        return Ok(());
    }

    println!("Project root: {}", session.root().display());
    if summary.files_changed > 0 {
        println!("{} in {:.2}s", summary.summary(), summary.duration_ms as f64 / 1000.0);
    } else {
        println!("Index is up to date. No files need indexing.");
    }

    if !summary.warnings.is_empty() {
        println!("\n⚠️  {} warning(s):", summary.warnings.len());
        for warning in summary.warnings.iter().take(10) {
            println!("  - {}", warning);
        }
        if summary.warnings.len() > 10 {
            println!("  ... and {} more", summary.warnings.len() - 10);
        }
    }

    Ok(())
}
