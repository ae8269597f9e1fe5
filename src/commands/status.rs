//! Status command implementation.
//!
//! Shows index statistics and the outcome of the last cycle.

use anyhow::{Context, Result};

use super::open_and_refresh;
use crate::cli::GlobalArgs;
use crate::Config;

pub async fn run(global: &GlobalArgs) -> Result<()> {
    let (session, _) = open_and_refresh(global).await?;
    let status = session.status();

    if global.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).context("Failed to serialize status")?
        );
        return Ok(());
    }

    println!("Project root: {}", session.root().display());
    println!("Has local config: {}", Config::is_initialized(session.root()));
    println!(
        "Snapshot: {}",
        session.config().snapshot_path(session.root()).display()
    );

    println!();
    println!("Index statistics:");
    println!("  Files indexed: {}", status.file_count);
    println!("  Symbols: {}", status.symbol_count);
    if let Some(time) = status.last_cycle_time {
        println!("  Last cycle: {}", time.to_rfc3339());
    }
    if let Some(cycle) = &status.last_cycle {
        println!("  {}", cycle.summary());
    }

    Ok(())
}
