use anyhow::{bail, Result};
use tracing::info;

use super::resolve_root;
use crate::cli::GlobalArgs;
use crate::Config;

pub async fn run(global: &GlobalArgs, force: bool) -> Result<()> {
    let root = resolve_root(&global.root)?;

    if Config::is_initialized(&root) && !force {
        bail!(
            "symdex is already initialized in {:?} (use --force to overwrite)",
            Config::symdex_dir(&root)
        );
    }

    let config = Config::default();
    config.save(&root)?;

    info!("Initialized symdex in {:?}", Config::symdex_dir(&root));
    println!(
        "✓ Created {} with default configuration",
        Config::symdex_dir(&root).display()
    );
    println!("\nNext steps:");
    println!("  1. Edit .symdex/config.toml to customize settings");
    println!("  2. Run 'symdex index' to index your codebase");
    println!("  3. Run 'symdex find <name>' to look up a symbol");

    Ok(())
}
