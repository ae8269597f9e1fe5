use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use symdex::cli::{Cli, Commands};
use symdex::config::Config;
use symdex::logging::{init_early_logging, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let project_root = cli
        .global
        .root
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from(&cli.global.root));

    // Load configuration (if available, otherwise use defaults)
    let config = match Config::load(&project_root) {
        Ok(config) => config,
        Err(e) => {
            init_early_logging();
            tracing::error!("{:#}", e);
            return Err(e);
        }
    };

    // The guard MUST be held until program exit to ensure logs are flushed
    let _logging_guard = init_logging(&config.logging, &project_root)?;
    tracing::debug!("Loaded configuration from: {}", project_root.display());

    let global = &cli.global;
    match cli.command {
        Commands::Init { force } => {
            symdex::commands::init::run(global, force).await?;
        }
        Commands::Index => {
            symdex::commands::index::run(global).await?;
        }
        Commands::Find { name } => {
            symdex::commands::query::find(global, &name).await?;
        }
        Commands::Qualified { path } => {
            symdex::commands::query::qualified(global, &path).await?;
        }
        Commands::Search {
            pattern,
            ignore_case,
            limit,
        } => {
            symdex::commands::query::search(global, &pattern, ignore_case, limit).await?;
        }
        Commands::Symbols { file } => {
            symdex::commands::query::symbols(global, &file).await?;
        }
        Commands::Status => {
            symdex::commands::status::run(global).await?;
        }
    }

    Ok(())
}
