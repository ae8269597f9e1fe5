use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "symdex")]
#[command(author, version, about = "Incremental source-code symbol index")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Project root to index
    #[arg(short, long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize symdex in the project root
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Bring the index up to date with the source tree
    Index,

    /// Find symbols by exact name
    Find {
        /// Symbol name
        name: String,
    },

    /// Find symbols by qualified path (e.g. `Foo.bar`)
    Qualified {
        /// Dot-joined qualified path
        path: String,
    },

    /// Find symbols whose name contains a pattern
    Search {
        /// Substring to look for
        pattern: String,

        /// Match regardless of case
        #[arg(short = 'i', long)]
        ignore_case: bool,

        /// Maximum number of results (0 = unlimited)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List the symbols of one file in source order
    Symbols {
        /// File path relative to the project root
        file: String,
    },

    /// Show index statistics and the last cycle
    Status,
}
