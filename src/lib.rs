pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod extractor;
pub mod indexing;
pub mod logging;
pub mod persist;
pub mod session;
pub mod source;
pub mod symbol;

pub use config::Config;
pub use error::{FileReadError, QueryError, ScanError};
pub use indexing::{CycleSummary, IncrementalUpdater};
pub use session::{IndexSession, IndexStatus};
pub use symbol::{IndexStore, QueryResolver, SymbolDescriptor, SymbolKind};
