//! Symbol records, the in-memory index and its query resolver.
//!
//! Records are produced by the extractor, owned by the index per file, and
//! read back through [`QueryResolver`] as [`SymbolDescriptor`]s.

pub mod index;
pub mod record;
pub mod search;

pub use index::{IndexSnapshot, IndexStore};
pub use record::{
    ColumnRange, ExtractionWarning, FileRecord, LineRange, ScopeViolation, Span,
    SymbolDescriptor, SymbolId, SymbolKind, SymbolRecord, WarningKind,
};
pub use search::{QueryResolver, SearchOptions};
