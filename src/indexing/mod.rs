//! Incremental indexing: change detection, parallel extraction and the
//! single-writer apply loop

pub mod errors;
pub mod pipeline;
pub mod updater;

pub use errors::{log_summary, ProcessingStage, WarningCollector};
pub use pipeline::{ChangeKind, ChangeSet, CycleSummary, CycleWarning, ExtractedFile};
pub use updater::IncrementalUpdater;
