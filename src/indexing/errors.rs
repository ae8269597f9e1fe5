//! Warning collection and reporting for update cycles

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use super::pipeline::CycleWarning;

/// Stage where a warning was raised
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum ProcessingStage {
    FileRead,
    Extraction,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::FileRead => write!(f, "File Read"),
            ProcessingStage::Extraction => write!(f, "Extraction"),
        }
    }
}

impl From<&CycleWarning> for ProcessingStage {
    fn from(warning: &CycleWarning) -> Self {
        match warning {
            CycleWarning::FileRead(_) => ProcessingStage::FileRead,
            CycleWarning::Extraction { .. } => ProcessingStage::Extraction,
        }
    }
}

/// Collects warnings from the extraction workers and the writer
#[derive(Clone, Default)]
pub struct WarningCollector {
    warnings: Arc<Mutex<Vec<CycleWarning>>>,
}

impl WarningCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, warning: CycleWarning) {
        self.lock().push(warning);
    }

    /// Number of files skipped because they could not be read
    pub fn failed_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|w| matches!(w, CycleWarning::FileRead(_)))
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.lock().len()
    }

    /// All warnings ordered by path, leaving the collector empty.
    pub fn take(&self) -> Vec<CycleWarning> {
        let mut warnings = std::mem::take(&mut *self.lock());
        warnings.sort_by(|a, b| a.path().cmp(b.path()));
        warnings
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<CycleWarning>> {
        self.warnings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Log warnings grouped by stage, with a few examples each
pub fn log_summary(warnings: &[CycleWarning]) {
    if warnings.is_empty() {
        info!("No warnings during indexing");
        return;
    }

    let mut by_stage: BTreeMap<ProcessingStage, Vec<&CycleWarning>> = BTreeMap::new();
    for warning in warnings {
        by_stage
            .entry(ProcessingStage::from(warning))
            .or_default()
            .push(warning);
    }

    warn!("Indexing completed with {} warnings", warnings.len());
    for (stage, stage_warnings) in &by_stage {
        warn!("  {}: {} warnings", stage, stage_warnings.len());

        // Show up to 5 examples per stage
        for warning in stage_warnings.iter().take(5) {
            warn!("    - {}", warning);
        }

        if stage_warnings.len() > 5 {
            warn!("    ... and {} more", stage_warnings.len() - 5);
        }
    }
}
