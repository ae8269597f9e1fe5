use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use symdex::extractor::{Extraction, FileExtractor, SymbolExtractor};

/// Wraps the real extractor and counts how many files it was handed.
#[derive(Default)]
pub struct CountingExtractor {
    inner: SymbolExtractor,
    calls: AtomicUsize,
}

impl CountingExtractor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }
}

impl FileExtractor for CountingExtractor {
    fn extract(&self, file_path: &str, source: &str) -> Extraction {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.extract(file_path, source)
    }
}
