//! Language-specific symbol visitors.
//!
//! Each visitor knows which syntax nodes of its grammar declare symbols and
//! which of them open a new scope.

pub mod javascript;
pub mod python;
pub mod rust;

use std::collections::HashMap;

use tree_sitter::Node;

use super::{ScopeBuilder, MAX_NESTING_DEPTH};

pub use javascript::JavaScriptExtractor;
pub use python::PythonExtractor;
pub use rust::RustExtractor;

/// Trait for language-specific syntax tree visitors.
pub trait LanguageExtractor: Send + Sync {
    /// Language identifier string (e.g., "rust", "python").
    fn language_id(&self) -> &'static str;

    /// Walk a parsed tree and record every declaration in source order.
    fn collect(&self, root: Node, source: &[u8], scope: &mut ScopeBuilder);

    /// Node types this extractor records. Informational.
    fn target_node_types(&self) -> &[&'static str];
}

/// Registry of language-specific extractors.
pub struct ExtractorRegistry {
    extractors: HashMap<String, Box<dyn LanguageExtractor>>,
}

impl ExtractorRegistry {
    /// Create a registry with all built-in extractors.
    pub fn new() -> Self {
        let mut registry = Self {
            extractors: HashMap::new(),
        };

        registry.register(Box::new(PythonExtractor));
        registry.register(Box::new(RustExtractor));
        registry.register(Box::new(JavaScriptExtractor::new("javascript")));
        registry.register(Box::new(JavaScriptExtractor::new("typescript")));
        registry.register(Box::new(JavaScriptExtractor::new("tsx")));

        registry
    }

    pub fn get(&self, language: &str) -> Option<&dyn LanguageExtractor> {
        self.extractors.get(language).map(|e| e.as_ref())
    }

    /// Register a custom extractor, replacing any previous one for its language.
    pub fn register(&mut self, extractor: Box<dyn LanguageExtractor>) {
        let lang_id = extractor.language_id().to_string();
        self.extractors.insert(lang_id, extractor);
    }

    pub fn supported_languages(&self) -> Vec<&str> {
        self.extractors.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns `false` and halts the builder once `depth` passes the limit.
pub(crate) fn within_depth(node: &Node, depth: usize, scope: &mut ScopeBuilder) -> bool {
    if scope.is_halted() {
        return false;
    }
    if depth > MAX_NESTING_DEPTH {
        scope.halt(node);
        return false;
    }
    true
}
