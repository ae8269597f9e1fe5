//! Per-thread pool of tree-sitter parsers.
//!
//! Provides parser management with language detection and grammar initialization.

use std::collections::HashMap;

use tracing::debug;
use tree_sitter::{Language, Parser};

/// Manages tree-sitter parsers for multiple languages.
///
/// Each language gets its own parser instance, which is reused
/// across multiple parse operations. `Parser` is not `Sync`, so the
/// extractor keeps one pool per worker thread.
pub struct ParserPool {
    /// Map of language identifier to configured parser
    parsers: HashMap<&'static str, Parser>,
    /// Map of language identifier to tree-sitter Language
    languages: HashMap<&'static str, Language>,
}

impl ParserPool {
    /// Create a new parser pool with all supported languages.
    pub fn new() -> Self {
        let mut pool = Self {
            parsers: HashMap::new(),
            languages: HashMap::new(),
        };

        pool.register_language("python", tree_sitter_python::LANGUAGE.into());
        pool.register_language("javascript", tree_sitter_javascript::LANGUAGE.into());
        pool.register_language(
            "typescript",
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        );
        pool.register_language("tsx", tree_sitter_typescript::LANGUAGE_TSX.into());
        pool.register_language("rust", tree_sitter_rust::LANGUAGE.into());

        pool
    }

    fn register_language(&mut self, id: &'static str, language: Language) {
        self.languages.insert(id, language);
    }

    /// Get a parser for the given language.
    ///
    /// Creates the parser on first access and caches it for reuse.
    /// Returns `None` if the language is not supported.
    pub fn get_parser(&mut self, language: &str) -> Option<&mut Parser> {
        let (&id, ts_language) = self.languages.get_key_value(language)?;

        if !self.parsers.contains_key(id) {
            let mut parser = Parser::new();
            if let Err(e) = parser.set_language(ts_language) {
                debug!("Failed to set language '{}' for parser: {:?}", language, e);
                return None;
            }
            self.parsers.insert(id, parser);
        }

        self.parsers.get_mut(id)
    }

    /// Check if a language is supported.
    pub fn supports(&self, language: &str) -> bool {
        self.languages.contains_key(language)
    }

    /// Get a list of all supported languages.
    pub fn supported_languages(&self) -> Vec<&'static str> {
        self.languages.keys().copied().collect()
    }

    /// Detect language from file extension and return the appropriate language ID.
    pub fn detect_language_from_extension(ext: &str) -> Option<&'static str> {
        match ext.to_ascii_lowercase().as_str() {
            "py" | "pyi" => Some("python"),
            "js" | "jsx" | "mjs" | "cjs" => Some("javascript"),
            "ts" | "mts" | "cts" => Some("typescript"),
            "tsx" => Some("tsx"),
            "rs" => Some("rust"),
            _ => None,
        }
    }
}

impl Default for ParserPool {
    fn default() -> Self {
        Self::new()
    }
}
