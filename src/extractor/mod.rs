//! Symbol extraction from source text.
//!
//! Files are parsed with tree-sitter and walked by a language-specific
//! visitor that records definitions through a [`ScopeBuilder`]. The builder
//! keeps the scope stack, so every symbol gets its qualified path and the id
//! of its enclosing symbol. Symbols are stored in source order in one arena
//! per file and `parent_id` indexes into that arena.
//!
//! Extraction never fails. Unparseable input yields the prefix of symbols
//! recovered before the first syntax error plus an [`ExtractionWarning`].

pub mod languages;
pub mod parser_pool;

use std::cell::RefCell;
use std::path::Path;

use tracing::debug;
use tree_sitter::Node;

use crate::symbol::{
    ColumnRange, ExtractionWarning, LineRange, Span, SymbolId, SymbolKind, SymbolRecord,
    WarningKind,
};

pub use languages::{ExtractorRegistry, LanguageExtractor};
pub use parser_pool::ParserPool;

/// Deepest syntax nesting a visitor descends into before giving up.
pub const MAX_NESTING_DEPTH: usize = 512;

thread_local! {
    static PARSERS: RefCell<ParserPool> = RefCell::new(ParserPool::new());
}

/// Output of extracting one file.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub language: Option<&'static str>,
    /// Source order, ids equal positions
    pub symbols: Vec<SymbolRecord>,
    pub warnings: Vec<ExtractionWarning>,
}

/// Turns one file's text into symbol records.
///
/// Implementations must be pure: the same input always yields the same
/// symbols. The updater calls this from many threads at once.
pub trait FileExtractor: Send + Sync {
    fn extract(&self, file_path: &str, source: &str) -> Extraction;
}

/// Tree-sitter backed extractor for every registered language.
pub struct SymbolExtractor {
    registry: ExtractorRegistry,
}

impl SymbolExtractor {
    pub fn new() -> Self {
        Self {
            registry: ExtractorRegistry::new(),
        }
    }

    /// Language id for a path, based on its extension.
    pub fn detect_language(path: &str) -> Option<&'static str> {
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ParserPool::detect_language_from_extension)
    }

    fn extract_with(
        &self,
        extractor: &dyn LanguageExtractor,
        language: &'static str,
        file_path: &str,
        source: &str,
    ) -> Extraction {
        let tree = PARSERS.with(|pool| {
            pool.borrow_mut()
                .get_parser(language)
                .and_then(|parser| parser.parse(source, None))
        });

        let Some(tree) = tree else {
            return Extraction {
                language: Some(language),
                symbols: Vec::new(),
                warnings: vec![ExtractionWarning {
                    kind: WarningKind::Partial,
                    line: 1,
                    message: format!("{} parser produced no syntax tree", language),
                }],
            };
        };

        let root = tree.root_node();
        let mut builder = ScopeBuilder::new(file_path);
        extractor.collect(root, source.as_bytes(), &mut builder);

        let mut warnings = Vec::new();
        if let Some(line) = builder.halted_at() {
            warnings.push(ExtractionWarning {
                kind: WarningKind::Partial,
                line,
                message: format!("nesting deeper than {} levels", MAX_NESTING_DEPTH),
            });
        }

        let mut symbols = builder.finish();

        if root.has_error() {
            if let Some(error) = first_error(root) {
                let kept = symbols
                    .iter()
                    .take_while(|s| s.span.start < error.start_byte())
                    .count();
                let dropped = symbols.len() - kept;
                symbols.truncate(kept);

                let line = error.start_position().row + 1;
                let what = if error.is_missing() {
                    format!("missing {}", error.kind())
                } else {
                    "unexpected input".to_string()
                };
                warnings.push(ExtractionWarning {
                    kind: WarningKind::SyntaxError,
                    line,
                    message: format!("{}; {} later symbol(s) dropped", what, dropped),
                });
            }
        }

        Extraction {
            language: Some(language),
            symbols,
            warnings,
        }
    }
}

impl Default for SymbolExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FileExtractor for SymbolExtractor {
    fn extract(&self, file_path: &str, source: &str) -> Extraction {
        let Some(language) = Self::detect_language(file_path) else {
            debug!("No language for {}, indexing without symbols", file_path);
            return Extraction::default();
        };

        let Some(extractor) = self.registry.get(language) else {
            debug!("No extractor for language '{}'", language);
            return Extraction {
                language: Some(language),
                ..Default::default()
            };
        };

        self.extract_with(extractor, language, file_path, source)
    }
}

/// One level of the lexical scope stack.
#[derive(Debug)]
struct Frame {
    qualified_path: String,
    kind: SymbolKind,
    /// `None` for name-only scopes such as a Rust `impl` of a foreign type
    symbol: Option<SymbolId>,
}

/// Collects symbols for one file while a visitor walks its syntax tree.
pub struct ScopeBuilder<'a> {
    file_path: &'a str,
    symbols: Vec<SymbolRecord>,
    frames: Vec<Frame>,
    halted_at: Option<usize>,
}

impl<'a> ScopeBuilder<'a> {
    pub fn new(file_path: &'a str) -> Self {
        Self {
            file_path,
            symbols: Vec::new(),
            frames: Vec::new(),
            halted_at: None,
        }
    }

    /// Kind of the innermost scope, `None` at file level.
    pub fn scope_kind(&self) -> Option<SymbolKind> {
        self.frames.last().map(|frame| frame.kind)
    }

    /// Whether plain bindings (variables, imports) are recorded here.
    pub fn records_bindings(&self) -> bool {
        self.scope_kind().map_or(true, |kind| kind.records_bindings())
    }

    /// Kind for a function declared in the current scope.
    pub fn function_kind(&self) -> SymbolKind {
        match self.scope_kind() {
            Some(kind) if kind.holds_methods() => SymbolKind::Method,
            _ => SymbolKind::Function,
        }
    }

    /// Record a symbol declared in the current scope.
    ///
    /// `node` provides the span; returns `None` for empty names or once the
    /// builder has halted.
    pub fn add(&mut self, name: &str, kind: SymbolKind, node: &Node) -> Option<SymbolId> {
        let name = name.trim();
        if name.is_empty() || self.is_halted() {
            return None;
        }

        let qualified_path = self.qualify(name);
        let parent_id = self.frames.iter().rev().find_map(|frame| frame.symbol);
        let id = SymbolId(self.symbols.len() as u32);
        let start = node.start_position();
        let end = node.end_position();

        self.symbols.push(SymbolRecord {
            id,
            name: name.to_string(),
            kind,
            qualified_path,
            file_path: self.file_path.to_string(),
            span: Span {
                start: node.start_byte(),
                end: node.end_byte(),
            },
            line_range: LineRange {
                start: start.row + 1,
                end: end.row + 1,
            },
            column_range: ColumnRange {
                start: start.column + 1,
                end: end.column + 1,
            },
            parent_id,
        });

        Some(id)
    }

    /// Open the scope of a recorded symbol.
    pub fn enter(&mut self, id: SymbolId) {
        let symbol = &self.symbols[id.index()];
        self.frames.push(Frame {
            qualified_path: symbol.qualified_path.clone(),
            kind: symbol.kind,
            symbol: Some(id),
        });
    }

    /// Open a scope that has no symbol of its own.
    pub fn enter_named(&mut self, name: &str, kind: SymbolKind) {
        self.frames.push(Frame {
            qualified_path: self.qualify(name.trim()),
            kind,
            symbol: None,
        });
    }

    pub fn exit(&mut self) {
        self.frames.pop();
    }

    /// Latest symbol named `name` of `kind` declared directly in the current scope.
    pub fn find_in_scope(&self, name: &str, kind: SymbolKind) -> Option<SymbolId> {
        let expected = self.qualify(name.trim());
        self.symbols
            .iter()
            .rev()
            .find(|s| s.kind == kind && s.qualified_path == expected)
            .map(|s| s.id)
    }

    /// Stop recording; everything after `node` is left out.
    pub fn halt(&mut self, node: &Node) {
        if self.halted_at.is_none() {
            self.halted_at = Some(node.start_position().row + 1);
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted_at.is_some()
    }

    /// Line where extraction stopped early, if it did.
    pub fn halted_at(&self) -> Option<usize> {
        self.halted_at
    }

    pub fn finish(self) -> Vec<SymbolRecord> {
        self.symbols
    }

    fn qualify(&self, name: &str) -> String {
        match self.frames.last() {
            Some(frame) => format!("{}.{}", frame.qualified_path, name),
            None => name.to_string(),
        }
    }
}

/// Source text covered by a node.
pub fn node_text<'s>(node: &Node, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or("")
}

/// Named children of a node, collected so callers can recurse freely.
pub fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// First error or missing node in document order.
///
/// Walks with a cursor so arbitrarily deep trees use constant stack. Only
/// subtrees that contain an error are entered.
pub fn first_error<'t>(node: Node<'t>) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    loop {
        let current = cursor.node();
        if current.is_error() || current.is_missing() {
            return Some(current);
        }
        if current.has_error() && cursor.goto_first_child() {
            continue;
        }

        // Clean subtree: move on to the next sibling, climbing as needed
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}
