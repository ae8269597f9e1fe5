//! Symbol and file records held by the index.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::Fingerprint;

/// Kinds of symbols the extractors produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// A module or namespace
    Module,
    /// A class, struct, enum, trait or interface
    Class,
    /// A free function
    Function,
    /// A function declared inside a class-like scope
    Method,
    /// A module- or class-level binding
    Variable,
    /// A name brought into scope by an import
    Import,
}

impl SymbolKind {
    /// Convert to a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Module => "module",
            SymbolKind::Class => "class",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Variable => "variable",
            SymbolKind::Import => "import",
        }
    }

    /// Parse from a string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "module" => Some(SymbolKind::Module),
            "class" => Some(SymbolKind::Class),
            "function" => Some(SymbolKind::Function),
            "method" => Some(SymbolKind::Method),
            "variable" => Some(SymbolKind::Variable),
            "import" => Some(SymbolKind::Import),
            _ => None,
        }
    }

    /// Whether definitions nested inside this symbol are scoped under it.
    pub fn opens_scope(&self) -> bool {
        match self {
            SymbolKind::Module | SymbolKind::Class | SymbolKind::Function | SymbolKind::Method => {
                true
            }
            SymbolKind::Variable | SymbolKind::Import => false,
        }
    }

    /// Whether functions declared directly inside this scope are methods.
    pub fn holds_methods(&self) -> bool {
        match self {
            SymbolKind::Class => true,
            SymbolKind::Module
            | SymbolKind::Function
            | SymbolKind::Method
            | SymbolKind::Variable
            | SymbolKind::Import => false,
        }
    }

    /// Whether plain bindings inside this scope are indexed as variables.
    ///
    /// Locals of function bodies are not symbols.
    pub fn records_bindings(&self) -> bool {
        match self {
            SymbolKind::Module | SymbolKind::Class => true,
            SymbolKind::Function
            | SymbolKind::Method
            | SymbolKind::Variable
            | SymbolKind::Import => false,
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index of a symbol inside its owning [`FileRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Byte offsets into the file content, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// 1-indexed, inclusive line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

/// 1-indexed byte columns of the first and last line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub start: usize,
    pub end: usize,
}

/// A single extracted symbol. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub qualified_path: String,
    pub file_path: String,
    pub span: Span,
    pub line_range: LineRange,
    pub column_range: ColumnRange,
    /// Enclosing symbol in the same file
    pub parent_id: Option<SymbolId>,
}

impl SymbolRecord {
    /// Sort key used by every location-ordered query.
    pub fn location_key(&self) -> (&str, usize, usize, SymbolId) {
        (
            self.file_path.as_str(),
            self.line_range.start,
            self.span.start,
            self.id,
        )
    }
}

/// Kind of problem found while extracting a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// The source contains a syntax error; symbols after it were dropped
    SyntaxError,
    /// Extraction stopped early; only a prefix of the file was processed
    Partial,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningKind::SyntaxError => write!(f, "syntax error"),
            WarningKind::Partial => write!(f, "partial"),
        }
    }
}

/// Soft extraction failure attached to a file record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionWarning {
    pub kind: WarningKind,
    /// 1-indexed line where extraction stopped
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at line {}: {}", self.kind, self.line, self.message)
    }
}

/// All indexed facts about one file. Owns its symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub language: Option<String>,
    pub fingerprint: Fingerprint,
    /// Source order; `symbols[i].id == SymbolId(i)`
    pub symbols: Vec<SymbolRecord>,
    #[serde(default)]
    pub warnings: Vec<ExtractionWarning>,
}

/// A broken parent link or misplaced symbol inside a file record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid symbol '{qualified_path}' in {file_path}: {reason}")]
pub struct ScopeViolation {
    pub file_path: String,
    pub qualified_path: String,
    pub reason: String,
}

impl FileRecord {
    /// Check the arena invariants: ids match positions, every symbol points
    /// back at this file, and every parent is an earlier symbol whose
    /// qualified path is a strict dotted prefix of the child's.
    pub fn validate(&self) -> Result<(), ScopeViolation> {
        for (index, symbol) in self.symbols.iter().enumerate() {
            let violation = |reason: String| ScopeViolation {
                file_path: self.path.clone(),
                qualified_path: symbol.qualified_path.clone(),
                reason,
            };

            if symbol.id.index() != index {
                return Err(violation(format!("id {} at position {}", symbol.id.0, index)));
            }
            if symbol.file_path != self.path {
                return Err(violation(format!("belongs to {}", symbol.file_path)));
            }

            let Some(parent_id) = symbol.parent_id else {
                continue;
            };
            if parent_id.index() >= index {
                return Err(violation(format!("parent {} is not an earlier symbol", parent_id.0)));
            }
            let parent = &self.symbols[parent_id.index()];
            let is_prefix = symbol
                .qualified_path
                .strip_prefix(parent.qualified_path.as_str())
                .is_some_and(|rest| rest.starts_with('.') && rest.len() > 1);
            if !is_prefix {
                return Err(violation(format!(
                    "parent path '{}' is not a prefix",
                    parent.qualified_path
                )));
            }
        }
        Ok(())
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}

/// Symbol shape returned to callers of the query surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolDescriptor {
    pub name: String,
    pub kind: SymbolKind,
    pub qualified_path: String,
    pub file_path: String,
    pub line_range: LineRange,
}

impl From<&SymbolRecord> for SymbolDescriptor {
    fn from(symbol: &SymbolRecord) -> Self {
        Self {
            name: symbol.name.clone(),
            kind: symbol.kind,
            qualified_path: symbol.qualified_path.clone(),
            file_path: symbol.file_path.clone(),
            line_range: symbol.line_range,
        }
    }
}

impl From<SymbolRecord> for SymbolDescriptor {
    fn from(symbol: SymbolRecord) -> Self {
        Self {
            name: symbol.name,
            kind: symbol.kind,
            qualified_path: symbol.qualified_path,
            file_path: symbol.file_path,
            line_range: symbol.line_range,
        }
    }
}
