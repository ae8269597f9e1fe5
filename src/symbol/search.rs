//! Read-side query resolution over index snapshots.
//!
//! Every query takes one snapshot up front, so its result reflects a single
//! consistent index state even while an update cycle is applying files.

use std::sync::Arc;

use tracing::debug;

use super::index::{IndexSnapshot, IndexStore};
use super::record::{SymbolDescriptor, SymbolRecord};
use crate::config::SearchConfig;
use crate::error::QueryError;

/// Per-call options for substring search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    /// Maximum number of results, `None` for unlimited
    pub limit: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for SearchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            case_sensitive: config.case_sensitive,
            limit: (config.max_results > 0).then_some(config.max_results),
        }
    }
}

/// Answers symbol queries against the shared index.
#[derive(Debug, Clone)]
pub struct QueryResolver {
    store: Arc<IndexStore>,
    defaults: SearchOptions,
}

impl QueryResolver {
    pub fn new(store: Arc<IndexStore>, config: &SearchConfig) -> Self {
        Self {
            store,
            defaults: SearchOptions::from(config),
        }
    }

    /// Symbols named exactly `name`, ordered by `(file_path, line)`.
    pub fn find_by_name(&self, name: &str) -> Result<Vec<SymbolDescriptor>, QueryError> {
        let name = non_empty(name, "name")?;
        let snapshot = self.store.snapshot();
        Ok(describe(snapshot.lookup_by_name(name)))
    }

    /// Symbols whose qualified path equals `qualified_path`, ordered by
    /// `(file_path, line)`. Colliding paths from different files are all returned.
    pub fn find_by_qualified_path(
        &self,
        qualified_path: &str,
    ) -> Result<Vec<SymbolDescriptor>, QueryError> {
        let qualified_path = non_empty(qualified_path, "qualified path")?;
        let snapshot = self.store.snapshot();
        Ok(describe(snapshot.lookup_by_qualified_path(qualified_path)))
    }

    /// Substring search with the configured defaults.
    pub fn search(&self, pattern: &str) -> Result<Vec<SymbolDescriptor>, QueryError> {
        self.search_with(pattern, &self.defaults)
    }

    /// Symbols whose name contains `pattern`.
    ///
    /// Ordered by the position of the match inside the name, then file path,
    /// then line, so exact and prefix matches come first.
    pub fn search_with(
        &self,
        pattern: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SymbolDescriptor>, QueryError> {
        if pattern.trim().is_empty() {
            return Err(QueryError::EmptyQuery {
                query_kind: "pattern",
            });
        }

        let snapshot = self.store.snapshot();
        let mut matches = substring_matches(&snapshot, pattern, options.case_sensitive);
        matches.sort_by(|(pos_a, a), (pos_b, b)| {
            pos_a
                .cmp(pos_b)
                .then_with(|| a.location_key().cmp(&b.location_key()))
        });

        let total = matches.len();
        if let Some(limit) = options.limit {
            matches.truncate(limit);
        }
        debug!(
            "Substring '{}' matched {} symbols, returning {}",
            pattern,
            total,
            matches.len()
        );

        Ok(matches
            .into_iter()
            .map(|(_, symbol)| SymbolDescriptor::from(symbol))
            .collect())
    }

    /// All symbols of one file in source order. Unknown files yield no symbols.
    pub fn file_symbols(&self, file_path: &str) -> Result<Vec<SymbolDescriptor>, QueryError> {
        let file_path = normalize_file_path(non_empty(file_path, "file path")?);
        let snapshot = self.store.snapshot();
        Ok(snapshot
            .symbols_in_file(&file_path)
            .map(|symbols| symbols.iter().map(SymbolDescriptor::from).collect())
            .unwrap_or_default())
    }
}

fn non_empty<'q>(query: &'q str, query_kind: &'static str) -> Result<&'q str, QueryError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(QueryError::EmptyQuery { query_kind });
    }
    Ok(trimmed)
}

fn describe(symbols: Vec<&SymbolRecord>) -> Vec<SymbolDescriptor> {
    symbols.into_iter().map(SymbolDescriptor::from).collect()
}

/// Linear scan over the distinct names, pairing each hit with its match position.
fn substring_matches<'s>(
    snapshot: &'s IndexSnapshot,
    pattern: &str,
    case_sensitive: bool,
) -> Vec<(usize, &'s SymbolRecord)> {
    let folded_pattern = pattern.to_lowercase();
    let mut matches = Vec::new();

    for name in snapshot.names() {
        let position = if case_sensitive {
            name.find(pattern)
        } else {
            name.to_lowercase().find(&folded_pattern)
        };

        if let Some(position) = position {
            matches.extend(
                snapshot
                    .lookup_by_name(name)
                    .into_iter()
                    .map(|symbol| (position, symbol)),
            );
        }
    }

    matches
}

/// Index keys are root-relative and `/`-separated.
fn normalize_file_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut path = path.as_str();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.to_string()
}
