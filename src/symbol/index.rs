//! In-memory symbol index with snapshot reads.
//!
//! The store keeps three views of the indexed files: the authoritative
//! `path -> FileRecord` map and two secondary indexes (`name` and
//! `qualified_path`) pointing back into it. All three change together under
//! one write lock, so a reader never sees a symbol whose file is gone or a
//! file whose symbols are only half indexed.
//!
//! Readers take an [`IndexSnapshot`], a cheap `Arc` clone of the current
//! state. Each map is split into shards behind their own `Arc`; the writer
//! mutates through `Arc::make_mut`, so while older snapshots are alive an
//! apply copies only the shards it touches.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

use super::record::{FileRecord, SymbolId, SymbolRecord};
use crate::source::Fingerprint;

const SHARD_COUNT: usize = 64;

/// Location of a symbol: owning file plus index into its arena.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SymbolKey {
    file: Arc<str>,
    id: SymbolId,
}

/// String-keyed map split into independently shared shards.
#[derive(Debug, Clone)]
struct ShardedMap<V> {
    shards: Vec<Arc<HashMap<Arc<str>, V>>>,
}

impl<V> Default for ShardedMap<V> {
    fn default() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Arc::new(HashMap::new())).collect(),
        }
    }
}

impl<V: Clone> ShardedMap<V> {
    fn shard_of(key: &str) -> usize {
        (xxh3_64(key.as_bytes()) % SHARD_COUNT as u64) as usize
    }

    fn get(&self, key: &str) -> Option<&V> {
        self.shards[Self::shard_of(key)].get(key)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.shards[Self::shard_of(key)].contains_key(key)
    }

    /// The shard holding `key`, copied first if a snapshot still shares it.
    fn shard_mut(&mut self, key: &str) -> &mut HashMap<Arc<str>, V> {
        Arc::make_mut(&mut self.shards[Self::shard_of(key)])
    }

    fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &V)> + '_ {
        self.shards.iter().flat_map(|shard| shard.iter())
    }

    fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.len()).sum()
    }
}

#[derive(Debug, Clone, Default)]
struct IndexState {
    files: ShardedMap<Arc<FileRecord>>,
    by_name: ShardedMap<Vec<SymbolKey>>,
    by_qualified: ShardedMap<Vec<SymbolKey>>,
    symbol_count: usize,
    /// Bumped on every mutation
    generation: u64,
}

impl IndexState {
    fn insert(&mut self, record: FileRecord) {
        let path: Arc<str> = Arc::from(record.path.as_str());

        for symbol in &record.symbols {
            let key = SymbolKey {
                file: Arc::clone(&path),
                id: symbol.id,
            };
            push_key(&mut self.by_name, &symbol.name, key.clone());
            push_key(&mut self.by_qualified, &symbol.qualified_path, key);
        }

        self.symbol_count += record.symbols.len();
        self.files
            .shard_mut(&path)
            .insert(Arc::clone(&path), Arc::new(record));
    }

    fn remove(&mut self, path: &str) -> Option<Arc<FileRecord>> {
        if !self.files.contains_key(path) {
            return None;
        }
        let (_, record) = self.files.shard_mut(path).remove_entry(path)?;

        let names: HashSet<&str> = record.symbols.iter().map(|s| s.name.as_str()).collect();
        for name in names {
            remove_keys(&mut self.by_name, name, path);
        }

        let qualified: HashSet<&str> = record
            .symbols
            .iter()
            .map(|s| s.qualified_path.as_str())
            .collect();
        for qualified_path in qualified {
            remove_keys(&mut self.by_qualified, qualified_path, path);
        }

        self.symbol_count -= record.symbols.len();
        Some(record)
    }

    fn resolve(&self, key: &SymbolKey) -> Option<&SymbolRecord> {
        self.files.get(&key.file)?.symbols.get(key.id.index())
    }
}

fn push_key(index: &mut ShardedMap<Vec<SymbolKey>>, key: &str, entry: SymbolKey) {
    let shard = index.shard_mut(key);
    match shard.get_mut(key) {
        Some(keys) => keys.push(entry),
        None => {
            shard.insert(Arc::from(key), vec![entry]);
        }
    }
}

fn remove_keys(index: &mut ShardedMap<Vec<SymbolKey>>, key: &str, path: &str) {
    if !index.contains_key(key) {
        return;
    }
    let shard = index.shard_mut(key);
    if let Some(keys) = shard.get_mut(key) {
        keys.retain(|k| &*k.file != path);
        if keys.is_empty() {
            shard.remove(key);
        }
    }
}

/// Immutable view of the index at one point in time.
///
/// Snapshots stay valid and unchanged while the store keeps mutating.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    state: Arc<IndexState>,
}

impl IndexSnapshot {
    /// All symbols named exactly `name`, ordered by file path then location.
    pub fn lookup_by_name(&self, name: &str) -> Vec<&SymbolRecord> {
        self.lookup(self.state.by_name.get(name))
    }

    /// All symbols with this qualified path, ordered by file path then location.
    pub fn lookup_by_qualified_path(&self, qualified_path: &str) -> Vec<&SymbolRecord> {
        self.lookup(self.state.by_qualified.get(qualified_path))
    }

    fn lookup(&self, keys: Option<&Vec<SymbolKey>>) -> Vec<&SymbolRecord> {
        let mut symbols: Vec<&SymbolRecord> = keys
            .into_iter()
            .flatten()
            .filter_map(|key| self.state.resolve(key))
            .collect();
        symbols.sort_by(|a, b| a.location_key().cmp(&b.location_key()));
        symbols
    }

    /// Symbols of one file in source order, `None` if the file is not indexed.
    pub fn symbols_in_file(&self, path: &str) -> Option<&[SymbolRecord]> {
        self.state.files.get(path).map(|record| record.symbols.as_slice())
    }

    /// Distinct symbol names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.state.by_name.iter().map(|(name, _)| &**name)
    }

    pub fn file(&self, path: &str) -> Option<&FileRecord> {
        self.state.files.get(path).map(Arc::as_ref)
    }

    pub fn files(&self) -> impl Iterator<Item = &FileRecord> + '_ {
        self.state.files.iter().map(|(_, record)| record.as_ref())
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.state.files.contains_key(path)
    }

    /// Last known fingerprint of every indexed file.
    pub fn fingerprints(&self) -> HashMap<String, Fingerprint> {
        self.state
            .files
            .iter()
            .map(|(path, record)| (path.to_string(), record.fingerprint))
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.state.files.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.state.symbol_count
    }

    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    /// Check that both secondary indexes mirror the file map exactly.
    ///
    /// Returns a description of the first mismatch found.
    pub fn verify_consistency(&self) -> Result<(), String> {
        let mut expected_name: HashMap<&str, usize> = HashMap::new();
        let mut expected_qualified: HashMap<&str, usize> = HashMap::new();
        let mut total = 0;

        for (_, record) in self.state.files.iter() {
            for symbol in &record.symbols {
                *expected_name.entry(symbol.name.as_str()).or_default() += 1;
                *expected_qualified
                    .entry(symbol.qualified_path.as_str())
                    .or_default() += 1;
            }
            total += record.symbols.len();
        }

        if total != self.state.symbol_count {
            return Err(format!(
                "symbol count {} but files hold {}",
                self.state.symbol_count, total
            ));
        }

        for (label, index, expected) in [
            ("name", &self.state.by_name, &expected_name),
            ("qualified path", &self.state.by_qualified, &expected_qualified),
        ] {
            if index.len() != expected.len() {
                return Err(format!(
                    "{} index has {} keys, expected {}",
                    label,
                    index.len(),
                    expected.len()
                ));
            }
            for (key, entries) in index.iter() {
                if expected.get(&**key) != Some(&entries.len()) {
                    return Err(format!("{} index entry '{}' is out of date", label, key));
                }
                if entries.iter().any(|entry| self.state.resolve(entry).is_none()) {
                    return Err(format!("{} index entry '{}' points at a removed file", label, key));
                }
            }
        }

        Ok(())
    }
}

/// Thread-safe symbol index.
///
/// Any number of readers may take snapshots concurrently with the single
/// writer (the incremental updater).
#[derive(Debug, Default)]
pub struct IndexStore {
    state: RwLock<Arc<IndexState>>,
}

impl IndexStore {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from previously extracted file records.
    pub fn from_records(records: impl IntoIterator<Item = FileRecord>) -> Self {
        let mut state = IndexState::default();
        for record in records {
            state.remove(&record.path);
            state.insert(record);
        }
        state.generation = 1;

        Self {
            state: RwLock::new(Arc::new(state)),
        }
    }

    /// Current state of the index.
    pub fn snapshot(&self) -> IndexSnapshot {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        IndexSnapshot {
            state: Arc::clone(&state),
        }
    }

    /// Replace everything known about `record.path` with `record`.
    ///
    /// The old symbols disappear and the new ones appear in one step.
    pub fn apply(&self, record: FileRecord) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let state = Arc::make_mut(&mut *guard);

        let replaced = state.remove(&record.path);
        debug!(
            "Indexed {} ({} symbols, replaced {})",
            record.path,
            record.symbols.len(),
            replaced.map_or(0, |old| old.symbols.len())
        );
        state.insert(record);
        state.generation += 1;
    }

    /// Drop a file and every symbol it owns. Returns `false` if it was not indexed.
    pub fn remove(&self, path: &str) -> bool {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !guard.files.contains_key(path) {
            return false;
        }

        let state = Arc::make_mut(&mut *guard);
        let removed = state.remove(path).is_some();
        state.generation += 1;
        debug!("Removed {} from index", path);
        removed
    }

    pub fn file_count(&self) -> usize {
        self.snapshot().file_count()
    }

    pub fn symbol_count(&self) -> usize {
        self.snapshot().symbol_count()
    }
}
