pub mod model;
pub mod error;
pub mod analyzer;
pub mod filter;
pub mod nl;
pub mod parser;
pub mod server;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{LexisError, Result};
use crate::filter::{Filter, FilterQuery};
use crate::model::Record;

#[derive(Default)]
struct Entries {
    by_id: HashMap<String, (u64, Arc<Record>)>,
    next_seq: u64,
}

/// In-memory, content-addressed record store.
///
/// Construct one per process (or per test) and share it behind an `Arc`.
/// Admission is insert-if-absent under a single write guard, so concurrent
/// inserts of the same text store exactly one record.
#[derive(Default)]
pub struct ContentStore {
    entries: RwLock<Entries>,
}

impl fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStore")
        .field("record_count", &self.len())
        .finish()
    }
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Records are immutable once stored, so a poisoned guard still holds consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `record` unless its identifier is already present.
    /// Returns false, leaving the store untouched, on a duplicate.
    pub fn insert(&self, record: Record) -> bool {
        self.insert_if_absent(record).is_some()
    }

    fn insert_if_absent(&self, record: Record) -> Option<Arc<Record>> {
        let mut guard = self.write();
        let entries = &mut *guard;

        match entries.by_id.entry(record.identifier.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                tracing::debug!(id = %record.identifier, "record admitted");
                let record = Arc::new(record);
                slot.insert((entries.next_seq, record.clone()));
                entries.next_seq += 1;
                Some(record)
            }
        }
    }

    pub fn get_by_identifier(&self, id: &str) -> Option<Arc<Record>> {
        self.read().by_id.get(id).map(|(_, r)| r.clone())
    }

    /// Exact, case-sensitive lookup by the original text.
    pub fn get_by_text(&self, raw_text: &str) -> Option<Arc<Record>> {
        self.get_by_identifier(&analyzer::content_hash(raw_text))
            .filter(|r| r.raw_text == raw_text)
    }

    /// Snapshot of every record in insertion order.
    pub fn list_all(&self) -> Vec<Arc<Record>> {
        let entries = self.read();
        let mut all: Vec<_> = entries.by_id.values().cloned().collect();
        drop(entries);

        all.sort_unstable_by_key(|(seq, _)| *seq);
        all.into_iter().map(|(_, r)| r).collect()
    }

    pub fn delete_by_text(&self, raw_text: &str) -> bool {
        let id = analyzer::content_hash(raw_text);
        let mut entries = self.write();

        let matches = entries.by_id.get(&id).is_some_and(|(_, r)| r.raw_text == raw_text);
        if matches {
            entries.by_id.remove(&id);
            tracing::info!(id = %id, "record deleted");
        }
        matches
    }

    pub fn len(&self) -> usize {
        self.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // --- SERVICE OPERATIONS ---

    /// Analyze and admit `raw_text`, reporting a duplicate as `Conflict`.
    pub fn create(&self, raw_text: &str) -> Result<Arc<Record>> {
        self.admit(analyzer::analyze(raw_text))
    }

    /// Admit an already analyzed record, reporting a duplicate as `Conflict`.
    pub fn admit(&self, record: Record) -> Result<Arc<Record>> {
        let id = record.identifier.clone();
        self.insert_if_absent(record).ok_or_else(|| {
            tracing::info!(id = %id, "duplicate rejected");
            LexisError::Conflict
        })
    }

    pub fn fetch(&self, raw_text: &str) -> Result<Arc<Record>> {
        self.get_by_text(raw_text).ok_or(LexisError::NotFound)
    }

    pub fn remove(&self, raw_text: &str) -> Result<()> {
        if self.delete_by_text(raw_text) {
            Ok(())
        } else {
            Err(LexisError::NotFound)
        }
    }

    /// Validate caller-supplied filters and apply them to the current contents.
    pub fn query(&self, query: &FilterQuery) -> Result<(Filter, Vec<Arc<Record>>)> {
        let filter = query.validate()?;
        Ok((filter, filter.apply(self.list_all())))
    }

    /// Translate a free-text query and apply the resulting filter.
    pub fn query_natural(&self, text: &str) -> Result<(Filter, Vec<Arc<Record>>)> {
        let filter = nl::translate(text)?;
        Ok((filter, filter.apply(self.list_all())))
    }
}
