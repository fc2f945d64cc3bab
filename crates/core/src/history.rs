//! Search history journal.
//!
//! An ordered, deduplicated, size-bounded log of submitted queries, oldest
//! first. Every mutation writes the full list through to a [`StoragePort`]
//! under a fixed key. Storage problems never surface to the caller: the
//! in-memory list stays authoritative for the rest of the session.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::{StoragePort, StoreError};

pub const MAX_ENTRIES: usize = 15;
pub const HISTORY_KEY: &str = "mathMexSearchHistory";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    #[serde(rename = "latex")]
    pub query: String,
    pub timestamp: i64,
}

impl HistoryEntry {
    pub fn new(query: impl Into<String>, timestamp: i64) -> Self {
        Self {
            query: query.into(),
            timestamp,
        }
    }
}

pub struct HistoryJournal<S: StoragePort> {
    store: S,
    key: String,
    entries: Vec<HistoryEntry>,
}

impl<S: StoragePort> HistoryJournal<S> {
    /// Builds a journal over `store` and hydrates it from the default key.
    pub fn open(store: S) -> Self {
        Self::open_with_key(store, HISTORY_KEY)
    }

    pub fn open_with_key(store: S, key: impl Into<String>) -> Self {
        let mut j = Self {
            store,
            key: key.into(),
            entries: Vec::new(),
        };
        j.entries = j.hydrate();
        debug!(target: "core::history", "hydrated {} entries from '{}'", j.entries.len(), j.key);
        j
    }

    /// Reads the persisted list. Missing, empty or malformed data is an empty
    /// history, never an error.
    pub fn hydrate(&self) -> Vec<HistoryEntry> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(target: "core::history", "history store unreadable: {}", e);
                return Vec::new();
            }
        };
        if raw.trim().is_empty() {
            return Vec::new();
        }
        match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
            Ok(list) => normalize(list),
            Err(e) => {
                warn!(target: "core::history", "ignoring malformed history: {}", e);
                Vec::new()
            }
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record(&mut self, query: &str) -> &[HistoryEntry] {
        self.record_at(query, now_millis())
    }

    /// Moves `query` to the tail with `timestamp`, evicting the oldest entries
    /// beyond [`MAX_ENTRIES`], then writes the list through.
    pub fn record_at(&mut self, query: &str, timestamp: i64) -> &[HistoryEntry] {
        if query.is_empty() {
            return &self.entries;
        }
        self.entries.retain(|e| e.query != query);
        self.entries.push(HistoryEntry::new(query, timestamp));
        if self.entries.len() > MAX_ENTRIES {
            let excess = self.entries.len() - MAX_ENTRIES;
            self.entries.drain(..excess);
        }
        if let Err(e) = self.persist() {
            warn!(target: "core::history", "history not persisted: {}", e);
        }
        &self.entries
    }

    pub fn clear(&mut self) -> &[HistoryEntry] {
        self.entries.clear();
        if let Err(e) = self.store.delete(&self.key) {
            warn!(target: "core::history", "history not cleared in store: {}", e);
        }
        &self.entries
    }

    /// Newest-first copy of the current entries.
    pub fn display(&self) -> Vec<HistoryEntry> {
        project_for_display(&self.entries)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let data =
            serde_json::to_string(&self.entries).map_err(|e| StoreError::Encode(e.to_string()))?;
        self.store.set(&self.key, &data)
    }
}

pub fn project_for_display(entries: &[HistoryEntry]) -> Vec<HistoryEntry> {
    entries.iter().rev().cloned().collect()
}

/// Something holding a query field that can run a search on it.
pub trait ReplayTarget {
    fn commit_query(&mut self, query: &str);
    /// Must read the query committed by the preceding `commit_query`.
    fn run_search(&mut self);
}

/// Re-issues a past query: the field update completes before the search
/// reads it.
pub fn replay<T: ReplayTarget + ?Sized>(target: &mut T, entry: &HistoryEntry) {
    target.commit_query(&entry.query);
    target.run_search();
}

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

// Stored data may come from older clients without the bounds enforced.
fn normalize(list: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    let mut out: Vec<HistoryEntry> = Vec::with_capacity(list.len().min(MAX_ENTRIES));
    for e in list {
        if e.query.is_empty() {
            continue;
        }
        out.retain(|x| x.query != e.query);
        out.push(e);
    }
    if out.len() > MAX_ENTRIES {
        let excess = out.len() - MAX_ENTRIES;
        out.drain(..excess);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileStore, MemoryStore};

    fn queries(entries: &[HistoryEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.query.as_str()).collect()
    }

    struct BrokenStore;

    impl StoragePort for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Poisoned)
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "quota exceeded",
            )))
        }
        fn delete(&mut self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    #[test]
    fn repeated_query_moves_to_tail() {
        let mut j = HistoryJournal::open(MemoryStore::new());
        j.record_at("a^2+b^2=c^2", 1000);
        j.record_at("x^2", 2000);
        let out = j.record_at("a^2+b^2=c^2", 3000).to_vec();
        assert_eq!(
            out,
            vec![
                HistoryEntry::new("x^2", 2000),
                HistoryEntry::new("a^2+b^2=c^2", 3000),
            ]
        );
    }

    #[test]
    fn sixteenth_query_evicts_the_oldest() {
        let mut j = HistoryJournal::open(MemoryStore::new());
        for i in 1..=16 {
            j.record_at(&format!("q{}", i), i);
        }
        let expected: Vec<String> = (2..=16).map(|i| format!("q{}", i)).collect();
        assert_eq!(j.len(), MAX_ENTRIES);
        assert_eq!(queries(j.entries()), expected);
    }

    #[test]
    fn empty_query_is_ignored() {
        let store = MemoryStore::new();
        let mut j = HistoryJournal::open(store.clone());
        assert!(j.record("").is_empty());
        assert_eq!(store.get(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn bounds_and_uniqueness_hold_after_every_call() {
        let mut j = HistoryJournal::open(MemoryStore::new());
        // Deterministic pseudo-random mix of fresh and repeated queries.
        let mut seed = 7u64;
        for t in 0..400 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let q = format!("q{}", (seed >> 33) % 23);
            j.record_at(&q, t);
            assert!(j.len() <= MAX_ENTRIES);
            let mut seen = std::collections::HashSet::new();
            assert!(j.entries().iter().all(|e| seen.insert(e.query.clone())));
            assert_eq!(j.entries().last().map(|e| e.query.as_str()), Some(q.as_str()));
            assert_eq!(j.entries().last().map(|e| e.timestamp), Some(t));
        }
    }

    #[test]
    fn reload_sees_the_same_entries() {
        let store = MemoryStore::new();
        let mut j = HistoryJournal::open(store.clone());
        j.record_at("\\int_a^b f'(x) dx", 10);
        j.record_at("e^{i\\pi} + 1 = 0", 20);
        let before = j.entries().to_vec();
        drop(j);

        let reloaded = HistoryJournal::open(store);
        assert_eq!(reloaded.entries(), before.as_slice());
        assert_eq!(reloaded.hydrate(), before);
    }

    #[test]
    fn reload_from_file_store() {
        let dir = tempfile::TempDir::new().unwrap();
        {
            let mut j = HistoryJournal::open(FileStore::new(dir.path()));
            j.record_at("x^2", 5);
        }
        let j = HistoryJournal::open(FileStore::new(dir.path()));
        assert_eq!(j.entries(), &[HistoryEntry::new("x^2", 5)]);
    }

    #[test]
    fn stored_format_uses_latex_field() {
        let store = MemoryStore::new();
        let mut j = HistoryJournal::open(store.clone());
        j.record_at("x^2", 2000);
        let raw = store.get(HISTORY_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"[{"latex":"x^2","timestamp":2000}]"#);
    }

    #[test]
    fn malformed_storage_is_empty_history() {
        for raw in ["not json", "", "{\"latex\":1}", "[{\"query\":\"x\"}]"] {
            let mut store = MemoryStore::new();
            store.set(HISTORY_KEY, raw).unwrap();
            let j = HistoryJournal::open(store);
            assert!(j.is_empty(), "raw={:?}", raw);
            assert!(j.hydrate().is_empty());
        }
    }

    #[test]
    fn hydrate_normalizes_out_of_bounds_data() {
        let mut list: Vec<HistoryEntry> =
            (0..20).map(|i| HistoryEntry::new(format!("q{}", i), i)).collect();
        list.push(HistoryEntry::new("q19", 99));
        list.push(HistoryEntry::new("", 100));
        let mut store = MemoryStore::new();
        store
            .set(HISTORY_KEY, &serde_json::to_string(&list).unwrap())
            .unwrap();
        let j = HistoryJournal::open(store);
        assert_eq!(j.len(), MAX_ENTRIES);
        assert_eq!(j.entries().last(), Some(&HistoryEntry::new("q19", 99)));
        assert_eq!(j.entries()[0].query, "q4");
    }

    #[test]
    fn clear_empties_memory_and_store() {
        let store = MemoryStore::new();
        let mut j = HistoryJournal::open(store.clone());
        j.record_at("x", 1);
        assert!(j.clear().is_empty());
        assert_eq!(store.get(HISTORY_KEY).unwrap(), None);
        assert!(HistoryJournal::open(store).is_empty());
    }

    #[test]
    fn storage_failures_keep_memory_authoritative() {
        let mut j = HistoryJournal::open(BrokenStore);
        assert!(j.is_empty());
        j.record_at("x", 1);
        j.record_at("y", 2);
        assert_eq!(queries(j.entries()), vec!["x", "y"]);
        assert!(j.clear().is_empty());
    }

    #[test]
    fn display_is_reverse_and_involutive() {
        let mut j = HistoryJournal::open(MemoryStore::new());
        for (i, q) in ["a", "b", "c"].iter().enumerate() {
            j.record_at(q, i as i64);
        }
        let shown = j.display();
        assert_eq!(queries(&shown), vec!["c", "b", "a"]);
        assert_eq!(project_for_display(&shown), j.entries());
        assert_eq!(queries(j.entries()), vec!["a", "b", "c"]);
    }

    #[derive(Default)]
    struct Recorder {
        field: String,
        events: Vec<String>,
    }

    impl ReplayTarget for Recorder {
        fn commit_query(&mut self, query: &str) {
            self.field = query.to_string();
            self.events.push(format!("commit:{}", query));
        }
        fn run_search(&mut self) {
            self.events.push(format!("search:{}", self.field));
        }
    }

    #[test]
    fn replay_commits_before_searching() {
        let mut r = Recorder {
            field: "stale".into(),
            ..Default::default()
        };
        replay(&mut r, &HistoryEntry::new("x^2", 1));
        assert_eq!(r.events, vec!["commit:x^2", "search:x^2"]);
    }
}
