//! First-occurrence tracking over a key stream.
//!
//! The tracker answers one question per row, in arrival order: has this
//! `row_id` been seen before? It stores only the keys, never row content,
//! so memory grows with the number of distinct keys observed and with
//! nothing else. Lookup and insert are amortized O(1).

use std::collections::HashSet;

/// Tracks which keys have already been observed in a single run.
///
/// Arrival order defines "first": the first row carrying a given key is the
/// one occurrence that may be accepted; every later row with the same key
/// is a duplicate regardless of its own validity. An absent key is never
/// registered and never counts as a first occurrence, so two rows with a
/// blank `row_id` are not duplicates of each other.
///
/// State lives for one run and is discarded with the tracker.
#[derive(Debug, Default)]
pub struct KeyTracker {
    seen: HashSet<i64>,
}

impl KeyTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the key set for an expected distinct-key count.
    #[must_use]
    pub fn with_capacity(keys: usize) -> Self {
        Self {
            seen: HashSet::with_capacity(keys),
        }
    }

    /// Observe one key; returns `true` iff this is its first occurrence.
    ///
    /// `None` (absent key) always returns `false` and leaves the set
    /// untouched.
    pub fn observe(&mut self, key: Option<i64>) -> bool {
        match key {
            Some(k) => self.seen.insert(k),
            None => false,
        }
    }

    /// Number of distinct keys observed so far.
    #[must_use]
    pub fn distinct_keys(&self) -> usize {
        self.seen.len()
    }
}
