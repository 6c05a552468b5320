//! Writer-lifetime memory of items from failed flushes.
//!
//! When a session flush fails mid-job, the framework only knows that some
//! item in the chunk was bad, not which one. Every item of that chunk is
//! recorded here as a suspect; when a suspect is written again in a later
//! chunk, the writer flushes eagerly so the failure surfaces on that item
//! alone.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

struct Inner<T> {
    suspects: HashSet<T>,
    flush_failures: usize,
}

/// Shared, append-only set of suspect items.
///
/// Grows for the lifetime of the writer and is never pruned. Callers should
/// scope a writer to a single job and discard it afterwards rather than keep
/// one alive indefinitely.
pub struct FailureMemory<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> FailureMemory<T>
where
    T: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                suspects: HashSet::new(),
                flush_failures: 0,
            }),
        }
    }

    /// Whether this item was part of a unit of work whose flush failed.
    pub fn contains(&self, item: &T) -> bool {
        self.lock().suspects.contains(item)
    }

    /// Record every item of a failed flush as suspect.
    ///
    /// Counts one flush failure per call. Mutually exclusive with membership
    /// tests, so concurrent failures from different units of work cannot
    /// lose suspects.
    pub fn record_all(&self, items: impl IntoIterator<Item = T>) {
        let mut inner = self.lock();
        inner.flush_failures += 1;
        inner.suspects.extend(items);
    }

    /// Number of suspects currently held.
    pub fn len(&self) -> usize {
        self.lock().suspects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().suspects.is_empty()
    }

    /// Snapshot of counters for operator visibility.
    pub fn stats(&self) -> FailureStats {
        let inner = self.lock();
        FailureStats {
            flush_failures: inner.flush_failures,
            suspects: inner.suspects.len(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // Inserts cannot leave the set half-updated, so a poisoned lock is
        // still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for FailureMemory<T>
where
    T: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Counters describing the failure memory.
///
/// `suspects` only ever grows; exposing it lets long-lived callers observe
/// the memory's size without this crate deciding an eviction policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FailureStats {
    /// Number of flush failures observed over the writer's lifetime.
    pub flush_failures: usize,
    /// Number of distinct suspect items currently held.
    pub suspects: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let memory: FailureMemory<String> = FailureMemory::new();
        assert!(memory.is_empty());
        assert_eq!(memory.stats(), FailureStats::default());
    }

    #[test]
    fn test_record_all_marks_every_item_suspect() {
        let memory = FailureMemory::new();
        memory.record_all(vec!["a", "b"]);

        assert!(memory.contains(&"a"));
        assert!(memory.contains(&"b"));
        assert!(!memory.contains(&"c"));
    }

    #[test]
    fn test_suspects_are_sticky_across_failures() {
        let memory = FailureMemory::new();
        memory.record_all(vec!["a"]);
        memory.record_all(vec!["b"]);

        assert!(memory.contains(&"a"));
        assert_eq!(
            memory.stats(),
            FailureStats {
                flush_failures: 2,
                suspects: 2,
            }
        );
    }

    #[test]
    fn test_duplicate_suspects_counted_once() {
        let memory = FailureMemory::new();
        memory.record_all(vec!["a", "a", "b"]);
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn test_stats_serialize() {
        let memory = FailureMemory::new();
        memory.record_all(vec!["a"]);

        let json = serde_json::to_string(&memory.stats()).unwrap();
        assert_eq!(json, r#"{"flush_failures":1,"suspects":1}"#);
    }
}
