//! Per-unit-of-work tracking of written items.
//!
//! One writer instance serves several concurrently active units of work, so
//! the tracker keeps a mutex-guarded map from unit-of-work identity to the
//! set of items written during it. Each unit of work is driven by a single
//! worker thread, so contention is limited to the map itself.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use snafu::prelude::*;

use crate::context::{UnitOfWork, UnitOfWorkId};
use crate::error::{NotBoundSnafu, TrackerError};

/// Tracks the items written during each active unit of work.
pub struct ProcessedTracker<T> {
    sets: Mutex<HashMap<UnitOfWorkId, HashSet<T>>>,
}

impl<T> ProcessedTracker<T>
where
    T: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            sets: Mutex::new(HashMap::new()),
        }
    }

    /// Associate an empty processed set with the unit of work. Idempotent:
    /// binding an already-bound unit of work leaves its set untouched.
    pub fn bind(&self, uow: &UnitOfWork) {
        self.lock().entry(uow.id()).or_default();
    }

    /// Record an item as written in this unit of work.
    ///
    /// Fails with [`TrackerError::NotBound`] if the unit of work has no
    /// processed set; callers must bind first.
    pub fn record(&self, uow: &UnitOfWork, item: T) -> Result<(), TrackerError> {
        let mut sets = self.lock();
        let set = sets.get_mut(&uow.id()).context(NotBoundSnafu {
            unit_of_work: uow.id(),
        })?;
        set.insert(item);
        Ok(())
    }

    /// Snapshot of the items written so far in this unit of work.
    pub fn processed(&self, uow: &UnitOfWork) -> Result<HashSet<T>, TrackerError> {
        self.lock().get(&uow.id()).cloned().context(NotBoundSnafu {
            unit_of_work: uow.id(),
        })
    }

    /// Drop the association for this unit of work. No-op when nothing is
    /// bound, so rollback paths can call it unconditionally.
    pub fn unbind(&self, uow: &UnitOfWork) {
        self.lock().remove(&uow.id());
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UnitOfWorkId, HashSet<T>>> {
        // A set insert cannot leave the map half-updated, so a poisoned lock
        // is still usable.
        self.sets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for ProcessedTracker<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_requires_bind() {
        let tracker: ProcessedTracker<String> = ProcessedTracker::new();
        let uow = UnitOfWork::new();

        let err = tracker.record(&uow, "a".to_string()).unwrap_err();
        assert!(matches!(err, TrackerError::NotBound { .. }));
    }

    #[test]
    fn test_processed_requires_bind() {
        let tracker: ProcessedTracker<String> = ProcessedTracker::new();
        let uow = UnitOfWork::new();

        assert!(tracker.processed(&uow).is_err());
    }

    #[test]
    fn test_bind_is_idempotent() {
        let tracker = ProcessedTracker::new();
        let uow = UnitOfWork::new();

        tracker.bind(&uow);
        tracker.record(&uow, "a").unwrap();
        tracker.bind(&uow);

        let processed = tracker.processed(&uow).unwrap();
        assert_eq!(processed.len(), 1);
        assert!(processed.contains("a"));
    }

    #[test]
    fn test_processed_set_holds_distinct_items() {
        let tracker = ProcessedTracker::new();
        let uow = UnitOfWork::new();

        tracker.bind(&uow);
        tracker.record(&uow, "a").unwrap();
        tracker.record(&uow, "b").unwrap();
        tracker.record(&uow, "a").unwrap();

        let processed = tracker.processed(&uow).unwrap();
        assert_eq!(processed.len(), 2);
    }

    #[test]
    fn test_units_of_work_are_isolated() {
        let tracker = ProcessedTracker::new();
        let first = UnitOfWork::new();
        let second = UnitOfWork::new();

        tracker.bind(&first);
        tracker.bind(&second);
        tracker.record(&first, "a").unwrap();

        assert!(tracker.processed(&second).unwrap().is_empty());
    }

    #[test]
    fn test_unbind_is_noop_when_absent() {
        let tracker: ProcessedTracker<String> = ProcessedTracker::new();
        let uow = UnitOfWork::new();

        tracker.unbind(&uow);
        assert!(tracker.processed(&uow).is_err());
    }

    #[test]
    fn test_unbind_drops_the_set() {
        let tracker = ProcessedTracker::new();
        let uow = UnitOfWork::new();

        tracker.bind(&uow);
        tracker.record(&uow, "a").unwrap();
        tracker.unbind(&uow);

        assert!(tracker.processed(&uow).is_err());
    }
}
