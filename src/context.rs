//! Explicit unit-of-work context threaded through writer calls.
//!
//! The step controller creates one [`UnitOfWork`] per transaction and passes
//! it to every `write`/`flush`/`clear` call on the writer. The handle also
//! carries the "complete only" flag: the writer sets it to request early
//! chunk termination, and the step controller polls it between items.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitOfWorkId(u64);

impl fmt::Display for UnitOfWorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uow-{}", self.0)
    }
}

/// Handle for one transactional unit of work.
///
/// Writes are grouped under a unit of work until the step controller either
/// commits (calls `flush`) or rolls back (calls `clear`). A single writer
/// instance may serve several concurrently active units of work, but calls
/// within one unit of work are sequential.
#[derive(Debug)]
pub struct UnitOfWork {
    id: UnitOfWorkId,
    complete_only: AtomicBool,
}

impl UnitOfWork {
    /// Create a fresh unit of work with a process-unique identity.
    pub fn new() -> Self {
        Self {
            id: UnitOfWorkId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            complete_only: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> UnitOfWorkId {
        self.id
    }

    /// Request early completion of the current chunk.
    ///
    /// Once set, the step controller should stop feeding items into this
    /// unit of work and commit (or roll back) as soon as possible.
    pub fn set_complete_only(&self) {
        self.complete_only.store(true, Ordering::SeqCst);
    }

    /// Whether early completion has been requested.
    pub fn is_complete_only(&self) -> bool {
        self.complete_only.load(Ordering::SeqCst)
    }
}

impl Default for UnitOfWork {
    fn default() -> Self {
        Self::new()
    }
}
