//! Error types for the session-aware writer.

use snafu::prelude::*;

use crate::context::UnitOfWorkId;

/// Boxed error produced by delegate writers and session handles.
///
/// Collaborators own their error types; this crate never alters them, only
/// carries them through to the caller.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised when the writer is assembled with missing collaborators.
///
/// Detected eagerly at build time, before the writer accepts any items.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// No delegate item writer was provided.
    #[snafu(display("Session-aware writer requires a delegate item writer"))]
    MissingDelegate,

    /// No session operations handle was provided.
    #[snafu(display("Session-aware writer requires a session operations handle"))]
    MissingSession,
}

/// Errors from the per-unit-of-work processed tracker.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TrackerError {
    /// The processed set was accessed with no unit of work bound.
    ///
    /// This is a caller ordering bug: `write` and `flush` bind before use.
    #[snafu(display("Processed items not bound to {unit_of_work}"))]
    NotBound { unit_of_work: UnitOfWorkId },
}

/// Errors surfaced at the writer's public boundary.
///
/// The kind tells callers where in the chunk lifecycle the failure happened:
/// `WriteFailed` mid-chunk, `FlushFailed` on the commit path, `ClearFailed`
/// on the rollback path.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum WriterError {
    /// Delegate write failure, propagated without side effects.
    #[snafu(display("Delegate write failed: {source}"))]
    WriteFailed { source: CollaboratorError },

    /// Session or delegate flush failure (commit path).
    ///
    /// The only error path with a side effect: every item processed so far
    /// in the unit of work is recorded as suspect before this surfaces.
    #[snafu(display("Flush failed: {source}"))]
    FlushFailed { source: CollaboratorError },

    /// Session or delegate clear failure (rollback path).
    #[snafu(display("Clear failed: {source}"))]
    ClearFailed { source: CollaboratorError },

    /// Invariant violation in the processed tracker.
    #[snafu(display("Tracker error: {source}"))]
    Tracker { source: TrackerError },
}

impl From<TrackerError> for WriterError {
    fn from(source: TrackerError) -> Self {
        WriterError::Tracker { source }
    }
}
