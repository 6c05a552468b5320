//! Session-aware delegating writer.
//!
//! Wraps a delegate [`ItemWriter`] and takes the chunk-boundary session
//! responsibilities away from it: tracking what was written per unit of
//! work, flushing and clearing the persistence session at commit and
//! rollback, and forcing early completion when a previously failed item
//! reappears.

use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

use snafu::prelude::*;
use tracing::{debug, error, warn};

use crate::context::UnitOfWork;
use crate::emit;
use crate::error::{
    ClearFailedSnafu, ConfigError, FlushFailedSnafu, MissingDelegateSnafu, MissingSessionSnafu,
    WriteFailedSnafu, WriterError,
};
use crate::failures::{FailureMemory, FailureStats};
use crate::metrics::events::{EagerFlushTriggered, FlushFailure, ItemsWritten, SuspectsRecorded};
use crate::session::SessionOperations;
use crate::tracker::ProcessedTracker;
use crate::writer::traits::ItemWriter;

/// Item writer that coordinates a persistence session around a delegate.
///
/// `write` is expected to be called inside a unit of work, with `flush`
/// before it commits or `clear` before it rolls back. A single instance is
/// safe to share across concurrent units of work.
///
/// Items from a failed flush are remembered for the lifetime of the writer
/// and that memory is never pruned, so an instance should live for one job
/// and then be discarded.
pub struct SessionAwareItemWriter<T, W, S> {
    delegate: W,
    session: S,
    tracker: ProcessedTracker<T>,
    failures: FailureMemory<T>,
    step: String,
}

impl<T, W, S> SessionAwareItemWriter<T, W, S>
where
    T: Clone + Eq + Hash + Debug + Send + Sync,
    W: ItemWriter<T>,
    S: SessionOperations,
{
    pub fn builder() -> SessionAwareItemWriterBuilder<T, W, S> {
        SessionAwareItemWriterBuilder::new()
    }

    /// Write one item through the delegate.
    ///
    /// The item is recorded in the unit of work's processed set first. A
    /// delegate failure is propagated as [`WriterError::WriteFailed`] with
    /// no side effects. If the item is a known suspect, the write is
    /// followed by a forced early completion and an eager session flush.
    pub async fn write(&self, uow: &UnitOfWork, item: T) -> Result<(), WriterError> {
        self.tracker.bind(uow);
        self.tracker.record(uow, item.clone())?;
        self.delegate
            .write(&item)
            .await
            .context(WriteFailedSnafu)?;
        emit!(ItemsWritten {
            count: 1,
            step: self.step.clone(),
        });
        self.flush_if_necessary(uow, &item).await
    }

    /// Flush the session and the delegate at the end of a chunk.
    ///
    /// Called before the unit of work commits. Any failure surfaces as
    /// [`WriterError::FlushFailed`]; a session failure additionally records
    /// every item of this unit of work as suspect.
    pub async fn flush(&self, uow: &UnitOfWork) -> Result<(), WriterError> {
        // Bind in case flush is invoked without a prior write.
        self.tracker.bind(uow);
        self.do_flush(uow).await?;
        self.tracker.unbind(uow);
        self.delegate.flush().await.context(FlushFailedSnafu)?;
        Ok(())
    }

    /// Discard the unit of work: drop its processed set, clear the session,
    /// then clear the delegate.
    ///
    /// Called before the unit of work rolls back. Safe to call without any
    /// prior `write`. Failures surface as [`WriterError::ClearFailed`].
    pub async fn clear(&self, uow: &UnitOfWork) -> Result<(), WriterError> {
        self.tracker.unbind(uow);
        self.session.clear().await.context(ClearFailedSnafu)?;
        self.delegate.clear().await.context(ClearFailedSnafu)?;
        Ok(())
    }

    /// Counters for the never-pruned failure memory.
    pub fn failure_stats(&self) -> FailureStats {
        self.failures.stats()
    }

    /// Force an eager flush when the item was part of a failed chunk.
    ///
    /// We don't know which item broke that chunk, so stop accepting further
    /// items and flush now; a failure then surfaces on this item alone and
    /// the step can skip it.
    async fn flush_if_necessary(&self, uow: &UnitOfWork, item: &T) -> Result<(), WriterError> {
        if !self.failures.contains(item) {
            return Ok(());
        }

        warn!(
            unit_of_work = %uow.id(),
            item = ?item,
            "Suspect item written, forcing early completion and flush"
        );
        emit!(EagerFlushTriggered {
            step: self.step.clone(),
        });
        uow.set_complete_only();
        self.do_flush(uow).await
    }

    /// Flush then clear the session from within a unit of work.
    ///
    /// The clear also happens at transaction commit, but it is forced here
    /// too. On failure, every item processed so far in this unit of work
    /// becomes suspect before the original error surfaces; nothing is
    /// retried internally.
    async fn do_flush(&self, uow: &UnitOfWork) -> Result<(), WriterError> {
        let result = match self.session.flush().await {
            Ok(()) => self.session.clear().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                debug!(unit_of_work = %uow.id(), "Session flushed and cleared");
                Ok(())
            }
            Err(source) => {
                let processed = self.tracker.processed(uow)?;
                let count = processed.len();
                error!(
                    unit_of_work = %uow.id(),
                    suspects = count,
                    error = %source,
                    "Session flush failed, recording items as suspect"
                );
                self.failures.record_all(processed);
                emit!(FlushFailure {
                    step: self.step.clone(),
                });
                emit!(SuspectsRecorded {
                    count: count as u64,
                    step: self.step.clone(),
                });
                Err(WriterError::FlushFailed { source })
            }
        }
    }
}

/// Builder for [`SessionAwareItemWriter`].
///
/// Both collaborators are mandatory; `build` fails with a [`ConfigError`]
/// when one is missing, before the writer sees its first item.
pub struct SessionAwareItemWriterBuilder<T, W, S> {
    delegate: Option<W>,
    session: Option<S>,
    step: Option<String>,
    _items: PhantomData<fn() -> T>,
}

impl<T, W, S> SessionAwareItemWriterBuilder<T, W, S>
where
    T: Clone + Eq + Hash + Debug + Send + Sync,
    W: ItemWriter<T>,
    S: SessionOperations,
{
    pub fn new() -> Self {
        Self {
            delegate: None,
            session: None,
            step: None,
            _items: PhantomData,
        }
    }

    /// Set the delegate that performs the actual item persistence.
    pub fn delegate(mut self, delegate: W) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Set the persistence session handle.
    pub fn session(mut self, session: S) -> Self {
        self.session = Some(session);
        self
    }

    /// Step identifier used as the metrics label (default: `"default"`).
    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    pub fn build(self) -> Result<SessionAwareItemWriter<T, W, S>, ConfigError> {
        let delegate = self.delegate.context(MissingDelegateSnafu)?;
        let session = self.session.context(MissingSessionSnafu)?;

        Ok(SessionAwareItemWriter {
            delegate,
            session,
            tracker: ProcessedTracker::new(),
            failures: FailureMemory::new(),
            step: self.step.unwrap_or_else(|| "default".to_string()),
        })
    }
}

impl<T, W, S> Default for SessionAwareItemWriterBuilder<T, W, S>
where
    T: Clone + Eq + Hash + Debug + Send + Sync,
    W: ItemWriter<T>,
    S: SessionOperations,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::CollaboratorError;

    #[derive(Default)]
    struct NoopWriter;

    #[async_trait]
    impl ItemWriter<String> for NoopWriter {
        async fn write(&self, _item: &String) -> Result<(), CollaboratorError> {
            Ok(())
        }

        async fn flush(&self) -> Result<(), CollaboratorError> {
            Ok(())
        }

        async fn clear(&self) -> Result<(), CollaboratorError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingSession {
        flushes: AtomicUsize,
        clears: AtomicUsize,
        fail_flushes: Mutex<usize>,
    }

    #[async_trait]
    impl SessionOperations for CountingSession {
        async fn flush(&self) -> Result<(), CollaboratorError> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            let mut remaining = self.fail_flushes.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err("session flush failed".into());
            }
            Ok(())
        }

        async fn clear(&self) -> Result<(), CollaboratorError> {
            self.clears.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_build_requires_delegate() {
        let err = SessionAwareItemWriter::<String, NoopWriter, CountingSession>::builder()
            .session(CountingSession::default())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::MissingDelegate));
    }

    #[test]
    fn test_build_requires_session() {
        let err = SessionAwareItemWriter::<String, NoopWriter, CountingSession>::builder()
            .delegate(NoopWriter)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::MissingSession));
    }

    #[tokio::test]
    async fn test_write_does_not_flush_unknown_items() {
        let session = std::sync::Arc::new(CountingSession::default());
        let writer = SessionAwareItemWriter::builder()
            .delegate(std::sync::Arc::new(NoopWriter))
            .session(std::sync::Arc::clone(&session))
            .build()
            .unwrap();

        let uow = UnitOfWork::new();
        writer.write(&uow, "x".to_string()).await.unwrap();

        assert_eq!(session.flushes.load(Ordering::SeqCst), 0);
        assert!(!uow.is_complete_only());
    }

    #[tokio::test]
    async fn test_flush_failure_marks_items_suspect() {
        let session = std::sync::Arc::new(CountingSession::default());
        *session.fail_flushes.lock().unwrap() = 1;

        let writer = SessionAwareItemWriter::builder()
            .delegate(std::sync::Arc::new(NoopWriter))
            .session(std::sync::Arc::clone(&session))
            .build()
            .unwrap();

        let uow = UnitOfWork::new();
        writer.write(&uow, "a".to_string()).await.unwrap();
        let err = writer.flush(&uow).await.unwrap_err();

        assert!(matches!(err, WriterError::FlushFailed { .. }));
        assert_eq!(writer.failure_stats().suspects, 1);
    }
}
