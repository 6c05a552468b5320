//! Persistence session collaborator contract.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CollaboratorError;

/// Flush and clear operations on the persistence session cache.
///
/// Models an ORM-style session: an in-memory cache of managed entities that
/// is flushed to durable storage before commit and clearable independently
/// of the transaction outcome. Both operations may fail; the writer treats a
/// flush failure as fatal-but-recorded and re-raises it.
#[async_trait]
pub trait SessionOperations: Send + Sync {
    /// Push pending changes in the session cache to durable storage.
    async fn flush(&self) -> Result<(), CollaboratorError>;

    /// Discard the session cache without writing.
    async fn clear(&self) -> Result<(), CollaboratorError>;
}

#[async_trait]
impl<S> SessionOperations for Arc<S>
where
    S: SessionOperations + ?Sized,
{
    async fn flush(&self) -> Result<(), CollaboratorError> {
        (**self).flush().await
    }

    async fn clear(&self) -> Result<(), CollaboratorError> {
        (**self).clear().await
    }
}
