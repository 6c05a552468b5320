//! Delegate writer contract.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CollaboratorError;

/// Trait for writers that persist individual items.
///
/// Implementations own the actual persistence operation. The session-aware
/// writer only sequences calls around a delegate and never alters its
/// contract: a write failure here is propagated to the caller as-is.
#[async_trait]
pub trait ItemWriter<T>: Send + Sync {
    /// Write a single item.
    async fn write(&self, item: &T) -> Result<(), CollaboratorError>;

    /// Flush buffered output at a chunk boundary (commit path).
    async fn flush(&self) -> Result<(), CollaboratorError>;

    /// Discard buffered output (rollback path).
    async fn clear(&self) -> Result<(), CollaboratorError>;
}

#[async_trait]
impl<T, W> ItemWriter<T> for Arc<W>
where
    T: Send + Sync,
    W: ItemWriter<T> + ?Sized,
{
    async fn write(&self, item: &T) -> Result<(), CollaboratorError> {
        (**self).write(item).await
    }

    async fn flush(&self) -> Result<(), CollaboratorError> {
        (**self).flush().await
    }

    async fn clear(&self) -> Result<(), CollaboratorError> {
        (**self).clear().await
    }
}
