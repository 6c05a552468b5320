//! Snowbank: session-aware item writer for chunk-oriented batch steps.
//!
//! This crate handles:
//! - Delegating item persistence to a downstream writer
//! - Tracking the set of items written within each unit of work
//! - Remembering items from failed session flushes ("suspects") for the
//!   lifetime of the writer
//! - Forcing early chunk completion and an eager session flush whenever a
//!   suspect item is written again, so the failing item can be isolated
//!
//! The writer sits between a step controller (which owns [`UnitOfWork`]
//! handles and chunk boundaries) and a persistence session (an ORM-style
//! cache with `flush` and `clear` operations). It never performs persistence
//! itself; it only sequences calls around the injected collaborators.

pub mod context;
pub mod error;
pub mod failures;
pub mod metrics;
pub mod session;
pub mod tracker;
pub mod writer;

// Re-export commonly used items
pub use context::{UnitOfWork, UnitOfWorkId};
pub use error::{CollaboratorError, ConfigError, TrackerError, WriterError};
pub use failures::{FailureMemory, FailureStats};
pub use session::SessionOperations;
pub use writer::{ItemWriter, SessionAwareItemWriter, SessionAwareItemWriterBuilder};
