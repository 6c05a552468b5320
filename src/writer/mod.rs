//! The delegating writer and its flush coordination.

mod session_aware;
mod traits;

pub use session_aware::{SessionAwareItemWriter, SessionAwareItemWriterBuilder};
pub use traits::ItemWriter;
