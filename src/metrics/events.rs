//! Internal events for metrics emission.
//!
//! Each event struct represents a measurable occurrence in the writer.
//! Events implement the `InternalEvent` trait which emits the corresponding
//! Prometheus counter metric, labeled with the step identifier so multiple
//! writers in one process stay distinguishable.

use metrics::counter;
use tracing::trace;

/// Trait for internal events that can be emitted as metrics.
pub trait InternalEvent {
    /// Emit this event as a metric.
    fn emit(self);
}

/// Event emitted when items are written through the delegate.
pub struct ItemsWritten {
    pub count: u64,
    /// Step label for multi-writer deployments.
    pub step: String,
}

impl InternalEvent for ItemsWritten {
    fn emit(self) {
        trace!(count = self.count, step = %self.step, "Items written");
        counter!("snowbank_items_written_total", "step" => self.step).increment(self.count);
    }
}

/// Event emitted when a suspect item forces early completion and a flush.
pub struct EagerFlushTriggered {
    pub step: String,
}

impl InternalEvent for EagerFlushTriggered {
    fn emit(self) {
        trace!(step = %self.step, "Eager flush triggered");
        counter!("snowbank_eager_flushes_total", "step" => self.step).increment(1);
    }
}

/// Event emitted when a session flush or clear fails.
pub struct FlushFailure {
    pub step: String,
}

impl InternalEvent for FlushFailure {
    fn emit(self) {
        trace!(step = %self.step, "Flush failure");
        counter!("snowbank_flush_failures_total", "step" => self.step).increment(1);
    }
}

/// Event emitted when items are recorded into the failure memory.
pub struct SuspectsRecorded {
    pub count: u64,
    pub step: String,
}

impl InternalEvent for SuspectsRecorded {
    fn emit(self) {
        trace!(count = self.count, step = %self.step, "Suspects recorded");
        counter!("snowbank_suspects_recorded_total", "step" => self.step).increment(self.count);
    }
}
