//! Metrics and observability infrastructure.

pub mod events;

/// Macro for emitting metric events.
///
/// Calls the `InternalEvent::emit()` method on the given event, which
/// records the corresponding Prometheus counter metric.
///
/// # Example
///
/// ```ignore
/// use snowbank::metrics::events::ItemsWritten;
///
/// emit!(ItemsWritten { count: 1, step: "load".to_string() });
/// ```
#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::metrics::events::InternalEvent::emit($event)
    };
}

// Re-export the macro at crate root
pub use emit;
