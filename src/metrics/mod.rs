//! Metrics emission for the completion handler.
//!
//! Events implement [`events::InternalEvent`] and are emitted through the
//! `emit!` macro. Counters go to whatever recorder the hosting process
//! installs; no exporter is set up here.

pub mod events;

/// Emit an internal event as a metric.
#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::metrics::events::InternalEvent::emit($event)
    };
}

pub use emit;
