//! Event sink system for observability.
//!
//! The pipeline engine reports its lifecycle through an [`EventSink`]. The
//! event type names it emits are listed in [`names`].

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

#[cfg(test)]
pub use sink::MockEventSink;

use parking_lot::RwLock;
use std::sync::Arc;

/// Event types emitted by the pipeline engine.
pub mod names {
    /// A build started.
    pub const PIPELINE_STARTED: &str = "pipeline.started";
    /// Every invoked step succeeded.
    pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
    /// A step failed and the build stopped.
    pub const PIPELINE_FAILED: &str = "pipeline.failed";
    /// A step is about to run.
    pub const STEP_STARTED: &str = "step.started";
    /// A step succeeded.
    pub const STEP_COMPLETED: &str = "step.completed";
    /// A step failed.
    pub const STEP_FAILED: &str = "step.failed";
    /// A step was disabled for this run.
    pub const STEP_SKIPPED: &str = "step.skipped";
    /// A step was cleaned up.
    pub const STEP_CLEANUP: &str = "step.cleanup";
    /// A step's cleanup reported a failure.
    pub const STEP_CLEANUP_FAILED: &str = "step.cleanup_failed";
}

static GLOBAL_EVENT_SINK: RwLock<Option<Arc<dyn EventSink>>> = RwLock::new(None);

/// Sets the process-wide default event sink.
pub fn set_event_sink(sink: Arc<dyn EventSink>) {
    *GLOBAL_EVENT_SINK.write() = Some(sink);
}

/// Clears the process-wide default event sink.
pub fn clear_event_sink() {
    *GLOBAL_EVENT_SINK.write() = None;
}

/// Gets the process-wide default event sink.
///
/// Returns a `NoOpEventSink` if no sink is set.
pub fn get_event_sink() -> Arc<dyn EventSink> {
    GLOBAL_EVENT_SINK
        .read()
        .clone()
        .unwrap_or_else(|| Arc::new(NoOpEventSink))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_sink_round_trip() {
        let sink = Arc::new(CollectingEventSink::new());
        set_event_sink(sink.clone());
        get_event_sink().emit("test.event", Some(serde_json::json!({"key": "value"})));
        clear_event_sink();
        get_event_sink().emit("dropped", None);

        // Other tests may emit through the global sink concurrently.
        assert_eq!(sink.events_of_type("test.event").len(), 1);
        assert!(sink.events_of_type("dropped").is_empty());
    }
}
