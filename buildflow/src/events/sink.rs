//! Event sink trait and implementations.

use tracing::{debug, info, trace, Level};

/// Receives lifecycle events emitted by the pipeline engine.
///
/// Emission is synchronous and must not fail; a sink that cannot deliver
/// an event drops it.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink: Send + Sync {
    /// Emits an event.
    ///
    /// # Arguments
    ///
    /// * `event_type` - The type of event (e.g., "step.started")
    /// * `data` - Optional event data
    fn emit(&self, event_type: &str, data: Option<serde_json::Value>);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }

    /// Returns the level events are logged at.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }
}

impl EventSink for LoggingEventSink {
    fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        match self.level {
            Level::TRACE => trace!(event_type = %event_type, event_data = ?data, "Event: {}", event_type),
            Level::DEBUG => debug!(event_type = %event_type, event_data = ?data, "Event: {}", event_type),
            _ => info!(event_type = %event_type, event_data = ?data, "Event: {}", event_type),
        }
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<(String, Option<serde_json::Value>)>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Option<serde_json::Value>)> {
        self.events.read().clone()
    }

    /// Returns the collected event types, in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|(t, _)| t.clone()).collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events matching a type prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<(String, Option<serde_json::Value>)> {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t.starts_with(type_prefix))
            .cloned()
            .collect()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn test_noop_sink() {
        let sink = NoOpEventSink;
        sink.emit("test", Some(serde_json::json!({"x": 1})));
    }

    #[test]
    fn test_logging_sink() {
        let sink = LoggingEventSink::debug();
        assert_eq!(sink.level(), Level::DEBUG);
        sink.emit("test.event", Some(serde_json::json!({"key": "value"})));
        LoggingEventSink::default().emit("test.event", None);
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit("event1", None);
        sink.emit("event2", Some(serde_json::json!({"data": true})));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.event_types(), vec!["event1", "event2"]);
    }

    #[test]
    fn test_collecting_sink_filter() {
        let sink = CollectingEventSink::new();
        sink.emit("step.started", None);
        sink.emit("step.completed", None);
        sink.emit("pipeline.completed", None);

        assert_eq!(sink.events_of_type("step.").len(), 2);
        assert_eq!(sink.events_of_type("pipeline.").len(), 1);

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_mock_sink_expectation() {
        let mut sink = MockEventSink::new();
        sink.expect_emit()
            .with(eq("step.started"), eq(None::<serde_json::Value>))
            .times(1)
            .return_const(());

        sink.emit("step.started", None);
    }
}
