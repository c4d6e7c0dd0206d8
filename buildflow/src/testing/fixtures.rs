//! Test fixtures for pipeline testing.

use std::sync::Arc;

use super::{ExecutionLog, RecordingStep};
use crate::artifacts::ArtifactRegistry;
use crate::events::CollectingEventSink;
use crate::pipeline::PipelineConfig;

/// Shared wiring for pipeline tests.
///
/// Builds run through [`TestFixture::config`] emit into a collecting sink
/// and store results in a private registry, so tests never touch the
/// process-wide ones.
#[derive(Debug, Default)]
pub struct TestFixture {
    /// Collects every event emitted by builds using this fixture.
    pub sink: Arc<CollectingEventSink>,
    /// Receives stored build results.
    pub registry: Arc<ArtifactRegistry>,
    /// Shared log for steps created through [`TestFixture::step`].
    pub log: ExecutionLog,
}

impl TestFixture {
    /// Creates a new fixture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a configuration wired to this fixture, storing results.
    #[must_use]
    pub fn config(&self) -> PipelineConfig {
        PipelineConfig::new()
            .with_event_sink(self.sink.clone())
            .with_artifact_registry(self.registry.clone())
            .with_store_results(true)
    }

    /// Creates a recording step logging into the fixture's log.
    #[must_use]
    pub fn step(&self, description: &str) -> RecordingStep {
        RecordingStep::new(description, &self.log)
    }

    /// Returns the emitted event types, oldest first.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.sink.event_types()
    }
}
