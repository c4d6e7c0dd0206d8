//! Pipeline configuration.

use crate::artifacts::{artifact_registry, ArtifactRegistry};
use crate::events::EventSink;
use std::sync::Arc;

/// Where a pipeline reports events and stores results.
#[derive(Clone, Default)]
pub struct PipelineConfig {
    pub(crate) event_sink: Option<Arc<dyn EventSink>>,
    pub(crate) artifact_registry: Option<Arc<ArtifactRegistry>>,
    pub(crate) store_results: bool,
}

impl PipelineConfig {
    /// Creates the default configuration.
    ///
    /// Events go to the process-wide sink, no registry is attached and
    /// nothing is stored.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends events to `sink`.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Makes `registry` available to steps through the run context.
    #[must_use]
    pub fn with_artifact_registry(mut self, registry: Arc<ArtifactRegistry>) -> Self {
        self.artifact_registry = Some(registry);
        self
    }

    /// Attaches the process-wide artifact registry.
    #[must_use]
    pub fn with_global_artifact_registry(self) -> Self {
        self.with_artifact_registry(artifact_registry())
    }

    /// Stores each top-level build's result and artifacts in the attached
    /// registry.
    #[must_use]
    pub fn with_store_results(mut self, store_results: bool) -> Self {
        self.store_results = store_results;
        self
    }

    /// Returns the attached artifact registry.
    #[must_use]
    pub fn artifact_registry(&self) -> Option<&Arc<ArtifactRegistry>> {
        self.artifact_registry.as_ref()
    }

    /// Returns true if builds store their results.
    #[must_use]
    pub fn stores_results(&self) -> bool {
        self.store_results
    }
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("has_event_sink", &self.event_sink.is_some())
            .field("artifact_registry", &self.artifact_registry)
            .field("store_results", &self.store_results)
            .finish()
    }
}
