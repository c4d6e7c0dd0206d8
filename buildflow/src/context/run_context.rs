//! Per-build execution context.

use super::ValueBag;
use crate::artifacts::ArtifactRegistry;
use crate::core::Artifact;
use crate::events::{get_event_sink, EventSink};
use crate::profile::Profile;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// State shared by every step of one build.
///
/// A context is created by [`Pipeline::build`](crate::pipeline::Pipeline::build)
/// and handed to each step by `&mut`. Values stored here live until the
/// build returns.
pub struct RunContext {
    run_id: Uuid,
    parent_run_id: Option<Uuid>,
    profile: Profile,
    values: ValueBag,
    artifacts: Vec<Arc<dyn Artifact>>,
    event_sink: Arc<dyn EventSink>,
    artifact_registry: Option<Arc<ArtifactRegistry>>,
}

impl RunContext {
    /// Creates a context for a build of `profile`.
    ///
    /// Events go to the process-wide sink until another one is set.
    #[must_use]
    pub fn new(profile: Profile) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            parent_run_id: None,
            profile,
            values: ValueBag::new(),
            artifacts: Vec::new(),
            event_sink: get_event_sink(),
            artifact_registry: None,
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Sets the artifact registry steps may publish to.
    #[must_use]
    pub fn with_artifact_registry(mut self, registry: Arc<ArtifactRegistry>) -> Self {
        self.artifact_registry = Some(registry);
        self
    }

    /// Switches the context to a nested run.
    ///
    /// The nested run gets a fresh run id whose parent is the current one.
    /// Values, artifacts, sink and registry stay shared with the enclosing
    /// run. Returns the enclosing ids for [`RunContext::leave_nested_run`].
    pub(crate) fn enter_nested_run(&mut self) -> (Uuid, Option<Uuid>) {
        let enclosing = (self.run_id, self.parent_run_id);
        self.parent_run_id = Some(self.run_id);
        self.run_id = Uuid::new_v4();
        enclosing
    }

    /// Restores the ids returned by [`RunContext::enter_nested_run`].
    pub(crate) fn leave_nested_run(&mut self, (run_id, parent_run_id): (Uuid, Option<Uuid>)) {
        self.run_id = run_id;
        self.parent_run_id = parent_run_id;
    }

    /// Returns the run id.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the run id of the enclosing build, for nested builds.
    #[must_use]
    pub fn parent_run_id(&self) -> Option<Uuid> {
        self.parent_run_id
    }

    /// Returns true if this context belongs to a nested build.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.parent_run_id.is_some()
    }

    /// Returns the profile being built.
    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Stores a value, replacing any value of the same type.
    pub fn set_value<T: Any + Send + Sync>(&mut self, value: T) {
        self.values.insert(value);
    }

    /// Stores `value` if present. `None` leaves the context unchanged.
    pub fn set_value_opt<T: Any + Send + Sync>(&mut self, value: Option<T>) {
        if let Some(value) = value {
            self.values.insert(value);
        }
    }

    /// Borrows the value of type `T`.
    #[must_use]
    pub fn get_value<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values.get::<T>()
    }

    /// Mutably borrows the value of type `T`.
    #[must_use]
    pub fn get_value_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.values.get_mut::<T>()
    }

    /// Returns the value of type `T`, storing `T::default()` first if absent.
    pub fn get_or_create_value<T: Any + Send + Sync + Default>(&mut self) -> &mut T {
        self.values.get_or_insert_with(T::default)
    }

    /// Removes and returns the value of type `T`.
    pub fn remove_value<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.values.remove::<T>()
    }

    /// Returns true if a value of type `T` is stored.
    #[must_use]
    pub fn has_value<T: Any + Send + Sync>(&self) -> bool {
        self.values.contains::<T>()
    }

    /// Iterates over stored values as `(type name, value)` pairs.
    pub fn values(&self) -> impl Iterator<Item = (&'static str, &(dyn Any + Send + Sync))> {
        self.values.iter()
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Records an artifact produced by this build.
    pub fn add_artifact<A: Artifact>(&mut self, artifact: A) {
        self.artifacts.push(Arc::new(artifact));
    }

    /// Records an already shared artifact.
    pub fn add_shared_artifact(&mut self, artifact: Arc<dyn Artifact>) {
        self.artifacts.push(artifact);
    }

    /// Returns the artifacts recorded so far.
    #[must_use]
    pub fn artifacts(&self) -> &[Arc<dyn Artifact>] {
        &self.artifacts
    }

    pub(crate) fn take_artifacts(&mut self) -> Vec<Arc<dyn Artifact>> {
        std::mem::take(&mut self.artifacts)
    }

    /// Returns the artifact registry, if one is configured.
    #[must_use]
    pub fn artifact_registry(&self) -> Option<&Arc<ArtifactRegistry>> {
        self.artifact_registry.as_ref()
    }

    /// Returns the event sink.
    #[must_use]
    pub fn event_sink(&self) -> &Arc<dyn EventSink> {
        &self.event_sink
    }

    /// Emits an event through the context's sink.
    pub fn emit_event(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.event_sink.emit(event_type, data);
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("parent_run_id", &self.parent_run_id)
            .field("profile", &self.profile.id())
            .field("values", &self.values)
            .field("artifacts", &self.artifacts.len())
            .field("has_registry", &self.artifact_registry.is_some())
            .finish()
    }
}
