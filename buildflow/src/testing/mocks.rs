//! Recording steps for testing.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::context::RunContext;
use crate::core::{ComponentDescriptor, ComponentType};
use crate::steps::{Step, StepResult};

/// A shared, ordered log of step actions.
///
/// Forward actions are recorded as `run:<description>` and cleanups as
/// `cleanup:<description>`.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl ExecutionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns every entry, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns the descriptions of steps whose forward action ran.
    #[must_use]
    pub fn runs(&self) -> Vec<String> {
        self.with_prefix("run:")
    }

    /// Returns the descriptions of steps that were cleaned up.
    #[must_use]
    pub fn cleanups(&self) -> Vec<String> {
        self.with_prefix("cleanup:")
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter_map(|entry| entry.strip_prefix(prefix).map(str::to_string))
            .collect()
    }
}

/// A step that records its actions and can be told to fail.
#[derive(Debug, Clone)]
pub struct RecordingStep {
    description: String,
    log: ExecutionLog,
    failure: Option<String>,
    cleanup_failure: Option<String>,
    enabled: bool,
    required: Vec<ComponentDescriptor>,
}

impl RecordingStep {
    /// Creates a step that succeeds and records into `log`.
    #[must_use]
    pub fn new(description: impl Into<String>, log: &ExecutionLog) -> Self {
        Self {
            description: description.into(),
            log: log.clone(),
            failure: None,
            cleanup_failure: None,
            enabled: true,
            required: Vec::new(),
        }
    }

    /// Makes the forward action fail with `message`.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Makes the cleanup action fail with `message`.
    #[must_use]
    pub fn failing_cleanup(mut self, message: impl Into<String>) -> Self {
        self.cleanup_failure = Some(message.into());
        self
    }

    /// Disables the step.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Declares `T` as a required component.
    #[must_use]
    pub fn requires<T: ComponentType>(mut self) -> Self {
        self.required.push(ComponentDescriptor::of::<T>());
        self
    }
}

impl Step for RecordingStep {
    fn description(&self) -> &str {
        &self.description
    }

    fn required_components(&self) -> Vec<ComponentDescriptor> {
        self.required.clone()
    }

    fn is_enabled(&self, _ctx: &RunContext) -> bool {
        self.enabled
    }

    fn run(&self, _ctx: &mut RunContext) -> StepResult {
        self.log.record(format!("run:{}", self.description));
        match &self.failure {
            Some(message) => StepResult::failure(message.clone()),
            None => StepResult::success(),
        }
    }

    fn cleanup(&self, _ctx: &mut RunContext) -> StepResult {
        self.log.record(format!("cleanup:{}", self.description));
        match &self.cleanup_failure {
            Some(message) => StepResult::failure(message.clone()),
            None => StepResult::success(),
        }
    }
}
