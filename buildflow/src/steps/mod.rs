//! Step trait and implementations.
//!
//! A step is one unit of pipeline work. It declares which component types
//! it reads from the profile, may opt out of a run through
//! [`Step::is_enabled`], and pairs its forward action with a cleanup action
//! the engine runs in reverse order once the build stops.

mod access;
mod result;


pub use access::StepComponents;
pub use result::StepResult;

use crate::context::RunContext;
use crate::core::{ComponentDescriptor, ComponentType};
use crate::errors::UnmetRequirement;
use crate::profile::Profile;
use std::fmt::Debug;

/// A unit of pipeline work.
pub trait Step: Send + Sync + Debug {
    /// Returns a short description used in results, events and logs.
    fn description(&self) -> &str;

    /// Component types this step may read through the required accessors.
    fn required_components(&self) -> Vec<ComponentDescriptor> {
        Vec::new()
    }

    /// Component types this step may read through the optional accessors.
    fn optional_components(&self) -> Vec<ComponentDescriptor> {
        Vec::new()
    }

    /// Returns false to skip the step for this run.
    fn is_enabled(&self, _ctx: &RunContext) -> bool {
        true
    }

    /// Runs the forward action.
    fn run(&self, ctx: &mut RunContext) -> StepResult;

    /// Lists declared required components `profile` does not provide.
    ///
    /// Used for dry checks; nothing is run.
    fn unmet_requirements(&self, profile: &Profile) -> Vec<UnmetRequirement> {
        self.required_components()
            .iter()
            .filter(|descriptor| !profile.has_component_dyn(&descriptor.key()))
            .map(|descriptor| UnmetRequirement {
                step: self.description().to_string(),
                component: descriptor.name(),
            })
            .collect()
    }

    /// Undoes or finalizes the forward action.
    ///
    /// Called for every step whose forward action ran, in reverse order,
    /// whatever the outcome of the build.
    fn cleanup(&self, _ctx: &mut RunContext) -> StepResult {
        StepResult::success()
    }
}

type RunFn = dyn Fn(&FnStep, &mut RunContext) -> StepResult + Send + Sync;
type CleanupFn = dyn Fn(&mut RunContext) -> StepResult + Send + Sync;
type EnabledFn = dyn Fn(&RunContext) -> bool + Send + Sync;

/// A closure-backed step.
///
/// The forward closure receives the step itself so it can use the
/// [`StepComponents`] accessors against its own declarations.
///
/// ```rust,ignore
/// let step = FnStep::new("compile", |step, ctx| {
///     match step.get_required_component::<Target>(ctx) {
///         Ok(target) => compile(target),
///         Err(err) => err.into(),
///     }
/// })
/// .requires::<Target>();
/// ```
pub struct FnStep {
    description: String,
    required: Vec<ComponentDescriptor>,
    optional: Vec<ComponentDescriptor>,
    run: Box<RunFn>,
    cleanup: Option<Box<CleanupFn>>,
    enabled: Option<Box<EnabledFn>>,
}

impl FnStep {
    /// Creates a step running `run` as its forward action.
    pub fn new<F>(description: impl Into<String>, run: F) -> Self
    where
        F: Fn(&Self, &mut RunContext) -> StepResult + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            required: Vec::new(),
            optional: Vec::new(),
            run: Box::new(run),
            cleanup: None,
            enabled: None,
        }
    }

    /// Declares `T` as a required component.
    #[must_use]
    pub fn requires<T: ComponentType>(mut self) -> Self {
        self.required.push(ComponentDescriptor::of::<T>());
        self
    }

    /// Declares `T` as an optional component.
    #[must_use]
    pub fn optional<T: ComponentType>(mut self) -> Self {
        self.optional.push(ComponentDescriptor::of::<T>());
        self
    }

    /// Sets the enablement predicate.
    #[must_use]
    pub fn enabled_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RunContext) -> bool + Send + Sync + 'static,
    {
        self.enabled = Some(Box::new(predicate));
        self
    }

    /// Sets the cleanup action.
    #[must_use]
    pub fn on_cleanup<F>(mut self, cleanup: F) -> Self
    where
        F: Fn(&mut RunContext) -> StepResult + Send + Sync + 'static,
    {
        self.cleanup = Some(Box::new(cleanup));
        self
    }
}

impl Debug for FnStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStep")
            .field("description", &self.description)
            .field("required", &self.required.len())
            .field("optional", &self.optional.len())
            .finish_non_exhaustive()
    }
}

impl Step for FnStep {
    fn description(&self) -> &str {
        &self.description
    }

    fn required_components(&self) -> Vec<ComponentDescriptor> {
        self.required.clone()
    }

    fn optional_components(&self) -> Vec<ComponentDescriptor> {
        self.optional.clone()
    }

    fn is_enabled(&self, ctx: &RunContext) -> bool {
        self.enabled.as_ref().map_or(true, |predicate| predicate(ctx))
    }

    fn run(&self, ctx: &mut RunContext) -> StepResult {
        (self.run)(self, ctx)
    }

    fn cleanup(&self, ctx: &mut RunContext) -> StepResult {
        self.cleanup
            .as_ref()
            .map_or_else(StepResult::success, |cleanup| cleanup(ctx))
    }
}

/// A step that does nothing and always succeeds.
#[derive(Debug, Clone)]
pub struct NoOpStep {
    description: String,
}

impl NoOpStep {
    /// Creates a new no-op step.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl Step for NoOpStep {
    fn description(&self) -> &str {
        &self.description
    }

    fn run(&self, _ctx: &mut RunContext) -> StepResult {
        StepResult::success()
    }
}
