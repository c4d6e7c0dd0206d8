//! The pipeline engine.

use super::cleanup::{CleanupFailure, CleanupStack};
use super::{PipelineConfig, PipelineResult};
use crate::context::RunContext;
use crate::core::PipelineStatus;
use crate::errors::{CanBuildError, UnmetRequirement};
use crate::events::names;
use crate::observability::StepTimer;
use crate::profile::Profile;
use crate::steps::{Step, StepResult};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn};

/// An ordered list of steps run against a profile.
///
/// A pipeline is itself a [`Step`], so pipelines nest. A nested pipeline
/// runs its own steps and its own cleanup inside the parent's forward pass
/// and fails the parent exactly like a leaf step would.
///
/// ```rust,ignore
/// let pipeline = Pipeline::create("release", |p| {
///     p.add_step(Compile);
///     p.add_step(Package);
/// });
/// let result = pipeline.build(&profile);
/// ```
pub struct Pipeline {
    description: String,
    steps: Vec<Arc<dyn Step>>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            steps: Vec::new(),
            config: PipelineConfig::default(),
        }
    }

    /// Creates a pipeline and runs `init` on it before returning.
    #[must_use]
    pub fn create(description: impl Into<String>, init: impl FnOnce(&mut Self)) -> Self {
        let mut pipeline = Self::new(description);
        init(&mut pipeline);
        pipeline
    }

    /// Appends a step.
    #[must_use]
    pub fn with_step(mut self, step: impl Step + 'static) -> Self {
        self.add_step(step);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Appends a step.
    pub fn add_step(&mut self, step: impl Step + 'static) -> &mut Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Appends a shared step.
    pub fn add_shared_step(&mut self, step: Arc<dyn Step>) -> &mut Self {
        self.steps.push(step);
        self
    }

    /// Appends several shared steps, in order.
    pub fn add_steps(&mut self, steps: impl IntoIterator<Item = Arc<dyn Step>>) -> &mut Self {
        self.steps.extend(steps);
        self
    }

    /// Returns the steps.
    #[must_use]
    pub fn steps(&self) -> &[Arc<dyn Step>] {
        &self.steps
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the pipeline has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Builds `profile`.
    pub fn build(&self, profile: &Profile) -> PipelineResult {
        self.build_with(profile, |_| {})
    }

    /// Builds `profile`, running `mutator` on the fresh context first.
    pub fn build_with(&self, profile: &Profile, mutator: impl FnOnce(&mut RunContext)) -> PipelineResult {
        let mut ctx = RunContext::new(profile.clone());
        if let Some(sink) = &self.config.event_sink {
            ctx = ctx.with_event_sink(sink.clone());
        }
        if let Some(registry) = &self.config.artifact_registry {
            ctx = ctx.with_artifact_registry(registry.clone());
        }

        mutator(&mut ctx);
        let result = self.execute(&mut ctx);

        if self.config.store_results {
            if let Some(registry) = &self.config.artifact_registry {
                if let Err(err) = registry.store(result.clone(), ctx.take_artifacts()) {
                    error!(pipeline = %self.description, error = %err, "Failed to store build result");
                }
            }
        }
        result
    }

    /// Checks that every step's required components are available.
    ///
    /// Nested pipelines are checked recursively. Enablement predicates are
    /// not consulted, so a disabled step still counts.
    pub fn can_build(&self, profile: &Profile) -> Result<(), CanBuildError> {
        let unmet = self.unmet_requirements(profile);
        if unmet.is_empty() {
            Ok(())
        } else {
            Err(CanBuildError {
                pipeline: self.description.clone(),
                unmet,
            })
        }
    }

    fn execute(&self, ctx: &mut RunContext) -> PipelineResult {
        let span = info_span!(
            "pipeline.build",
            pipeline = %self.description,
            run_id = %ctx.run_id(),
            profile = %ctx.profile().id(),
        );
        let _guard = span.enter();

        let started_at = Utc::now();
        ctx.emit_event(
            names::PIPELINE_STARTED,
            Some(serde_json::json!({
                "pipeline": self.description,
                "run_id": ctx.run_id(),
                "profile_id": ctx.profile().id(),
                "steps": self.steps.len(),
                "nested": ctx.is_nested(),
            })),
        );

        let mut status = PipelineStatus::NotStarted;
        let mut cleanup = CleanupStack::new();
        let mut step_results = Vec::new();

        for (index, step) in self.steps.iter().enumerate() {
            let description = step.description();
            if !step.is_enabled(ctx) {
                debug!(step = %description, index, "Step disabled, skipping");
                ctx.emit_event(names::STEP_SKIPPED, Some(step_event(ctx, description, index)));
                continue;
            }

            status = PipelineStatus::Running { index };
            debug!(step = %description, %status, "Running step");
            ctx.emit_event(names::STEP_STARTED, Some(step_event(ctx, description, index)));

            cleanup.push(index, Arc::clone(step));
            let timer = StepTimer::start(description);
            let result = step.run(ctx);
            let result = result.stamped(description, timer.finish());

            let failed = result.is_failure();
            if failed {
                warn!(
                    step = %description,
                    index,
                    error = result.message.as_deref().unwrap_or_default(),
                    "Step failed"
                );
                let mut data = step_event(ctx, description, index);
                data["error"] = serde_json::json!(result.message);
                ctx.emit_event(names::STEP_FAILED, Some(data));
            } else {
                let mut data = step_event(ctx, description, index);
                data["duration_ms"] = serde_json::json!(result.duration_ms);
                ctx.emit_event(names::STEP_COMPLETED, Some(data));
            }

            step_results.push(result);
            if failed {
                status = PipelineStatus::Failed { index };
                break;
            }
        }

        if !status.is_terminal() {
            status = PipelineStatus::Completed;
        }

        debug!(steps = cleanup.len(), "Cleaning up");
        let cleanup_failures = cleanup.unwind(ctx);

        let succeeded = status == PipelineStatus::Completed;
        let result = PipelineResult {
            description: self.description.clone(),
            run_id: ctx.run_id(),
            profile: Some(ctx.profile().clone()),
            succeeded,
            step_results,
            started_at,
            ended_at: Utc::now(),
        };

        let event = if succeeded {
            info!(%status, duration_ms = result.duration_ms(), "Pipeline completed");
            names::PIPELINE_COMPLETED
        } else {
            info!(%status, failed_step = ?result.failed_step().map(|r| &r.description), "Pipeline failed");
            names::PIPELINE_FAILED
        };
        ctx.emit_event(
            event,
            Some(serde_json::json!({
                "pipeline": self.description,
                "run_id": ctx.run_id(),
                "status": status,
                "steps_run": result.step_results.len(),
                "duration_ms": result.duration_ms(),
                "cleanup_failures": cleanup_failures.iter().map(cleanup_failure_json).collect::<Vec<_>>(),
            })),
        );

        result
    }
}

fn step_event(ctx: &RunContext, description: &str, index: usize) -> serde_json::Value {
    serde_json::json!({
        "run_id": ctx.run_id(),
        "step": description,
        "index": index,
    })
}

fn cleanup_failure_json(failure: &CleanupFailure) -> serde_json::Value {
    serde_json::json!({
        "step": failure.step,
        "index": failure.index,
        "error": failure.message,
    })
}

impl Step for Pipeline {
    fn description(&self) -> &str {
        &self.description
    }

    /// Runs a nested build on the parent's context.
    ///
    /// The nested build gets its own run id but shares the profile, values
    /// and artifacts with the enclosing build.
    fn run(&self, ctx: &mut RunContext) -> StepResult {
        let enclosing = ctx.enter_nested_run();
        let nested = self.execute(ctx);
        ctx.leave_nested_run(enclosing);

        if nested.succeeded {
            return StepResult::success().with_nested(nested.step_results);
        }

        let message = match nested.failed_step() {
            Some(failed) => format!(
                "nested pipeline '{}' failed at step '{}': {}",
                self.description,
                failed.description,
                failed.message.as_deref().unwrap_or("no message")
            ),
            None => format!("nested pipeline '{}' failed", self.description),
        };
        StepResult::failure(message).with_nested(nested.step_results)
    }

    fn unmet_requirements(&self, profile: &Profile) -> Vec<UnmetRequirement> {
        self.steps
            .iter()
            .flat_map(|step| step.unmet_requirements(profile))
            .collect()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("description", &self.description)
            .field("steps", &self.steps)
            .field("config", &self.config)
            .finish()
    }
}
