//! Aggregate result of a pipeline build.

use crate::profile::{Profile, ProfileId};
use crate::steps::StepResult;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Outcome of one [`Pipeline::build`](super::Pipeline::build) call.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// Description of the pipeline.
    pub description: String,
    /// Id of the run that produced the result.
    pub run_id: Uuid,
    /// The profile that was built.
    #[serde(rename = "profile_id", serialize_with = "serialize_profile")]
    pub profile: Option<Profile>,
    /// True iff no invoked step failed.
    pub succeeded: bool,
    /// One result per step whose forward action ran, in order.
    pub step_results: Vec<StepResult>,
    /// When the build started.
    pub started_at: DateTime<Utc>,
    /// When the build returned.
    pub ended_at: DateTime<Utc>,
}

fn serialize_profile<S: Serializer>(profile: &Option<Profile>, serializer: S) -> Result<S::Ok, S::Error> {
    profile.as_ref().map(Profile::id).serialize(serializer)
}

impl PipelineResult {
    /// Returns the failing step's result, if the build failed.
    #[must_use]
    pub fn failed_step(&self) -> Option<&StepResult> {
        self.step_results.iter().find(|result| result.is_failure())
    }

    /// Returns the descriptions of the steps that ran, in order.
    #[must_use]
    pub fn step_descriptions(&self) -> Vec<&str> {
        self.step_results
            .iter()
            .map(|result| result.description.as_str())
            .collect()
    }

    /// Returns the id of the profile that was built.
    #[must_use]
    pub fn profile_id(&self) -> Option<ProfileId> {
        self.profile.as_ref().map(Profile::id)
    }

    /// Returns the build duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.ended_at - self.started_at).num_milliseconds()
    }
}

impl fmt::Display for PipelineResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.succeeded { "succeeded" } else { "failed" };
        write!(
            f,
            "Pipeline '{}' {} after {} step(s) in {}ms",
            self.description,
            outcome,
            self.step_results.len(),
            self.duration_ms()
        )?;
        if let Some(failed) = self.failed_step() {
            write!(f, "; failed at '{}'", failed.description)?;
            if let Some(message) = &failed.message {
                write!(f, ": {message}")?;
            }
        }
        Ok(())
    }
}
