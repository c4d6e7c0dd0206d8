//! Step and pipeline status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The outcome of a single step action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The action completed successfully.
    Succeeded,
    /// The action failed.
    Failed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl StepStatus {
    /// Returns true if the status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Returns true if the status indicates failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Lifecycle of one pipeline build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum PipelineStatus {
    /// The build has not started.
    NotStarted,
    /// The step at `index` is running.
    Running {
        /// Position of the running step.
        index: usize,
    },
    /// Every invoked step succeeded.
    Completed,
    /// A step failed and the build stopped.
    Failed {
        /// Position of the failing step.
        index: usize,
    },
}

impl Default for PipelineStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Running { index } => write!(f, "running({index})"),
            Self::Completed => write!(f, "completed"),
            Self::Failed { index } => write!(f, "failed({index})"),
        }
    }
}

impl PipelineStatus {
    /// Returns true if the build has finished, successfully or not.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }
}
