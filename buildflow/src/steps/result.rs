//! Result of a single step action.

use crate::core::StepStatus;
use crate::errors::ContractError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a step's forward or cleanup action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// Description of the step that produced the result.
    #[serde(default)]
    pub description: String,
    /// Whether the action succeeded.
    pub status: StepStatus,
    /// Optional human-readable detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Wall-clock duration of the action.
    #[serde(default)]
    pub duration_ms: u64,
    /// Results of the steps of a nested pipeline.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<StepResult>,
}

impl StepResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success() -> Self {
        Self {
            description: String::new(),
            status: StepStatus::Succeeded,
            message: None,
            duration_ms: 0,
            nested: Vec::new(),
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Failed,
            message: Some(message.into()),
            ..Self::success()
        }
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches the results of a nested pipeline.
    #[must_use]
    pub fn with_nested(mut self, nested: Vec<StepResult>) -> Self {
        self.nested = nested;
        self
    }

    /// Returns true if the action succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the action failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }

    pub(crate) fn stamped(mut self, description: &str, duration_ms: u64) -> Self {
        if self.description.is_empty() {
            self.description = description.to_string();
        }
        self.duration_ms = duration_ms;
        self
    }
}

impl From<ContractError> for StepResult {
    fn from(err: ContractError) -> Self {
        Self::failure(err.to_string())
    }
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.description, self.status)?;
        if let Some(message) = &self.message {
            write!(f, " ({message})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_constructors() {
        assert!(StepResult::success().is_success());

        let failed = StepResult::failure("no compiler");
        assert!(failed.is_failure());
        assert_eq!(failed.message.as_deref(), Some("no compiler"));
    }

    #[test]
    fn test_stamped_keeps_explicit_description() {
        let result = StepResult::success().stamped("compile", 12);
        assert_eq!(result.description, "compile");
        assert_eq!(result.duration_ms, 12);

        let mut named = StepResult::success();
        named.description = "custom".into();
        assert_eq!(named.stamped("compile", 0).description, "custom");
    }

    #[test]
    fn test_display() {
        let result = StepResult::failure("boom").stamped("link", 0);
        assert_eq!(result.to_string(), "link: failed (boom)");
    }

    #[test]
    fn test_serialize_skips_empty_fields() {
        let json = serde_json::to_value(StepResult::success().stamped("copy", 3)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"description": "copy", "status": "succeeded", "duration_ms": 3})
        );
    }

    #[test]
    fn test_from_contract_error() {
        let result = StepResult::from(ContractError::EmptyTypeToken { step: "s".into() });
        assert!(result.is_failure());
    }
}
