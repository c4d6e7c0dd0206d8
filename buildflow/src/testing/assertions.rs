//! Test assertions for pipeline results.

use crate::pipeline::PipelineResult;

use super::ExecutionLog;

/// Asserts that the build succeeded.
pub fn assert_pipeline_succeeded(result: &PipelineResult) {
    assert!(
        result.succeeded,
        "Expected build to succeed, got: {result}"
    );
}

/// Asserts that the build failed at the step described by `step`.
pub fn assert_pipeline_failed(result: &PipelineResult, step: &str) {
    assert!(!result.succeeded, "Expected build to fail, got: {result}");
    let failed = result.failed_step().map(|failed| failed.description.as_str());
    assert_eq!(
        failed,
        Some(step),
        "Expected failure at '{step}', got {failed:?}"
    );
}

/// Asserts the descriptions of the steps whose forward action ran.
pub fn assert_step_descriptions(result: &PipelineResult, expected: &[&str]) {
    assert_eq!(
        result.step_descriptions(),
        expected,
        "Unexpected step results for '{}'",
        result.description
    );
}

/// Asserts the full forward and cleanup order recorded in `log`.
pub fn assert_execution_order(log: &ExecutionLog, expected: &[&str]) {
    let entries = log.entries();
    assert_eq!(entries, expected, "Unexpected execution order");
}
