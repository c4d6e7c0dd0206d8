//! Testing utilities for buildflow pipelines.
//!
//! This module provides:
//! - Recording steps that log their forward and cleanup actions
//! - Assertions over pipeline results
//! - A fixture wiring a collecting sink and a private artifact registry

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_execution_order, assert_pipeline_failed, assert_pipeline_succeeded,
    assert_step_descriptions,
};
pub use fixtures::TestFixture;
pub use mocks::{ExecutionLog, RecordingStep};
