//! Pipeline execution.
//!
//! A [`Pipeline`] runs its steps in order against one profile, stops at the
//! first failure and then cleans up every step that ran, in reverse order.

mod cleanup;
mod config;
mod engine;
mod result;


pub use config::PipelineConfig;
pub use engine::Pipeline;
pub use result::PipelineResult;
