//! Logging setup and timing helpers.

mod logging;
mod timer;

pub use logging::{init_logging, LogConfig, LogFormat, LOG_ENV, LOG_FORMAT_ENV};
pub use timer::StepTimer;
