//! # Buildflow
//!
//! Layered build configuration and an ordered build pipeline engine.
//!
//! Buildflow provides:
//!
//! - **Profiles**: typed component values layered over dependency profiles
//! - **Pipelines**: ordered steps with reverse-order cleanup and nesting
//! - **Step contracts**: steps declare the components they read
//! - **Artifact registry**: per-profile storage of build results
//! - **Event-driven observability**: lifecycle events and structured logs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use buildflow::prelude::*;
//!
//! let base = Profile::new();
//! base.set_component(Compression(6));
//!
//! let release = Profile::new();
//! release.add_dependency(&base)?;
//!
//! let pipeline = Pipeline::new("release")
//!     .with_step(Compile)
//!     .with_step(Package);
//! pipeline.can_build(&release)?;
//!
//! let result = pipeline.build(&release);
//! assert!(result.succeeded);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod artifacts;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod profile;
pub mod steps;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::artifacts::{artifact_registry, ArtifactRegistry};
    pub use crate::context::RunContext;
    pub use crate::core::{
        Artifact, Capability, Component, ComponentRegistry, ComponentType, NamedArtifact,
        PipelineStatus, StepStatus, TypeKey,
    };
    pub use crate::errors::{
        BuildflowError, CanBuildError, ContractError, CycleDetectedError, ProfileError,
        RegistryError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::{init_logging, LogConfig, LogFormat};
    pub use crate::pipeline::{Pipeline, PipelineConfig, PipelineResult};
    pub use crate::profile::{ComponentSource, Profile, ProfileCatalog, ProfileId};
    pub use crate::steps::{FnStep, NoOpStep, Step, StepComponents, StepResult};
}
