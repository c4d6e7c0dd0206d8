//! Core domain model types for buildflow.
//!
//! This module contains the fundamental types used throughout the framework:
//! - The component type model and its registry
//! - Step and pipeline status enums
//! - The artifact marker

mod artifact;
mod component;
mod status;
mod type_registry;

pub use artifact::{Artifact, AsAny, NamedArtifact};
pub use component::{
    Capability, Component, ComponentDescriptor, ComponentType, DeserializeFn, TypeKey, TypeKind,
};
pub use status::{PipelineStatus, StepStatus};
pub use type_registry::{is_valid_type_name, ComponentRegistry};
