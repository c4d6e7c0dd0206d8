//! Process-wide record of what each profile's last build produced.

mod registry;

pub use registry::{artifact_registry, reset_artifact_registry, set_artifact_registry, ArtifactRegistry};
