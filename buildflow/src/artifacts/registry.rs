//! Artifact registry keyed by profile identity.

use crate::core::Artifact;
use crate::errors::RegistryError;
use crate::pipeline::PipelineResult;
use crate::profile::{Profile, ProfileId};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    result: PipelineResult,
    artifacts: Vec<Arc<dyn Artifact>>,
}

/// Maps a profile to its most recent build result and artifacts.
///
/// Storing replaces whatever was recorded for the profile before. Every
/// read is total: an absent or destroyed profile, a missing entry or a
/// type mismatch all yield `None`.
#[derive(Default)]
pub struct ArtifactRegistry {
    entries: Mutex<HashMap<ProfileId, Entry>>,
}

impl ArtifactRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `result` and `artifacts` for the result's profile.
    ///
    /// # Errors
    ///
    /// Fails if the result has no profile or the profile was destroyed.
    pub fn store(&self, result: PipelineResult, artifacts: Vec<Arc<dyn Artifact>>) -> Result<(), RegistryError> {
        let profile = result
            .profile
            .as_ref()
            .ok_or_else(|| RegistryError::MissingProfile(result.description.clone()))?;
        if profile.is_destroyed() {
            return Err(RegistryError::DestroyedProfile(profile.id()));
        }

        let id = profile.id();
        debug!(profile = %id, artifacts = artifacts.len(), succeeded = result.succeeded, "Storing build result");
        self.entries.lock().insert(id, Entry { result, artifacts });
        Ok(())
    }

    /// Returns the first artifact of type `T` from the last build of `profile`.
    #[must_use]
    pub fn get_build_artifact<T: Artifact>(&self, profile: Option<&Profile>) -> Option<Arc<T>> {
        self.with_entry(profile, |entry| {
            entry
                .artifacts
                .iter()
                .find_map(|artifact| Arc::clone(artifact).into_any_arc().downcast::<T>().ok())
        })
    }

    /// Returns every artifact of type `T` from the last build of `profile`.
    #[must_use]
    pub fn get_build_artifacts_of<T: Artifact>(&self, profile: Option<&Profile>) -> Vec<Arc<T>> {
        self.with_entry(profile, |entry| {
            Some(
                entry
                    .artifacts
                    .iter()
                    .filter_map(|artifact| Arc::clone(artifact).into_any_arc().downcast::<T>().ok())
                    .collect(),
            )
        })
        .unwrap_or_default()
    }

    /// Returns all artifacts from the last build of `profile`.
    #[must_use]
    pub fn get_build_artifacts(&self, profile: Option<&Profile>) -> Vec<Arc<dyn Artifact>> {
        self.with_entry(profile, |entry| Some(entry.artifacts.clone()))
            .unwrap_or_default()
    }

    /// Returns the last build result of `profile`.
    #[must_use]
    pub fn get_build_result(&self, profile: Option<&Profile>) -> Option<PipelineResult> {
        self.with_entry(profile, |entry| Some(entry.result.clone()))
    }

    /// Forgets the entry of `profile`. Returns true if one existed.
    pub fn remove(&self, profile: &Profile) -> bool {
        self.entries.lock().remove(&profile.id()).is_some()
    }

    /// Forgets every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn with_entry<R>(&self, profile: Option<&Profile>, read: impl FnOnce(&Entry) -> Option<R>) -> Option<R> {
        let profile = profile.filter(|profile| !profile.is_destroyed())?;
        self.entries.lock().get(&profile.id()).and_then(read)
    }
}

impl std::fmt::Debug for ArtifactRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactRegistry")
            .field("entries", &self.len())
            .finish()
    }
}

static GLOBAL_ARTIFACT_REGISTRY: RwLock<Option<Arc<ArtifactRegistry>>> = RwLock::new(None);

/// Returns the process-wide artifact registry, creating it on first use.
pub fn artifact_registry() -> Arc<ArtifactRegistry> {
    if let Some(registry) = GLOBAL_ARTIFACT_REGISTRY.read().as_ref() {
        return registry.clone();
    }
    GLOBAL_ARTIFACT_REGISTRY
        .write()
        .get_or_insert_with(|| Arc::new(ArtifactRegistry::new()))
        .clone()
}

/// Replaces the process-wide artifact registry.
pub fn set_artifact_registry(registry: Arc<ArtifactRegistry>) {
    *GLOBAL_ARTIFACT_REGISTRY.write() = Some(registry);
}

/// Drops the process-wide artifact registry; the next access creates a
/// fresh one.
pub fn reset_artifact_registry() {
    *GLOBAL_ARTIFACT_REGISTRY.write() = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NamedArtifact;
    use crate::pipeline::Pipeline;
    use crate::steps::NoOpStep;
    use pretty_assertions::assert_eq;

    #[derive(Debug, PartialEq)]
    struct Executable {
        path: String,
    }

    impl Artifact for Executable {}

    #[derive(Debug)]
    struct Symbols;

    impl Artifact for Symbols {}

    fn result_for(profile: &Profile) -> PipelineResult {
        Pipeline::new("build").with_step(NoOpStep::new("noop")).build(profile)
    }

    fn executable(path: &str) -> Arc<dyn Artifact> {
        Arc::new(Executable { path: path.to_string() })
    }

    #[test]
    fn test_store_and_get_artifact() {
        let registry = ArtifactRegistry::new();
        let profile = Profile::new();
        registry.store(result_for(&profile), vec![executable("game.exe")]).unwrap();

        let found = registry.get_build_artifact::<Executable>(Some(&profile)).unwrap();
        assert_eq!(found.path, "game.exe");
        assert!(registry.get_build_artifact::<Symbols>(Some(&profile)).is_none());
        assert!(registry.get_build_artifact::<Executable>(None).is_none());
    }

    #[test]
    fn test_store_replaces_previous_entry() {
        let registry = ArtifactRegistry::new();
        let profile = Profile::new();
        registry
            .store(result_for(&profile), vec![executable("old.exe"), Arc::new(Symbols)])
            .unwrap();
        registry.store(result_for(&profile), vec![executable("new.exe")]).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_build_artifacts(Some(&profile)).len(), 1);
        assert!(registry.get_build_artifact::<Symbols>(Some(&profile)).is_none());
        assert_eq!(
            registry.get_build_artifact::<Executable>(Some(&profile)).unwrap().path,
            "new.exe"
        );
    }

    #[test]
    fn test_get_build_result() {
        let registry = ArtifactRegistry::new();
        let profile = Profile::new();
        let other = Profile::new();
        let result = result_for(&profile);
        let run_id = result.run_id;
        registry.store(result, Vec::new()).unwrap();

        assert_eq!(registry.get_build_result(Some(&profile)).map(|r| r.run_id), Some(run_id));
        assert!(registry.get_build_result(Some(&other)).is_none());
        assert!(registry.get_build_result(None).is_none());
    }

    #[test]
    fn test_get_build_artifacts_of_type() {
        let registry = ArtifactRegistry::new();
        let profile = Profile::new();
        registry
            .store(
                result_for(&profile),
                vec![
                    executable("a"),
                    Arc::new(NamedArtifact::new("report", "size", serde_json::json!(1))),
                    executable("b"),
                ],
            )
            .unwrap();

        let paths: Vec<String> = registry
            .get_build_artifacts_of::<Executable>(Some(&profile))
            .iter()
            .map(|exe| exe.path.clone())
            .collect();
        assert_eq!(paths, vec!["a", "b"]);
    }

    #[test]
    fn test_store_rejects_missing_or_destroyed_profile() {
        let registry = ArtifactRegistry::new();
        let profile = Profile::new();

        let mut orphan = result_for(&profile);
        orphan.profile = None;
        assert_eq!(
            registry.store(orphan, Vec::new()),
            Err(RegistryError::MissingProfile("build".into()))
        );

        let result = result_for(&profile);
        profile.destroy();
        assert_eq!(
            registry.store(result, Vec::new()),
            Err(RegistryError::DestroyedProfile(profile.id()))
        );
    }

    #[test]
    fn test_destroyed_profile_reads_as_absent() {
        let registry = ArtifactRegistry::new();
        let profile = Profile::new();
        registry.store(result_for(&profile), vec![executable("x")]).unwrap();

        profile.destroy();
        assert!(registry.get_build_artifact::<Executable>(Some(&profile)).is_none());
        assert!(registry.get_build_result(Some(&profile)).is_none());
    }

    #[test]
    fn test_remove_and_clear() {
        let registry = ArtifactRegistry::new();
        let a = Profile::new();
        let b = Profile::new();
        registry.store(result_for(&a), Vec::new()).unwrap();
        registry.store(result_for(&b), Vec::new()).unwrap();

        assert!(registry.remove(&a));
        assert!(!registry.remove(&a));
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_global_registry() {
        let replacement = Arc::new(ArtifactRegistry::new());
        set_artifact_registry(replacement.clone());
        assert!(Arc::ptr_eq(&artifact_registry(), &replacement));

        reset_artifact_registry();
        assert!(!Arc::ptr_eq(&artifact_registry(), &replacement));
        assert!(Arc::ptr_eq(&artifact_registry(), &artifact_registry()));
    }
}
