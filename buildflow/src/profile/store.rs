//! Profile handle, identity and dependency graph.

use crate::core::Component;
use crate::errors::{CycleDetectedError, ProfileError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Stable identity of a profile instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(Uuid);

impl ProfileId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ProfileId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

pub(crate) struct ProfileState {
    id: ProfileId,
    name: RwLock<String>,
    pub(crate) components: RwLock<Vec<Arc<dyn Component>>>,
    pub(crate) dependencies: RwLock<Vec<DependencySlot>>,
    destroyed: AtomicBool,
}

/// One entry of a profile's raw dependency list.
///
/// A linked slot keeps its target alive. A slot whose target was destroyed
/// or never resolved is a placeholder: it keeps its id for serialization
/// and is skipped by queries.
#[derive(Clone)]
pub(crate) struct DependencySlot {
    pub(crate) id: Option<ProfileId>,
    handle: Option<Arc<ProfileState>>,
}

impl DependencySlot {
    pub(crate) fn linked(profile: &Profile) -> Self {
        Self {
            id: Some(profile.id()),
            handle: Some(Arc::clone(&profile.inner)),
        }
    }

    pub(crate) fn placeholder(id: Option<ProfileId>) -> Self {
        Self {
            id,
            handle: None,
        }
    }

    pub(crate) fn resolve(&self) -> Option<Profile> {
        self.handle
            .as_ref()
            .filter(|state| !state.destroyed.load(Ordering::SeqCst))
            .map(|inner| Profile {
                inner: Arc::clone(inner),
            })
    }
}

/// A node in the configuration graph.
///
/// Cloning a `Profile` clones the handle; all clones observe the same state.
/// Equality and hashing follow the profile's identity.
#[derive(Clone)]
pub struct Profile {
    pub(crate) inner: Arc<ProfileState>,
}

impl Profile {
    /// Creates an empty profile.
    #[must_use]
    pub fn new() -> Self {
        Self::named("")
    }

    /// Creates an empty profile with a display name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::with_id(ProfileId::new(), name)
    }

    /// Creates an empty profile with a fixed identity.
    #[must_use]
    pub fn with_id(id: ProfileId, name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ProfileState {
                id,
                name: RwLock::new(name.into()),
                components: RwLock::new(Vec::new()),
                dependencies: RwLock::new(Vec::new()),
                destroyed: AtomicBool::new(false),
            }),
        }
    }

    /// Creates a profile and runs `init` on it before returning.
    #[must_use]
    pub fn create(init: impl FnOnce(&Profile)) -> Self {
        let profile = Self::new();
        init(&profile);
        profile
    }

    /// Returns the profile identity.
    #[must_use]
    pub fn id(&self) -> ProfileId {
        self.inner.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> String {
        self.inner.name.read().clone()
    }

    /// Sets the display name.
    pub fn set_name(&self, name: impl Into<String>) {
        *self.inner.name.write() = name.into();
    }

    /// Returns true once [`Profile::destroy`] has been called.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    /// Destroys the profile.
    ///
    /// Its state is cleared and every profile depending on it sees the slot
    /// as a missing dependency from now on.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.components.write().clear();
        self.inner.dependencies.write().clear();
        debug!(profile = %self.id(), "Profile destroyed");
    }

    /// Adds `other` as the last dependency.
    ///
    /// Returns `Ok(false)` without changing anything when `other` is this
    /// profile, is already a direct dependency, or already depends on this
    /// profile.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Destroyed`] if `other` has been destroyed.
    pub fn add_dependency(&self, other: &Profile) -> Result<bool, ProfileError> {
        if other.is_destroyed() {
            return Err(ProfileError::Destroyed { id: other.id() });
        }
        if other.id() == self.id() || other.depends_on(self.id()) {
            debug!(profile = %self.id(), dependency = %other.id(), "Rejected cyclic dependency");
            return Ok(false);
        }

        let mut dependencies = self.inner.dependencies.write();
        if dependencies.iter().any(|slot| slot.id == Some(other.id())) {
            return Ok(false);
        }
        dependencies.push(DependencySlot::linked(other));
        Ok(true)
    }

    /// Replaces the whole dependency list.
    ///
    /// Repeated entries are collapsed onto their first occurrence.
    ///
    /// # Errors
    ///
    /// Fails without changing anything if an entry is destroyed, is this
    /// profile, or would close a cycle.
    pub fn set_dependencies(&self, dependencies: Vec<Profile>) -> Result<(), ProfileError> {
        let mut seen = HashSet::new();
        let mut slots = Vec::with_capacity(dependencies.len());

        for dependency in &dependencies {
            if dependency.is_destroyed() {
                return Err(ProfileError::Destroyed { id: dependency.id() });
            }
            if let Some(path) = self.cycle_through(dependency) {
                return Err(CycleDetectedError::new(path).into());
            }
            if seen.insert(dependency.id()) {
                slots.push(DependencySlot::linked(dependency));
            }
        }

        *self.inner.dependencies.write() = slots;
        Ok(())
    }

    /// Removes `other` from the direct dependencies.
    ///
    /// Returns true if it was present.
    pub fn remove_dependency(&self, other: &Profile) -> bool {
        let mut dependencies = self.inner.dependencies.write();
        let before = dependencies.len();
        dependencies.retain(|slot| slot.id != Some(other.id()));
        dependencies.len() < before
    }

    /// Removes every dependency, placeholders included.
    pub fn clear_dependencies(&self) {
        self.inner.dependencies.write().clear();
    }

    /// Returns true if `other` is a live direct dependency.
    #[must_use]
    pub fn has_dependency(&self, other: &Profile) -> bool {
        self.dependencies().iter().any(|dep| dep.id() == other.id())
    }

    /// Returns the live direct dependencies, in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> Vec<Profile> {
        self.dependency_slots()
            .iter()
            .filter_map(DependencySlot::resolve)
            .collect()
    }

    /// Returns the transitive closure of live dependencies.
    ///
    /// Depth-first pre-order, each profile once. Missing entries are skipped.
    #[must_use]
    pub fn get_dependencies(&self) -> Vec<Profile> {
        let mut visited = HashSet::from([self.id()]);
        let mut closure = Vec::new();
        self.collect_dependencies(&mut visited, &mut closure);
        closure
    }

    /// Returns the raw number of dependency slots, placeholders included.
    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.read().len()
    }

    /// Returns true if `target` is reachable through the dependency graph.
    #[must_use]
    pub fn depends_on(&self, target: ProfileId) -> bool {
        self.get_dependencies().iter().any(|dep| dep.id() == target)
    }

    pub(crate) fn dependency_slots(&self) -> Vec<DependencySlot> {
        self.inner.dependencies.read().clone()
    }

    pub(crate) fn replace_state(
        &self,
        components: Vec<Arc<dyn Component>>,
        dependencies: Vec<DependencySlot>,
    ) {
        *self.inner.components.write() = components;
        *self.inner.dependencies.write() = dependencies;
    }

    fn collect_dependencies(&self, visited: &mut HashSet<ProfileId>, closure: &mut Vec<Profile>) {
        for dependency in self.dependencies() {
            if visited.insert(dependency.id()) {
                closure.push(dependency.clone());
                dependency.collect_dependencies(visited, closure);
            }
        }
    }

    /// Describes the cycle adding `dependency` would close, if any.
    fn cycle_through(&self, dependency: &Profile) -> Option<Vec<String>> {
        if dependency.id() == self.id() {
            return Some(vec![self.label(), self.label()]);
        }
        let mut path = vec![self.label()];
        let mut visited = HashSet::new();
        dependency
            .path_to(self.id(), &mut visited, &mut path)
            .then_some(path)
    }

    fn path_to(&self, target: ProfileId, visited: &mut HashSet<ProfileId>, path: &mut Vec<String>) -> bool {
        path.push(self.label());
        if self.id() == target {
            return true;
        }
        if visited.insert(self.id()) {
            for dependency in self.dependencies() {
                if dependency.path_to(target, visited, path) {
                    return true;
                }
            }
        }
        path.pop();
        false
    }

    fn label(&self) -> String {
        let name = self.name();
        if name.is_empty() {
            self.id().to_string()
        } else {
            name
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Profile {}

impl Hash for Profile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("components", &self.inner.components.read().len())
            .field("dependencies", &self.dependency_count())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
