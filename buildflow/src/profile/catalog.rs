//! Factory and identity lookup for profiles.

use super::document::{self, DeserializeReport};
use super::store::{Profile, ProfileState};
use super::ProfileId;
use crate::core::ComponentRegistry;
use crate::errors::ProfileError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Creates profiles and resolves them by id.
///
/// Serialized dependencies are plain ids; the catalog is what turns them
/// back into live profiles. It holds weak handles only, so dropping every
/// `Profile` clone releases the profile.
#[derive(Debug)]
pub struct ProfileCatalog {
    types: Arc<ComponentRegistry>,
    profiles: RwLock<HashMap<ProfileId, Weak<ProfileState>>>,
}

impl Default for ProfileCatalog {
    fn default() -> Self {
        Self::new(Arc::new(ComponentRegistry::new()))
    }
}

impl ProfileCatalog {
    /// Creates a catalog deserializing components through `types`.
    #[must_use]
    pub fn new(types: Arc<ComponentRegistry>) -> Self {
        Self {
            types,
            profiles: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the component type registry.
    #[must_use]
    pub fn types(&self) -> &Arc<ComponentRegistry> {
        &self.types
    }

    /// Creates and registers an empty profile.
    #[must_use]
    pub fn create(&self) -> Profile {
        let profile = Profile::new();
        self.register(&profile);
        profile
    }

    /// Creates and registers a profile, running `init` on it first.
    #[must_use]
    pub fn create_with(&self, init: impl FnOnce(&Profile)) -> Profile {
        let profile = self.create();
        init(&profile);
        profile
    }

    /// Makes `profile` resolvable by id.
    pub fn register(&self, profile: &Profile) {
        self.profiles
            .write()
            .insert(profile.id(), Arc::downgrade(&profile.inner));
    }

    /// Returns the live profile with this id.
    #[must_use]
    pub fn resolve(&self, id: ProfileId) -> Option<Profile> {
        let inner = self.profiles.read().get(&id)?.upgrade()?;
        let profile = Profile { inner };
        (!profile.is_destroyed()).then_some(profile)
    }

    /// Destroys `profile` and forgets it.
    pub fn destroy(&self, profile: &Profile) {
        profile.destroy();
        self.profiles.write().remove(&profile.id());
    }

    /// Returns the number of live registered profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        let mut profiles = self.profiles.write();
        profiles.retain(|_, handle| {
            handle
                .upgrade()
                .is_some_and(|inner| !Profile { inner }.is_destroyed())
        });
        profiles.len()
    }

    /// Returns true if no live profile is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the state of `target` with the document in `text`.
    ///
    /// Entries that cannot be loaded are skipped and listed in the report;
    /// everything else is applied in one swap.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::MalformedDocument`] if `text` is not a
    /// profile document, or [`ProfileError::Destroyed`] if `target` has been
    /// destroyed. The target is left untouched in both cases.
    pub fn deserialize_into(&self, target: &Profile, text: &str) -> Result<DeserializeReport, ProfileError> {
        document::decode(self, target, text)
    }

    /// Creates a registered profile from a document.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ProfileCatalog::deserialize_into`].
    pub fn load(&self, text: &str) -> Result<(Profile, DeserializeReport), ProfileError> {
        let profile = self.create();
        match self.deserialize_into(&profile, text) {
            Ok(report) => Ok((profile, report)),
            Err(err) => {
                debug!(profile = %profile.id(), "Discarding profile after failed load");
                self.destroy(&profile);
                Err(err)
            }
        }
    }
}
