//! Component storage and effective value resolution.
//!
//! A profile's own values always win. Otherwise dependencies are searched
//! in declaration order, depth-first, and the first dependency whose
//! effective view answers the query wins.

use super::store::Profile;
use super::ProfileId;
use crate::core::{Capability, Component, ComponentType, TypeKey};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Where an effective component value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentSource {
    /// Set locally, no dependency supplies the type.
    Own,
    /// Set locally while a dependency also supplies the type.
    Overridden,
    /// Supplied solely by a dependency.
    Inherited,
}

impl fmt::Display for ComponentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Own => write!(f, "own"),
            Self::Overridden => write!(f, "overridden"),
            Self::Inherited => write!(f, "inherited"),
        }
    }
}

/// An effective component value together with its provenance.
#[derive(Debug, Clone)]
pub struct ResolvedComponent {
    /// The value.
    pub value: Arc<dyn Component>,
    /// How the value was obtained.
    pub source: ComponentSource,
    /// The profile that stores the value.
    pub provider: ProfileId,
}

impl Profile {
    /// Stores `value`, replacing any previous value of the same type.
    ///
    /// A replaced value keeps its position in the component order.
    pub fn set_component<T: ComponentType>(&self, value: T) {
        let value: Arc<dyn Component> = Arc::new(value);
        let key = TypeKey::of::<T>();
        let mut components = self.inner.components.write();
        match components.iter_mut().find(|existing| existing.type_key() == key) {
            Some(slot) => *slot = value,
            None => components.push(value),
        }
    }

    /// Returns the effective value of `T`.
    #[must_use]
    pub fn get_component<T: ComponentType>(&self) -> Option<T> {
        self.get_component_dyn(&TypeKey::of::<T>())
            .and_then(|value| value.downcast_ref::<T>().cloned())
    }

    /// Returns the effective value of `T`, or `T::default()`.
    #[must_use]
    pub fn get_component_or_default<T: ComponentType + Default>(&self) -> T {
        self.get_component::<T>().unwrap_or_default()
    }

    /// Returns the effective value answering `query`.
    ///
    /// `query` may be a concrete type or a capability.
    #[must_use]
    pub fn get_component_dyn(&self, query: &TypeKey) -> Option<Arc<dyn Component>> {
        self.local_match(query)
            .or_else(|| self.inherited_match(query, &mut HashSet::from([self.id()])).map(|(value, _)| value))
    }

    /// Returns the effective value satisfying capability `C`.
    #[must_use]
    pub fn get_capability<C: Capability>(&self) -> Option<Arc<dyn Component>> {
        self.get_component_dyn(&TypeKey::capability::<C>())
    }

    /// Resolves `query` and reports where the value comes from.
    #[must_use]
    pub fn resolve_component(&self, query: &TypeKey) -> Option<ResolvedComponent> {
        let inherited = self.inherited_match(query, &mut HashSet::from([self.id()]));
        match (self.local_match(query), inherited) {
            (Some(value), inherited) => Some(ResolvedComponent {
                value,
                source: if inherited.is_some() {
                    ComponentSource::Overridden
                } else {
                    ComponentSource::Own
                },
                provider: self.id(),
            }),
            (None, Some((value, provider))) => Some(ResolvedComponent {
                value,
                source: ComponentSource::Inherited,
                provider,
            }),
            (None, None) => None,
        }
    }

    /// Returns where the effective value of `query` comes from.
    #[must_use]
    pub fn component_source(&self, query: &TypeKey) -> Option<ComponentSource> {
        self.resolve_component(query).map(|resolved| resolved.source)
    }

    /// Returns true if an effective value of `T` exists.
    #[must_use]
    pub fn has_component<T: ComponentType>(&self) -> bool {
        self.has_component_dyn(&TypeKey::of::<T>())
    }

    /// Returns true if an effective value answers `query`.
    #[must_use]
    pub fn has_component_dyn(&self, query: &TypeKey) -> bool {
        self.get_component_dyn(query).is_some()
    }

    /// Removes the local value of `T`.
    ///
    /// Returns true if something was removed. An inherited value, if any,
    /// becomes effective again.
    pub fn remove_component<T: ComponentType>(&self) -> bool {
        self.remove_component_dyn(&TypeKey::of::<T>())
    }

    /// Removes every local value answering `query`.
    pub fn remove_component_dyn(&self, query: &TypeKey) -> bool {
        let mut components = self.inner.components.write();
        let before = components.len();
        components.retain(|component| !component.satisfies(query));
        components.len() < before
    }

    /// Removes every local value.
    pub fn clear_components(&self) {
        self.inner.components.write().clear();
    }

    /// Returns true if `T` is only supplied by a dependency.
    #[must_use]
    pub fn is_component_inherited<T: ComponentType>(&self) -> bool {
        self.is_component_inherited_dyn(&TypeKey::of::<T>())
    }

    /// Returns true if `query` is only answered by a dependency.
    #[must_use]
    pub fn is_component_inherited_dyn(&self, query: &TypeKey) -> bool {
        self.component_source(query) == Some(ComponentSource::Inherited)
    }

    /// Returns true if `T` is set locally and also supplied by a dependency.
    #[must_use]
    pub fn is_component_overridden<T: ComponentType>(&self) -> bool {
        self.is_component_overridden_dyn(&TypeKey::of::<T>())
    }

    /// Returns true if `query` is answered locally and by a dependency.
    #[must_use]
    pub fn is_component_overridden_dyn(&self, query: &TypeKey) -> bool {
        self.component_source(query) == Some(ComponentSource::Overridden)
    }

    /// Returns the local values, in insertion order.
    #[must_use]
    pub fn own_components(&self) -> Vec<Arc<dyn Component>> {
        self.inner.components.read().clone()
    }

    /// Returns the effective values: own values first, then inherited
    /// values of types not yet seen, following dependency precedence.
    #[must_use]
    pub fn get_components(&self) -> Vec<Arc<dyn Component>> {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();

        for profile in std::iter::once(self.clone()).chain(self.get_dependencies()) {
            for component in profile.own_components() {
                if seen.insert(component.type_key()) {
                    merged.push(component);
                }
            }
        }
        merged
    }

    /// Returns the concrete types of [`Profile::get_components`].
    #[must_use]
    pub fn get_component_types(&self) -> Vec<TypeKey> {
        self.get_components()
            .iter()
            .map(|component| component.type_key())
            .collect()
    }

    fn local_match(&self, query: &TypeKey) -> Option<Arc<dyn Component>> {
        self.inner
            .components
            .read()
            .iter()
            .find(|component| component.satisfies(query))
            .cloned()
    }

    fn inherited_match(
        &self,
        query: &TypeKey,
        visited: &mut HashSet<ProfileId>,
    ) -> Option<(Arc<dyn Component>, ProfileId)> {
        for dependency in self.dependencies() {
            if !visited.insert(dependency.id()) {
                continue;
            }
            if let Some(value) = dependency.local_match(query) {
                return Some((value, dependency.id()));
            }
            if let Some(found) = dependency.inherited_match(query, visited) {
                return Some(found);
            }
        }
        None
    }
}
