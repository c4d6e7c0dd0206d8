//! Registry of component types known to the deserializer.

use super::component::{ComponentDescriptor, ComponentType, TypeKey};
use crate::errors::RegistrationError;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static TYPE_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("type name pattern is valid")
});

/// Returns true if `name` is usable as a serialized component identity.
#[must_use]
pub fn is_valid_type_name(name: &str) -> bool {
    TYPE_NAME_PATTERN.is_match(name)
}

/// Maps serialized type names to component descriptors.
///
/// Used to reconstruct components polymorphically from profile documents.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    entries: RwLock<HashMap<&'static str, ComponentDescriptor>>,
}

impl ComponentRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under its `TYPE_NAME`.
    ///
    /// Registering the same type twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or already bound to a
    /// different type.
    pub fn register<T: ComponentType>(&self) -> Result<(), RegistrationError> {
        self.register_descriptor(ComponentDescriptor::of::<T>())
    }

    /// Registers a prebuilt descriptor.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ComponentRegistry::register`].
    pub fn register_descriptor(&self, descriptor: ComponentDescriptor) -> Result<(), RegistrationError> {
        let name = descriptor.name();
        if !is_valid_type_name(name) {
            return Err(RegistrationError::InvalidTypeName(name.to_string()));
        }

        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(name) {
            if existing.key() == descriptor.key() {
                return Ok(());
            }
            return Err(RegistrationError::DuplicateTypeName(name.to_string()));
        }

        entries.insert(name, descriptor);
        Ok(())
    }

    /// Looks up a descriptor by serialized name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ComponentDescriptor> {
        self.entries.read().get(name).cloned()
    }

    /// Returns true if a type with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Returns the descriptors of every registered type satisfying `query`.
    #[must_use]
    pub fn implementors(&self, query: &TypeKey) -> Vec<ComponentDescriptor> {
        let mut found: Vec<ComponentDescriptor> = self
            .entries
            .read()
            .values()
            .filter(|descriptor| descriptor.satisfies(query))
            .cloned()
            .collect();
        found.sort_by_key(ComponentDescriptor::name);
        found
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns all registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.entries.read().keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Capability;
    use serde::{Deserialize, Serialize};

    struct Output;

    impl Capability for Output {
        const NAME: &'static str = "Output";
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct OutputDir(String);

    impl ComponentType for OutputDir {
        const TYPE_NAME: &'static str = "buildflow::OutputDir";

        fn capabilities() -> Vec<TypeKey> {
            vec![TypeKey::capability::<Output>()]
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Impostor(String);

    impl ComponentType for Impostor {
        const TYPE_NAME: &'static str = "buildflow::OutputDir";
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct BadName;

    impl ComponentType for BadName {
        const TYPE_NAME: &'static str = "9 lives";
    }

    #[test]
    fn test_type_name_validation() {
        assert!(is_valid_type_name("Target"));
        assert!(is_valid_type_name("my_crate::settings::Target"));
        assert!(!is_valid_type_name(""));
        assert!(!is_valid_type_name("9 lives"));
        assert!(!is_valid_type_name("a::"));
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ComponentRegistry::new();
        registry.register::<OutputDir>().unwrap();
        registry.register::<OutputDir>().unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("buildflow::OutputDir"));
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.implementors(&TypeKey::capability::<Output>()).len(), 1);
    }

    #[test]
    fn test_register_rejects_duplicate_name() {
        let registry = ComponentRegistry::new();
        registry.register::<OutputDir>().unwrap();

        assert_eq!(
            registry.register::<Impostor>(),
            Err(RegistrationError::DuplicateTypeName("buildflow::OutputDir".to_string()))
        );
    }

    #[test]
    fn test_register_rejects_invalid_name() {
        let registry = ComponentRegistry::new();
        assert!(matches!(
            registry.register::<BadName>(),
            Err(RegistrationError::InvalidTypeName(_))
        ));
        assert!(registry.is_empty());
    }
}
