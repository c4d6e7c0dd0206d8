//! Component type model.
//!
//! Profiles store values keyed by their concrete type. Lookups may also go
//! through a [`Capability`], a marker standing for an interface or abstract
//! base that several concrete component types can satisfy.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Whether a [`TypeKey`] names a storable type or a query-only capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A concrete, instantiable component type.
    Concrete,
    /// An interface-like capability; queryable, never storable.
    Capability,
}

/// Runtime descriptor of a component or capability type.
///
/// Equality and hashing only consider the underlying [`TypeId`].
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    kind: TypeKind,
}

impl TypeKey {
    /// Returns the key of a concrete component type.
    #[must_use]
    pub fn of<T: ComponentType>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: T::TYPE_NAME,
            kind: TypeKind::Concrete,
        }
    }

    /// Returns the key of a capability.
    #[must_use]
    pub fn capability<C: Capability>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: C::NAME,
            kind: TypeKind::Capability,
        }
    }

    /// Returns the type id.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the serialized type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the kind of type.
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Returns true for concrete, storable types.
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        self.kind == TypeKind::Concrete
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeKey")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Marker for an interface-like lookup type.
///
/// ```rust,ignore
/// struct PlatformTarget;
/// impl Capability for PlatformTarget {
///     const NAME: &'static str = "PlatformTarget";
/// }
/// ```
pub trait Capability: 'static {
    /// Human-readable name used in diagnostics.
    const NAME: &'static str;
}

/// A concrete component type that can be stored in a profile.
pub trait ComponentType:
    Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Stable identity written to serialized profiles.
    const TYPE_NAME: &'static str;

    /// Capabilities this type satisfies, in declaration order.
    fn capabilities() -> Vec<TypeKey> {
        Vec::new()
    }
}

/// Object-safe view over a stored component value.
pub trait Component: Debug + Send + Sync + 'static {
    /// Returns the concrete type key.
    fn type_key(&self) -> TypeKey;

    /// Returns true if this value can answer a query for `query`.
    fn satisfies(&self, query: &TypeKey) -> bool;

    /// Returns the value as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Serializes the value to JSON.
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
}

impl<T: ComponentType> Component for T {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn satisfies(&self, query: &TypeKey) -> bool {
        query.id == TypeId::of::<T>() || T::capabilities().contains(query)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

impl dyn Component {
    /// Downcasts to a concrete component type.
    #[must_use]
    pub fn downcast_ref<T: ComponentType>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Returns true if the value is exactly of type `T`.
    #[must_use]
    pub fn is<T: ComponentType>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Deserializer signature stored in a [`ComponentDescriptor`].
pub type DeserializeFn = fn(serde_json::Value) -> serde_json::Result<Arc<dyn Component>>;

fn deserialize_component<T: ComponentType>(
    value: serde_json::Value,
) -> serde_json::Result<Arc<dyn Component>> {
    let component: T = serde_json::from_value(value)?;
    Ok(Arc::new(component))
}

/// Everything the runtime needs to know about a concrete component type.
#[derive(Clone)]
pub struct ComponentDescriptor {
    key: TypeKey,
    capabilities: Vec<TypeKey>,
    deserialize: DeserializeFn,
}

impl ComponentDescriptor {
    /// Builds the descriptor of `T`.
    #[must_use]
    pub fn of<T: ComponentType>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            capabilities: T::capabilities(),
            deserialize: deserialize_component::<T>,
        }
    }

    /// Returns the concrete type key.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Returns the serialized type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.key.name
    }

    /// Returns the capabilities this type satisfies.
    #[must_use]
    pub fn capabilities(&self) -> &[TypeKey] {
        &self.capabilities
    }

    /// Returns true if values of this type answer queries for `query`.
    #[must_use]
    pub fn satisfies(&self, query: &TypeKey) -> bool {
        self.key == *query || self.capabilities.contains(query)
    }

    /// Reconstructs a value from its JSON payload.
    pub fn deserialize(&self, value: serde_json::Value) -> serde_json::Result<Arc<dyn Component>> {
        (self.deserialize)(value)
    }
}

impl Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("key", &self.key)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    struct Platform;

    impl Capability for Platform {
        const NAME: &'static str = "Platform";
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Desktop {
        arch: String,
    }

    impl ComponentType for Desktop {
        const TYPE_NAME: &'static str = "Desktop";

        fn capabilities() -> Vec<TypeKey> {
            vec![TypeKey::capability::<Platform>()]
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Compression(u8);

    impl ComponentType for Compression {
        const TYPE_NAME: &'static str = "Compression";
    }

    #[test]
    fn test_type_key_identity() {
        assert_eq!(TypeKey::of::<Desktop>(), TypeKey::of::<Desktop>());
        assert_ne!(TypeKey::of::<Desktop>(), TypeKey::of::<Compression>());
        assert!(TypeKey::of::<Desktop>().is_concrete());
        assert!(!TypeKey::capability::<Platform>().is_concrete());
        assert_eq!(TypeKey::capability::<Platform>().to_string(), "Platform");
    }

    #[test]
    fn test_component_satisfies_capability() {
        let desktop: Arc<dyn Component> = Arc::new(Desktop { arch: "x64".into() });
        let compression: Arc<dyn Component> = Arc::new(Compression(3));
        let platform = TypeKey::capability::<Platform>();

        assert!(desktop.satisfies(&platform));
        assert!(desktop.satisfies(&TypeKey::of::<Desktop>()));
        assert!(!compression.satisfies(&platform));
    }

    #[test]
    fn test_downcast() {
        let value: Arc<dyn Component> = Arc::new(Compression(9));
        assert!(value.is::<Compression>());
        assert_eq!(value.downcast_ref::<Compression>(), Some(&Compression(9)));
        assert!(value.downcast_ref::<Desktop>().is_none());
    }

    #[test]
    fn test_descriptor_deserialize() {
        let descriptor = ComponentDescriptor::of::<Desktop>();
        let value = descriptor
            .deserialize(serde_json::json!({"arch": "arm64"}))
            .unwrap();

        assert_eq!(descriptor.name(), "Desktop");
        assert!(descriptor.satisfies(&TypeKey::capability::<Platform>()));
        assert_eq!(
            value.downcast_ref::<Desktop>(),
            Some(&Desktop { arch: "arm64".into() })
        );
    }
}
