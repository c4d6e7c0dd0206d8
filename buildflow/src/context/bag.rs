//! Type-keyed value storage.

use std::any::{type_name, Any, TypeId};
use std::fmt;

struct Slot {
    id: TypeId,
    name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

/// Holds at most one value per Rust type, in insertion order.
#[derive(Default)]
pub struct ValueBag {
    slots: Vec<Slot>,
}

impl ValueBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, replacing any value of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        let value: Box<dyn Any + Send + Sync> = Box::new(value);
        match self.position::<T>() {
            Some(index) => self.slots[index].value = value,
            None => self.slots.push(Slot {
                id: TypeId::of::<T>(),
                name: type_name::<T>(),
                value,
            }),
        }
    }

    /// Borrows the value of type `T`.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.slots
            .iter()
            .find(|slot| slot.id == TypeId::of::<T>())
            .and_then(|slot| slot.value.downcast_ref::<T>())
    }

    /// Mutably borrows the value of type `T`.
    #[must_use]
    pub fn get_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.slots
            .iter_mut()
            .find(|slot| slot.id == TypeId::of::<T>())
            .and_then(|slot| slot.value.downcast_mut::<T>())
    }

    /// Returns the value of type `T`, inserting `init()` first if absent.
    #[allow(clippy::expect_used)]
    pub fn get_or_insert_with<T: Any + Send + Sync>(&mut self, init: impl FnOnce() -> T) -> &mut T {
        if !self.contains::<T>() {
            self.insert(init());
        }
        self.get_mut::<T>().expect("value of this type is present")
    }

    /// Removes and returns the value of type `T`.
    pub fn remove<T: Any + Send + Sync>(&mut self) -> Option<T> {
        let index = self.position::<T>()?;
        let slot = self.slots.remove(index);
        slot.value.downcast::<T>().ok().map(|value| *value)
    }

    /// Returns true if a value of type `T` is present.
    #[must_use]
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.position::<T>().is_some()
    }

    /// Iterates over `(type name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &(dyn Any + Send + Sync))> {
        self.slots.iter().map(|slot| (slot.name, slot.value.as_ref()))
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn position<T: Any>(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.id == TypeId::of::<T>())
    }
}

impl fmt::Debug for ValueBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|slot| slot.name))
            .finish()
    }
}
