//! Injection sets.
//!
//! An injection supplies a parameter by type match instead of by position.
//! Values are keyed by their runtime [`TypeId`]; a set holds at most one
//! value per type.

use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    fmt,
    sync::Arc,
};

/// A type-erased injection value.
///
/// Cloning is cheap: the value itself is shared.
#[derive(Clone)]
pub struct Injected {
    id: TypeId,
    name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl Injected {
    /// Wrap a value, recording its runtime type.
    pub fn new<V: Any + Send + Sync>(value: V) -> Self {
        Self {
            id: TypeId::of::<V>(),
            name: type_name::<V>(),
            value: Arc::new(value),
        }
    }

    /// The runtime type of the wrapped value.
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// The Rust type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Borrow the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for Injected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Injected").field(&self.name).finish()
    }
}

/// A set of injection values, one per type.
#[derive(Clone, Default)]
pub struct Injections {
    values: HashMap<TypeId, Injected>,
}

impl Injections {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with<V: Any + Send + Sync>(mut self, value: V) -> Self {
        self.insert(value);
        self
    }

    /// Insert a value under its type, returning the value it replaced.
    pub fn insert<V: Any + Send + Sync>(&mut self, value: V) -> Option<Injected> {
        self.insert_injected(Injected::new(value))
    }

    /// Insert an already wrapped value under its type.
    pub fn insert_injected(&mut self, injected: Injected) -> Option<Injected> {
        self.values.insert(injected.type_id(), injected)
    }

    /// Borrow the value of type `T`.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|i| i.downcast_ref::<T>())
    }

    /// Look up a value by runtime type.
    pub fn get_by_id(&self, id: TypeId) -> Option<&Injected> {
        self.values.get(&id)
    }

    /// Whether a value of type `T` is present.
    pub fn contains<T: Any>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    /// Remove the value of type `T`.
    pub fn remove<T: Any>(&mut self) -> Option<Injected> {
        self.values.remove(&TypeId::of::<T>())
    }

    /// Copy every value of `other` into this set; `other` wins on collision.
    pub fn extend(&mut self, other: &Injections) {
        for injected in other.values.values() {
            self.insert_injected(injected.clone());
        }
    }

    /// Merge sets left to right. Later sets overwrite earlier ones for the same type.
    pub fn merge<'a>(sets: impl IntoIterator<Item = &'a Injections>) -> Injections {
        let mut merged = Injections::new();
        for set in sets {
            merged.extend(set);
        }
        merged
    }

    /// Iterate over the contained values.
    pub fn iter(&self) -> impl Iterator<Item = &Injected> {
        self.values.values()
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Injections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.values.values().map(|i| i.type_name()))
            .finish()
    }
}

impl FromIterator<Injected> for Injections {
    fn from_iter<I: IntoIterator<Item = Injected>>(iter: I) -> Self {
        let mut set = Injections::new();
        for injected in iter {
            set.insert_injected(injected);
        }
        set
    }
}

impl Extend<Injected> for Injections {
    fn extend<I: IntoIterator<Item = Injected>>(&mut self, iter: I) {
        for injected in iter {
            self.insert_injected(injected);
        }
    }
}

/// Build an [`Injections`] set from a list of values.
///
/// ```rust,ignore
/// let injections = injections![ctx.clone(), session];
/// ```
#[macro_export]
macro_rules! injections {
    () => {
        $crate::Injections::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Injections::new()$(.with($value))+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Session(&'static str);

    #[test]
    fn test_get_by_type() {
        let set = Injections::new().with(Session("a")).with(5i64);
        assert_eq!(set.get::<Session>(), Some(&Session("a")));
        assert_eq!(set.get::<i64>(), Some(&5));
        assert!(set.get::<i32>().is_none());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_later_sets_win() {
        let defaults = Injections::new().with(Session("default")).with(1u8);
        let call = Injections::new().with(Session("call"));

        let merged = Injections::merge([&defaults, &call]);
        assert_eq!(merged.get::<Session>(), Some(&Session("call")));
        assert_eq!(merged.get::<u8>(), Some(&1));

        // Inputs are untouched.
        assert_eq!(defaults.get::<Session>(), Some(&Session("default")));
    }

    #[test]
    fn test_macro_builds_set() {
        let set = injections![Session("m"), 2u16];
        assert!(set.contains::<Session>());
        assert!(set.contains::<u16>());
        assert!(injections![].is_empty());
    }
}
