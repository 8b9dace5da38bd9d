use crate::{
    error::RegistryError,
    types::{Decode, Type, TypeMismatch, Typed, Value},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::{debug, warn};

/// The shape of a structured type: its stable name and its ordered fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TypeDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: Type,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A Rust type that can travel as a structured argument once registered.
///
/// Usually implemented through [`structured!`](crate::structured).
pub trait Structured: Sized {
    const TYPE_NAME: &'static str;

    fn descriptor() -> TypeDescriptor;
    fn into_fields(self) -> Vec<Value>;
    fn from_fields(fields: Vec<Value>) -> Result<Self, TypeMismatch>;
}

/// Pulls the next positional field out of a [`StructValue`](crate::StructValue)'s
/// fields for [`Structured::from_fields`].
#[doc(hidden)]
pub fn next_field<T, I>(fields: &mut I) -> Result<T, TypeMismatch>
where
    T: Decode + Typed,
    I: Iterator<Item = Value>,
{
    match fields.next() {
        Some(value) => T::decode(value),
        None => Err(TypeMismatch::missing(T::rpc_type())),
    }
}

/// An immutable view of the registered types.
pub type Snapshot = Arc<BTreeMap<String, Arc<TypeDescriptor>>>;

/// Table of structured types known to the codec.
///
/// Registrations replace the whole table with an updated copy, so readers
/// only hold the lock long enough to clone a [`Snapshot`]. Intended use is to
/// register everything at startup and share the registry read-only after.
#[derive(Debug, Default)]
pub struct Registry {
    table: RwLock<Snapshot>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor. Registering an identical descriptor again is a
    /// no-op; a different shape under a taken name is rejected.
    pub fn register(&self, descriptor: TypeDescriptor) -> Result<(), RegistryError> {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = table.get(&descriptor.name) {
            if **existing == descriptor {
                return Ok(());
            }
            warn!(name = %descriptor.name, "conflicting type registration");
            return Err(RegistryError::Conflict(descriptor.name));
        }

        debug!(name = %descriptor.name, fields = descriptor.fields.len(), "registered type");
        let mut updated = (**table).clone();
        updated.insert(descriptor.name.clone(), Arc::new(descriptor));
        *table = Arc::new(updated);
        Ok(())
    }

    pub fn register_type<T: Structured>(&self) -> Result<(), RegistryError> {
        self.register(T::descriptor())
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.snapshot().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.snapshot().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> Vec<String> {
        self.snapshot().keys().cloned().collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn point() -> TypeDescriptor {
        TypeDescriptor::new(
            "Point",
            vec![
                FieldDescriptor::new("x", Type::Int),
                FieldDescriptor::new("y", Type::Int),
            ],
        )
    }

    #[test]
    fn register_is_idempotent() {
        let registry = Registry::new();
        registry.register(point()).unwrap();
        registry.register(point()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("Point").unwrap().fields[1].name, "y");
    }

    #[test]
    fn conflicting_shape_is_rejected() {
        let registry = Registry::new();
        registry.register(point()).unwrap();
        let other = TypeDescriptor::new("Point", vec![FieldDescriptor::new("x", Type::Float)]);
        assert_eq!(
            registry.register(other),
            Err(RegistryError::Conflict("Point".into()))
        );
        assert_eq!(*registry.lookup("Point").unwrap(), point());
    }

    #[test]
    fn snapshot_is_unaffected_by_later_registration() {
        let registry = Registry::new();
        let before = registry.snapshot();
        registry.register(point()).unwrap();
        assert!(before.is_empty());
        assert!(registry.contains("Point"));
        assert_eq!(registry.names(), vec!["Point".to_owned()]);
    }

    #[test]
    fn concurrent_readers_and_writer() {
        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    let name = format!("T{i}");
                    registry
                        .register(TypeDescriptor::new(name.clone(), vec![]))
                        .unwrap();
                    for _ in 0..100 {
                        assert!(registry.contains(&name));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 4);
    }
}
