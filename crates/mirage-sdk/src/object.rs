//! Object instances
//!
//! An [`Object`] is an instance of a [`Class`]. Instance fields of the class
//! and all of its ancestors are allocated when the object is created, seeded
//! with each field's initial value. Field storage is guarded by a
//! `parking_lot::RwLock`, so objects can be shared across threads freely.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::class::Class;
use crate::value::Value;

/// Shared handle to an object
pub type Instance = Arc<Object>;

/// An instance of a class
pub struct Object {
    class: Arc<Class>,
    fields: RwLock<FxHashMap<String, Value>>,
}

impl Object {
    /// Allocate an instance with default field values (no initializer runs)
    pub fn alloc(class: Arc<Class>) -> Instance {
        let mut fields = FxHashMap::default();
        // Walk root-first so a subclass field shadows an inherited one
        let chain: Vec<&Arc<Class>> = class.ancestors().collect();
        for cls in chain.into_iter().rev() {
            for field in cls.fields().iter().filter(|f| !f.is_static) {
                fields.insert(field.name.clone(), field.initial.clone());
            }
        }
        Arc::new(Object {
            class,
            fields: RwLock::new(fields),
        })
    }

    /// The runtime class of this object
    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    /// Read a field
    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    /// Write a field, returning the previous value.
    ///
    /// Writing a name the class does not declare is allowed; the object
    /// model does not validate field shapes.
    pub fn set(&self, name: &str, value: Value) -> Option<Value> {
        self.fields.write().insert(name.to_string(), value)
    }

    /// Check whether the object has storage for a field
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.read().contains_key(name)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.class.name())
            .field("fields", &self.fields.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{ClassBuilder, FieldDef};

    #[test]
    fn test_alloc_seeds_inherited_fields() {
        let base = ClassBuilder::new("demo.Base")
            .field(FieldDef::new("a", "int").initial(1))
            .field(FieldDef::new("shared", "int").initial(10))
            .build();
        let derived = ClassBuilder::new("demo.Derived")
            .extends(&base)
            .field(FieldDef::new("b", "int").initial(2))
            .field(FieldDef::new("shared", "int").initial(20))
            .build();

        let obj = Object::alloc(derived);
        assert_eq!(obj.get("a"), Some(Value::Int(1)));
        assert_eq!(obj.get("b"), Some(Value::Int(2)));
        assert_eq!(obj.get("shared"), Some(Value::Int(20)));
    }

    #[test]
    fn test_static_fields_not_allocated_on_instance() {
        let class = ClassBuilder::new("demo.Counter")
            .field(FieldDef::new("count", "int").as_static())
            .build();
        let obj = Object::alloc(class);
        assert!(!obj.has_field("count"));
    }

    #[test]
    fn test_set_returns_previous() {
        let class = ClassBuilder::new("demo.Cell")
            .field(FieldDef::new("v", "int").initial(1))
            .build();
        let obj = Object::alloc(class);
        assert_eq!(obj.set("v", Value::Int(5)), Some(Value::Int(1)));
        assert_eq!(obj.get("v"), Some(Value::Int(5)));
    }
}
