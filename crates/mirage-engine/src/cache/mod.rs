//! Type cache
//!
//! Maps classes to their [`ClassData`] and type names to classes. There is
//! exactly one `ClassData` per class per cache, so every adapter created from
//! the same resolver shares member lookups.
//!
//! Entries are never evicted; the cache lives as long as its resolver.
//! Name lookups that find nothing are not cached, so a class defined into a
//! scope after a failed lookup is found by the next one.

mod class_data;
mod member;

pub use class_data::{CachedMethod, ClassData, ConstructorHandle, FieldHandle};
pub use member::{MemberDescriptor, CONSTRUCTOR_NAME};

use std::sync::Arc;

use dashmap::DashMap;
use mirage_sdk::{Class, ClassId, Scope, ScopeId};
use tracing::trace;

/// Shared class and type-name cache
pub struct TypeCache {
    default_scope: Scope,
    classes: DashMap<ClassId, Arc<ClassData>>,
    by_name: DashMap<String, Arc<ClassData>>,
    by_scoped_name: DashMap<(String, ScopeId), Arc<ClassData>>,
}

impl TypeCache {
    /// Create a cache whose unscoped lookups go to `default_scope`
    pub fn new(default_scope: Scope) -> Self {
        Self {
            default_scope,
            classes: DashMap::new(),
            by_name: DashMap::new(),
            by_scoped_name: DashMap::new(),
        }
    }

    /// Scope used when no scope is given
    pub fn default_scope(&self) -> &Scope {
        &self.default_scope
    }

    /// The cache entry for a class, created on first use
    pub fn of(&self, class: &Arc<Class>) -> Arc<ClassData> {
        if let Some(hit) = self.classes.get(&class.id()) {
            return hit.value().clone();
        }
        self.classes
            .entry(class.id())
            .or_insert_with(|| {
                trace!(class = class.name(), "class cache entry created");
                Arc::new(ClassData::new(class.clone()))
            })
            .value()
            .clone()
    }

    /// Find a class by name in the default scope
    pub fn class_named(&self, name: &str) -> Option<Arc<ClassData>> {
        if let Some(hit) = self.by_name.get(name) {
            return Some(hit.value().clone());
        }
        let class = self.default_scope.find(name)?;
        trace!(name, scope = self.default_scope.name(), "type resolved");
        let data = self.of(&class);
        Some(
            self.by_name
                .entry(name.to_string())
                .or_insert(data)
                .value()
                .clone(),
        )
    }

    /// Find a class by name in a specific scope
    pub fn class_named_in(&self, name: &str, scope: &Scope) -> Option<Arc<ClassData>> {
        if *scope == self.default_scope {
            return self.class_named(name);
        }
        let key = (name.to_string(), scope.id());
        if let Some(hit) = self.by_scoped_name.get(&key) {
            return Some(hit.value().clone());
        }
        let class = scope.find(name)?;
        trace!(name, scope = scope.name(), "type resolved");
        let data = self.of(&class);
        Some(self.by_scoped_name.entry(key).or_insert(data).value().clone())
    }

    /// Number of classes with a cache entry
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check whether no class has been cached yet
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl std::fmt::Debug for TypeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeCache")
            .field("default_scope", &self.default_scope.name())
            .field("classes", &self.classes.len())
            .field("names", &self.by_name.len())
            .field("scoped_names", &self.by_scoped_name.len())
            .finish()
    }
}
