//! Loading scopes
//!
//! A [`Scope`] is a namespace of classes, the place a type name is looked up
//! in. Scopes may delegate to a parent; lookups consult the scope's own
//! classes first so that a child scope can carry a different version of a
//! class than its parent.
//!
//! Scopes are cheap to clone (shared handle) and safe to define into from
//! several threads at once.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::class::{Class, ClassBuilder};

/// Unique scope identity
pub type ScopeId = u64;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

struct ScopeInner {
    id: ScopeId,
    name: String,
    parent: Option<Scope>,
    classes: DashMap<String, Arc<Class>>,
}

/// A class namespace
#[derive(Clone)]
pub struct Scope(Arc<ScopeInner>);

/// Non-owning scope handle, held by the classes a scope defines
#[derive(Clone)]
pub struct WeakScope(Weak<ScopeInner>);

impl WeakScope {
    /// Upgrade to a live scope
    pub fn upgrade(&self) -> Option<Scope> {
        self.0.upgrade().map(Scope)
    }
}

impl Scope {
    /// Create a root scope
    pub fn new(name: impl Into<String>) -> Self {
        Self::build(name.into(), None)
    }

    /// Create a scope that delegates to `parent` for names it lacks
    pub fn with_parent(name: impl Into<String>, parent: &Scope) -> Self {
        Self::build(name.into(), Some(parent.clone()))
    }

    fn build(name: String, parent: Option<Scope>) -> Self {
        Scope(Arc::new(ScopeInner {
            id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
            name,
            parent,
            classes: DashMap::new(),
        }))
    }

    /// Unique identity
    pub fn id(&self) -> ScopeId {
        self.0.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Parent scope
    pub fn parent(&self) -> Option<&Scope> {
        self.0.parent.as_ref()
    }

    /// Build a class and register it in this scope.
    ///
    /// A class with the same name replaces the previous definition for
    /// future lookups; classes already handed out stay valid.
    pub fn define(&self, builder: ClassBuilder) -> Arc<Class> {
        let class = builder.build_in(Some(self.downgrade()));
        self.0
            .classes
            .insert(class.name().to_string(), class.clone());
        class
    }

    /// Find a class by name, delegating to the parent chain
    pub fn find(&self, name: &str) -> Option<Arc<Class>> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(class) = scope.0.classes.get(name) {
                return Some(class.value().clone());
            }
            current = scope.parent();
        }
        None
    }

    /// Check whether this scope (or an ancestor) defines `name`
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Names defined directly in this scope
    pub fn class_names(&self) -> Vec<String> {
        self.0.classes.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of classes defined directly in this scope
    pub fn len(&self) -> usize {
        self.0.classes.len()
    }

    /// Check whether the scope defines no classes directly
    pub fn is_empty(&self) -> bool {
        self.0.classes.is_empty()
    }

    /// Non-owning handle
    pub fn downgrade(&self) -> WeakScope {
        WeakScope(Arc::downgrade(&self.0))
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Scope {}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("classes", &self.0.classes.len())
            .finish()
    }
}

impl fmt::Debug for WeakScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakScope")
    }
}
