//! Name resolution
//!
//! Templates are strings containing `@name@` tokens. A [`NameResolver`]
//! substitutes each token with the value of the variable it names, looking
//! first at the provider registry and then at the variables declared in its
//! mapping document. Values may contain further tokens, so substitution is
//! repeated until none remain (bounded by [`MAX_PASSES`]). A token with no
//! value is replaced by its bare name.
//!
//! Member names additionally go through the rename table of the owning
//! type. The table is indexed by resolved owner name the first time a
//! member is resolved, and every rename hit is memoized per
//! (owner, logical name) for the resolver's lifetime. A provider whose
//! value changes later does not affect an already memoized rename.

mod binding;
pub mod template;
mod variables;

pub use template::MAX_PASSES;

use std::borrow::Cow;
use std::cell::RefCell;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use mirage_sdk::Scope;
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use self::binding::{SlotSource, VariableSlot};
use crate::cache::{CachedMethod, ClassData, FieldHandle, MemberDescriptor, TypeCache};
use crate::error::{MirageError, Result};
use crate::mapping::{MappingDocument, VariableDecl};
use crate::provider::Provider;
use crate::registry::ProviderRegistry;

/// Resolved owner → logical name → real name
type RenameIndex = FxHashMap<String, FxHashMap<String, String>>;

thread_local! {
    /// Descriptor variables being evaluated on this thread, keyed by resolver
    static EVALUATING: RefCell<Vec<(usize, String)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a descriptor variable as under evaluation until dropped
struct EvaluationGuard;

impl EvaluationGuard {
    /// `None` when `name` is already being evaluated by `owner` on this thread
    fn enter(owner: usize, name: &str) -> Option<Self> {
        EVALUATING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(start) = stack.iter().position(|(o, n)| *o == owner && n == name) {
                let cycle: Vec<&str> = stack[start..]
                    .iter()
                    .filter(|(o, _)| *o == owner)
                    .map(|(_, n)| n.as_str())
                    .chain(std::iter::once(name))
                    .collect();
                warn!(variable = name, cycle = %cycle.join(" -> "), "variable depends on itself");
                return None;
            }
            stack.push((owner, name.to_string()));
            Some(EvaluationGuard)
        })
    }
}

impl Drop for EvaluationGuard {
    fn drop(&mut self) {
        EVALUATING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Resolution strategy used by adapters
pub trait Resolver: Send + Sync {
    /// Substitute every token in `template`
    fn substitute(&self, template: &str) -> String;

    /// Real member name for `logical` on the type named by `owner`
    fn resolve_member(&self, owner: &str, logical: &str) -> String;

    /// Find the class a name template denotes
    fn resolve_class(&self, template: &str, scope: Option<&Scope>) -> Result<Arc<ClassData>>;

    /// Find the real method a logical method maps to on `target`
    fn resolve_method(
        &self,
        target: &ClassData,
        interface: &ClassData,
        logical: &str,
        params: &[String],
    ) -> Result<Arc<CachedMethod>>;

    /// Find a field by name template. Fields are never renamed.
    fn resolve_field(&self, class: &ClassData, template: &str) -> Option<FieldHandle>;

    /// Registered providers
    fn registry(&self) -> &ProviderRegistry;

    /// Shared type cache
    fn cache(&self) -> &TypeCache;

    /// Scope used when neither the caller nor the target names one
    fn default_scope(&self) -> &Scope {
        self.cache().default_scope()
    }
}

/// Mapping-document backed resolver
pub struct NameResolver {
    document: MappingDocument,
    registry: ProviderRegistry,
    slots: DashMap<String, Arc<VariableSlot>>,
    renames: OnceCell<RenameIndex>,
    rename_memo: DashMap<(String, String), String>,
    cache: TypeCache,
}

impl NameResolver {
    /// Create a resolver over a document, looking types up in `scope`
    pub fn new(document: MappingDocument, scope: Scope) -> Result<Self> {
        document.validate()?;
        debug!(
            variables = document.variables.len(),
            owners = document.replacements.len(),
            scope = scope.name(),
            "resolver created"
        );
        Ok(Self {
            document,
            registry: ProviderRegistry::new(),
            slots: DashMap::new(),
            renames: OnceCell::new(),
            rename_memo: DashMap::new(),
            cache: TypeCache::new(scope),
        })
    }

    /// Create a resolver with no variables or renames
    pub fn empty(scope: Scope) -> Self {
        Self {
            document: MappingDocument::new(),
            registry: ProviderRegistry::new(),
            slots: DashMap::new(),
            renames: OnceCell::new(),
            rename_memo: DashMap::new(),
            cache: TypeCache::new(scope),
        }
    }

    /// Parse a JSON document
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str, scope: Scope) -> Result<Self> {
        Self::new(MappingDocument::from_str(json)?, scope)
    }

    /// Read a JSON document
    pub fn from_reader(reader: impl Read, scope: Scope) -> Result<Self> {
        Self::new(MappingDocument::from_reader(reader)?, scope)
    }

    /// Read a JSON document from disk
    pub fn from_path(path: impl AsRef<Path>, scope: Scope) -> Result<Self> {
        Self::new(MappingDocument::from_path(path)?, scope)
    }

    /// The loaded document
    pub fn document(&self) -> &MappingDocument {
        &self.document
    }

    /// Register (or replace) a provider
    pub fn register_provider(
        &self,
        name: impl Into<String>,
        provider: impl Provider + 'static,
    ) -> Option<Arc<dyn Provider>> {
        self.registry.register_provider(name, provider)
    }

    /// Look up a registered provider
    pub fn get_registered_provider(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.registry.get_registered_provider(name)
    }

    /// Substitute every token in `template`
    pub fn resolve(&self, template: &str) -> String {
        self.substitute(template)
    }

    /// Current value of a variable, honoring its retention
    pub fn variable(&self, name: &str) -> Option<String> {
        let slot = self.slot(name)?;
        slot.value(|| match slot.source() {
            SlotSource::Registered(provider) => provider.get(),
            SlotSource::Declared(VariableDecl::Literal(value)) => Some(value.clone()),
            SlotSource::Declared(VariableDecl::Spec(spec)) => {
                let _guard = EvaluationGuard::enter(self as *const Self as usize, name)?;
                variables::evaluate(self, name, spec)
            }
        })
    }

    fn slot(&self, name: &str) -> Option<Arc<VariableSlot>> {
        if let Some(provider) = self.registry.get_registered_provider(name) {
            return Some(self.registered_slot(name, provider));
        }

        let decl = self.document.variables.get(name)?;
        let mut entry = self
            .slots
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(VariableSlot::declared(decl.clone())));
        if !entry.is_declared() {
            *entry = Arc::new(VariableSlot::declared(decl.clone()));
        }
        Some(entry.value().clone())
    }

    /// Slot for a registered provider, rebinding when the registration changed.
    ///
    /// `provider` may already be stale, so the registry is read again under
    /// the entry lock before a slot is replaced.
    fn registered_slot(&self, name: &str, provider: Arc<dyn Provider>) -> Arc<VariableSlot> {
        let mut entry = self
            .slots
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(VariableSlot::registered(provider.clone())));
        if !entry.is_bound_to(&provider) {
            let current = self.registry.get_registered_provider(name).unwrap_or(provider);
            if !entry.is_bound_to(&current) {
                debug!(variable = name, "provider rebound");
                *entry = Arc::new(VariableSlot::registered(current));
            }
        }
        entry.value().clone()
    }

    fn renames(&self) -> &RenameIndex {
        self.renames.get_or_init(|| {
            let mut index = RenameIndex::default();
            for (owner, entries) in &self.document.replacements {
                let resolved = self.substitute(owner);
                let table = index.entry(resolved).or_default();
                for entry in entries {
                    table.insert(entry.logical.clone(), entry.real.clone());
                }
            }
            debug!(owners = index.len(), "rename index built");
            index
        })
    }
}

impl Resolver for NameResolver {
    fn substitute(&self, template: &str) -> String {
        let mut current = Cow::Borrowed(template);
        let mut passes = 0;
        while template::has_tokens(&current) {
            if passes == MAX_PASSES {
                warn!(
                    template,
                    partial = %current,
                    pending = ?template::tokens(&current),
                    "variable substitution did not converge"
                );
                break;
            }
            current = Cow::Owned(template::substitute_once(&current, |name| self.variable(name)));
            passes += 1;
        }
        current.into_owned()
    }

    fn resolve_member(&self, owner: &str, logical: &str) -> String {
        let owner = self.substitute(owner);
        let key = (owner, logical.to_string());
        if let Some(hit) = self.rename_memo.get(&key) {
            return hit.value().clone();
        }

        let table = self.renames().get(&key.0);
        let mut current = Cow::Borrowed(logical);
        let mut passes = 0;
        loop {
            if let Some(real) = table.and_then(|t| t.get(&*current)) {
                debug!(owner = %key.0, logical, real = %real, "member renamed");
                let real = real.clone();
                self.rename_memo.insert(key, real.clone());
                return real;
            }
            if !template::has_tokens(&current) {
                return current.into_owned();
            }
            if passes == MAX_PASSES {
                warn!(owner = %key.0, logical, "member name substitution did not converge");
                return current.into_owned();
            }
            current = Cow::Owned(template::substitute_once(&current, |name| self.variable(name)));
            passes += 1;
        }
    }

    fn resolve_class(&self, template: &str, scope: Option<&Scope>) -> Result<Arc<ClassData>> {
        let resolved = self.substitute(template);
        let found = match scope {
            Some(scope) => self.cache.class_named_in(&resolved, scope),
            None => self.cache.class_named(&resolved),
        };
        found.ok_or_else(|| MirageError::TypeNotFound {
            template: template.to_string(),
            resolved,
        })
    }

    fn resolve_method(
        &self,
        target: &ClassData,
        interface: &ClassData,
        logical: &str,
        params: &[String],
    ) -> Result<Arc<CachedMethod>> {
        let real = self.resolve_member(target.name(), logical);
        let desc = MemberDescriptor::new(real.clone(), params.iter().cloned());
        debug!(target = target.name(), logical, member = %desc, "resolving method");
        target.method(&desc).ok_or_else(|| MirageError::MemberNotFound {
            logical: logical.to_string(),
            resolved: real,
            params: params.to_vec(),
            target: target.name().to_string(),
            interface: interface.name().to_string(),
        })
    }

    fn resolve_field(&self, class: &ClassData, template: &str) -> Option<FieldHandle> {
        class.field(&self.substitute(template))
    }

    fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    fn cache(&self) -> &TypeCache {
        &self.cache
    }
}

impl std::fmt::Debug for NameResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameResolver")
            .field("variables", &self.document.variables.len())
            .field("owners", &self.document.replacements.len())
            .field("registry", &self.registry)
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{ProviderKind, VariableSpec};
    use crate::provider::{cached, constant, lazy, Retention};
    use mirage_sdk::{ClassBuilder, MethodDef};
    use std::sync::atomic::{AtomicI64, Ordering};

    fn resolver(doc: MappingDocument) -> NameResolver {
        NameResolver::new(doc, Scope::new("test")).unwrap()
    }

    #[test]
    fn test_literal_substitution() {
        let r = resolver(MappingDocument::new().literal("v", "pkgA"));
        assert_eq!(r.resolve("@v@.Target"), "pkgA.Target");
        assert_eq!(r.resolve("plain"), "plain");
    }

    #[test]
    fn test_nested_variables() {
        let r = resolver(
            MappingDocument::new()
                .literal("root", "com")
                .literal("v", "@root@.pkgA"),
        );
        assert_eq!(r.resolve("@v@.Target"), "com.pkgA.Target");
    }

    #[test]
    fn test_registered_overrides_declared() {
        let r = resolver(MappingDocument::new().literal("v", "declared"));
        r.register_provider("v", constant("registered"));
        assert_eq!(r.resolve("@v@"), "registered");
    }

    #[test]
    fn test_unresolved_token_is_bare_name() {
        let r = resolver(MappingDocument::new());
        assert_eq!(r.resolve("@nobody@.Target"), "nobody.Target");
    }

    #[test]
    fn test_cycle_guard() {
        let r = resolver(
            MappingDocument::new()
                .literal("a", "@b@")
                .literal("b", "@a@"),
        );
        let out = r.resolve("@a@");
        assert!(template::has_tokens(&out));
    }

    #[test]
    fn test_self_referencing_descriptor() {
        let r = resolver(MappingDocument::new().variable(
            "x",
            VariableSpec::new(ProviderKind::Static).provider("@x@.Build").value("id"),
        ));
        assert_eq!(r.resolve("@x@"), "x");
        assert_eq!(r.resolve("pkg.@x@"), "pkg.x");
    }

    #[test]
    fn test_descriptor_cycle_between_variables() {
        let r = resolver(
            MappingDocument::new()
                .variable("a", VariableSpec::new(ProviderKind::Provider).provider("@b@.X"))
                .variable(
                    "b",
                    VariableSpec::new(ProviderKind::Static).provider("@a@.Y").value("id"),
                ),
        );
        assert_eq!(r.resolve("@a@-@b@"), "a-b");
        assert_eq!(r.variable("a"), None);
    }

    #[test]
    fn test_descriptor_cycle_still_finds_class() {
        let scope = Scope::new("test");
        scope.define(ClassBuilder::new("x.Build").method(
            MethodDef::new("id")
                .as_static()
                .returns("str")
                .body(|_, _| Ok("build7".into())),
        ));
        let doc = MappingDocument::new().variable(
            "x",
            VariableSpec::new(ProviderKind::Static).provider("@x@.Build").value("id"),
        );
        let r = NameResolver::new(doc, scope).unwrap();
        assert_eq!(r.resolve("@x@"), "build7");
    }

    #[test]
    fn test_cached_and_lazy_retention() {
        let n = Arc::new(AtomicI64::new(1));
        let r = resolver(MappingDocument::new());
        let src = n.clone();
        r.register_provider("c", cached(move || src.load(Ordering::SeqCst).to_string()));
        let src = n.clone();
        r.register_provider("l", lazy(move || src.load(Ordering::SeqCst).to_string()));

        assert_eq!(r.resolve("@c@-@l@"), "1-1");
        n.store(2, Ordering::SeqCst);
        assert_eq!(r.resolve("@c@-@l@"), "1-2");
    }

    #[test]
    fn test_reregistration_rebinds() {
        let r = resolver(MappingDocument::new());
        r.register_provider("v", constant("a"));
        assert_eq!(r.resolve("@v@"), "a");
        r.register_provider("v", constant("b"));
        assert_eq!(r.resolve("@v@"), "b");
    }

    #[test]
    fn test_stale_registration_keeps_current_slot() {
        let r = resolver(MappingDocument::new());
        let calls = Arc::new(AtomicI64::new(0));
        let counter = calls.clone();
        r.register_provider("v", constant("old"));
        let stale = r.get_registered_provider("v").unwrap();
        r.register_provider(
            "v",
            cached(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                "new"
            }),
        );
        assert_eq!(r.resolve("@v@"), "new");

        // A resolution that read the registry before the replacement
        let slot = r.registered_slot("v", stale);
        assert!(slot.is_bound_to(&r.get_registered_provider("v").unwrap()));
        assert_eq!(r.resolve("@v@"), "new");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registered_kind_variable() {
        let r = resolver(MappingDocument::new().variable(
            "x",
            VariableSpec::new(ProviderKind::Registered)
                .value("source")
                .retention(Retention::Lazy),
        ));
        assert_eq!(r.resolve("@x@"), "x");
        r.register_provider("source", constant("found"));
        assert_eq!(r.resolve("@x@"), "found");
    }

    #[test]
    fn test_rename_table() {
        let r = resolver(
            MappingDocument::new()
                .literal("v", "pkgA")
                .rename("@v@.Target", "run", "a")
                .rename("@v@.Target", "stop@n@", "b"),
        );
        r.register_provider("n", constant("2"));
        assert_eq!(r.resolve_member("@v@.Target", "run"), "a");
        assert_eq!(r.resolve_member("pkgA.Target", "run"), "a");
        assert_eq!(r.resolve_member("pkgA.Target", "stop@n@"), "b");
        assert_eq!(r.resolve_member("pkgA.Other", "run"), "run");
    }

    #[test]
    fn test_rename_after_substitution() {
        let r = resolver(
            MappingDocument::new()
                .literal("i", "1")
                .rename("pkgA.Target", "method1", "m"),
        );
        assert_eq!(r.resolve_member("pkgA.Target", "method@i@"), "m");
    }

    #[test]
    fn test_resolve_class_miss() {
        let r = resolver(MappingDocument::new().literal("v", "pkgA"));
        match r.resolve_class("@v@.Missing", None).unwrap_err() {
            MirageError::TypeNotFound { template, resolved } => {
                assert_eq!(template, "@v@.Missing");
                assert_eq!(resolved, "pkgA.Missing");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_document_rejected() {
        let doc = MappingDocument::new().variable("s", VariableSpec::new(ProviderKind::Static));
        assert!(matches!(
            NameResolver::new(doc, Scope::new("t")),
            Err(MirageError::MalformedProvider { .. })
        ));
    }
}
