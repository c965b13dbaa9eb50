//! Registry of programmatically registered providers
//!
//! Providers registered here take precedence over the variables declared
//! in a mapping document. The registry is shared by reference with the
//! resolver that owns it and may be written while resolutions run; a
//! registration is only guaranteed to be seen by resolutions that start
//! after it returns.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::provider::Provider;

/// Name → provider map
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<FxHashMap<String, Arc<dyn Provider>>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the provider for `name`, returning the previous one
    pub fn register_provider(
        &self,
        name: impl Into<String>,
        provider: impl Provider + 'static,
    ) -> Option<Arc<dyn Provider>> {
        self.register_shared(name, Arc::new(provider))
    }

    /// Register an already shared provider
    pub fn register_shared(
        &self,
        name: impl Into<String>,
        provider: Arc<dyn Provider>,
    ) -> Option<Arc<dyn Provider>> {
        self.providers.write().insert(name.into(), provider)
    }

    /// Look up a registered provider
    pub fn get_registered_provider(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.read().get(name).cloned()
    }

    /// Remove a provider
    pub fn unregister_provider(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.write().remove(name)
    }

    /// Check if a provider is registered
    pub fn contains(&self, name: &str) -> bool {
        self.providers.read().contains_key(name)
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let providers = self.providers.read();
        let mut names: Vec<&String> = providers.keys().collect();
        names.sort();
        f.debug_struct("ProviderRegistry")
            .field("providers", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{constant, lazy};

    #[test]
    fn test_register_and_get() {
        let registry = ProviderRegistry::new();
        assert!(registry.is_empty());

        registry.register_provider("v", constant("pkgA"));
        assert!(registry.contains("v"));
        assert_eq!(registry.len(), 1);

        let p = registry.get_registered_provider("v").unwrap();
        assert_eq!(p.get().as_deref(), Some("pkgA"));
        assert!(registry.get_registered_provider("missing").is_none());
    }

    #[test]
    fn test_replace_returns_previous() {
        let registry = ProviderRegistry::new();
        assert!(registry.register_provider("v", constant("a")).is_none());
        let previous = registry.register_provider("v", lazy(|| "b")).unwrap();
        assert_eq!(previous.get().as_deref(), Some("a"));
        assert_eq!(
            registry.get_registered_provider("v").unwrap().get().as_deref(),
            Some("b")
        );
    }

    #[test]
    fn test_unregister() {
        let registry = ProviderRegistry::new();
        registry.register_provider("v", constant("a"));
        assert!(registry.unregister_provider("v").is_some());
        assert!(!registry.contains("v"));
        assert!(registry.unregister_provider("v").is_none());
    }
}
