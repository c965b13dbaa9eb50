//! Entry points
//!
//! [`Mirage`] wraps targets in adapters and constructs new adapted
//! instances. [`Facade`] lets hand-written typed wrappers sit on top of an
//! [`Adapter`]:
//!
//! ```ignore
//! struct Target(Adapter);
//!
//! impl Facade for Target {
//!     const INTERFACE: &'static str = "app.Target";
//!     fn from_adapter(adapter: Adapter) -> Self { Target(adapter) }
//! }
//!
//! impl Target {
//!     fn run(&self, n: i64) -> mirage_engine::Result<i64> {
//!         let v = self.0.call("run", &[n.into()])?;
//!         Ok(i64::from_value(v)?)
//!     }
//! }
//! ```

use std::sync::Arc;

use mirage_sdk::{Scope, Value};
use tracing::debug;

use crate::adapter::{adapt_param_types, adapts_template, Adapter};
use crate::error::{MirageError, Result};
use crate::resolver::Resolver;

/// A typed wrapper over an adapter for a known interface
pub trait Facade: Sized {
    /// Name of the logical interface
    const INTERFACE: &'static str;

    /// Wrap an adapter bound to [`Self::INTERFACE`]
    fn from_adapter(adapter: Adapter) -> Self;
}

/// Adapter factory over a shared resolver
#[derive(Clone)]
pub struct Mirage {
    resolver: Arc<dyn Resolver>,
}

impl Mirage {
    /// Create a factory owning `resolver`
    pub fn new(resolver: impl Resolver + 'static) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    /// Create a factory over an already shared resolver
    pub fn from_shared(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }

    /// The resolver adapters are created with
    pub fn resolver(&self) -> &Arc<dyn Resolver> {
        &self.resolver
    }

    /// Wrap `target` in an adapter for `interface`
    pub fn wrap(&self, interface: &str, target: impl Into<Value>) -> Result<Adapter> {
        self.wrap_scoped(None, interface, target.into())
    }

    /// Wrap `target`, resolving the adapted type in `scope`
    pub fn wrap_in(
        &self,
        scope: &Scope,
        interface: &str,
        target: impl Into<Value>,
    ) -> Result<Adapter> {
        self.wrap_scoped(Some(scope), interface, target.into())
    }

    /// Wrap `target` in a typed facade
    pub fn wrap_as<F: Facade>(&self, target: impl Into<Value>) -> Result<F> {
        self.wrap(F::INTERFACE, target).map(F::from_adapter)
    }

    /// Construct a new instance of the type `interface` adapts and wrap it
    pub fn new_instance(
        &self,
        interface: &str,
        param_types: &[&str],
        args: &[Value],
    ) -> Result<Adapter> {
        self.construct(None, interface, param_types, args)
    }

    /// Like [`Mirage::new_instance`], resolving types in `scope`
    pub fn new_instance_in(
        &self,
        scope: &Scope,
        interface: &str,
        param_types: &[&str],
        args: &[Value],
    ) -> Result<Adapter> {
        self.construct(Some(scope), interface, param_types, args)
    }

    /// Construct a new instance and wrap it in a typed facade
    pub fn new_instance_as<F: Facade>(&self, param_types: &[&str], args: &[Value]) -> Result<F> {
        self.new_instance(F::INTERFACE, param_types, args)
            .map(F::from_adapter)
    }

    fn wrap_scoped(&self, scope: Option<&Scope>, interface: &str, target: Value) -> Result<Adapter> {
        let iface = self.resolver.resolve_class(interface, scope)?;
        Adapter::bind(self.resolver.clone(), iface, target, scope)
    }

    fn construct(
        &self,
        scope: Option<&Scope>,
        interface: &str,
        param_types: &[&str],
        args: &[Value],
    ) -> Result<Adapter> {
        let iface = self.resolver.resolve_class(interface, scope)?;
        let template = adapts_template(&iface)?;
        let scope = scope.unwrap_or_else(|| self.resolver.default_scope()).clone();
        let adapted = self.resolver.resolve_class(&template, Some(&scope))?;

        let declared: Vec<String> = param_types.iter().map(|t| t.to_string()).collect();
        let params = adapt_param_types(self.resolver.as_ref(), &declared, &scope)?;
        let ctor = adapted
            .constructor(&params)
            .ok_or_else(|| MirageError::ConstructorNotFound {
                target: adapted.name().to_string(),
                params: params.clone(),
                interface: iface.name().to_string(),
            })?;

        let unwrapped: Vec<Value> = args.iter().map(Value::unwrap_proxy).collect();
        let instance = ctor.new_instance(&unwrapped)?;
        debug!(interface = iface.name(), adapted = adapted.name(), "instance constructed");
        Adapter::bind(self.resolver.clone(), iface, Value::Object(instance), Some(&scope))
    }
}

impl std::fmt::Debug for Mirage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mirage")
            .field("default_scope", &self.resolver.default_scope().name())
            .finish()
    }
}
