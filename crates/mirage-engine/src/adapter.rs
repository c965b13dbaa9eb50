//! Dynamic interface adapters
//!
//! An [`Adapter`] binds a logical interface to a target value. The interface
//! names the concrete type it adapts with an `Adapts` marker; that type is
//! resolved once, when the adapter is created. Each logical call then:
//!
//! 1. runs default methods (a body and no markers) locally, with the
//!    adapter as receiver
//! 2. replaces adapter arguments with the targets they wrap
//! 3. serves `Field`-marked methods as field getters or setters
//! 4. otherwise resolves the real method (through the `Rename` marker or
//!    the method's own name) with interface parameter types replaced by
//!    their adapted types, and invokes it
//! 5. wraps results whose declared type is an adapting interface
//!
//! Exceptions raised by the target come back as [`MirageError::Thrown`]
//! exactly as raised.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use mirage_sdk::{types, InvokeResult, Marker, MarkerKind, MethodDef, ProxyObject, Scope, Value};
use tracing::debug;

use crate::cache::{CachedMethod, ClassData, MemberDescriptor};
use crate::error::{MirageError, Result};
use crate::facade::Facade;
use crate::resolver::Resolver;

/// A live binding of a logical interface to a target
#[derive(Clone)]
pub struct Adapter(Arc<Binding>);

struct Binding {
    resolver: Arc<dyn Resolver>,
    interface: Arc<ClassData>,
    adapted: Arc<ClassData>,
    target: Value,
    scope: Scope,
    me: Weak<Binding>,
}

impl Adapter {
    /// Bind `interface` to `target`.
    ///
    /// The adapted type is looked up in `scope` if given, else in the scope
    /// that defined the target's class, else in the resolver's default scope.
    pub fn bind(
        resolver: Arc<dyn Resolver>,
        interface: Arc<ClassData>,
        target: Value,
        scope: Option<&Scope>,
    ) -> Result<Self> {
        let template = adapts_template(&interface)?;
        let target = target.unwrap_proxy();
        let scope = match scope {
            Some(scope) => scope.clone(),
            None => target
                .as_object()
                .and_then(|obj| obj.class().scope())
                .unwrap_or_else(|| resolver.default_scope().clone()),
        };
        let adapted = resolver.resolve_class(&template, Some(&scope))?;
        debug!(
            interface = interface.name(),
            adapted = adapted.name(),
            scope = scope.name(),
            "adapter created"
        );
        let binding = Arc::new_cyclic(|me| Binding {
            resolver,
            interface,
            adapted,
            target,
            scope,
            me: me.clone(),
        });
        Ok(Adapter(binding))
    }

    /// Call a logical method by name, choosing the overload by argument count
    /// and, when several remain, by argument types
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.0.call(name, args)
    }

    /// Call the logical method with exactly this signature
    pub fn invoke(&self, desc: &MemberDescriptor, args: &[Value]) -> Result<Value> {
        self.0.invoke(desc, args)
    }

    /// The wrapped target (`Null` for static-only bindings)
    pub fn target(&self) -> &Value {
        &self.0.target
    }

    /// The logical interface
    pub fn interface(&self) -> &Arc<ClassData> {
        &self.0.interface
    }

    /// The adapted concrete type
    pub fn adapted_class(&self) -> &Arc<ClassData> {
        &self.0.adapted
    }

    /// Scope the adapted type was resolved in
    pub fn scope(&self) -> &Scope {
        &self.0.scope
    }

    /// This adapter as a value
    pub fn into_value(self) -> Value {
        Value::Proxy(self.0)
    }

    /// Recover an adapter carried in a value
    pub fn from_value(value: &Value) -> Option<Adapter> {
        let proxy = value.as_proxy()?.clone();
        proxy.into_any().downcast::<Binding>().ok().map(Adapter)
    }

    /// Recover a typed facade from a value returned by a call
    pub fn value_as<F: Facade>(value: &Value) -> Option<F> {
        let adapter = Adapter::from_value(value)?;
        (adapter.interface().name() == F::INTERFACE).then(|| F::from_adapter(adapter))
    }

    /// Check whether both adapters share one binding
    pub fn ptr_eq(a: &Adapter, b: &Adapter) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl From<Adapter> for Value {
    fn from(adapter: Adapter) -> Self {
        adapter.into_value()
    }
}

impl Binding {
    fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let method = self.select(name, args)?;
        self.dispatch(&method, args)
    }

    fn invoke(&self, desc: &MemberDescriptor, args: &[Value]) -> Result<Value> {
        let method = self
            .interface
            .method(desc)
            .filter(|m| !m.def().is_static)
            .ok_or_else(|| self.unknown(&desc.name, desc.arity()))?;
        self.dispatch(&method, args)
    }

    fn select(&self, name: &str, args: &[Value]) -> Result<Arc<CachedMethod>> {
        let candidates: Vec<&MethodDef> = self
            .interface
            .class()
            .ancestors()
            .flat_map(|cls| cls.methods())
            .filter(|m| m.name == name && m.params.len() == args.len() && !m.is_static)
            .collect();
        let chosen = match candidates.as_slice() {
            [] => return Err(self.unknown(name, args.len())),
            [only] => *only,
            many => many
                .iter()
                .copied()
                .find(|m| args.iter().zip(&m.params).all(|(a, ty)| a.conforms_to(ty)))
                .ok_or_else(|| MirageError::NoMatchingOverload {
                    interface: self.interface.name().to_string(),
                    name: name.to_string(),
                    args: args.iter().map(|a| a.type_name().to_string()).collect(),
                })?,
        };
        self.interface
            .method(&MemberDescriptor::new(name, chosen.params.iter().cloned()))
            .ok_or_else(|| self.unknown(name, args.len()))
    }

    fn dispatch(&self, method: &CachedMethod, args: &[Value]) -> Result<Value> {
        let def = method.def();
        let field = method.marker(MarkerKind::Field);
        let rename = method.marker(MarkerKind::Rename);

        if def.has_body() && field.is_none() && rename.is_none() {
            let receiver = self.as_value();
            return Ok(method.invoke(&receiver, args)?);
        }

        let unwrapped: Vec<Value> = args.iter().map(Value::unwrap_proxy).collect();

        if let Some(marker) = field {
            return self.access_field(def, marker, args, &unwrapped);
        }

        let params = adapt_param_types(self.resolver.as_ref(), &def.params, &self.scope)?;
        let logical = rename.and_then(Marker::template).unwrap_or(def.name.as_str());
        let real = self
            .resolver
            .resolve_method(&self.adapted, &self.interface, logical, &params)?;
        let result = real.invoke(&self.target, &unwrapped)?;
        self.wrap_result(&def.return_type, result)
    }

    fn access_field(
        &self,
        def: &MethodDef,
        marker: &Marker,
        args: &[Value],
        unwrapped: &[Value],
    ) -> Result<Value> {
        let handle = match marker.template() {
            Some(template) => self.resolver.resolve_field(&self.adapted, template),
            None => self.adapted.field(&def.name),
        };
        let Some(handle) = handle else {
            let resolved = match marker.template() {
                Some(template) => self.resolver.substitute(template),
                None => def.name.clone(),
            };
            return Err(MirageError::FieldNotFound {
                logical: def.name.clone(),
                resolved,
                target: self.adapted.name().to_string(),
                interface: self.interface.name().to_string(),
            });
        };
        match unwrapped {
            [] => {
                let value = handle.get(&self.target)?;
                self.wrap_result(&def.return_type, value)
            }
            [value] => {
                handle.set(&self.target, value.clone())?;
                Ok(args[0].clone())
            }
            _ => Err(mirage_sdk::Exception::illegal_argument(format!(
                "field accessor {} takes at most one argument, got {}",
                def.name,
                unwrapped.len()
            ))
            .into()),
        }
    }

    fn wrap_result(&self, return_type: &str, value: Value) -> Result<Value> {
        if value.is_null() || types::is_builtin(return_type) {
            return Ok(value);
        }
        let Some(interface) = lookup_type(self.resolver.as_ref(), return_type, &self.scope) else {
            return Ok(value);
        };
        if !interface.class().is_interface() || interface.marker(MarkerKind::Adapts).is_none() {
            return Ok(value);
        }
        if let Value::Proxy(proxy) = &value {
            if proxy.interface_name() == interface.name() {
                return Ok(value);
            }
        }
        let adapter = Adapter::bind(self.resolver.clone(), interface, value, None)?;
        Ok(adapter.into_value())
    }

    fn as_value(&self) -> Value {
        match self.me.upgrade() {
            Some(me) => Value::Proxy(me),
            None => self.target.clone(),
        }
    }

    fn unknown(&self, name: &str, arity: usize) -> MirageError {
        MirageError::UnknownLogicalMember {
            interface: self.interface.name().to_string(),
            name: name.to_string(),
            arity,
        }
    }
}

impl ProxyObject for Binding {
    fn target(&self) -> &Value {
        &self.target
    }

    fn interface_name(&self) -> &str {
        self.interface.name()
    }

    fn call(&self, name: &str, args: &[Value]) -> InvokeResult<Value> {
        Binding::call(self, name, args).map_err(MirageError::into_exception)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("interface", &self.interface.name())
            .field("adapted", &self.adapted.name())
            .field("target", &self.target)
            .field("scope", &self.scope.name())
            .finish()
    }
}

/// The `Adapts` template of an interface
pub(crate) fn adapts_template(interface: &ClassData) -> Result<String> {
    if !interface.class().is_interface() {
        return Err(MirageError::NotAnInterface {
            name: interface.name().to_string(),
        });
    }
    interface
        .marker(MarkerKind::Adapts)
        .and_then(|m| m.template().map(str::to_string))
        .ok_or_else(|| MirageError::MissingAdapts {
            interface: interface.name().to_string(),
        })
}

/// Replace each adapting interface type with the type it adapts
pub(crate) fn adapt_param_types(
    resolver: &dyn Resolver,
    params: &[String],
    scope: &Scope,
) -> Result<Vec<String>> {
    params
        .iter()
        .map(|ty| {
            if types::is_builtin(ty) {
                return Ok(ty.clone());
            }
            let Some(class) = lookup_type(resolver, ty, scope) else {
                return Ok(ty.clone());
            };
            if !class.class().is_interface() {
                return Ok(ty.clone());
            }
            match class.marker(MarkerKind::Adapts) {
                Some(Marker::Adapts(template)) => {
                    Ok(resolver.resolve_class(&template, Some(scope))?.name().to_string())
                }
                _ => Ok(ty.clone()),
            }
        })
        .collect()
}

fn lookup_type(resolver: &dyn Resolver, name: &str, scope: &Scope) -> Option<Arc<ClassData>> {
    resolver
        .cache()
        .class_named_in(name, scope)
        .or_else(|| resolver.cache().class_named(name))
}
