//! Best-effort evaluation of declared variables
//!
//! Every failure here is logged and reported as "no value"; the caller
//! leaves the token unresolved.

use mirage_sdk::Value;
use tracing::warn;

use super::Resolver;
use crate::cache::MemberDescriptor;
use crate::mapping::{ProviderKind, VariableSpec};

/// Method called on instances of `provider`-kind classes
const PROVIDER_METHOD: &str = "get";

pub(crate) fn evaluate<R: Resolver + ?Sized>(
    resolver: &R,
    variable: &str,
    spec: &VariableSpec,
) -> Option<String> {
    match spec.kind {
        ProviderKind::Value => spec.value.clone(),
        ProviderKind::Registered => registered(resolver, variable, spec),
        ProviderKind::Static => static_call(resolver, variable, spec),
        ProviderKind::Provider => provider_instance(resolver, variable, spec),
    }
}

fn registered<R: Resolver + ?Sized>(
    resolver: &R,
    variable: &str,
    spec: &VariableSpec,
) -> Option<String> {
    let name = spec.value.as_deref()?;
    match resolver.registry().get_registered_provider(name) {
        Some(provider) => provider.get(),
        None => {
            warn!(variable, provider = name, "registered provider not found");
            None
        }
    }
}

fn static_call<R: Resolver + ?Sized>(
    resolver: &R,
    variable: &str,
    spec: &VariableSpec,
) -> Option<String> {
    let class_template = spec.provider.as_deref()?;
    let method_name = spec.value.as_deref()?;
    let class = match resolver.resolve_class(class_template, None) {
        Ok(class) => class,
        Err(e) => {
            warn!(variable, error = %e, "static provider class not found");
            return None;
        }
    };
    let desc = MemberDescriptor::new(method_name, spec.params.iter().cloned());
    let method = match class.method(&desc) {
        Some(m) if m.def().is_static => m,
        _ => {
            warn!(variable, class = class.name(), member = %desc, "static provider method not found");
            return None;
        }
    };
    match method.invoke(&Value::Null, &[]) {
        Ok(value) => string_result(variable, value),
        Err(e) => {
            warn!(variable, error = %e, "static provider failed");
            None
        }
    }
}

fn provider_instance<R: Resolver + ?Sized>(
    resolver: &R,
    variable: &str,
    spec: &VariableSpec,
) -> Option<String> {
    let class_template = spec.provider.as_deref()?;
    let class = match resolver.resolve_class(class_template, None) {
        Ok(class) => class,
        Err(e) => {
            warn!(variable, error = %e, "provider class not found");
            return None;
        }
    };
    let Some(ctor) = class.constructor(&[]) else {
        warn!(variable, class = class.name(), "provider class has no no-arg constructor");
        return None;
    };
    let Some(get) = class.method(&MemberDescriptor::nullary(PROVIDER_METHOD)) else {
        warn!(variable, class = class.name(), "provider class has no get() method");
        return None;
    };
    let result = ctor
        .new_instance(&[])
        .and_then(|instance| get.invoke(&Value::Object(instance), &[]));
    match result {
        Ok(value) => string_result(variable, value),
        Err(e) => {
            warn!(variable, error = %e, "provider failed");
            None
        }
    }
}

fn string_result(variable: &str, value: Value) -> Option<String> {
    match value {
        Value::Str(s) => Some(s),
        Value::Null => None,
        other => {
            warn!(variable, got = other.type_name(), "provider returned a non-string value");
            None
        }
    }
}
