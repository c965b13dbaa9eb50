//! Value: the dynamically typed currency of the object model
//!
//! Every argument, return value and field travels as a [`Value`]. Objects are
//! reference counted, so cloning a `Value` never copies an instance.
//!
//! Adapters produced by the engine are carried as [`Value::Proxy`]. The SDK
//! only knows them through the [`ProxyObject`] trait, which is enough to
//! unwrap them (`target()`) and to call back through them from default
//! method bodies.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{Exception, InvokeResult};
use crate::object::Instance;

/// Built-in type names used in member signatures
pub mod types {
    /// The null type
    pub const NULL: &str = "null";
    /// Booleans
    pub const BOOL: &str = "bool";
    /// 64-bit signed integers
    pub const INT: &str = "int";
    /// 64-bit floats
    pub const FLOAT: &str = "float";
    /// Strings
    pub const STR: &str = "str";
    /// No value (return type only)
    pub const VOID: &str = "void";
    /// Accepts any value
    pub const ANY: &str = "any";

    /// Check whether a type name is one of the built-in primitive names
    pub fn is_builtin(name: &str) -> bool {
        matches!(name, NULL | BOOL | INT | FLOAT | STR | VOID | ANY)
    }
}

/// A live binding that stands in for a target value.
///
/// Implemented by the engine's dispatch adapter. The object model only needs
/// to recognise a proxy and reach the value behind it.
pub trait ProxyObject: fmt::Debug + Send + Sync {
    /// The wrapped target (`Value::Null` for static-only bindings)
    fn target(&self) -> &Value;

    /// Name of the logical interface this proxy implements
    fn interface_name(&self) -> &str;

    /// Dispatch a logical call through the proxy
    fn call(&self, name: &str, args: &[Value]) -> InvokeResult<Value>;

    /// Borrow as `Any` for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Convert an owned handle into `Any` for `Arc` downcasting
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A dynamically typed value
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Float
    Float(f64),
    /// Owned string
    Str(String),
    /// Reference to an object instance
    Object(Instance),
    /// A proxy standing in for another value
    Proxy(Arc<dyn ProxyObject>),
}

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Check if this is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this is a proxy
    pub fn is_proxy(&self) -> bool {
        matches!(self, Value::Proxy(_))
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float (integers widen)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as object instance
    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get as proxy
    pub fn as_proxy(&self) -> Option<&Arc<dyn ProxyObject>> {
        match self {
            Value::Proxy(p) => Some(p),
            _ => None,
        }
    }

    /// Integer or a `TypeMismatch` exception (for member bodies)
    pub fn expect_int(&self) -> InvokeResult<i64> {
        self.as_int()
            .ok_or_else(|| Exception::type_mismatch(types::INT, self.type_name()))
    }

    /// String or a `TypeMismatch` exception (for member bodies)
    pub fn expect_str(&self) -> InvokeResult<&str> {
        self.as_str()
            .ok_or_else(|| Exception::type_mismatch(types::STR, self.type_name()))
    }

    /// Object receiver or a `NullPointer` exception (for member bodies)
    pub fn expect_object(&self) -> InvokeResult<&Instance> {
        match self {
            Value::Object(o) => Ok(o),
            Value::Null => Err(Exception::null_pointer("receiver is null")),
            other => Err(Exception::type_mismatch("object", other.type_name())),
        }
    }

    /// Structural type name of this value
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => types::NULL,
            Value::Bool(_) => types::BOOL,
            Value::Int(_) => types::INT,
            Value::Float(_) => types::FLOAT,
            Value::Str(_) => types::STR,
            Value::Object(o) => o.class().name(),
            Value::Proxy(p) => p.interface_name(),
        }
    }

    /// Check whether this value can be passed where `ty` is declared.
    ///
    /// Null conforms to every non-primitive type. Objects conform to their
    /// class and all ancestors.
    pub fn conforms_to(&self, ty: &str) -> bool {
        if ty == types::ANY {
            return true;
        }
        match self {
            Value::Null => !matches!(ty, types::BOOL | types::INT | types::FLOAT),
            Value::Bool(_) => ty == types::BOOL,
            Value::Int(_) => ty == types::INT,
            Value::Float(_) => ty == types::FLOAT,
            Value::Str(_) => ty == types::STR,
            Value::Object(o) => o.class().is_subclass_of(ty),
            Value::Proxy(p) => p.interface_name() == ty,
        }
    }

    /// Replace a proxy with the value it wraps; other values pass through
    pub fn unwrap_proxy(&self) -> Value {
        match self {
            Value::Proxy(p) => p.target().clone(),
            other => other.clone(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Proxy(a), Value::Proxy(b)) => {
                std::ptr::eq(
                    Arc::as_ptr(a) as *const (),
                    Arc::as_ptr(b) as *const (),
                ) || (a.interface_name() == b.interface_name() && a.target() == b.target())
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Object(o) => write!(f, "Object({}@{:p})", o.class().name(), Arc::as_ptr(o)),
            Value::Proxy(p) => write!(f, "Proxy({} -> {:?})", p.interface_name(), p.target()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Instance> for Value {
    fn from(o: Instance) -> Self {
        Value::Object(o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_accessors() {
        assert_eq!(Value::from(7).as_int(), Some(7));
        assert_eq!(Value::from(2.5).as_float(), Some(2.5));
        assert_eq!(Value::from(3).as_float(), Some(3.0));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert!(Value::Null.is_null());
        assert!(Value::from("x").as_int().is_none());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::from(1).type_name(), "int");
        assert_eq!(Value::from("s").type_name(), "str");
    }

    #[test]
    fn test_conforms_to_primitives() {
        assert!(Value::from(1).conforms_to("int"));
        assert!(!Value::from(1).conforms_to("str"));
        assert!(Value::from(1).conforms_to("any"));
        assert!(Value::Null.conforms_to("str"));
        assert!(!Value::Null.conforms_to("int"));
    }

    #[test]
    fn test_expect_helpers() {
        assert_eq!(Value::from(4).expect_int().unwrap(), 4);
        let err = Value::from("4").expect_int().unwrap_err();
        assert!(err.is(crate::error::kind::TYPE_MISMATCH));
        let err = Value::Null.expect_object().unwrap_err();
        assert!(err.is(crate::error::kind::NULL_POINTER));
    }

    #[test]
    fn test_unwrap_non_proxy_is_identity() {
        assert_eq!(Value::from(9).unwrap_proxy(), Value::from(9));
    }
}
