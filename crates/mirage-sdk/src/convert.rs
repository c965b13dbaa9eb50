//! Conversions from [`Value`] into Rust types.
//!
//! Hand-written facades use these to turn dispatch results back into typed
//! returns:
//!
//! ```ignore
//! let n: i64 = i64::from_value(adapter.call("size", &[])?)?;
//! ```

use crate::error::{Exception, InvokeResult};
use crate::object::Instance;
use crate::value::{types, Value};

/// Extract a Rust value from a [`Value`]
pub trait FromValue: Sized {
    /// Convert, raising `TypeMismatch` when the shape is wrong
    fn from_value(value: Value) -> InvokeResult<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> InvokeResult<Self> {
        Ok(value)
    }
}

impl FromValue for () {
    fn from_value(_value: Value) -> InvokeResult<Self> {
        Ok(())
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> InvokeResult<Self> {
        value
            .as_bool()
            .ok_or_else(|| Exception::type_mismatch(types::BOOL, value.type_name()))
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> InvokeResult<Self> {
        value.expect_int()
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> InvokeResult<Self> {
        value
            .as_float()
            .ok_or_else(|| Exception::type_mismatch(types::FLOAT, value.type_name()))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> InvokeResult<Self> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(Exception::type_mismatch(types::STR, other.type_name())),
        }
    }
}

impl FromValue for Instance {
    fn from_value(value: Value) -> InvokeResult<Self> {
        match value {
            Value::Object(o) => Ok(o),
            other => Err(Exception::type_mismatch("object", other.type_name())),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> InvokeResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(i64::from_value(Value::Int(3)).unwrap(), 3);
        assert!(bool::from_value(Value::Bool(true)).unwrap());
        assert_eq!(String::from_value(Value::from("a")).unwrap(), "a");
        assert_eq!(f64::from_value(Value::Int(2)).unwrap(), 2.0);
    }

    #[test]
    fn test_option_maps_null() {
        assert_eq!(Option::<i64>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i64>::from_value(Value::Int(1)).unwrap(), Some(1));
    }

    #[test]
    fn test_mismatch_reports_types() {
        let err = String::from_value(Value::Int(1)).unwrap_err();
        assert_eq!(err.message, "expected str, got int");
    }
}
