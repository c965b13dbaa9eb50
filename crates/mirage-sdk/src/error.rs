//! Failures raised inside the object model
//!
//! Method bodies, constructor initializers and field accessors report
//! failures with [`Exception`]. The engine never rewrites an exception it
//! receives from a target: callers see exactly what the target raised.

/// Result type for member bodies
pub type InvokeResult<T> = Result<T, Exception>;

/// Well-known exception kinds raised by the object model itself
pub mod kind {
    /// A member required a receiver but none was bound
    pub const NULL_POINTER: &str = "NullPointer";
    /// Argument count did not match the member's parameter list
    pub const ILLEGAL_ARGUMENT: &str = "IllegalArgument";
    /// A member could not be reached by a call made from inside the model
    pub const NO_SUCH_MEMBER: &str = "NoSuchMember";
    /// An abstract member was invoked directly
    pub const ABSTRACT_MEMBER: &str = "AbstractMember";
    /// A value had the wrong shape for the operation
    pub const TYPE_MISMATCH: &str = "TypeMismatch";
}

/// An exception raised by a target member
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Exception {
    /// Exception kind (a class-like name such as `IllegalState`)
    pub kind: String,
    /// Human readable message
    pub message: String,
}

impl Exception {
    /// Create an exception of the given kind
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Receiver was required but absent
    pub fn null_pointer(message: impl Into<String>) -> Self {
        Self::new(kind::NULL_POINTER, message)
    }

    /// Wrong number of arguments
    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::new(kind::ILLEGAL_ARGUMENT, message)
    }

    /// Value had an unexpected shape
    pub fn type_mismatch(expected: &str, got: &str) -> Self {
        Self::new(
            kind::TYPE_MISMATCH,
            format!("expected {}, got {}", expected, got),
        )
    }

    /// Check the exception kind
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

impl From<String> for Exception {
    fn from(s: String) -> Self {
        Exception::new("Error", s)
    }
}

impl From<&str> for Exception {
    fn from(s: &str) -> Self {
        Exception::new("Error", s)
    }
}
