//! Engine error types

use mirage_sdk::Exception;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, MirageError>;

/// Errors raised while loading mappings, binding adapters or dispatching
#[derive(Debug, Error)]
pub enum MirageError {
    /// The logical interface does not say which concrete type it adapts
    #[error("interface `{interface}` does not declare the type it adapts")]
    MissingAdapts {
        /// Interface name
        interface: String,
    },

    /// A type used as a logical interface is a plain class
    #[error("`{name}` is not an interface")]
    NotAnInterface {
        /// Type name
        name: String,
    },

    /// A type name could not be found after template resolution
    #[error("type `{resolved}` not found (template `{template}`)")]
    TypeNotFound {
        /// Template as written
        template: String,
        /// Name after substitution
        resolved: String,
    },

    /// A variable descriptor is missing a field its kind requires
    #[error("malformed provider for variable `{variable}`: {reason}")]
    MalformedProvider {
        /// Variable name
        variable: String,
        /// What is wrong
        reason: String,
    },

    /// The mapping document is not valid JSON of the expected shape
    #[error("invalid mapping document: {0}")]
    Config(#[from] serde_json::Error),

    /// The mapping document could not be read
    #[error("failed to read mapping document: {0}")]
    Io(#[from] std::io::Error),

    /// No real method matches the resolved name and parameter types
    #[error(
        "method {logical} -> {resolved}({}) not found on {target} (interface {interface})",
        .params.join(", ")
    )]
    MemberNotFound {
        /// Logical name as declared on the interface
        logical: String,
        /// Real name after resolution
        resolved: String,
        /// Parameter types after adapter substitution
        params: Vec<String>,
        /// Adapted type name
        target: String,
        /// Interface name
        interface: String,
    },

    /// No real field matches the resolved name
    #[error("field {logical} -> {resolved} not found on {target} (interface {interface})")]
    FieldNotFound {
        /// Logical accessor name
        logical: String,
        /// Real field name after resolution
        resolved: String,
        /// Adapted type name
        target: String,
        /// Interface name
        interface: String,
    },

    /// No constructor matches the parameter types
    #[error(
        "constructor {target}({}) not found when instantiating {interface}",
        .params.join(", ")
    )]
    ConstructorNotFound {
        /// Adapted type name
        target: String,
        /// Parameter types after adapter substitution
        params: Vec<String>,
        /// Interface name
        interface: String,
    },

    /// The interface declares no member matching the call
    #[error("interface {interface} has no member {name} taking {arity} argument(s)")]
    UnknownLogicalMember {
        /// Interface name
        interface: String,
        /// Called name
        name: String,
        /// Number of arguments supplied
        arity: usize,
    },

    /// Several overloads take this many arguments but none accepts their types
    #[error("interface {interface} has no overload of {name} accepting ({})", .args.join(", "))]
    NoMatchingOverload {
        /// Interface name
        interface: String,
        /// Called name
        name: String,
        /// Type names of the supplied arguments
        args: Vec<String>,
    },

    /// The target raised an exception; passed through untouched
    #[error(transparent)]
    Thrown(#[from] Exception),
}

impl MirageError {
    /// The target's exception, if this is an invocation failure
    pub fn thrown(&self) -> Option<&Exception> {
        match self {
            MirageError::Thrown(e) => Some(e),
            _ => None,
        }
    }

    /// Whether this is a resolution failure (member, field, constructor or type not found)
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            MirageError::MemberNotFound { .. }
                | MirageError::FieldNotFound { .. }
                | MirageError::ConstructorNotFound { .. }
                | MirageError::TypeNotFound { .. }
                | MirageError::UnknownLogicalMember { .. }
                | MirageError::NoMatchingOverload { .. }
        )
    }

    /// Whether this is a configuration error
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            MirageError::MissingAdapts { .. }
                | MirageError::NotAnInterface { .. }
                | MirageError::MalformedProvider { .. }
                | MirageError::Config(_)
                | MirageError::Io(_)
        )
    }

    /// Convert into an exception for callers inside the object model.
    ///
    /// A target's own exception comes back unchanged.
    pub fn into_exception(self) -> Exception {
        match self {
            MirageError::Thrown(e) => e,
            other => Exception::new(mirage_sdk::error::kind::NO_SUCH_MEMBER, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_not_found_message() {
        let err = MirageError::MemberNotFound {
            logical: "method@i@".into(),
            resolved: "method3".into(),
            params: vec!["int".into(), "str".into()],
            target: "pkgA.Target".into(),
            interface: "app.Wrapper".into(),
        };
        assert_eq!(
            err.to_string(),
            "method method@i@ -> method3(int, str) not found on pkgA.Target (interface app.Wrapper)"
        );
        assert!(err.is_resolution_failure());
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_thrown_is_transparent() {
        let exc = Exception::new("IllegalState", "boom");
        let err = MirageError::from(exc.clone());
        assert_eq!(err.to_string(), "IllegalState: boom");
        assert_eq!(err.thrown(), Some(&exc));
        assert_eq!(err.into_exception(), exc);
    }
}
