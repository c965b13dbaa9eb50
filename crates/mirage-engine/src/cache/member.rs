//! Structural member keys

use std::fmt;

/// Name used for constructor descriptors
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// A member's name and ordered parameter types.
///
/// Two descriptors are equal iff both the name and every parameter type
/// match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberDescriptor {
    /// Member name
    pub name: String,
    /// Parameter type names, in order
    pub params: Vec<String>,
}

impl MemberDescriptor {
    /// Create a descriptor
    pub fn new<I, S>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Descriptor for a method without parameters
    pub fn nullary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Descriptor for a constructor
    pub fn constructor<I, S>(params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(CONSTRUCTOR_NAME, params)
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(", "))
    }
}
