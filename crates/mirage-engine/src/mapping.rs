//! Mapping documents
//!
//! A mapping document declares the variables templates may reference and
//! the member renames that apply to each owner type:
//!
//! ```json
//! {
//!   "variables": {
//!     "v": "pkgA",
//!     "c": { "type": "registered", "value": "c" },
//!     "build": { "type": "static", "provider": "@v@.Build", "value": "id", "retention": "lazy" }
//!   },
//!   "replacements": {
//!     "@v@.Target": [ { "method": "run", "original": "a" } ]
//!   }
//! }
//! ```
//!
//! Both sections are optional. Descriptor objects are validated on load.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::{MirageError, Result};
use crate::provider::Retention;

/// Where a structured variable gets its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Instantiate the class `provider` and call its `get()` method
    #[default]
    Provider,
    /// Use the registered provider named `value`
    Registered,
    /// Call the static method `value` on the class `provider`
    Static,
    /// Use `value` literally
    Value,
}

/// A structured variable descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    /// Provider kind (`"type"` in JSON)
    #[serde(rename = "type", default)]
    pub kind: ProviderKind,

    /// Retention of the produced value
    #[serde(default)]
    pub retention: Retention,

    /// Class name template (provider and static kinds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Method name, registered provider name, or literal value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Parameter type names of the static method
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

impl VariableSpec {
    /// Create a descriptor of the given kind with default retention
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            retention: Retention::Cached,
            provider: None,
            value: None,
            params: Vec::new(),
        }
    }

    /// Set the class template
    pub fn provider(mut self, template: impl Into<String>) -> Self {
        self.provider = Some(template.into());
        self
    }

    /// Set the value field
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the retention
    pub fn retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    /// Add a static method parameter type
    pub fn param(mut self, ty: impl Into<String>) -> Self {
        self.params.push(ty.into());
        self
    }

    fn validate(&self, variable: &str) -> Result<()> {
        let malformed = |reason: &str| MirageError::MalformedProvider {
            variable: variable.to_string(),
            reason: reason.to_string(),
        };
        match self.kind {
            ProviderKind::Provider if self.provider.is_none() => {
                Err(malformed("`provider` kind requires a `provider` class"))
            }
            ProviderKind::Static if self.provider.is_none() => {
                Err(malformed("`static` kind requires a `provider` class"))
            }
            ProviderKind::Static if self.value.is_none() => {
                Err(malformed("`static` kind requires a `value` method name"))
            }
            ProviderKind::Registered if self.value.is_none() => {
                Err(malformed("`registered` kind requires a `value` provider name"))
            }
            ProviderKind::Value if self.value.is_none() => {
                Err(malformed("`value` kind requires a `value`"))
            }
            _ => Ok(()),
        }
    }
}

/// A declared variable: either a literal or a descriptor.
///
/// Any JSON string, number or boolean is read as a literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VariableDecl {
    /// Literal string, retained as `Cached`
    Literal(String),
    /// Structured descriptor
    Spec(VariableSpec),
}

impl VariableDecl {
    /// Retention of this declaration
    pub fn retention(&self) -> Retention {
        match self {
            VariableDecl::Literal(_) => Retention::Cached,
            VariableDecl::Spec(spec) => spec.retention,
        }
    }
}

impl<'de> Deserialize<'de> for VariableDecl {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(VariableDecl::Literal(s)),
            serde_json::Value::Number(n) => Ok(VariableDecl::Literal(n.to_string())),
            serde_json::Value::Bool(b) => Ok(VariableDecl::Literal(b.to_string())),
            value @ serde_json::Value::Object(_) => serde_json::from_value(value)
                .map(VariableDecl::Spec)
                .map_err(de::Error::custom),
            serde_json::Value::Null => {
                Err(de::Error::custom("expected a literal or a descriptor, found null"))
            }
            serde_json::Value::Array(_) => {
                Err(de::Error::custom("expected a literal or a descriptor, found an array"))
            }
        }
    }
}

fn deserialize_variables<'de, D>(
    deserializer: D,
) -> std::result::Result<HashMap<String, VariableDecl>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, serde_json::Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(name, value)| match VariableDecl::deserialize(value) {
            Ok(decl) => Ok((name, decl)),
            Err(err) => Err(de::Error::custom(format!("variable `{}`: {}", name, err))),
        })
        .collect()
}

/// One member rename: logical name on the interface → real member name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRename {
    /// Logical (interface-side) name
    #[serde(rename = "method", alias = "logical")]
    pub logical: String,
    /// Real (target-side) name
    #[serde(rename = "original", alias = "real")]
    pub real: String,
}

/// A parsed mapping document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingDocument {
    /// Declared variables
    #[serde(default, deserialize_with = "deserialize_variables")]
    pub variables: HashMap<String, VariableDecl>,

    /// Owner type template → member renames
    #[serde(default)]
    pub replacements: HashMap<String, Vec<MemberRename>>,
}

impl MappingDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a JSON string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self> {
        let doc: MappingDocument = serde_json::from_str(json)?;
        doc.validate()?;
        Ok(doc)
    }

    /// Parse from a reader
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let doc: MappingDocument = serde_json::from_reader(reader)?;
        doc.validate()?;
        Ok(doc)
    }

    /// Read and parse a file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_str(&text)
    }

    /// Check every descriptor carries the fields its kind requires
    pub fn validate(&self) -> Result<()> {
        for (name, decl) in &self.variables {
            if let VariableDecl::Spec(spec) = decl {
                spec.validate(name)?;
            }
        }
        Ok(())
    }

    /// Declare a literal variable
    pub fn literal(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables
            .insert(name.into(), VariableDecl::Literal(value.into()));
        self
    }

    /// Declare a structured variable
    pub fn variable(mut self, name: impl Into<String>, spec: VariableSpec) -> Self {
        self.variables.insert(name.into(), VariableDecl::Spec(spec));
        self
    }

    /// Add a member rename for an owner type template
    pub fn rename(
        mut self,
        owner: impl Into<String>,
        logical: impl Into<String>,
        real: impl Into<String>,
    ) -> Self {
        self.replacements
            .entry(owner.into())
            .or_default()
            .push(MemberRename {
                logical: logical.into(),
                real: real.into(),
            });
        self
    }

    /// Serialize back to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
