//! Mirage engine
//!
//! Binds logical interfaces to concrete types whose names are only known at
//! run time. Names are written as templates (`"@v@.Target"`,
//! `"method@i@"`) and resolved through variables declared in a mapping
//! document or registered programmatically.
//!
//! - [`provider`]: value providers and their retention
//! - [`registry`]: programmatically registered providers
//! - [`mapping`]: the JSON mapping document
//! - [`resolver`]: template substitution and member renames
//! - [`cache`]: per-class member lookup cache
//! - [`adapter`]: dynamic interface adapters
//! - [`facade`]: `Mirage` entry points and typed facades
//!
//! # Example
//!
//! ```ignore
//! use mirage_engine::{Mirage, NameResolver};
//!
//! let resolver = NameResolver::from_str(r#"{ "variables": { "v": "pkgA" } }"#, scope)?;
//! let mirage = Mirage::new(resolver);
//! let target = mirage.wrap("app.Target", instance)?;
//! let n = target.call("method1", &[])?;
//! ```

#![warn(missing_docs)]

pub mod adapter;
pub mod cache;
pub mod error;
pub mod facade;
pub mod mapping;
pub mod provider;
pub mod registry;
pub mod resolver;

pub use adapter::Adapter;
pub use cache::{CachedMethod, ClassData, ConstructorHandle, FieldHandle, MemberDescriptor, TypeCache};
pub use error::{MirageError, Result};
pub use facade::{Facade, Mirage};
pub use mapping::{MappingDocument, MemberRename, ProviderKind, VariableDecl, VariableSpec};
pub use provider::{Provider, Retention};
pub use registry::ProviderRegistry;
pub use resolver::{NameResolver, Resolver};

pub use mirage_sdk;
