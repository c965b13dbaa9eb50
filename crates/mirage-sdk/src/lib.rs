//! Mirage SDK - the reflective object model
//!
//! This crate provides the types that targets and logical interfaces are
//! described with, without depending on the resolution engine:
//!
//! - [`Value`]: dynamically typed values, including proxies
//! - [`Class`] / [`ClassBuilder`]: classes and interfaces with methods,
//!   fields, constructors and markers
//! - [`Object`]: instances with thread-safe field storage
//! - [`Scope`]: loading scopes that classes are defined in and looked up from
//! - [`Exception`]: failures raised by member bodies
//!
//! # Example
//!
//! ```ignore
//! use mirage_sdk::{ClassBuilder, FieldDef, MethodDef, Scope, Value};
//!
//! let scope = Scope::new("app");
//! scope.define(
//!     ClassBuilder::new("pkgA.Target")
//!         .field(FieldDef::new("i1", "int").initial(1))
//!         .method(MethodDef::new("method1").returns("int").body(|this, _| {
//!             Ok(this.expect_object()?.get("i1").unwrap_or_default())
//!         })),
//! );
//! ```

#![warn(missing_docs)]

pub mod class;
pub mod convert;
pub mod error;
pub mod object;
pub mod scope;
pub mod value;

pub use class::{
    ClassBuilder, Class, ClassId, ClassKind, ConstructorDef, FieldDef, Initializer, Marker,
    MarkerKind, MethodBody, MethodDef, Visibility,
};
pub use convert::FromValue;
pub use error::{Exception, InvokeResult};
pub use object::{Instance, Object};
pub use scope::{Scope, ScopeId, WeakScope};
pub use value::{types, ProxyObject, Value};
