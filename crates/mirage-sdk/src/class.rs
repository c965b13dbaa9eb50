//! Class definitions
//!
//! A [`Class`] is the unit of reflection: it declares methods, fields and
//! constructors, optionally extends a parent class, and carries markers.
//! Classes are immutable once built; only static field *values* change.
//!
//! Interfaces are classes of kind [`ClassKind::Interface`]. Their methods
//! describe logical members; a method with a body is a default method.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{kind, Exception, InvokeResult};
use crate::object::{Instance, Object};
use crate::scope::{Scope, WeakScope};
use crate::value::{types, Value};

/// Process-wide unique class identity
pub type ClassId = u64;

static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

/// Method body: `(receiver, args) -> result`. The receiver is `Value::Null`
/// for static methods.
pub type MethodBody = Arc<dyn Fn(&Value, &[Value]) -> InvokeResult<Value> + Send + Sync>;

/// Constructor initializer, run on a freshly allocated instance
pub type Initializer = Arc<dyn Fn(&Instance, &[Value]) -> InvokeResult<()> + Send + Sync>;

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Found by public lookups
    #[default]
    Public,
    /// Only found by declared-member lookups
    Private,
}

/// Kind of class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// Concrete, instantiable class
    Class,
    /// Logical interface
    Interface,
}

/// Discriminant used to look markers up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// Type-level: names the concrete type an interface adapts
    Adapts,
    /// Method-level: real member name template
    Rename,
    /// Method-level: the method reads or writes a field
    Field,
}

/// Declarative metadata attached to an interface or one of its methods
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// Name template of the adapted concrete type
    Adapts(String),
    /// Name template of the real member
    Rename(String),
    /// Field accessor; `None` uses the method's own name
    Field(Option<String>),
}

impl Marker {
    /// The lookup key of this marker
    pub fn kind(&self) -> MarkerKind {
        match self {
            Marker::Adapts(_) => MarkerKind::Adapts,
            Marker::Rename(_) => MarkerKind::Rename,
            Marker::Field(_) => MarkerKind::Field,
        }
    }

    /// The name template carried by the marker, if any
    pub fn template(&self) -> Option<&str> {
        match self {
            Marker::Adapts(t) | Marker::Rename(t) => Some(t),
            Marker::Field(t) => t.as_deref().filter(|t| !t.trim().is_empty()),
        }
    }
}

/// A method declaration
#[derive(Clone)]
pub struct MethodDef {
    /// Method name
    pub name: String,
    /// Parameter type names, in order
    pub params: Vec<String>,
    /// Return type name
    pub return_type: String,
    /// Visibility
    pub visibility: Visibility,
    /// Whether the method is static
    pub is_static: bool,
    /// Markers declared on the method
    pub markers: Vec<Marker>,
    body: Option<MethodBody>,
}

impl MethodDef {
    /// Create an abstract, public, zero-argument method returning `void`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: types::VOID.to_string(),
            visibility: Visibility::Public,
            is_static: false,
            markers: Vec::new(),
            body: None,
        }
    }

    /// Append a parameter type
    pub fn param(mut self, ty: impl Into<String>) -> Self {
        self.params.push(ty.into());
        self
    }

    /// Set the return type
    pub fn returns(mut self, ty: impl Into<String>) -> Self {
        self.return_type = ty.into();
        self
    }

    /// Mark as private
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Mark as static
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Attach a marker
    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Attach a rename marker
    pub fn rename(self, template: impl Into<String>) -> Self {
        self.marker(Marker::Rename(template.into()))
    }

    /// Attach a field marker naming the real field
    pub fn field(self, template: impl Into<String>) -> Self {
        self.marker(Marker::Field(Some(template.into())))
    }

    /// Attach a field marker that reuses the method name
    pub fn own_field(self) -> Self {
        self.marker(Marker::Field(None))
    }

    /// Provide the implementation
    pub fn body<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> InvokeResult<Value> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(f));
        self
    }

    /// Whether the method has an implementation
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// First marker of the given kind
    pub fn marker_of(&self, kind: MarkerKind) -> Option<&Marker> {
        self.markers.iter().find(|m| m.kind() == kind)
    }

    /// Run the body after checking arity
    pub fn call(&self, receiver: &Value, args: &[Value]) -> InvokeResult<Value> {
        if args.len() != self.params.len() {
            return Err(Exception::illegal_argument(format!(
                "{} expects {} argument(s), got {}",
                self.name,
                self.params.len(),
                args.len()
            )));
        }
        match &self.body {
            Some(body) => body(receiver, args),
            None => Err(Exception::new(
                kind::ABSTRACT_MEMBER,
                format!("{} has no implementation", self.name),
            )),
        }
    }

    /// Check whether this method matches a name and parameter list
    pub fn matches(&self, name: &str, params: &[String]) -> bool {
        self.name == name && self.params == params
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("markers", &self.markers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// A field declaration
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Declared type name
    pub ty: String,
    /// Visibility
    pub visibility: Visibility,
    /// Whether the field is static
    pub is_static: bool,
    /// Value the field starts with
    pub initial: Value,
}

impl FieldDef {
    /// Create a public instance field starting at null
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            visibility: Visibility::Public,
            is_static: false,
            initial: Value::Null,
        }
    }

    /// Set the initial value
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = value.into();
        self
    }

    /// Mark as private
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Mark as static
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// A constructor declaration
#[derive(Clone)]
pub struct ConstructorDef {
    /// Parameter type names, in order
    pub params: Vec<String>,
    /// Visibility
    pub visibility: Visibility,
    init: Initializer,
}

impl ConstructorDef {
    /// Create a public constructor
    pub fn new<I, S, F>(params: I, init: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Instance, &[Value]) -> InvokeResult<()> + Send + Sync + 'static,
    {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            visibility: Visibility::Public,
            init: Arc::new(init),
        }
    }

    /// Mark as private
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }
}

impl fmt::Debug for ConstructorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDef")
            .field("params", &self.params)
            .field("visibility", &self.visibility)
            .finish()
    }
}

/// A class or interface
pub struct Class {
    id: ClassId,
    name: String,
    kind: ClassKind,
    parent: Option<Arc<Class>>,
    methods: Vec<MethodDef>,
    fields: Vec<FieldDef>,
    constructors: Vec<ConstructorDef>,
    markers: Vec<Marker>,
    statics: RwLock<FxHashMap<String, Value>>,
    scope: Option<WeakScope>,
}

impl Class {
    /// Unique identity
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Fully qualified name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simple name (after the last `.`)
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Class or interface
    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// Whether this is an interface
    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    /// Parent class
    pub fn parent(&self) -> Option<&Arc<Class>> {
        self.parent.as_ref()
    }

    /// Declared methods
    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    /// Declared fields
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Declared constructors
    pub fn constructors(&self) -> &[ConstructorDef] {
        &self.constructors
    }

    /// Type-level markers
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// First type-level marker of the given kind
    pub fn marker(&self, kind: MarkerKind) -> Option<&Marker> {
        self.markers.iter().find(|m| m.kind() == kind)
    }

    /// The scope that defined this class, if it is still alive
    pub fn scope(&self) -> Option<Scope> {
        self.scope.as_ref().and_then(WeakScope::upgrade)
    }

    /// Iterate this class followed by its ancestors
    pub fn ancestors(self: &Arc<Self>) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Check whether this class is, or extends, a class named `name`
    pub fn is_subclass_of(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(cls) = current {
            if cls.name == name {
                return true;
            }
            current = cls.parent.as_deref();
        }
        false
    }

    /// Declared method with an exact signature
    pub fn declared_method(&self, name: &str, params: &[String]) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.matches(name, params))
    }

    /// Declared field by name
    pub fn declared_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declared constructor with an exact parameter list
    pub fn declared_constructor(&self, params: &[String]) -> Option<&ConstructorDef> {
        self.constructors.iter().find(|c| c.params == params)
    }

    /// Most-derived non-private instance method with this signature,
    /// starting the search at `self`
    pub fn find_override(self: &Arc<Self>, name: &str, params: &[String]) -> Option<&MethodDef> {
        self.ancestors()
            .filter_map(|cls| cls.declared_method(name, params))
            .find(|m| !m.is_static && m.visibility == Visibility::Public && m.has_body())
    }

    /// Read a static field declared on this class
    pub fn static_get(&self, name: &str) -> Option<Value> {
        self.statics.read().get(name).cloned()
    }

    /// Write a static field declared on this class
    pub fn static_set(&self, name: &str, value: Value) -> Option<Value> {
        self.statics.write().insert(name.to_string(), value)
    }

    /// Allocate an instance and run a constructor on it
    pub fn instantiate(
        self: &Arc<Self>,
        ctor: &ConstructorDef,
        args: &[Value],
    ) -> InvokeResult<Instance> {
        if self.is_interface() {
            return Err(Exception::illegal_argument(format!(
                "cannot instantiate interface {}",
                self.name
            )));
        }
        if args.len() != ctor.params.len() {
            return Err(Exception::illegal_argument(format!(
                "constructor of {} expects {} argument(s), got {}",
                self.name,
                ctor.params.len(),
                args.len()
            )));
        }
        let instance = Object::alloc(self.clone());
        (ctor.init)(&instance, args)?;
        Ok(instance)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("methods", &self.methods.len())
            .field("fields", &self.fields.len())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

/// Iterator over a class and its ancestors
pub struct Ancestors<'a> {
    next: Option<&'a Arc<Class>>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Arc<Class>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent.as_ref();
        Some(current)
    }
}

/// Builder for classes and interfaces
#[derive(Debug)]
pub struct ClassBuilder {
    name: String,
    kind: ClassKind,
    parent: Option<Arc<Class>>,
    methods: Vec<MethodDef>,
    fields: Vec<FieldDef>,
    constructors: Vec<ConstructorDef>,
    markers: Vec<Marker>,
}

impl ClassBuilder {
    /// Start a concrete class
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name.into(), ClassKind::Class)
    }

    /// Start an interface
    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name.into(), ClassKind::Interface)
    }

    fn with_kind(name: String, kind: ClassKind) -> Self {
        Self {
            name,
            kind,
            parent: None,
            methods: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// The name being built
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the parent class
    pub fn extends(mut self, parent: &Arc<Class>) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Add a method
    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a field
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a constructor
    pub fn constructor(mut self, ctor: ConstructorDef) -> Self {
        self.constructors.push(ctor);
        self
    }

    /// Attach a type-level marker
    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Declare the concrete type this interface adapts
    pub fn adapts(self, template: impl Into<String>) -> Self {
        self.marker(Marker::Adapts(template.into()))
    }

    /// Build a class that belongs to no scope
    pub fn build(self) -> Arc<Class> {
        self.build_in(None)
    }

    pub(crate) fn build_in(mut self, scope: Option<WeakScope>) -> Arc<Class> {
        // Concrete classes without constructors get an implicit no-arg one
        if self.kind == ClassKind::Class && self.constructors.is_empty() {
            self.constructors
                .push(ConstructorDef::new(Vec::<String>::new(), |_, _| Ok(())));
        }
        let statics = self
            .fields
            .iter()
            .filter(|f| f.is_static)
            .map(|f| (f.name.clone(), f.initial.clone()))
            .collect();
        Arc::new(Class {
            id: NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed),
            name: self.name,
            kind: self.kind,
            parent: self.parent,
            methods: self.methods,
            fields: self.fields,
            constructors: self.constructors,
            markers: self.markers,
            statics: RwLock::new(statics),
            scope,
        })
    }
}
