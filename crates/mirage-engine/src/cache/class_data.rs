//! Per-class member cache
//!
//! A [`ClassData`] memoizes every member lookup made against one class.
//! Lookups search public members along the class and its ancestors first,
//! then fall back to members declared on the class itself regardless of
//! visibility (such handles are flagged `overridden`).
//!
//! Misses are memoized too: classes are immutable once built, so a member
//! that is absent now stays absent.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use mirage_sdk::{
    Class, ConstructorDef, Exception, FieldDef, Instance, InvokeResult, Marker, MarkerKind,
    MethodDef, Value, Visibility,
};
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use tracing::trace;

use super::member::MemberDescriptor;

/// Cached lookups for one class
pub struct ClassData {
    class: Arc<Class>,
    fields: DashMap<String, Option<FieldHandle>>,
    methods: DashMap<MemberDescriptor, Option<Arc<CachedMethod>>>,
    constructors: DashMap<MemberDescriptor, Option<ConstructorHandle>>,
    markers: DashMap<MarkerKind, Option<Marker>>,
}

impl ClassData {
    pub(crate) fn new(class: Arc<Class>) -> Self {
        Self {
            class,
            fields: DashMap::new(),
            methods: DashMap::new(),
            constructors: DashMap::new(),
            markers: DashMap::new(),
        }
    }

    /// The underlying class
    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    /// Class name
    pub fn name(&self) -> &str {
        self.class.name()
    }

    /// Look up a method by exact descriptor
    pub fn method(&self, desc: &MemberDescriptor) -> Option<Arc<CachedMethod>> {
        if let Some(hit) = self.methods.get(desc) {
            return hit.value().clone();
        }
        let found = self.lookup_method(desc).map(Arc::new);
        trace!(class = self.name(), member = %desc, found = found.is_some(), "method cache miss");
        // Racing lookups compute equal handles; the first insert wins
        self.methods
            .entry(desc.clone())
            .or_insert(found)
            .value()
            .clone()
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<FieldHandle> {
        if let Some(hit) = self.fields.get(name) {
            return hit.value().clone();
        }
        let found = self.lookup_field(name);
        trace!(class = self.name(), field = name, found = found.is_some(), "field cache miss");
        self.fields
            .entry(name.to_string())
            .or_insert(found)
            .value()
            .clone()
    }

    /// Look up a constructor by parameter types
    pub fn constructor(&self, params: &[String]) -> Option<ConstructorHandle> {
        let desc = MemberDescriptor::constructor(params.iter().cloned());
        if let Some(hit) = self.constructors.get(&desc) {
            return hit.value().clone();
        }
        let found = self.lookup_constructor(params);
        trace!(class = self.name(), member = %desc, found = found.is_some(), "constructor cache miss");
        self.constructors
            .entry(desc)
            .or_insert(found)
            .value()
            .clone()
    }

    /// Type-level marker of the given kind
    pub fn marker(&self, kind: MarkerKind) -> Option<Marker> {
        self.markers
            .entry(kind)
            .or_insert_with(|| self.class.marker(kind).cloned())
            .value()
            .clone()
    }

    fn lookup_method(&self, desc: &MemberDescriptor) -> Option<CachedMethod> {
        let public = self.class.ancestors().find_map(|cls| {
            cls.declared_method(&desc.name, &desc.params)
                .filter(|m| m.visibility == Visibility::Public)
                .map(|m| CachedMethod::new(cls.clone(), m.clone(), false))
        });
        public.or_else(|| {
            self.class
                .declared_method(&desc.name, &desc.params)
                .map(|m| CachedMethod::new(self.class.clone(), m.clone(), true))
        })
    }

    fn lookup_field(&self, name: &str) -> Option<FieldHandle> {
        let public = self.class.ancestors().find_map(|cls| {
            cls.declared_field(name)
                .filter(|f| f.visibility == Visibility::Public)
                .map(|f| FieldHandle::new(cls.clone(), f.clone(), false))
        });
        public.or_else(|| {
            self.class
                .declared_field(name)
                .map(|f| FieldHandle::new(self.class.clone(), f.clone(), true))
        })
    }

    fn lookup_constructor(&self, params: &[String]) -> Option<ConstructorHandle> {
        let ctor = self.class.declared_constructor(params)?;
        Some(ConstructorHandle {
            class: self.class.clone(),
            def: ctor.clone(),
            overridden: ctor.visibility != Visibility::Public,
        })
    }

    /// Number of memoized method lookups (hits and misses)
    pub fn cached_methods(&self) -> usize {
        self.methods.len()
    }
}

impl fmt::Debug for ClassData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassData")
            .field("class", &self.class.name())
            .field("methods", &self.methods.len())
            .field("fields", &self.fields.len())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

/// A resolved method plus the markers declared on it
pub struct CachedMethod {
    declaring: Arc<Class>,
    def: MethodDef,
    overridden: bool,
    markers: OnceCell<FxHashMap<MarkerKind, Marker>>,
}

impl CachedMethod {
    fn new(declaring: Arc<Class>, def: MethodDef, overridden: bool) -> Self {
        Self {
            declaring,
            def,
            overridden,
            markers: OnceCell::new(),
        }
    }

    /// Class that declares the method
    pub fn declaring(&self) -> &Arc<Class> {
        &self.declaring
    }

    /// The method declaration
    pub fn def(&self) -> &MethodDef {
        &self.def
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Whether the handle was found by the non-public fallback
    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    /// First marker of the given kind; the marker map is captured once
    pub fn marker(&self, kind: MarkerKind) -> Option<&Marker> {
        self.markers
            .get_or_init(|| {
                let mut map = FxHashMap::default();
                for marker in &self.def.markers {
                    map.entry(marker.kind()).or_insert_with(|| marker.clone());
                }
                map
            })
            .get(&kind)
    }

    /// Invoke against a receiver.
    ///
    /// Static methods ignore the receiver. Public instance methods dispatch
    /// to the receiver's most-derived override.
    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> InvokeResult<Value> {
        if self.def.is_static {
            return self.def.call(&Value::Null, args);
        }
        match receiver {
            Value::Null => Err(Exception::null_pointer(format!(
                "{}.{} invoked without a receiver",
                self.declaring.name(),
                self.def.name
            ))),
            Value::Object(obj) => {
                if !obj.class().is_subclass_of(self.declaring.name()) {
                    return Err(Exception::type_mismatch(
                        self.declaring.name(),
                        obj.class().name(),
                    ));
                }
                if self.def.visibility == Visibility::Private {
                    return self.def.call(receiver, args);
                }
                let class = obj.class();
                match class.find_override(&self.def.name, &self.def.params) {
                    Some(m) => m.call(receiver, args),
                    None => self.def.call(receiver, args),
                }
            }
            _ => self.def.call(receiver, args),
        }
    }
}

impl fmt::Debug for CachedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedMethod")
            .field("declaring", &self.declaring.name())
            .field("def", &self.def)
            .field("overridden", &self.overridden)
            .finish()
    }
}

/// A resolved field
#[derive(Clone)]
pub struct FieldHandle {
    declaring: Arc<Class>,
    def: FieldDef,
    overridden: bool,
}

impl FieldHandle {
    fn new(declaring: Arc<Class>, def: FieldDef, overridden: bool) -> Self {
        Self {
            declaring,
            def,
            overridden,
        }
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Declared type
    pub fn ty(&self) -> &str {
        &self.def.ty
    }

    /// Whether the handle was found by the non-public fallback
    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    /// Read the field from `target` (ignored for static fields)
    pub fn get(&self, target: &Value) -> InvokeResult<Value> {
        if self.def.is_static {
            return Ok(self.declaring.static_get(&self.def.name).unwrap_or_default());
        }
        let obj = self.receiver(target)?;
        Ok(obj.get(&self.def.name).unwrap_or_default())
    }

    /// Write the field on `target` (ignored for static fields)
    pub fn set(&self, target: &Value, value: Value) -> InvokeResult<()> {
        if self.def.is_static {
            self.declaring.static_set(&self.def.name, value);
            return Ok(());
        }
        let obj = self.receiver(target)?;
        obj.set(&self.def.name, value);
        Ok(())
    }

    fn receiver<'a>(&self, target: &'a Value) -> InvokeResult<&'a Instance> {
        let obj = match target {
            Value::Null => {
                return Err(Exception::null_pointer(format!(
                    "field {}.{} accessed without a receiver",
                    self.declaring.name(),
                    self.def.name
                )))
            }
            other => other.expect_object()?,
        };
        if !obj.class().is_subclass_of(self.declaring.name()) {
            return Err(Exception::type_mismatch(
                self.declaring.name(),
                obj.class().name(),
            ));
        }
        Ok(obj)
    }
}

impl fmt::Debug for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldHandle")
            .field("declaring", &self.declaring.name())
            .field("name", &self.def.name)
            .field("static", &self.def.is_static)
            .finish()
    }
}

/// A resolved constructor
#[derive(Clone)]
pub struct ConstructorHandle {
    class: Arc<Class>,
    def: ConstructorDef,
    overridden: bool,
}

impl ConstructorHandle {
    /// Parameter types
    pub fn params(&self) -> &[String] {
        &self.def.params
    }

    /// Whether the constructor is not public
    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    /// Allocate and initialize a new instance
    pub fn new_instance(&self, args: &[Value]) -> InvokeResult<Instance> {
        self.class.instantiate(&self.def, args)
    }
}

impl fmt::Debug for ConstructorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorHandle")
            .field("class", &self.class.name())
            .field("params", &self.def.params)
            .finish()
    }
}
