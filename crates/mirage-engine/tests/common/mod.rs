//! Shared fixtures: a small target world and the interfaces that adapt it

#![allow(dead_code)]

use std::sync::Arc;

use mirage_engine::mirage_sdk::{
    ClassBuilder, ConstructorDef, Exception, FieldDef, MethodDef, ProxyObject, Scope, Value,
};
use mirage_engine::{Mirage, NameResolver};

pub const MAPPING: &str = r#"{
    "variables": {
        "v": "pkgA",
        "lf": "label",
        "build": { "type": "static", "provider": "@v@.Build", "value": "id" },
        "ver": { "type": "provider", "provider": "@v@.VersionProvider" },
        "broken": { "type": "static", "provider": "@v@.Missing", "value": "id" }
    },
    "replacements": {
        "@v@.Target": [ { "method": "go", "original": "a" } ]
    }
}"#;

/// Define the target classes and the logical interfaces in a fresh scope
pub fn world() -> Scope {
    let scope = Scope::new("app");
    define_targets(&scope, "pkgA");
    define_interfaces(&scope);
    scope
}

/// Define `<pkg>.Target` and its helper classes in `scope`
pub fn define_targets(scope: &Scope, pkg: &str) {
    let target_name = format!("{}.Target", pkg);
    let tag = pkg.to_string();
    scope.define(
        ClassBuilder::new(target_name.clone())
            .field(FieldDef::new("i1", "int").initial(1))
            .field(FieldDef::new("label", "str").initial("t"))
            .field(FieldDef::new("created", "int").initial(0).as_static())
            .constructor(ConstructorDef::new(Vec::<String>::new(), |_, _| Ok(())))
            .constructor(ConstructorDef::new(["int"], |this, args| {
                this.set("i1", args[0].clone());
                Ok(())
            }))
            .method(MethodDef::new("method1").returns("int").body(|_, _| Ok(Value::Int(1))))
            .method(MethodDef::new("method2").returns("int").body(|_, _| Ok(Value::Int(2))))
            .method(MethodDef::new("a").returns("str").body(|_, _| Ok("ran".into())))
            .method(MethodDef::new("kind").param("int").returns("str").body(|_, _| Ok("int".into())))
            .method(MethodDef::new("kind").param("str").returns("str").body(|_, _| Ok("str".into())))
            .method(
                MethodDef::new("add")
                    .param("int")
                    .param("int")
                    .returns("int")
                    .body(|_, args| Ok(Value::Int(args[0].expect_int()? + args[1].expect_int()?))),
            )
            .method(
                MethodDef::new("peer")
                    .param(target_name.clone())
                    .returns("int")
                    .body(|_, args| match &args[0] {
                        Value::Object(o) => Ok(o.get("i1").unwrap_or_default()),
                        other => Err(Exception::type_mismatch("object", other.type_name())),
                    }),
            )
            .method(MethodDef::new("spawn").returns(target_name.clone()).body(|this, _| {
                let obj = this.expect_object()?;
                let class = obj.class();
                let ctor = class
                    .declared_constructor(&["int".to_string()])
                    .ok_or_else(|| Exception::from("no int constructor"))?;
                let next = obj.get("i1").unwrap_or_default().expect_int()? + 1;
                Ok(Value::Object(class.instantiate(ctor, &[Value::Int(next)])?))
            }))
            .method(MethodDef::new("nothing").returns(target_name.clone()).body(|_, _| Ok(Value::Null)))
            .method(MethodDef::new("fail").body(|_, _| Err(Exception::new("IllegalState", "boom"))))
            .method(
                MethodDef::new("version")
                    .as_static()
                    .returns("str")
                    .body(move |_, _| Ok(format!("{}-1.0", tag).into())),
            )
            .method(MethodDef::new("secret").returns("str").private().body(|_, _| Ok("hidden".into()))),
    );
    scope.define(
        ClassBuilder::new(format!("{}.Build", pkg)).method(
            MethodDef::new("id")
                .as_static()
                .returns("str")
                .body(|_, _| Ok("build7".into())),
        ),
    );
    scope.define(
        ClassBuilder::new(format!("{}.VersionProvider", pkg))
            .method(MethodDef::new("get").returns("str").body(|_, _| Ok("v3".into()))),
    );
}

/// Define the logical interfaces in `scope`
pub fn define_interfaces(scope: &Scope) {
    scope.define(
        ClassBuilder::interface("app.Target")
            .adapts("@v@.Target")
            .method(MethodDef::new("method@i@").returns("int"))
            .method(MethodDef::new("run").returns("str").rename("a"))
            .method(MethodDef::new("go").returns("str"))
            .method(MethodDef::new("add").param("int").param("int").returns("int"))
            .method(MethodDef::new("kind").param("int").returns("str"))
            .method(MethodDef::new("kind").param("str").returns("str"))
            .method(MethodDef::new("peer").param("app.Target").returns("int"))
            .method(MethodDef::new("spawn").returns("app.Target"))
            .method(MethodDef::new("nothing").returns("app.Target"))
            .method(MethodDef::new("fail"))
            .method(MethodDef::new("version").returns("str"))
            .method(MethodDef::new("secret").returns("str"))
            .method(MethodDef::new("i1").returns("int").own_field())
            .method(MethodDef::new("i1").param("int").returns("int").own_field())
            .method(MethodDef::new("label").returns("str").field("@lf@"))
            .method(MethodDef::new("setLabel").param("str").returns("str").field("@lf@"))
            .method(MethodDef::new("created").returns("int").own_field())
            .method(MethodDef::new("missing").param("int").returns("int"))
            .method(MethodDef::new("ghost").returns("int").field("nope"))
            .method(MethodDef::new("describe").returns("str").body(|this, _| {
                let proxy = this
                    .as_proxy()
                    .ok_or_else(|| Exception::type_mismatch("proxy", this.type_name()))?;
                let n = proxy.call("i1", &[])?.expect_int()?;
                Ok(format!("target#{}", n).into())
            })),
    );
    scope.define(ClassBuilder::interface("app.Plain").method(MethodDef::new("run")));
}

/// A resolver over [`MAPPING`] and the fixture world
pub fn resolver(scope: &Scope) -> NameResolver {
    NameResolver::from_str(MAPPING, scope.clone()).unwrap()
}

/// A factory over [`MAPPING`] and the fixture world
pub fn mirage(scope: &Scope) -> Mirage {
    Mirage::new(resolver(scope))
}

/// A factory sharing an existing resolver
pub fn mirage_with(resolver: Arc<NameResolver>) -> Mirage {
    Mirage::from_shared(resolver)
}

/// A fresh `<pkg>.Target` instance with `i1` set
pub fn new_target(scope: &Scope, pkg: &str, i1: i64) -> Value {
    let class = scope.find(&format!("{}.Target", pkg)).unwrap();
    let ctor = class.declared_constructor(&["int".to_string()]).unwrap();
    Value::Object(class.instantiate(ctor, &[Value::Int(i1)]).unwrap())
}
