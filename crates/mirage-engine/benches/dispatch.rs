use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mirage_engine::mirage_sdk::{ClassBuilder, FieldDef, MethodDef, Scope, Value};
use mirage_engine::{Mirage, NameResolver, Resolver};

const MAPPING: &str = r#"{
    "variables": { "v": "pkgA", "i": "1" },
    "replacements": { "@v@.Target": [ { "method": "run", "original": "a" } ] }
}"#;

fn world() -> Scope {
    let scope = Scope::new("bench");
    scope.define(
        ClassBuilder::new("pkgA.Target")
            .field(FieldDef::new("i1", "int").initial(1))
            .method(MethodDef::new("method1").returns("int").body(|_, _| Ok(Value::Int(1))))
            .method(MethodDef::new("a").returns("str").body(|_, _| Ok("ran".into())))
            .method(
                MethodDef::new("add")
                    .param("int")
                    .param("int")
                    .returns("int")
                    .body(|_, args| Ok(Value::Int(args[0].expect_int()? + args[1].expect_int()?))),
            ),
    );
    scope.define(
        ClassBuilder::interface("app.Target")
            .adapts("@v@.Target")
            .method(MethodDef::new("method@i@").returns("int"))
            .method(MethodDef::new("run").returns("str"))
            .method(MethodDef::new("add").param("int").param("int").returns("int"))
            .method(MethodDef::new("i1").returns("int").own_field()),
    );
    scope
}

fn target(scope: &Scope) -> Value {
    let class = scope.find("pkgA.Target").unwrap();
    let ctor = class.declared_constructor(&[]).unwrap();
    Value::Object(class.instantiate(ctor, &[]).unwrap())
}

fn bench_resolve(c: &mut Criterion) {
    let scope = world();
    let resolver = NameResolver::from_str(MAPPING, scope).unwrap();

    let mut group = c.benchmark_group("resolve");
    for template in ["pkgA.Target", "@v@.Target", "method@i@"] {
        group.bench_with_input(BenchmarkId::new("substitute", template), &template, |b, t| {
            b.iter(|| resolver.substitute(black_box(t)))
        });
    }
    group.bench_function("member_renamed", |b| {
        b.iter(|| resolver.resolve_member(black_box("@v@.Target"), black_box("run")))
    });
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let scope = world();
    let mirage = Mirage::new(NameResolver::from_str(MAPPING, scope.clone()).unwrap());
    let adapter = mirage.wrap("app.Target", target(&scope)).unwrap();

    let mut group = c.benchmark_group("dispatch");
    group.bench_function("templated_method", |b| {
        b.iter(|| adapter.call(black_box("method@i@"), &[]).unwrap())
    });
    group.bench_function("renamed_method", |b| {
        b.iter(|| adapter.call(black_box("run"), &[]).unwrap())
    });
    group.bench_function("two_args", |b| {
        let args = [Value::Int(2), Value::Int(3)];
        b.iter(|| adapter.call(black_box("add"), black_box(&args)).unwrap())
    });
    group.bench_function("field_getter", |b| {
        b.iter(|| adapter.call(black_box("i1"), &[]).unwrap())
    });
    group.finish();

    c.bench_function("wrap", |b| {
        let obj = target(&scope);
        b.iter(|| mirage.wrap("app.Target", black_box(obj.clone())).unwrap())
    });
}

criterion_group!(benches, bench_resolve, bench_dispatch);
criterion_main!(benches);
