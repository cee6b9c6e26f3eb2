use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_engine::{Members, TypeRef, Value};

fn sleeper_hierarchy(levels: usize) -> TypeRef {
    let base = TypeRef::new_base("Base");
    let mut ty = base
        .extend(
            "Level0",
            Members::new()
                .value("counter", 0)
                .method("sleep", |this, _args| {
                    let n = this.get("counter")?.as_int().unwrap_or(0);
                    this.set("counter", n + 1)?;
                    Ok(Value::Undefined)
                }),
            Members::new(),
        )
        .unwrap();

    for level in 1..levels {
        ty = ty
            .extend(
                format!("Level{}", level),
                Members::new().method("sleep", |this, args| {
                    this.call_super(args)?;
                    let n = this.get("counter")?.as_int().unwrap_or(0);
                    this.set("counter", n + 1)?;
                    Ok(Value::Undefined)
                }),
                Members::new(),
            )
            .unwrap();
    }
    ty
}

fn bench_super_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("super_chain");

    for levels in [1usize, 2, 4, 8] {
        let ty = sleeper_hierarchy(levels);
        let obj = ty.instantiate(&[]).unwrap();
        group.bench_with_input(BenchmarkId::new("sleep", levels), &obj, |b, obj| {
            b.iter(|| obj.call(black_box("sleep"), &[]).unwrap());
        });
    }

    group.finish();
}

fn bench_private_dispatch(c: &mut Criterion) {
    let base = TypeRef::new_base("Base");
    let ty = base
        .extend(
            "Secretive",
            Members::new()
                .method("__step", |this, _args| {
                    let n = this.get("__n")?.as_int().unwrap_or(0);
                    this.set("__n", n + 1)?;
                    Ok(Value::Undefined)
                })
                .method("step", |this, _args| this.call("__step", &[])),
            Members::new(),
        )
        .unwrap();
    let obj = ty.instantiate(&[]).unwrap();

    c.bench_function("private_step", |b| {
        b.iter(|| obj.call(black_box("step"), &[]).unwrap());
    });
}

fn bench_extend(c: &mut Criterion) {
    let base = TypeRef::new_base("Base");

    c.bench_function("extend_type", |b| {
        b.iter(|| {
            base.extend(
                "Transient",
                Members::new()
                    .value("a", 1)
                    .method("m", |_this, _args| Ok(Value::Undefined)),
                Members::new().value("s", 2),
            )
            .unwrap()
        });
    });
}

criterion_group!(benches, bench_super_chain, bench_private_dispatch, bench_extend);
criterion_main!(benches);
