//! Benchmarks for the binding hot paths.
//!
//! - Invocation with evaluated values and with call-site expressions
//! - Default substitution and variadic tails
//! - Source emission
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin
//! ```

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use tether::emit::emit_native_call;
use tether::{Context, Expr, Literal, Value, VarRef};

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

/// Call at the end of each benchmark iteration to flush profiling data.
#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

fn invoke_benchmarks(c: &mut Criterion) {
    setup_profiler();

    let registry = tether::default_registry().expect("bundled modules");
    let snapshot = registry.freeze();
    let mut ctx = Context::new().with_resolver(snapshot.clone());

    let add = snapshot.find_function("add").expect("add");
    let max = snapshot.find_function("max").expect("max");
    let strpos = snapshot.find_function("strpos").expect("strpos");

    let mut group = c.benchmark_group("invoke");

    group.bench_function("values_all_args", |b| {
        let args = [Value::Long(3), Value::Long(4)];
        b.iter(|| {
            let result = add.invoke_values(&mut ctx, black_box(&args));
            end_profiling_frame();
            black_box(result)
        })
    });

    group.bench_function("values_with_default", |b| {
        let args = [Value::Long(3)];
        b.iter(|| black_box(add.invoke_values(&mut ctx, black_box(&args))))
    });

    group.bench_function("values_numeric_string", |b| {
        let args = [Value::from("12abc"), Value::from("3")];
        b.iter(|| black_box(add.invoke_values(&mut ctx, black_box(&args))))
    });

    group.bench_function("values_variadic_tail", |b| {
        let args: Vec<Value> = (0..16).map(Value::Long).collect();
        b.iter(|| black_box(max.invoke_values(&mut ctx, black_box(&args))))
    });

    group.bench_function("exprs_literals", |b| {
        let haystack = Literal(Value::from("the quick brown fox"));
        let needle = Literal(Value::from("fox"));
        let args: [&dyn Expr; 2] = [&haystack, &needle];
        b.iter(|| black_box(strpos.invoke_exprs(&mut ctx, black_box(&args))))
    });

    group.bench_function("exprs_variables", |b| {
        ctx.set_var("a", 1_i64);
        ctx.set_var("b", 2_i64);
        let (a, bv) = (VarRef::new("a"), VarRef::new("b"));
        let args: [&dyn Expr; 2] = [&a, &bv];
        b.iter(|| black_box(add.invoke_exprs(&mut ctx, black_box(&args))))
    });

    group.finish();

    let mut group = c.benchmark_group("emit");
    group.bench_function("native_call", |b| {
        let one = Literal(Value::Long(1));
        let args: [&dyn Expr; 1] = [&one];
        b.iter(|| black_box(emit_native_call(&add, black_box(&args))))
    });
    group.finish();
}

criterion_group!(benches, invoke_benchmarks);
criterion_main!(benches);
