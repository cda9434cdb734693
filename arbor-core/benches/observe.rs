//! Benchmarks for the hot paths: registration, write interception with and
//! without listeners, and batch flushing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use arbor_core::observe::Registry;
use arbor_core::value::Value;

fn bench_make(c: &mut Criterion) {
    c.bench_function("make_nested_record", |b| {
        b.iter(|| {
            let mut reg = Registry::new();
            let h = reg
                .make(Value::record([
                    ("a", Value::from(1)),
                    ("b", Value::record([("c", Value::from(2))])),
                ]))
                .unwrap();
            black_box(h)
        })
    });
}

fn bench_set(c: &mut Criterion) {
    c.bench_function("set_no_listeners", |b| {
        let mut reg = Registry::new();
        let h = reg.make(Value::record([("v", Value::from(0))])).unwrap();
        let mut i = 0_i64;
        b.iter(|| {
            i += 1;
            reg.set(h, "v", Value::from(i)).unwrap();
        })
    });

    c.bench_function("set_with_prop_listener", |b| {
        let mut reg = Registry::new();
        let h = reg.make(Value::record([("v", Value::from(0))])).unwrap();
        reg.on_prop_changed(h, |_, e| {
            black_box(&e.next);
        })
        .unwrap();
        let mut i = 0_i64;
        b.iter(|| {
            i += 1;
            reg.set(h, "v", Value::from(i)).unwrap();
        })
    });
}

fn bench_flush(c: &mut Criterion) {
    c.bench_function("burst_and_flush", |b| {
        let mut reg = Registry::new();
        let h = reg
            .make(Value::record([("a", Value::from(0)), ("b", Value::from(0))]))
            .unwrap();
        reg.on_changed(h, |_, e| {
            black_box(&e.props);
        })
        .unwrap();
        let mut i = 0_i64;
        b.iter(|| {
            i += 1;
            reg.set(h, "a", Value::from(i)).unwrap();
            reg.set(h, "b", Value::from(-i)).unwrap();
            reg.flush();
        })
    });
}

criterion_group!(benches, bench_make, bench_set, bench_flush);
criterion_main!(benches);
