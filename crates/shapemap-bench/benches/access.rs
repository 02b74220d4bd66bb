//! Record access benchmarks.
//!
//! Measures the cost of checked, name-indexed field access on runtime shapes.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shapemap_bench::fixtures::{business_key, CarFixture};
use shapemap_core::Record;

fn bench_instantiate(c: &mut Criterion) {
    let fixture = CarFixture::new();

    c.bench_function("access/instantiate", |b| {
        b.iter(|| black_box(Record::new(&fixture.maker)));
    });
}

fn bench_set_field(c: &mut Criterion) {
    let fixture = CarFixture::new();
    let mut group = c.benchmark_group("access/set");

    group.bench_function("uuid", |b| {
        let mut record = Record::new(&fixture.maker);
        let key = business_key(1, 1);
        b.iter(|| record.set_field("maker_id", black_box(key)).unwrap());
    });

    group.bench_function("string", |b| {
        let mut record = Record::new(&fixture.maker);
        b.iter(|| record.set_field("name", black_box("Renault")).unwrap());
    });

    group.bench_function("type_mismatch", |b| {
        let mut record = Record::new(&fixture.maker);
        b.iter(|| black_box(record.set_field("name", black_box(5i64)).is_err()));
    });

    group.finish();
}

fn bench_get_field(c: &mut Criterion) {
    let fixture = CarFixture::new();
    let mut record = Record::new(&fixture.maker);
    record.set_field("maker_id", business_key(1, 1)).unwrap();
    record.set_field("name", "Renault").unwrap();

    let mut group = c.benchmark_group("access/get");

    group.bench_function("get_field", |b| {
        b.iter(|| black_box(record.get_field(black_box("maker_id")).unwrap()));
    });

    group.bench_function("get_str", |b| {
        b.iter(|| black_box(record.get_str(black_box("name")).unwrap()));
    });

    group.bench_function("iterate_fields", |b| {
        b.iter(|| black_box(record.fields().count()));
    });

    group.finish();
}

criterion_group!(benches, bench_instantiate, bench_set_field, bench_get_field);
criterion_main!(benches);
