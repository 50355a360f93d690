use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mapview_core::emit::{emit_array, Emissions, ExtraKeys};
use mapview_core::key;
use mapview_core::value::{FieldMap, Value};

fn document(fields: usize) -> FieldMap {
    (0..fields)
        .map(|i| {
            let name = format!("field_{i}");
            match i % 3 {
                0 => (name, Value::from(i as i64).into()),
                1 => (name, (i % 2 == 0).into()),
                _ => (name, vec![1, 2, 3].into()),
            }
        })
        .collect::<Vec<(String, mapview_core::value::FieldValue)>>()
        .into_iter()
        .collect()
}

fn bench_emit_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_array");
    let mut extra_keys = ExtraKeys::new();
    extra_keys.insert("field_1".into(), Value::from("2024-01-01"));

    for fields in [4usize, 32, 256] {
        let data = document(fields);
        let base = key!["user-1", 1_700_000_000i64];
        group.bench_with_input(BenchmarkId::from_parameter(fields), &data, |b, data| {
            b.iter(|| {
                let mut rows = Emissions::new();
                emit_array(black_box(data), &base, &extra_keys, &mut rows).unwrap();
                rows
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_emit_array);
criterion_main!(benches);
