//! Cleaning and consolidation throughput on synthetic messy data.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_data_cleaning::cleaning::{clean_dataset, CleaningOptions};
use rust_data_cleaning::consolidate::{merge, DatasetCollection, JoinKind};
use rust_data_cleaning::rules::{ColumnRule, ColumnRules, NullStrategy, TargetType};
use rust_data_cleaning::types::{DataSet, Schema, Value};

fn messy(rows: usize) -> DataSet {
    let schema = Schema::utf8(&["Order ID", "Customer Name", "Order Date", "Unit Price", "Notes"]);
    let rows = (0..rows)
        .map(|i| {
            vec![
                Value::Utf8(i.to_string()),
                Value::Utf8(format!("  customer   NUMBER {} ", i % 97)),
                if i % 13 == 0 {
                    Value::Null
                } else {
                    Value::Utf8(format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1))
                },
                if i % 7 == 0 {
                    Value::Null
                } else {
                    Value::Utf8(format!("{}.{}", i % 500, i % 10))
                },
                Value::Utf8(format!("free text {}", i % 5)),
            ]
        })
        .collect();
    DataSet::new(schema, rows)
}

fn rules() -> ColumnRules {
    ColumnRules::new()
        .with(
            "unit_price",
            ColumnRule::new()
                .with_type(TargetType::Numeric)
                .with_null_strategy(NullStrategy::Median),
        )
        .with(
            "order_date",
            ColumnRule::new()
                .with_type(TargetType::Date)
                .with_null_strategy(NullStrategy::ForwardFill),
        )
}

fn bench_clean(c: &mut Criterion) {
    let mut group = c.benchmark_group("clean_dataset");
    let rules = rules();
    for rows in [1_000, 10_000, 50_000] {
        let ds = messy(rows);
        group.bench_with_input(BenchmarkId::new("sequential", rows), &ds, |b, ds| {
            b.iter(|| clean_dataset(std::hint::black_box(ds), &rules, &CleaningOptions::default()).unwrap())
        });
        let parallel = CleaningOptions {
            parallel_columns: true,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("parallel_columns", rows), &ds, |b, ds| {
            b.iter(|| clean_dataset(std::hint::black_box(ds), &rules, &parallel).unwrap())
        });
    }
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    for rows in [1_000, 10_000] {
        let mut collection = DatasetCollection::new();
        collection.insert("left", messy(rows));
        collection.insert("right", messy(rows / 2));
        group.bench_with_input(BenchmarkId::new("outer", rows), &collection, |b, collection| {
            b.iter(|| merge(std::hint::black_box(collection), "order_id", JoinKind::Outer).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_clean, bench_merge);
criterion_main!(benches);
