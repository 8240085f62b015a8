use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sheetbind::execution::ExecutionOptions;
use sheetbind::grid::Grid;
use sheetbind::ingestion::{parse_all_into_list, parse_all_parallel, MemorySource, ParseOptions};
use sheetbind::schema::{Fields, Record};
use sheetbind::types::Timestamp;

#[derive(Debug, Default)]
struct Location {
    city: String,
    zip: Option<u32>,
}

impl Record for Location {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("city", |l: &mut Location| &mut l.city);
        fields.field("zip", |l: &mut Location| &mut l.zip);
    }
}

#[derive(Debug, Default)]
struct Shipment {
    id: u64,
    weight: f64,
    fragile: bool,
    shipped_at: Option<Timestamp>,
    destination: Option<Location>,
}

impl Record for Shipment {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("id", |s: &mut Shipment| &mut s.id);
        fields.field("weight", |s: &mut Shipment| &mut s.weight);
        fields.field("fragile", |s: &mut Shipment| &mut s.fragile);
        fields.field("shipped_at", |s: &mut Shipment| &mut s.shipped_at);
        fields.nested_option("destination", |s: &mut Shipment| &mut s.destination);
    }
}

fn shipments(n: usize) -> ParseOptions {
    let mut rows = vec![vec![
        "id".to_string(),
        "weight".to_string(),
        "fragile".to_string(),
        "shipped_at".to_string(),
        "city".to_string(),
        "zip".to_string(),
    ]];
    for i in 0..n {
        // every third row has no destination
        let (city, zip) = if i % 3 == 0 {
            (String::new(), String::new())
        } else {
            (format!("City{}", i % 50), format!("{}", 10_000 + i % 90_000))
        };
        rows.push(vec![
            i.to_string(),
            format!("{}.{}", i % 100, i % 10),
            (i % 2 == 0).to_string(),
            format!("2024-01-{:02} 08:{:02}:00", 1 + i % 28, i % 60),
            city,
            zip,
        ]);
    }
    let source = MemorySource::new().with_sheet("bench", "Shipments", Grid::new(rows));
    ParseOptions::new(Arc::new(source), "bench")
}

fn bench_materialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("materialize");

    for n in [1_000usize, 10_000, 100_000] {
        let options = shipments(n);

        group.bench_with_input(BenchmarkId::new("sequential", n), &options, |b, options| {
            b.iter(|| parse_all_into_list::<Shipment>(black_box(options)).unwrap())
        });

        let exec = ExecutionOptions {
            chunk_size: 2_048,
            ..ExecutionOptions::default()
        };
        group.bench_with_input(BenchmarkId::new("parallel", n), &options, |b, options| {
            b.iter(|| parse_all_parallel::<Shipment>(black_box(options), &exec).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_materialize);
criterion_main!(benches);
