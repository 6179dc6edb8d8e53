//! Benchmarks for response assembly and query building
//!
//! Run with: cargo bench

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use quantumleap_client::*;
use serde_json::{json, Value};

fn stamps(start: usize, len: usize) -> Vec<String> {
    let base = Utc.with_ymd_and_hms(2021, 6, 10, 0, 0, 0).unwrap();
    (start..start + len)
        .map(|i| (base + Duration::seconds(i as i64)).to_rfc3339())
        .collect()
}

fn entity_pages(pages: usize, page_size: usize) -> Vec<Value> {
    (0..pages)
        .map(|p| {
            let start = p * page_size;
            let temps: Vec<f64> = (start..start + page_size).map(|i| 20.0 + i as f64 * 0.1).collect();
            json!({
                "entityId": "Room1",
                "entityType": "Room",
                "index": stamps(start, page_size),
                "attributes": [
                    { "attrName": "temperature", "values": temps },
                    { "attrName": "pressure", "values": temps },
                ]
            })
        })
        .collect()
}

fn type_pages(pages: usize, entities: usize, page_size: usize) -> Vec<Value> {
    (0..pages)
        .map(|p| {
            let start = p * page_size;
            let fragments: Vec<Value> = (0..entities)
                .map(|e| {
                    json!({
                        "entityId": format!("Room{}", e),
                        "index": stamps(start, page_size),
                        "values": vec![e as f64; page_size],
                    })
                })
                .collect();
            json!({
                "entityType": "Room",
                "attrName": "temperature",
                "entities": fragments,
            })
        })
        .collect()
}

fn bench_entity_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble_entity");
    let shape = QueryShape::all(Detail::Full);
    let assembler = ResponseAssembler::default();

    for pages in [10, 100, 1000] {
        let input = entity_pages(pages, DEFAULT_PAGE_SIZE as usize);
        group.throughput(Throughput::Elements((pages * DEFAULT_PAGE_SIZE as usize) as u64));

        group.bench_with_input(BenchmarkId::from_parameter(pages), &input, |b, input| {
            b.iter(|| {
                assembler
                    .assemble_entity(black_box(input.clone()), &shape, "Room1")
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_type_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble_type");
    let shape = QueryShape::attribute("temperature", Detail::Full);

    for strategy in [MergeStrategy::Identity, MergeStrategy::Positional] {
        let assembler = ResponseAssembler::new(strategy);
        let input = type_pages(100, 20, 50);

        group.bench_function(format!("{:?}_100x20", strategy), |b| {
            b.iter(|| {
                assembler
                    .assemble_type(black_box(input.clone()), &shape, "Room")
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_sequencer(c: &mut Criterion) {
    c.bench_function("sequencer_1000_pages", |b| {
        b.iter(|| {
            let mut sequencer = PageSequencer::with_page_size(Some(5000), None, 5);
            while let Some(_request) = sequencer.next_page() {
                if sequencer.record(Ok(json!({}))).is_err() {
                    break;
                }
            }
            black_box(sequencer.pages_collected())
        })
    });
}

fn bench_create_query(c: &mut Criterion) {
    let statements: Vec<Statement> = (0..100)
        .map(|i| {
            Statement::try_from((format!("attr{}", i % 25), ">=".to_string(), i.to_string())).unwrap()
        })
        .collect();

    c.bench_function("create_query_100", |b| {
        b.iter(|| create_query(black_box(statements.clone())).unwrap())
    });
}

criterion_group!(
    benches,
    bench_entity_assembly,
    bench_type_merge,
    bench_sequencer,
    bench_create_query,
);

criterion_main!(benches);
