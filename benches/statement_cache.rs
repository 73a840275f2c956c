#![allow(clippy::cast_sign_loss)]

//! Criterion benchmarks for the statement cache and the batch insert planner.
//!
//! `single_row_lookup` runs the same point query with caching enabled and with capacity
//! `0`, so the difference is the cost of compiling the statement on every call.
//! `insert_batch` compares the multi-row path against the chunked path for the same rows.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sql_stmt_middleware::prelude::*;

const LOOKUP: &str = "SELECT id, name, score FROM bench WHERE id = ?1";
const ROWS: i64 = 1_000;

fn seeded(capacity: usize) -> Database {
    let mut db = Database::open(SqliteOptions::default().with_statement_cache_capacity(capacity))
        .expect("open in-memory database");
    {
        let mut conn = db.connect();
        conn.execute_script("CREATE TABLE bench (id INTEGER PRIMARY KEY, name TEXT, score REAL);")
            .expect("create table");
        let rows: Vec<BatchRow> = (0..ROWS).map(row).collect();
        conn.insert_batch("bench", &rows).expect("seed rows");
        conn.close();
    }
    db
}

fn row(id: i64) -> BatchRow {
    BatchRow::from([
        ("id".to_string(), RowValues::Int(id)),
        ("name".to_string(), RowValues::Text(format!("name-{id}"))),
        ("score".to_string(), RowValues::Float(1.5)),
    ])
}

fn single_row_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_row_lookup");
    group.throughput(Throughput::Elements(ROWS as u64));

    for capacity in [0_usize, 32] {
        let mut db = seeded(capacity);
        let mut conn = db.connect();
        group.bench_with_input(
            BenchmarkId::new("cache_capacity", capacity),
            &capacity,
            |b, _| {
                b.iter(|| {
                    for id in 0..ROWS {
                        let rs = conn
                            .execute_read(LOOKUP, &[RowValues::Int(id)])
                            .expect("lookup");
                        black_box(rs);
                    }
                });
            },
        );
    }
    group.finish();
}

fn insert_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_batch");
    for count in [900_i64, 1_100] {
        let rows: Vec<BatchRow> = (0..count).map(row).collect();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("rows", count), &rows, |b, rows| {
            b.iter(|| {
                let mut db = Database::open_in_memory().expect("open in-memory database");
                let mut conn = db.connect();
                conn.execute_script(
                    "CREATE TABLE bench (id INTEGER PRIMARY KEY, name TEXT, score REAL);",
                )
                .expect("create table");
                black_box(conn.insert_batch("bench", rows).expect("insert batch"));
            });
        });
    }
    group.finish();
}

criterion_group!(benches, single_row_lookup, insert_batch);
criterion_main!(benches);
