//! Benchmarks for flatdb store operations

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use flatdb::{Database, FieldSpec, MatchMode};
use tempfile::TempDir;

const MAGIC: i32 = 0x0103;

fn setup_db(rows: usize) -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bench.db");

    let schema = [
        FieldSpec {
            name: "name".to_string(),
            width: 32,
        },
        FieldSpec {
            name: "city".to_string(),
            width: 16,
        },
    ];
    Database::create_file(&path, MAGIC, &schema).unwrap();

    let db = Database::open(&path).unwrap();
    for i in 0..rows {
        db.create(&[format!("Hotel{:05}", i), format!("City{}", i % 10)])
            .unwrap();
    }

    (temp_dir, db)
}

fn store_benchmarks(c: &mut Criterion) {
    let (_temp, db) = setup_db(1_000);

    c.bench_function("read_cached_row", |b| {
        b.iter(|| db.read(black_box(500)).unwrap())
    });

    c.bench_function("find_prefix_and_1k_rows", |b| {
        let criteria = vec![Some("Hotel00".to_string()), None];
        b.iter(|| db.find(black_box(&criteria), MatchMode::And))
    });

    c.bench_function("lock_unlock_cycle", |b| {
        b.iter(|| {
            let cookie = db.lock(500).unwrap();
            db.unlock(500, cookie).unwrap();
        })
    });

    c.bench_function("create_with_cache_rebuild", |b| {
        let (_temp, db) = setup_db(100);
        let row = [String::from("Transient"), String::from("Nowhere")];
        b.iter(|| db.create(black_box(&row)).unwrap())
    });
}

criterion_group!(benches, store_benchmarks);
criterion_main!(benches);
