//! Table benchmarks: insertion, point lookup and full scan.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::tempdir;
use tinytable::{Row, Table, TableConfig};

fn make_row(id: u32) -> Row {
    Row::new(id, format!("user{}", id), format!("user{}@bench.test", id)).unwrap()
}

/// Deterministic permutation of `0..count` for count below the prime.
fn scrambled(count: u32) -> Vec<u32> {
    const PRIME: u64 = 10_007;
    (0..count as u64).map(|i| ((i * 7919) % PRIME) as u32).collect()
}

fn filled_table(count: u32) -> (Table, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let mut table = Table::open(dir.path().join("bench.db")).unwrap();
    for id in 0..count {
        table.insert(&make_row(id)).unwrap();
    }
    (table, dir)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_insert");

    for count in [100u32, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("sequential", count), count, |b, &count| {
            b.iter_with_setup(
                || {
                    let dir = tempdir().unwrap();
                    let config = TableConfig::default().with_max_pages(count + 64);
                    let table =
                        Table::open_with_config(dir.path().join("bench.db"), config).unwrap();
                    (dir, table)
                },
                |(dir, mut table)| {
                    for id in 0..count {
                        table.insert(&make_row(id)).unwrap();
                    }
                    (dir, table)
                },
            );
        });

        group.bench_with_input(BenchmarkId::new("random", count), count, |b, &count| {
            b.iter_with_setup(
                || {
                    let dir = tempdir().unwrap();
                    let table = Table::open(dir.path().join("bench.db")).unwrap();
                    (dir, table, scrambled(count))
                },
                |(dir, mut table, ids)| {
                    for id in ids {
                        table.insert(&make_row(id)).unwrap();
                    }
                    (dir, table)
                },
            );
        });
    }

    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_find");

    for count in [100u32, 1000].iter() {
        let (mut table, _dir) = filled_table(*count);
        group.bench_with_input(BenchmarkId::new("existing", count), count, |b, &count| {
            let mut id = 0;
            b.iter(|| {
                id = (id + 7) % count;
                black_box(table.find(black_box(id)).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_scan");

    for count in [100u32, 1000].iter() {
        let (mut table, _dir) = filled_table(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("full", count), count, |b, _| {
            b.iter(|| {
                for row in table.rows() {
                    black_box(row.unwrap());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_find, bench_scan);
criterion_main!(benches);
