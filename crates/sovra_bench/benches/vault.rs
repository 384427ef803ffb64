//! End-to-end vault benchmarks: path validation, encryption and the
//! atomic write together.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sovra_bench::{open_vault, random_data, SIZES};
use tempfile::TempDir;

fn bench_vault_write(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let vault = open_vault(dir.path(), false).unwrap();
    let mut group = c.benchmark_group("vault_write");

    for size in SIZES {
        let data = random_data(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| vault.write_bytes(black_box("notes/bench.bin"), black_box(data)).unwrap());
        });
    }

    group.finish();
}

fn bench_vault_read(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let vault = open_vault(dir.path(), false).unwrap();
    let mut group = c.benchmark_group("vault_read");

    for size in SIZES {
        let path = format!("notes/{size}");
        vault.write_bytes(&path, &random_data(size)).unwrap();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &path, |b, path| {
            b.iter(|| vault.read_bytes(black_box(path)).unwrap());
        });
    }

    group.finish();
}

fn bench_vault_list(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let vault = open_vault(dir.path(), false).unwrap();
    let mut group = c.benchmark_group("vault_list");

    for count in [10usize, 100, 1000] {
        for i in 0..count {
            vault.write_bytes(&format!("list{count}/f{i}"), b"x").unwrap();
        }
        let prefix = format!("list{count}");
        group.bench_with_input(BenchmarkId::from_parameter(count), &prefix, |b, prefix| {
            b.iter(|| vault.list(Some(black_box(prefix.as_str()))).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_vault_write, bench_vault_read, bench_vault_list);
criterion_main!(benches);
