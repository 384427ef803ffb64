//! Blob store benchmarks.
//!
//! Compares the in-memory store with the atomic file store, with and
//! without fsync.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sovra_bench::{random_data, SIZES};
use sovra_storage::{BlobStore, FileStore, MemoryStore, RelativePath};
use tempfile::TempDir;

fn bench_memory_write(c: &mut Criterion) {
    let store = MemoryStore::new();
    let path = RelativePath::new("bench.bin").unwrap();
    let mut group = c.benchmark_group("memory_write");

    for size in SIZES {
        let data = random_data(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| store.write(black_box(&path), black_box(data)).unwrap());
        });
    }

    group.finish();
}

fn bench_file_write(c: &mut Criterion) {
    let path = RelativePath::new("docs/bench.bin").unwrap();

    for (name, sync) in [("file_write_sync", true), ("file_write_nosync", false)] {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap().sync_writes(sync);
        let mut group = c.benchmark_group(name);
        // fsync dominates; keep the sample count low.
        group.sample_size(20);

        for size in SIZES {
            let data = random_data(size);
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
                b.iter(|| store.write(black_box(&path), black_box(data)).unwrap());
            });
        }

        group.finish();
    }
}

fn bench_file_read(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path()).unwrap().sync_writes(false);
    let mut group = c.benchmark_group("file_read");

    for size in SIZES {
        let path = RelativePath::new(&format!("read/{size}")).unwrap();
        store.write(&path, &random_data(size)).unwrap();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &path, |b, path| {
            b.iter(|| store.read(black_box(path)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_memory_write, bench_file_write, bench_file_read);
criterion_main!(benches);
