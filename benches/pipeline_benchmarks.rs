use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use drivedupe::duplicates::{group_duplicates_structured, DuplicateFinder};
use drivedupe::resolver::PathResolver;
use drivedupe::source::{FileRecord, FolderNode, MemorySource};

// Binary folder tree of the given depth; files are spread over the leaves.
fn setup_source(depth: u32, files: usize) -> MemorySource {
    let mut source = MemorySource::new();
    let mut leaves = Vec::new();
    let total = (1usize << depth) - 1;

    for i in 0..total {
        let parent = (i > 0).then(|| format!("dir_{}", (i - 1) / 2));
        source = source.with_folder(FolderNode::new(format!("dir_{i}"), format!("d{i}"), parent.as_deref()));
        if i >= total / 2 {
            leaves.push(format!("dir_{i}"));
        }
    }

    for i in 0..files {
        let parent = leaves[i % leaves.len()].clone();
        // One file in four shares its hash with another.
        let hash = if i % 4 == 0 { format!("dup_{}", i / 8) } else { format!("u_{i}") };
        source = source.with_file(FileRecord::new(format!("f{i}"), format!("file_{i}"), hash, 1024, vec![parent]));
    }
    source
}

// 1. Grouping Benchmarks
fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping");
    for count in [1_000, 100_000] {
        let source = setup_source(4, count);
        group.bench_with_input(BenchmarkId::from_parameter(count), source.files(), |b, files| {
            b.iter(|| black_box(group_duplicates_structured(files)));
        });
    }
    group.finish();
}

// 2. Path Resolution Benchmarks (cold cache each iteration)
fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    for depth in [4, 10] {
        let source = setup_source(depth, 10_000);
        group.bench_with_input(BenchmarkId::new("depth", depth), &source, |b, source| {
            b.iter(|| {
                let mut resolver = PathResolver::new(source);
                black_box(resolver.resolve_paths(source.files()))
            });
        });
    }
    group.finish();
}

// 3. Full Pipeline Benchmark
fn bench_pipeline(c: &mut Criterion) {
    let source = setup_source(8, 10_000);
    c.bench_function("pipeline_10k_files", |b| {
        b.iter(|| black_box(DuplicateFinder::with_defaults(&source).find_duplicates()))
    });
}

criterion_group!(benches, bench_grouping, bench_resolution, bench_pipeline);
criterion_main!(benches);
