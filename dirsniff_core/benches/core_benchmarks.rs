use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dirsniff_core::{ComparisonEngine, IgnoreRules, TreeWalker};
use std::fs;
use std::io::Write as IoWrite;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

// Helper to create test directory structure
fn create_test_tree(root: &Path, depth: usize, files_per_dir: usize, file_size: usize, fill: u8) {
    if depth == 0 {
        return;
    }

    for i in 0..files_per_dir {
        let file_path = root.join(format!("file_{}.txt", i));
        let mut file = fs::File::create(&file_path).unwrap();
        let content = vec![fill; file_size];
        file.write_all(&content).unwrap();
    }

    if depth > 1 {
        for i in 0..3 {
            let dir_path = root.join(format!("subdir_{}", i));
            fs::create_dir(&dir_path).unwrap();
            create_test_tree(&dir_path, depth - 1, files_per_dir, file_size, fill);
        }
    }
}

fn bench_walker(c: &mut Criterion) {
    c.bench_function("walker_medium_tree", |b| {
        let temp = TempDir::new().unwrap();
        create_test_tree(temp.path(), 3, 10, 1024, b'x');
        let walker = TreeWalker::new(Arc::new(IgnoreRules::none()));

        b.iter(|| {
            let count = walker.walk(black_box(temp.path())).unwrap().count();
            black_box(count);
        });
    });
}

fn bench_walker_with_ignore(c: &mut Criterion) {
    c.bench_function("walker_with_ignore_patterns", |b| {
        let temp = TempDir::new().unwrap();
        create_test_tree(temp.path(), 3, 10, 1024, b'x');
        let rules = IgnoreRules::new(["subdir_1", "build"], ["*.o", "file_[0-4].txt"]).unwrap();
        let walker = TreeWalker::new(Arc::new(rules));

        b.iter(|| {
            let count = walker.walk(black_box(temp.path())).unwrap().count();
            black_box(count);
        });
    });
}

fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare");

    for (label, right_fill) in [("identical", b'x'), ("all_different", b'y')] {
        group.bench_with_input(BenchmarkId::from_parameter(label), &right_fill, |b, &fill| {
            let temp = TempDir::new().unwrap();
            let left = temp.path().join("left");
            let right = temp.path().join("right");
            fs::create_dir(&left).unwrap();
            fs::create_dir(&right).unwrap();
            create_test_tree(&left, 2, 10, 16 * 1024, b'x');
            create_test_tree(&right, 2, 10, 16 * 1024, fill);

            let engine = ComparisonEngine::new(IgnoreRules::none());
            b.iter(|| {
                let result = engine.compare(black_box(&left), black_box(&right)).unwrap();
                black_box(result);
            });
        });
    }

    group.finish();
}

fn bench_compare_parallel(c: &mut Criterion) {
    c.bench_function("compare_parallel_content", |b| {
        let temp = TempDir::new().unwrap();
        let left = temp.path().join("left");
        let right = temp.path().join("right");
        fs::create_dir(&left).unwrap();
        fs::create_dir(&right).unwrap();
        create_test_tree(&left, 3, 10, 64 * 1024, b'x');
        create_test_tree(&right, 3, 10, 64 * 1024, b'x');

        let engine = ComparisonEngine::new(IgnoreRules::none()).with_parallel_content(true);
        b.iter(|| {
            let result = engine.compare(black_box(&left), black_box(&right)).unwrap();
            black_box(result);
        });
    });
}

criterion_group!(walker_benches, bench_walker, bench_walker_with_ignore);

criterion_group!(comparison_benches, bench_compare, bench_compare_parallel);

criterion_main!(walker_benches, comparison_benches);
