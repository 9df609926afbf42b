use itensor::{
    arithmetic::FallibleAdd,
    contraction::{plan_contraction, Contract},
    random::random_tensor_seeded,
    structure::{index::Index, IndexSet},
};

use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn indices(names: &[&str], dim: usize) -> Vec<Index> {
    names.iter().map(|n| Index::new(*n, dim)).collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let left = indices(&["a", "b", "c", "d", "e"], 6);
    let mut right = indices(&["f", "g"], 6);
    right.extend([left[3].clone(), left[1].clone(), left[4].clone()]);

    let lt = random_tensor_seeded(IndexSet::new(left.clone()).unwrap(), 1);
    let rt = random_tensor_seeded(IndexSet::new(right.clone()).unwrap(), 2);

    let mut reversed = left.clone();
    reversed.reverse();
    let lr = random_tensor_seeded(IndexSet::new(reversed).unwrap(), 3);

    let mut group = c.benchmark_group("contract");

    group.bench_function("plan_contraction", |b| {
        b.iter(|| plan_contraction(black_box(&left), black_box(&right)).unwrap())
    });

    group.bench_function("dense_partial_contraction", |b| {
        b.iter(|| lt.contract(black_box(&rt)).unwrap())
    });

    group.bench_function("add_reordered", |b| {
        b.iter(|| lt.add_fallible(black_box(&lr)).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
