use arbor::criterion::{gini_impurity, std_dev};
use arbor::{DecisionTree, Row, TrainParam, Value};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

fn synthetic_rows(n: usize, regression: bool) -> Vec<Row> {
    let mut rng = StdRng::seed_from_u64(0);
    (0..n)
        .map(|_| {
            let x: Vec<f64> = (0..6).map(|_| rng.gen_range(0.0..100.0)).collect();
            let c: i64 = rng.gen_range(0..8);
            let target = if regression {
                Value::Measurement(x[0] * 2.0 + x[1] - x[2] * 0.5 + c as f64 + rng.gen_range(-5.0..5.0))
            } else {
                Value::Category(((x[0] + x[1]) / 50.0) as i64 + c % 2)
            };
            let mut row = vec![target];
            row.extend(x.into_iter().map(Value::Measurement));
            row.push(Value::Category(c));
            row
        })
        .collect()
}

pub fn tree_benchmarks(c: &mut Criterion) {
    let counts: Vec<usize> = (0..16).map(|i| i * 37 % 101).collect();
    c.bench_function("gini impurity", |b| b.iter(|| gini_impurity(black_box(&counts))));
    let ys: Vec<f64> = (0..10_000).map(|i| (i % 97) as f64).collect();
    c.bench_function("std dev", |b| b.iter(|| std_dev(black_box(&ys))));

    let class_rows = synthetic_rows(10_000, false);
    let value_rows = synthetic_rows(10_000, true);
    let param = TrainParam::default().set_max_depth(10);

    let mut group = c.benchmark_group("train_tree");
    group.warm_up_time(Duration::from_secs(3));
    group.sample_size(10);
    group.bench_function("classification", |b| {
        b.iter(|| {
            let mut tree = DecisionTree::new();
            tree.train(black_box(&class_rows), black_box(&param)).unwrap();
        })
    });
    group.bench_function("regression", |b| {
        b.iter(|| {
            let mut tree = DecisionTree::new();
            tree.train(black_box(&value_rows), black_box(&param)).unwrap();
        })
    });
    group.bench_function("regression serial", |b| {
        let serial = param.clone().set_parallel(false);
        b.iter(|| {
            let mut tree = DecisionTree::new();
            tree.train(black_box(&value_rows), black_box(&serial)).unwrap();
        })
    });
    group.finish();

    let mut tree = DecisionTree::new();
    tree.train(&value_rows, &param).unwrap();
    println!("{} nodes", tree.n_nodes());
    c.bench_function("evaluate", |b| b.iter(|| tree.evaluate(black_box(&value_rows)).unwrap()));
    c.bench_function("evaluate parallel", |b| {
        b.iter(|| tree.evaluate_parallel(black_box(&value_rows)).unwrap())
    });
}

criterion_group!(benches, tree_benchmarks);
criterion_main!(benches);
