//! Benchmarks for boosted-tree fitting and single-record scoring
//!
//! Run with: cargo bench --bench scoring_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use rand::SeedableRng;
use serde_json::json;

use riskgate::pipeline::{
    train_pipeline, BoostingConfig, Classifier, Dataset, FeatureMatrix, GradientBoostedTrees,
    RawValue, TrainingConfig,
};
use riskgate::scoring::{DecisionPolicy, ScoringService};

/// Dense matrix with a target driven by the first two features (`n_features >= 2`)
fn generate_matrix(n_rows: usize, n_features: usize, seed: u64) -> (FeatureMatrix, Vec<u8>) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let names: Vec<String> = (0..n_features).map(|i| format!("feature_{}", i)).collect();

    let mut values = Vec::with_capacity(n_rows * n_features);
    let mut labels = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let row: Vec<f64> = (0..n_features).map(|_| rng.gen::<f64>() * 100.0).collect();
        let score = row[0] - row[1] + rng.gen::<f64>() * 40.0 - 20.0;
        labels.push(u8::from(score > 0.0));
        values.extend(row);
    }

    (FeatureMatrix::new(names, values), labels)
}

/// Mixed numeric/categorical application data with a 0/1 label
fn generate_dataset(n_rows: usize, seed: u64) -> Dataset {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let grades = ["A", "B", "C", "D"];

    let mut income = Vec::with_capacity(n_rows);
    let mut amount = Vec::with_capacity(n_rows);
    let mut grade = Vec::with_capacity(n_rows);
    let mut status = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let inc: f64 = rng.gen_range(20_000.0..150_000.0);
        let amt: f64 = rng.gen_range(1_000.0..40_000.0);
        let g = rng.gen_range(0..grades.len());
        let risky = amt / inc + 0.1 * g as f64 + rng.gen::<f64>() * 0.2 > 0.45;

        income.push(RawValue::Number(inc));
        amount.push(RawValue::Number(amt));
        grade.push(RawValue::from(grades[g]));
        status.push(RawValue::Number(if risky { 1.0 } else { 0.0 }));
    }

    Dataset::from_columns(vec![
        ("income".to_string(), income),
        ("loan_amount".to_string(), amount),
        ("grade".to_string(), grade),
        ("loan_status".to_string(), status),
    ])
    .expect("Failed to create dataset")
}

fn benchmark_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("boosting_fit");
    group.sample_size(10);

    for n_rows in [1_000, 10_000] {
        let (features, labels) = generate_matrix(n_rows, 20, 42);
        group.throughput(Throughput::Elements(n_rows as u64));

        group.bench_with_input(
            BenchmarkId::new("50_trees_depth_5", n_rows),
            &(features, labels),
            |b, (features, labels)| {
                b.iter(|| {
                    let mut model = GradientBoostedTrees::new(BoostingConfig {
                        n_estimators: 50,
                        ..BoostingConfig::default()
                    });
                    model.fit(black_box(features), black_box(labels)).unwrap();
                    model
                })
            },
        );
    }

    group.finish();
}

fn benchmark_single_record(c: &mut Criterion) {
    let dataset = generate_dataset(5_000, 7);
    let model = GradientBoostedTrees::new(BoostingConfig {
        n_estimators: 200,
        ..BoostingConfig::default()
    });
    let outcome =
        train_pipeline(&dataset, &TrainingConfig::default(), model).expect("training failed");
    let service = ScoringService::from_pipeline(outcome.pipeline, DecisionPolicy::default());

    let request = json!({
        "application": {
            "income": 48000.0,
            "loan_amount": 15000.0,
            "grade": "C"
        }
    });
    let body = request.to_string().into_bytes();

    let mut group = c.benchmark_group("single_record");
    group.throughput(Throughput::Elements(1));
    group.bench_function("score_value", |b| {
        b.iter(|| service.score(black_box(&request)).unwrap())
    });
    group.bench_function("score_bytes", |b| {
        b.iter(|| service.score_bytes(black_box(&body)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, benchmark_fit, benchmark_single_record);
criterion_main!(benches);
