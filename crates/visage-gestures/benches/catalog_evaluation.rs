//! Benchmarks for full-catalog evaluation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use visage_core::{FrameLandmarks, LandmarkSet, SubjectKind};
use visage_gestures::{GestureEvaluator, PredicateCatalog};

fn create_test_set(kind: SubjectKind, len: usize) -> LandmarkSet {
    let triples: Vec<[f64; 3]> = (0..len)
        .map(|i| {
            let t = i as f64 * 0.013;
            [0.5 + 0.3 * t.sin(), 0.5 + 0.3 * t.cos(), 0.01 * t]
        })
        .collect();
    LandmarkSet::from_triples(kind, 0, &triples)
}

fn benchmark_face_catalog(c: &mut Criterion) {
    let catalog = PredicateCatalog::builtin().expect("built-in catalog");

    let refined = create_test_set(SubjectKind::Face, 478);
    let plain = create_test_set(SubjectKind::Face, 468);

    c.bench_function("face_catalog_refined_mesh", |b| {
        b.iter(|| catalog.evaluate_all(black_box(&refined)))
    });

    c.bench_function("face_catalog_plain_mesh", |b| {
        b.iter(|| catalog.evaluate_all(black_box(&plain)))
    });
}

fn benchmark_full_frame(c: &mut Criterion) {
    let evaluator = GestureEvaluator::new(Arc::new(
        PredicateCatalog::builtin().expect("built-in catalog"),
    ));

    let frame = FrameLandmarks::new(
        0.0,
        vec![
            create_test_set(SubjectKind::Face, 478),
            create_test_set(SubjectKind::Pose, 33),
            create_test_set(SubjectKind::Hand, 21),
            create_test_set(SubjectKind::Hand, 21),
        ],
    );

    c.bench_function("evaluate_full_frame", |b| {
        b.iter(|| evaluator.evaluate_frame(black_box(&frame)).merged())
    });
}

criterion_group!(benches, benchmark_face_catalog, benchmark_full_frame);
criterion_main!(benches);
