//! Benchmarks for generation and the per-frame CPU path.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use morphfield::curve::{CatmullRomCurve, TubeMesh};
use morphfield::prelude::*;
use morphfield::presets;

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for count in [150usize, 1_000, 10_000] {
        let config = FieldConfig::new("bench", count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &config, |b, config| {
            b.iter(|| {
                black_box(
                    morphfield::FieldGenerator::new(config)
                        .with_seed(1)
                        .generate()
                        .unwrap(),
                )
            })
        });
    }

    group.finish();
}

fn bench_instanced_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("instanced_update");

    for count in [150usize, 1_000, 10_000] {
        let mut mode = ModeController::new();
        let config = FieldConfig::new("bench", count).with_orientation(OrientationRule::FaceAxis {
            center: Vec3::ZERO,
            wobble: 1.0,
            tumble: Vec3::new(0.5, 0.3, 0.7),
        });
        let mut field = InstancedField::new(&config, Some(7), mode.signal()).unwrap();
        let mut frame = FrameContext::default();

        group.bench_function(BenchmarkId::from_parameter(count), |b| {
            b.iter(|| {
                frame.frame += 1;
                frame.delta = 1.0 / 60.0;
                frame.elapsed += frame.delta;
                if frame.frame % 120 == 0 {
                    mode.toggle();
                }
                field.update(black_box(&frame));
                black_box(field.instances_mut().take_dirty())
            })
        });
    }

    group.finish();
}

fn bench_scene_frame(c: &mut Criterion) {
    let mut scene = TreeScene::build(Some(3)).unwrap();
    c.bench_function("tree_scene_frame", |b| {
        b.iter(|| black_box(scene.scheduler_mut().advance(1.0 / 60.0)))
    });
}

fn bench_tube_mesh(c: &mut Criterion) {
    let field = morphfield::FieldGenerator::new(&presets::ornaments())
        .with_seed(5)
        .generate()
        .unwrap();
    let curve = CatmullRomCurve::new(field.structured_positions(), 0.2, false).unwrap();

    c.bench_function("tube_mesh_300x8", |b| {
        b.iter(|| black_box(TubeMesh::build(&curve, 300, 0.03, 8)))
    });
}

criterion_group!(
    benches,
    bench_generate,
    bench_instanced_update,
    bench_scene_frame,
    bench_tube_mesh
);
criterion_main!(benches);
