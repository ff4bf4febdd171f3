use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use keyframe_compositor::{
    motion::{EffectsResolver, EffectsTrack, InterpolationMode, PositionResolver},
    path::{self, smooth_path, Point},
};

/// A zig-zag document with `keyframes` keyframes of 12 points each
fn zigzag_document(keyframes: u32) -> String {
    (0..keyframes)
        .map(|k| {
            let points: Vec<String> = (0..12)
                .map(|i| format!("{},{}", k * 40 + i * 3, if i % 2 == 0 { 10 } else { 90 }))
                .collect();
            format!("{}:{}", k * 15, points.join(";"))
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn bench_smoothing(c: &mut Criterion) {
    let points: Vec<Point> = (0..200).map(|i| Point::new(f64::from(i), f64::from(i % 7) * 5.0)).collect();
    c.bench_function("smooth_path_200_points", |b| b.iter(|| smooth_path(black_box(&points), 10)));
}

fn bench_position_resolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("position_resolver");

    for keyframes in [4u32, 32] {
        let document = path::parse(&zigzag_document(keyframes)).expect("benchmark document parses");
        let last_frame = keyframes * 15;

        for mode in [InterpolationMode::Spline, InterpolationMode::Polyline, InterpolationMode::Legacy] {
            let resolver = PositionResolver::new(&document, mode);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", mode), keyframes),
                &last_frame,
                |b, &last_frame| {
                    b.iter(|| {
                        for frame in 0..=last_frame {
                            black_box(resolver.resolve(frame));
                        }
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_effects_resolver(c: &mut Criterion) {
    let document = path::parse(&zigzag_document(16)).expect("benchmark document parses");
    let resolver = PositionResolver::new(&document, InterpolationMode::Polyline);
    let track = EffectsTrack::parse("0:1,1,0,0,0,1|45:2,0.5,270,1,0,0.4|120:1,1,-90,0,1,1|225:0.5,0.5,10,0,0,0.2");
    let effects = EffectsResolver::new(&track);

    c.bench_function("effects_resolver_240_frames", |b| {
        b.iter(|| {
            for frame in 0..240 {
                let bracket = resolver.resolve(frame).bracket;
                black_box(effects.resolve(bracket.as_ref(), frame));
            }
        })
    });
}

criterion_group!(benches, bench_smoothing, bench_position_resolver, bench_effects_resolver);
criterion_main!(benches);
