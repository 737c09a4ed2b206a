//! # Trajectory Planner Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use arm_lib::servo_ctrl::{plan, Sample};

fn profile_benchmark(c: &mut Criterion) {
    // Cycle period the exec plans at
    let timestep_s = 0.025;

    let at_rest = Sample {
        pos_norm: 0.0,
        speed_norm: 0.0,
    };

    // Full travel from rest, the longest profile a default servo produces
    c.bench_function("plan::full_travel", |b| {
        b.iter(|| {
            plan(
                black_box(at_rest),
                black_box(1.0),
                black_box(0.35),
                black_box(0.05),
                timestep_s,
            )
        })
    });

    let at_speed = Sample {
        pos_norm: 0.5,
        speed_norm: 0.05,
    };

    // Reversal at full speed exercises the braking branch
    c.bench_function("plan::reversal", |b| {
        b.iter(|| {
            plan(
                black_box(at_speed),
                black_box(0.2),
                black_box(2.0),
                black_box(0.2),
                timestep_s,
            )
        })
    });
}

criterion_group!(benches, profile_benchmark);
criterion_main!(benches);
