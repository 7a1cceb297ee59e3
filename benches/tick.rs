//! Benchmark for the CPU tick: one full update pass over the particle
//! buffer, script evaluation included.

use criterion::{criterion_group, criterion_main, Criterion};
use scriptdust::prelude::*;

fn bench_step(c: &mut Criterion) {
    let mut host = ScriptHost::new(true);
    host.set_init_source(
        "#{ pos: [0.0, 0.0, 0.0], col: [1.0, 1.0, 1.0], siz: 3.0, vel: [0.001, 0.0, 0.0] }",
    )
    .unwrap();
    host.set_update_source(
        r#"
        let a = i.to_float() * 0.618 + t;
        #{
            pos: [pos[0], a.sin() * 0.5, pos[2]],
            col: col,
            siz: siz,
            vel: vel,
        }
        "#,
    )
    .unwrap();

    let mut buf = ParticleBuffer::new(1000, true);
    seed(&host, &mut buf);

    c.bench_function("step_1000_particles", |b| {
        let mut t = 0.0;
        b.iter(|| {
            t += 0.016;
            step(&host, &mut buf, t)
        });
    });
}

fn bench_seed(c: &mut Criterion) {
    let mut host = ScriptHost::new(false);
    host.set_init_source("#{ pos: [i.to_float(), 0.0, 0.0], col: [1, 1, 1], siz: 2 }")
        .unwrap();

    c.bench_function("seed_1000_particles", |b| {
        let mut buf = ParticleBuffer::new(1000, false);
        b.iter(|| seed(&host, &mut buf));
    });
}

criterion_group!(benches, bench_step, bench_seed);
criterion_main!(benches);
