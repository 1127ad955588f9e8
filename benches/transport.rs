//! Transport benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tubule_simulator_x::config::Parameters;
use tubule_simulator_x::electrochemistry::{ghk_potential_mV, GhkPermeabilities};
use tubule_simulator_x::transport::TransitionBarrier;
use tubule_simulator_x::TubuleSimulation;

fn seeded_simulation() -> TubuleSimulation {
    let mut params = Parameters::default();
    params.simulation.seed = Some(1);
    TubuleSimulation::new(&params).expect("default layout has unique compartment ids")
}

fn bench_simulation_tick(c: &mut Criterion) {
    let mut sim = seeded_simulation();

    c.bench_function("simulation_tick", |b| b.iter(|| sim.step()));
}

fn bench_simulation_second(c: &mut Criterion) {
    c.bench_function("simulation_1s_at_1ms", |b| {
        b.iter_with_setup(seeded_simulation, |mut sim| {
            sim.run(black_box(1.0));
            sim
        })
    });
}

fn bench_ghk(c: &mut Criterion) {
    let p = GhkPermeabilities::default();

    c.bench_function("ghk_potential", |b| {
        b.iter(|| {
            ghk_potential_mV(
                black_box(140.0),
                black_box(12.0),
                black_box(7.0),
                black_box(5.0),
                black_box(140.0),
                black_box(110.0),
                &p,
            )
        })
    });
}

fn bench_transition_rates(c: &mut Criterion) {
    let barrier = TransitionBarrier::default();

    c.bench_function("transition_rates", |b| b.iter(|| barrier.rates(black_box(-13_090.0))));
}

criterion_group!(
    benches,
    bench_simulation_tick,
    bench_simulation_second,
    bench_ghk,
    bench_transition_rates
);
criterion_main!(benches);
