//! Benchmarks for the MDP solvers.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tictactoe_mdp::games::tictactoe::{Mark, Opponent, Rewards, TicTacToeMdp};
use tictactoe_mdp::mdp::{
    ModelTable, PolicyIteration, SolverConfig, UpdateScheme, ValueIteration,
};

fn compile_benchmark(c: &mut Criterion) {
    let mdp = TicTacToeMdp::default();

    c.bench_function("tictactoe_compile", |b| {
        b.iter(|| ModelTable::compile(black_box(&mdp)).map(|t| t.len()))
    });
}

fn value_sweep_benchmark(c: &mut Criterion) {
    let mdp = TicTacToeMdp::default();
    let mut group = c.benchmark_group("tictactoe_value_sweep");

    for (name, config) in [
        ("in_place", SolverConfig::default()),
        (
            "synchronous",
            SolverConfig::default().with_update(UpdateScheme::Synchronous),
        ),
        (
            "parallel",
            SolverConfig::default()
                .with_update(UpdateScheme::Synchronous)
                .with_parallel(true),
        ),
    ] {
        let Ok(mut solver) = ValueIteration::new(&mdp, config) else {
            continue;
        };
        group.bench_function(name, |b| b.iter(|| black_box(solver.sweep())));
    }
    group.finish();
}

fn train_benchmark(c: &mut Criterion) {
    for opponent in [Opponent::Random, Opponent::Perfect] {
        let mdp = TicTacToeMdp::new(Mark::X, opponent, Rewards::default());

        c.bench_function(&format!("value_iteration_{:?}", opponent), |b| {
            b.iter(|| {
                let mut solver = ValueIteration::new(&mdp, SolverConfig::default()).ok()?;
                Some(solver.train().sweeps)
            })
        });

        c.bench_function(&format!("policy_iteration_{:?}", opponent), |b| {
            b.iter(|| {
                let config = SolverConfig::default().with_seed(42);
                let mut solver = PolicyIteration::new(&mdp, config).ok()?;
                Some(solver.train().rounds)
            })
        });
    }
}

criterion_group!(benches, compile_benchmark, value_sweep_benchmark, train_benchmark);
criterion_main!(benches);
