//! Criterion benchmarks for the density accumulator and the learning loop.
//!
//! Run with:
//!   cargo bench
//!   cargo bench --features parallel
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use gridpeak::density::kernel_surface;
use gridpeak::prelude::*;
use gridpeak::prng::Prng;

fn random_walk(len: usize, seed: u64) -> Vec<Position> {
    let grid = Grid::two_rooms();
    let mut rng = Prng::new(seed);
    let mut pos = Position::new(1, 1);
    (0..len)
        .map(|_| {
            let a = Action::ALL[rng.gen_range_usize(0, Action::COUNT)];
            pos = grid.attempt_move(pos, a);
            pos
        })
        .collect()
}

/// Kernel surface cost grows linearly with trajectory length.
fn bench_kernel_surface(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel_surface");

    for len in [10usize, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*len as u64));
        let traj = random_walk(*len, 42);
        group.bench_with_input(BenchmarkId::new("trajectory", len), &traj, |b, traj| {
            b.iter(|| black_box(kernel_surface(black_box(traj))));
        });
    }

    group.finish();
}

fn bench_density_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("density_update");

    for (name, reached) in [("success", true), ("failure", false)] {
        group.bench_function(name, |b| {
            let mut db = DensityAccumulator::new(DensityConfig::default()).unwrap();
            let traj = random_walk(200, 7);
            b.iter(|| black_box(db.update(traj.clone(), reached)));
        });
    }

    group.finish();
}

/// Full episodes: environment, value updates, density update.
fn bench_episode(c: &mut Criterion) {
    let mut group = c.benchmark_group("episode");

    group.bench_function("two_rooms_1000_steps", |b| {
        let env = Environment::new(Grid::two_rooms(), 0.1, 1).unwrap();
        let table = ValueTable::new(QConfig::default(), 2);
        let density = DensityAccumulator::new(DensityConfig::default()).unwrap();
        let mut trainer =
            Trainer::new(env, table, density, ExplorationSchedule::default()).unwrap();

        b.iter(|| black_box(trainer.run_episode(1000).steps));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_kernel_surface,
    bench_density_update,
    bench_episode
);
criterion_main!(benches);
