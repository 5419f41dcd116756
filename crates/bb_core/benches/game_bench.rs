//! Game simulation benchmarks.
//!
//! Run with: cargo bench --package bb_core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use bb_core::engine::baserunning::transition;
use bb_core::engine::test_fixtures::sample_season;
use bb_core::{
    run_independent_games, BaserunningState, GameContext, GameEngine, Outcome, PlayerId, ScheduledGame,
    SimConfig,
};

fn bench_full_game(c: &mut Criterion) {
    let season = sample_season();
    let config = SimConfig::default();
    let mut group = c.benchmark_group("full_game");
    for (label, home) in [("no_dh", "HOM"), ("dh", "ALH")] {
        group.bench_with_input(BenchmarkId::from_parameter(label), &home, |b, home| {
            let mut seed = 0u64;
            b.iter(|| {
                seed += 1;
                let ctx = GameContext::new(&season, &config, "AWY", home).unwrap();
                let result = GameEngine::new(ctx, black_box(seed)).unwrap().simulate().unwrap();
                black_box(result.plate_appearances)
            });
        });
    }
    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let season = sample_season();
    let config = SimConfig::default();
    let ctx = GameContext::new(&season, &config, "AWY", "HOM").unwrap();
    let mut engine = GameEngine::new(ctx, 42).unwrap();
    for _ in 0..40 {
        engine.step().unwrap();
    }
    let snapshot = engine.snapshot();

    c.bench_function("snapshot_to_bytes", |b| b.iter(|| black_box(snapshot.to_bytes().unwrap())));
    let bytes = snapshot.to_bytes().unwrap();
    c.bench_function("snapshot_from_bytes", |b| {
        b.iter(|| black_box(bb_core::GameSnapshot::from_bytes(black_box(&bytes)).unwrap()))
    });
}

fn bench_transition(c: &mut Criterion) {
    let loaded = BaserunningState {
        outs: 1,
        first: Some(PlayerId::from("r1")),
        second: Some(PlayerId::from("r2")),
        third: Some(PlayerId::from("r3")),
    };
    let batter = PlayerId::from("bat");
    c.bench_function("transition_loaded_single", |b| {
        b.iter(|| black_box(transition(black_box(&loaded), Outcome::Single, &batter)))
    });
}

fn bench_parallel_games(c: &mut Criterion) {
    let season = sample_season();
    let config = SimConfig::default();
    let schedule: Vec<ScheduledGame> =
        (0..32).map(|i| if i % 2 == 0 { ScheduledGame::new("AWY", "HOM") } else { ScheduledGame::new("HOM", "AWY") }).collect();
    let mut group = c.benchmark_group("parallel");
    group.sample_size(10);
    group.bench_function("32_games", |b| {
        b.iter(|| black_box(run_independent_games(&season, &config, &schedule, 7).len()))
    });
    group.finish();
}

criterion_group!(benches, bench_full_game, bench_snapshot, bench_transition, bench_parallel_games);
criterion_main!(benches);
