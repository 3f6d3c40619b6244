use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tactics_ai::arena::ArenaBuilder;
use tactics_ai::core::{EvalWeights, PlayerId, SearchConfig};
use tactics_ai::nn::{GridStateEncoder, StateEncoder, ValueNetwork};
use tactics_ai::search::SearchEngine;
use tactics_ai::state::StateSnapshot;

fn bench_snapshot(c: &mut Criterion) {
    let (grid, world) = ArenaBuilder::skirmish(7).build();
    let state = StateSnapshot::capture(&world, &world, &grid, PlayerId::new(0));

    let mut group = c.benchmark_group("snapshot");
    group.bench_function("clone", |b| b.iter(|| black_box(state.clone())));
    group.bench_function("clone_and_mutate", |b| {
        b.iter_batched(
            || state.clone(),
            |mut copy| {
                copy.add_resources(PlayerId::new(1), -10);
                copy.refresh_winner();
                copy
            },
            BatchSize::SmallInput,
        );
    });
    group.bench_function("fingerprint", |b| b.iter(|| black_box(state.fingerprint())));
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let (grid, world) = ArenaBuilder::skirmish(7).build();
    let state = StateSnapshot::capture(&world, &world, &grid, PlayerId::new(0));

    let mut group = c.benchmark_group("search");
    group.sample_size(20);
    for (name, alpha_beta) in [("minimax_depth2", false), ("alpha_beta_depth2", true)] {
        let config = SearchConfig::default().with_alpha_beta(alpha_beta).with_max_plans(30);
        let mut engine = SearchEngine::new(&grid, config, EvalWeights::default());
        group.bench_function(name, |b| {
            b.iter(|| black_box(engine.select_best_plan(&state, PlayerId::new(0), 2)));
        });
    }
    group.finish();
}

fn bench_network(c: &mut Criterion) {
    let (grid, world) = ArenaBuilder::skirmish(7).build();
    let state = StateSnapshot::capture(&world, &world, &grid, PlayerId::new(0));
    let encoder = GridStateEncoder::new(49);
    let input = encoder.encode(&state, PlayerId::new(0));
    let mut network = ValueNetwork::with_seed(encoder.input_size(), 256, 6, 42);
    let target = vec![0.5; 6];

    let mut group = c.benchmark_group("value_network");
    group.bench_function("encode", |b| b.iter(|| black_box(encoder.encode(&state, PlayerId::new(0)))));
    group.bench_function("predict", |b| b.iter(|| black_box(network.predict(&input))));
    group.bench_function("train", |b| b.iter(|| black_box(network.train(&input, &target, 0.001))));
    group.finish();
}

criterion_group!(benches, bench_snapshot, bench_search, bench_network);
criterion_main!(benches);
