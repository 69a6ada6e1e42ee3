use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use crate_digger::core::{generate_level, Budget, Level, LevelParams, Session, Tuning};
use crate_digger::engine::{Engine, EngineOptions, MagneticResolver, TargetResolver};
use crate_digger::types::{
    Category, Container, ContainerId, Difficulty, Mode, PointerPos, Target, Token, TokenId,
};

fn bench_generate(c: &mut Criterion) {
    let tuning = Tuning::default();

    c.bench_function("generate_level_p10", |b| {
        b.iter(|| {
            generate_level(
                black_box(LevelParams::new(10, Difficulty::Normal, false, 12345)),
                &tuning,
            )
        })
    });

    c.bench_function("generate_level_p100", |b| {
        b.iter(|| {
            generate_level(
                black_box(LevelParams::new(100, Difficulty::Hard, false, 12345)),
                &tuning,
            )
        })
    });
}

fn big_shelf() -> Level {
    let containers = vec![Container::new(ContainerId(0), Category::Rock, 64)];
    let tokens = (0..64).map(|i| Token::new(TokenId(i), Category::Rock)).collect();
    Level::handcrafted(containers, tokens, Budget::moves(Mode::Standard, 1_000))
}

fn bench_accept(c: &mut Criterion) {
    c.bench_function("session_accept_64", |b| {
        b.iter_batched(
            || Session::new(1, big_shelf(), Tuning::default(), 0, false),
            |mut s| {
                for i in 0..64 {
                    let _ = s.accept(TokenId(i), Target::Container(ContainerId(0)), i as u64 * 100);
                }
                s
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_resolve(c: &mut Criterion) {
    let mut r = MagneticResolver::default();
    for i in 0..7u16 {
        r.set_container_center(ContainerId(i), PointerPos::new(i as f32 * 150.0, 0.0));
    }
    r.set_discard_center(PointerPos::new(500.0, 400.0));

    c.bench_function("magnetic_resolve", |b| {
        b.iter(|| r.resolve(black_box(PointerPos::new(460.0, 30.0))))
    });
}

fn bench_drag_commit(c: &mut Criterion) {
    let resolver = MagneticResolver::default().with_container(ContainerId(0), PointerPos::new(0.0, 0.0));

    c.bench_function("arm_drag_commit", |b| {
        b.iter_batched(
            || {
                let mut e = Engine::new(EngineOptions::default());
                e.set_resolver(Box::new(resolver.clone()));
                e.start_level(big_shelf(), 0);
                e
            },
            |mut e| {
                let _ = e.arm_token(TokenId(0), PointerPos::new(0.0, 900.0), 0);
                for step in 0..16 {
                    let _ = e.update_pointer(PointerPos::new(0.0, 900.0 - step as f32 * 60.0));
                }
                let _ = e.commit(PointerPos::new(0.0, 0.0), 10);
                e
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_generate, bench_accept, bench_resolve, bench_drag_commit);
criterion_main!(benches);
