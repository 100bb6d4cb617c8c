use criterion::{black_box, criterion_group, criterion_main, Criterion};
use othello::{Board, Color};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

/// A fixed mid-game position reached by seeded random play.
fn midgame() -> Board {
    let mut rng = StdRng::seed_from_u64(42);
    let mut board = Board::new();
    let mut side = Color::Black;
    for _ in 0..24 {
        if let Some(&(r, c)) = board.legal_moves(side).choose(&mut rng) {
            board = board.apply(side, r, c).expect("listed move is legal").0;
        }
        side = side.opponent();
    }
    board
}

fn bench_legal_moves(c: &mut Criterion) {
    let board = midgame();
    c.bench_function("legal_moves_midgame", |b| {
        b.iter(|| black_box(&board).legal_moves(black_box(Color::Black)))
    });
}

fn bench_apply(c: &mut Criterion) {
    let board = midgame();
    let moves = board.legal_moves(Color::Black);
    c.bench_function("apply_every_legal_move", |b| {
        b.iter(|| {
            for &(r, col) in &moves {
                black_box(board.apply(Color::Black, r, col).ok());
            }
        })
    });
}

criterion_group!(benches, bench_legal_moves, bench_apply);
criterion_main!(benches);
