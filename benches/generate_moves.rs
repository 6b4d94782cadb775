use criterion::{Criterion, criterion_group, criterion_main};
use hivemind::engine::board::Board;
use hivemind::engine::hex::Hex;
use hivemind::engine::movegen::legal_moves;
use hivemind::engine::state::GameState;
use hivemind::{Bug, Color};

fn piece(bug: Bug, color: Color, instance: u8) -> hivemind::Piece {
    hivemind::Piece { bug, color, instance }
}

fn mid_game() -> GameState {
    let mut board = Board::new();
    board.push(Hex::new(0, 0), piece(Bug::Ant, Color::White, 1));
    board.push(Hex::new(0, -1), piece(Bug::Queen, Color::White, 1));
    board.push(Hex::new(0, 1), piece(Bug::Queen, Color::Black, 1));
    board.push(Hex::new(1, 1), piece(Bug::Ant, Color::Black, 1));
    GameState::from_board(board, Color::White, 10)
}

fn complex_game() -> GameState {
    let mut board = Board::new();
    let white = [
        (Bug::Ant, Hex::new(3, -3)),
        (Bug::Spider, Hex::new(2, -3)),
        (Bug::Beetle, Hex::new(1, -2)),
        (Bug::Ant, Hex::new(2, -2)),
        (Bug::Grasshopper, Hex::new(1, -1)),
        (Bug::Queen, Hex::new(2, -1)),
        (Bug::Beetle, Hex::new(3, -1)),
        (Bug::Spider, Hex::new(3, 0)),
    ];
    let black = [
        (Bug::Grasshopper, Hex::new(0, -1)),
        (Bug::Queen, Hex::new(1, 0)),
        (Bug::Ant, Hex::new(2, 0)),
        (Bug::Ant, Hex::new(0, 0)),
        (Bug::Spider, Hex::new(-1, 1)),
    ];
    let mut instance = 1;
    for (bug, hex) in white {
        board.push(hex, piece(bug, Color::White, instance));
        instance += 1;
    }
    instance = 1;
    for (bug, hex) in black {
        board.push(hex, piece(bug, Color::Black, instance));
        instance += 1;
    }
    board.push(Hex::new(2, 0), piece(Bug::Beetle, Color::Black, 2));
    GameState::from_board(board, Color::White, 18)
}

fn high_density_game() -> GameState {
    let mut board = Board::new();
    let ring: Vec<Hex> = hivemind::engine::hex::neighbors(Hex::ORIGIN).collect();
    board.push(Hex::ORIGIN, piece(Bug::Queen, Color::White, 1));
    let kinds = [Bug::Ant, Bug::Beetle, Bug::Grasshopper, Bug::Spider, Bug::Ant, Bug::Beetle];
    for (i, (hex, bug)) in ring.iter().zip(kinds.iter()).enumerate() {
        let color = if i % 2 == 0 { Color::Black } else { Color::White };
        board.push(*hex, piece(*bug, color, (i + 1) as u8));
    }
    let outer: Vec<Hex> = ring.iter().flat_map(|h| hivemind::engine::hex::neighbors(*h)).collect();
    for (i, hex) in outer.into_iter().enumerate() {
        if board.occupied(hex) {
            continue;
        }
        if i % 3 == 0 {
            board.push(hex, piece(Bug::Spider, Color::Black, (10 + i) as u8));
        }
    }
    board.push(Hex::new(5, -5), piece(Bug::Queen, Color::Black, 1));
    GameState::from_board(board, Color::White, 20)
}

fn beetle_stack_game() -> GameState {
    let mut board = Board::new();
    board.push(Hex::new(0, 0), piece(Bug::Queen, Color::White, 1));
    board.push(Hex::new(1, 0), piece(Bug::Queen, Color::Black, 1));
    board.push(Hex::new(1, 0), piece(Bug::Beetle, Color::White, 1));
    board.push(Hex::new(1, 0), piece(Bug::Beetle, Color::Black, 1));
    board.push(Hex::new(0, -1), piece(Bug::Ant, Color::White, 1));
    board.push(Hex::new(-1, 0), piece(Bug::Ant, Color::Black, 2));
    GameState::from_board(board, Color::White, 8)
}

fn bench_generate_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_moves");

    let games = [
        ("mid", mid_game()),
        ("complex", complex_game()),
        ("high_density", high_density_game()),
        ("beetle_stack", beetle_stack_game()),
    ];

    for (name, state) in games.iter() {
        group.bench_with_input(format!("moves {name}"), state, |b, state| {
            b.iter(|| legal_moves(state, state.side_to_move))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_generate_moves);
criterion_main!(benches);
