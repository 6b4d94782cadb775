//! A thin self-play demonstration of [`hivemind::decide`]. Not part of the
//! library's public contract — an embedding program is free to define its
//! own CLI, persistence, or networking around the engine.

use std::time::Instant;

use clap::Parser;
use hivemind::engine::driver::CancelToken;
use hivemind::{Color, Decision, Difficulty, GameResult, GameState, Move};

#[derive(Parser)]
#[command(about = "Self-play driver over the hivemind decision engine")]
struct Args {
    /// Search strength for both sides.
    #[arg(long, value_enum, default_value = "medium")]
    difficulty: DifficultyArg,

    /// Maximum number of plies to play before giving up on a decisive result.
    #[arg(long, default_value_t = 200)]
    max_plies: u32,

    /// PRNG seed; a fixed seed reproduces the same game.
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(value: DifficultyArg) -> Difficulty {
        match value {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

fn main() {
    let args = Args::parse();
    let difficulty: Difficulty = args.difficulty.into();
    let cancel = CancelToken::new();

    let mut state = GameState::new();
    let started = Instant::now();

    for ply in 0..args.max_plies {
        if state.result != GameResult::Ongoing {
            break;
        }

        let color = state.side_to_move;
        let seed = args.seed ^ (ply as u64);
        let decision = hivemind::decide(&state, color, difficulty, seed, &cancel, &mut |_event| {});

        let mv = match decision {
            Decision::Move(mv) => mv,
            Decision::Pass => Move::Pass,
        };

        println!("ply {ply:>3} {color:?} plays {mv}");
        state = state.apply(mv).expect("decide() must only return legal moves");
    }

    let elapsed = started.elapsed();
    println!(
        "game ended after {} ply in {} with result {:?}",
        state.move_number - 1,
        humantime::format_duration(elapsed),
        state.result
    );

    for color in [Color::White, Color::Black] {
        println!("{color:?} placed {} pieces", state.placed_count(color));
    }
}
