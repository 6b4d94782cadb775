//! The decision driver: orchestrates the Queen-placement shortcut,
//! tactical-position detection, the minimax/MCTS dispatch, and the
//! strategic override step, returning a single [`Decision`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::engine::evaluator::Difficulty;
use crate::engine::hex::hex_distance;
use crate::engine::mcts::{self, ProgressEvent, SearchPhase};
use crate::engine::minimax;
use crate::engine::movegen::{self, Priority};
use crate::engine::piece::{Bug, Color};
use crate::engine::rules;
use crate::engine::state::{GameState, Move};

pub use crate::engine::mcts::{ProgressEvent as DriverProgressEvent, SearchPhase as DriverSearchPhase};

/// The core's single externally meaningful output: either a move to play, or
/// a pass, returned in-band when a color has no legal move available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Move(Move),
    Pass,
}

/// A bool-valued observable the driver polls at yield points. Cloning shares
/// the same underlying flag; `cancel()` is typically called from outside
/// the decision (a UI thread, a test harness).
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A pin's urgency for the override step: how many of our own
/// pieces are currently pinned (an articulation point holding a single-piece
/// stack, or a piece covered by a Beetle), weighted up sharply when the
/// Queen herself is among them.
fn pin_severity(state: &GameState, color: Color) -> u32 {
    let articulation = rules::articulation_points(&state.board);
    let mut severity = 0u32;

    for (hex, stack) in state.board.cells_with_pieces() {
        let Some(top) = stack.last() else { continue };
        if top.color != color {
            continue;
        }
        let covered_by_beetle = stack.len() > 1;
        let pinned_by_articulation = stack.len() == 1 && articulation.contains(&hex);
        if !covered_by_beetle && !pinned_by_articulation {
            continue;
        }
        severity += if top.bug == Bug::Queen { 10 } else { 5 };
    }

    severity
}

/// The tactical-position detector: any one of these conditions is enough to
/// prefer exact minimax lookahead over MCTS sampling.
fn is_tactical_position(state: &GameState, color: Color) -> bool {
    let opponent = color.opposite();

    let queen_neighbor_count = |c: Color| -> usize {
        state.queen_hex(c).map(|h| state.board.occupied_neighbors(h).count()).unwrap_or(0)
    };
    if queen_neighbor_count(color) >= 3 || queen_neighbor_count(opponent) >= 3 {
        return true;
    }

    if let (Some(own_q), Some(opp_q)) = (state.queen_hex(color), state.queen_hex(opponent)) {
        if hex_distance(own_q, opp_q) <= 4 {
            return true;
        }
    }

    let total_pinned = pin_count(state, Color::White) + pin_count(state, Color::Black);
    if total_pinned >= 2 {
        return true;
    }

    if state.board.len() <= 8 {
        return true;
    }

    if let Some(own_q) = state.queen_hex(color) {
        let opponent_beetle_nearby = state.board.cells_with_pieces().any(|(hex, stack)| {
            stack.last().is_some_and(|p| p.color == opponent && p.bug == Bug::Beetle)
                && hex_distance(hex, own_q) <= 2
        });
        if opponent_beetle_nearby {
            return true;
        }
    }

    movegen::legal_moves(state, color).len() <= 3
}

fn pin_count(state: &GameState, color: Color) -> usize {
    let articulation = rules::articulation_points(&state.board);
    state
        .board
        .cells_with_pieces()
        .filter(|(hex, stack)| {
            stack.last().is_some_and(|p| p.color == color)
                && (stack.len() > 1 || articulation.contains(hex))
        })
        .count()
}

/// Decides the next move for `ai_color` in `state`. `seed` drives the
/// deterministic PRNG used by MCTS playouts, so a fixed
/// `(state, seed, difficulty)` always yields the same decision.
pub fn decide(
    state: &GameState,
    ai_color: Color,
    difficulty: Difficulty,
    seed: u64,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(ProgressEvent),
) -> Decision {
    let moves = movegen::legal_moves(state, ai_color);

    if moves == [Move::Pass] {
        return Decision::Pass;
    }

    if state.must_place_queen_this_turn(ai_color) {
        let mut tagged: Vec<_> = moves
            .iter()
            .filter(|m| matches!(m, Move::Placement { bug: Bug::Queen, .. }))
            .map(|&m| movegen::tag_move(state, ai_color, m))
            .collect();
        tagged.sort_by(|a, b| a.priority.cmp(&b.priority).then(b.value.total_cmp(&a.value)));
        if let Some(best) = tagged.first() {
            return Decision::Move(best.mv);
        }
    }

    if moves.len() == 1 {
        return Decision::Move(moves[0]);
    }

    if is_tactical_position(state, ai_color) {
        let outcome = minimax::search(state, ai_color, difficulty);
        progress(ProgressEvent {
            phase: SearchPhase::Minimax,
            iteration: 1,
            total: 1,
            tree_size: outcome.nodes_visited as usize,
        });
        if outcome.is_interesting() {
            if let Some(mv) = outcome.mv {
                return Decision::Move(mv);
            }
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let cancel_check = || cancel.is_cancelled();
    let mcts_outcome = mcts::search(state, ai_color, difficulty, &mut rng, &cancel_check, progress);

    if let Some(winning) = mcts_outcome.root_children.iter().find(|c| c.priority == Priority::WinningMove)
    {
        return Decision::Move(winning.mv);
    }

    let severe_pin_escape = mcts_outcome
        .root_children
        .iter()
        .filter(|c| matches!(c.priority, Priority::EmergencyDefense | Priority::PinEscape))
        .find(|_| pin_severity(state, ai_color) >= 10);
    if let Some(escape) = severe_pin_escape {
        return Decision::Move(escape.mv);
    }

    Decision::Move(mcts_outcome.chosen_move)
}
