//! The evaluator: a positional score in `[0,1]` for MCTS backpropagation
//! and a signed tactical score in `f64` for minimax, built from the same
//! weighted feature set. Grounded on `hiveboardgame-nokamute/src/eval.rs`'s
//! material-plus-queen-pressure shape, generalized with a fuller feature
//! table covering coordination, central control, tempo, and endgame.

use crate::engine::hex::{Hex, hex_distance};
use crate::engine::piece::{Bug, Color};
use crate::engine::rules;
use crate::engine::state::{GameResult, GameState};

/// The only externally supplied tuning knob: governs MCTS iteration budget,
/// minimax depth, and how strongly non-Queen features are weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn mcts_iterations(&self) -> u32 {
        match self {
            Difficulty::Easy => 1_000,
            Difficulty::Medium => 2_000,
            Difficulty::Hard => 3_000,
        }
    }

    pub fn minimax_depth(&self) -> u8 {
        match self {
            Difficulty::Easy => 3,
            Difficulty::Medium => 4,
            Difficulty::Hard => 5,
        }
    }

    /// Scales every feature weight except the (near-fixed) Queen-threat term.
    pub fn feature_scale(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.5,
            Difficulty::Medium => 0.8,
            Difficulty::Hard => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    /// In `[0, 1]`; 1.0 is a certain win for `ai_color`.
    pub positional: f64,
    /// Unbounded; positive favors `ai_color`.
    pub tactical: f64,
}

const QUEEN_THREAT_BONUS: [f64; 7] = [0.0, 2.0, 6.0, 16.0, 40.0, 100.0, 10_000.0];

pub fn evaluate(state: &GameState, ai_color: Color, difficulty: Difficulty) -> Scores {
    match state.result {
        GameResult::Winner(color) if color == ai_color => {
            return Scores { positional: 1.0, tactical: f64::INFINITY };
        }
        GameResult::Winner(_) => return Scores { positional: 0.0, tactical: f64::NEG_INFINITY },
        GameResult::Draw => return Scores { positional: 0.5, tactical: 0.0 },
        GameResult::Ongoing => {}
    }

    let opponent = ai_color.opposite();
    let scale = difficulty.feature_scale();

    let queen_threats = queen_threat_term(state, ai_color, opponent);
    let queen_danger = queen_danger_term(state, ai_color, opponent) * scale;
    let material = material_term(state, ai_color, opponent) * scale;
    let coordination = coordination_term(state, ai_color, opponent) * scale;
    let central = central_control_term(state, ai_color, opponent) * scale;
    let network = piece_network_term(state, ai_color, opponent) * scale;
    let tactical_patterns = tactical_patterns_term(state, ai_color, opponent) * scale;
    let tempo = tempo_term(state, ai_color, opponent) * scale;
    let circling = circling_defense_term(state, ai_color, opponent) * scale;
    let endgame = endgame_term(state, ai_color, opponent) * scale;

    let tactical = queen_threats
        + queen_danger
        + material
        + coordination
        + central
        + network
        + tactical_patterns
        + tempo
        + circling
        + endgame;

    // Map to [0,1] around a 0.5 baseline with a bounded logistic squash so a
    // single huge tactical swing cannot saturate the MCTS backprop signal.
    let positional = 0.5 + 0.5 * (tactical / 50.0).tanh();

    Scores { positional, tactical }
}

fn queen_threat_term(state: &GameState, ai: Color, opponent: Color) -> f64 {
    let own = state.queen_hex(ai).map(|h| state.board.occupied_neighbors(h).count()).unwrap_or(0);
    let opp = state
        .queen_hex(opponent)
        .map(|h| state.board.occupied_neighbors(h).count())
        .unwrap_or(0);
    QUEEN_THREAT_BONUS[opp.min(6)] - QUEEN_THREAT_BONUS[own.min(6)]
}

fn queen_danger_term(state: &GameState, ai: Color, opponent: Color) -> f64 {
    let danger_to = |queen_color: Color, attacker_color: Color| -> f64 {
        let Some(queen_hex) = state.queen_hex(queen_color) else { return 0.0 };
        let escape_routes = state.board.unoccupied_neighbors(queen_hex).count() as f64;
        let nearby_attackers = state
            .board
            .cells_with_pieces()
            .filter(|(_, stack)| {
                stack
                    .last()
                    .is_some_and(|p| p.color == attacker_color && is_mobile_attacker(p.bug))
            })
            .filter(|(hex, _)| hex_distance(*hex, queen_hex) <= 2)
            .count() as f64;
        nearby_attackers * 3.0 - escape_routes
    };

    // Higher is worse for the queen's owner, so flip sign for "danger to us".
    danger_to(opponent, ai) - danger_to(ai, opponent)
}

fn is_mobile_attacker(bug: Bug) -> bool {
    matches!(bug, Bug::Ant | Bug::Beetle | Bug::Grasshopper)
}

fn base_value(bug: Bug, phase: Phase) -> f64 {
    match (bug, phase) {
        (Bug::Queen, _) => 50.0,
        (Bug::Ant, Phase::Opening) => 25.0,
        (Bug::Ant, Phase::Middle) => 29.0,
        (Bug::Ant, Phase::Endgame) => 32.0,
        (Bug::Beetle, Phase::Opening) => 20.0,
        (Bug::Beetle, Phase::Middle) => 28.0,
        (Bug::Beetle, Phase::Endgame) => 35.0,
        (Bug::Grasshopper, Phase::Opening) => 20.0,
        (Bug::Grasshopper, Phase::Middle) => 25.0,
        (Bug::Grasshopper, Phase::Endgame) => 30.0,
        (Bug::Spider, Phase::Opening) => 10.0,
        (Bug::Spider, Phase::Middle) => 12.0,
        (Bug::Spider, Phase::Endgame) => 15.0,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Opening,
    Middle,
    Endgame,
}

fn phase(state: &GameState) -> Phase {
    match state.board.len() {
        0..=7 => Phase::Opening,
        8..=16 => Phase::Middle,
        _ => Phase::Endgame,
    }
}

fn material_term(state: &GameState, ai: Color, opponent: Color) -> f64 {
    let pins = rules::articulation_points(&state.board);
    let p = phase(state);
    let mut score = 0.0;
    for (hex, stack) in state.board.cells_with_pieces() {
        let Some(piece) = stack.last() else { continue };
        let pinned = stack.len() == 1 && pins.contains(&hex);
        let mut value = base_value(piece.bug, p);
        if pinned {
            value *= 0.2;
        }
        if piece.color == opponent {
            value = -value;
        } else if piece.color != ai {
            continue;
        }
        score += value;
    }
    score
}

fn coordination_term(state: &GameState, ai: Color, opponent: Color) -> f64 {
    let mut counted = rustc_hash::FxHashSet::default();
    let pair_bonus = |a: Bug, b: Bug| -> f64 {
        let pair = (a.min(b), a.max(b));
        match pair {
            (Bug::Beetle, Bug::Queen) => 2.0,
            (Bug::Ant, Bug::Spider) => 1.0,
            _ => 0.5,
        }
    };

    let mut score = 0.0;
    for hex in state.board.occupied_cells() {
        let Some(piece) = state.board.top_of(hex) else { continue };
        for neighbor in crate::engine::hex::neighbors(hex) {
            if counted.contains(&(neighbor, hex)) {
                continue;
            }
            let Some(other) = state.board.top_of(neighbor) else { continue };
            if other.color != piece.color {
                continue;
            }
            counted.insert((hex, neighbor));
            let bonus = pair_bonus(piece.bug, other.bug);
            score += if piece.color == ai { bonus } else { -bonus };
        }
    }
    let _ = opponent;
    score
}

fn central_control_term(state: &GameState, ai: Color, opponent: Color) -> f64 {
    state
        .board
        .cells_with_pieces()
        .filter_map(|(hex, stack)| stack.last().map(|p| (hex, *p)))
        .map(|(hex, piece)| {
            let closeness = (3 - hex_distance(hex, crate::engine::hex::Hex::ORIGIN)).max(0) as f64;
            if piece.color == ai {
                closeness
            } else if piece.color == opponent {
                -closeness
            } else {
                0.0
            }
        })
        .sum()
}

fn piece_network_term(state: &GameState, ai: Color, opponent: Color) -> f64 {
    let mut score = 0.0;
    for (hex, stack) in state.board.cells_with_pieces() {
        let Some(piece) = stack.last() else { continue };
        let same_color_neighbors = crate::engine::hex::neighbors(hex)
            .filter(|n| state.board.top_of(*n).is_some_and(|p| p.color == piece.color))
            .count();
        let penalty = if same_color_neighbors == 0 { -1.0 } else { 0.0 };
        if piece.color == ai {
            score += penalty;
        } else if piece.color == opponent {
            score -= penalty;
        }
    }
    score
}

/// Tactical patterns beyond plain pinning: forks (one piece simultaneously
/// adjacent to two high-value targets) and blockades (a piece boxed in by
/// fully occupied neighbors, immobile regardless of connectivity). Sacrifice
/// lines are a depth-search concern and are left to the minimax lookahead
/// rather than modeled as a static feature here.
fn tactical_patterns_term(state: &GameState, ai: Color, opponent: Color) -> f64 {
    fork_term(state, ai, opponent) + blockade_term(state, ai, opponent)
}

/// A fork credits an attacker simultaneously adjacent to two or more
/// high-value targets of the opposing color (that color's Queen, or any of
/// its pieces already pinned by an articulation point) — such an attacker
/// cannot be addressed by moving just one threatened piece.
fn fork_term(state: &GameState, ai: Color, opponent: Color) -> f64 {
    let pins = rules::articulation_points(&state.board);
    let is_high_value_target = |hex: Hex, target_color: Color| -> bool {
        state.board.top_of(hex).is_some_and(|p| {
            p.color == target_color
                && (p.bug == Bug::Queen || (state.board.stack_height(hex) == 1 && pins.contains(&hex)))
        })
    };

    let forking_bonus = |attacker_color: Color, target_color: Color| -> f64 {
        state
            .board
            .cells_with_pieces()
            .filter(|(_, stack)| stack.last().is_some_and(|p| p.color == attacker_color))
            .map(|(hex, _)| {
                crate::engine::hex::neighbors(hex)
                    .filter(|n| is_high_value_target(*n, target_color))
                    .count()
            })
            .filter(|&forked| forked >= 2)
            .map(|forked| (forked - 1) as f64 * 3.0)
            .sum()
    };

    forking_bonus(ai, opponent) - forking_bonus(opponent, ai)
}

/// A blockaded piece has every neighbor occupied: it cannot slide, jump (a
/// Grasshopper needs an empty landing cell), or climb off without a Beetle
/// doing the climbing. Distinct from a pin, which is about hive connectivity
/// rather than surrounding occupancy.
fn blockade_term(state: &GameState, ai: Color, opponent: Color) -> f64 {
    let blockaded_count = |color: Color| -> f64 {
        state
            .board
            .cells_with_pieces()
            .filter(|(hex, stack)| {
                stack.last().is_some_and(|p| p.color == color) && state.board.occupied_neighbors(*hex).count() == 6
            })
            .count() as f64
    };

    blockaded_count(opponent) - blockaded_count(ai)
}

fn tempo_term(state: &GameState, ai: Color, opponent: Color) -> f64 {
    let pins = rules::articulation_points(&state.board);
    let pinned_count = |color: Color| -> f64 {
        state
            .board
            .cells_with_pieces()
            .filter(|(hex, stack)| {
                stack.len() == 1
                    && stack.last().is_some_and(|p| p.color == color)
                    && pins.contains(hex)
            })
            .count() as f64
    };

    let own_queen_mobility = state
        .queen_hex(ai)
        .map(|h| state.board.unoccupied_neighbors(h).count())
        .unwrap_or(0) as f64;
    let opp_queen_mobility = state
        .queen_hex(opponent)
        .map(|h| state.board.unoccupied_neighbors(h).count())
        .unwrap_or(0) as f64;

    (pinned_count(opponent) - pinned_count(ai)) * 4.0 + (own_queen_mobility - opp_queen_mobility)
}

fn circling_defense_term(state: &GameState, ai: Color, opponent: Color) -> f64 {
    let ring_fraction = |queen_color: Color| -> f64 {
        let Some(queen_hex) = state.queen_hex(queen_color) else { return 0.0 };
        let neighbors: Vec<_> = crate::engine::hex::neighbors(queen_hex).collect();
        let occupied = neighbors.iter().filter(|h| state.board.occupied(**h)).count();
        if occupied == 0 {
            return 0.0;
        }
        let own = neighbors
            .iter()
            .filter(|h| state.board.top_of(**h).is_some_and(|p| p.color == queen_color))
            .count();
        own as f64 / occupied as f64
    };

    ring_fraction(ai) - ring_fraction(opponent)
}

fn endgame_term(state: &GameState, ai: Color, opponent: Color) -> f64 {
    if phase(state) != Phase::Endgame {
        return 0.0;
    }
    let activity_near_opponent_queen = |color: Color| -> f64 {
        let Some(opp_queen) = state.queen_hex(color.opposite()) else { return 0.0 };
        state
            .board
            .cells_with_pieces()
            .filter(|(_, stack)| stack.last().is_some_and(|p| p.color == color))
            .filter(|(hex, _)| hex_distance(*hex, opp_queen) <= 2)
            .count() as f64
    };
    (activity_near_opponent_queen(ai) - activity_near_opponent_queen(opponent)) * 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::board::Board;
    use crate::engine::hex::Hex;
    use crate::engine::piece::Piece;
    use crate::engine::state::GameState;

    fn piece(bug: Bug, color: Color) -> Piece {
        Piece { bug, color, instance: 1 }
    }

    #[test]
    fn winner_yields_saturated_scores() {
        let mut board = Board::new();
        board.push(Hex::new(0, 0), piece(Bug::Queen, Color::Black));
        for (q, r) in [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)] {
            board.push(Hex::new(q, r), piece(Bug::Ant, Color::White));
        }
        let state = GameState::from_board(board, Color::White, 10);
        assert_eq!(state.result, GameResult::Winner(Color::White));
        let scores = evaluate(&state, Color::White, Difficulty::Medium);
        assert_eq!(scores.positional, 1.0);
        assert!(scores.tactical.is_infinite() && scores.tactical.is_sign_positive());
    }

    #[test]
    fn more_threats_on_the_opponent_queen_improves_the_score() {
        let mut low = Board::new();
        low.push(Hex::new(0, 0), piece(Bug::Queen, Color::Black));
        low.push(Hex::new(5, 5), piece(Bug::Queen, Color::White));
        low.push(Hex::new(1, 0), piece(Bug::Ant, Color::White));

        let mut high = low.clone();
        high.push(Hex::new(1, -1), piece(Bug::Ant, Color::White));
        high.push(Hex::new(0, -1), piece(Bug::Ant, Color::White));

        let low_state = GameState::from_board(low, Color::White, 10);
        let high_state = GameState::from_board(high, Color::White, 10);

        let low_score = evaluate(&low_state, Color::White, Difficulty::Medium).tactical;
        let high_score = evaluate(&high_state, Color::White, Difficulty::Medium).tactical;
        assert!(high_score > low_score);
    }

    #[test]
    fn positional_score_stays_within_unit_interval() {
        let mut board = Board::new();
        board.push(Hex::new(0, 0), piece(Bug::Queen, Color::White));
        board.push(Hex::new(1, 0), piece(Bug::Queen, Color::Black));
        let state = GameState::from_board(board, Color::White, 10);
        let scores = evaluate(&state, Color::White, Difficulty::Hard);
        assert!((0.0..=1.0).contains(&scores.positional));
    }

    #[test]
    fn forking_two_pinned_pieces_beats_no_fork() {
        // Black chain (0,0)-(1,0)-(2,0)-(3,0): the middle two are articulation
        // points, so a single White attacker adjacent to both of them forks
        // two pinned, stack-height-1 targets at once.
        let mut forked = Board::new();
        forked.push(Hex::new(0, 0), piece(Bug::Queen, Color::Black));
        forked.push(Hex::new(1, 0), piece(Bug::Ant, Color::Black));
        forked.push(Hex::new(2, 0), piece(Bug::Ant, Color::Black));
        forked.push(Hex::new(3, 0), piece(Bug::Spider, Color::Black));
        forked.push(Hex::new(2, -1), piece(Bug::Ant, Color::White));
        forked.push(Hex::new(5, 5), piece(Bug::Queen, Color::White));

        let mut unforked = forked.clone();
        unforked.pop(Hex::new(2, -1));
        unforked.push(Hex::new(9, 9), piece(Bug::Ant, Color::White));

        let forked_state = GameState::from_board(forked, Color::White, 10);
        let unforked_state = GameState::from_board(unforked, Color::White, 10);

        let forked_score = evaluate(&forked_state, Color::White, Difficulty::Medium).tactical;
        let unforked_score = evaluate(&unforked_state, Color::White, Difficulty::Medium).tactical;
        assert!(forked_score > unforked_score);
    }

    #[test]
    fn a_blockaded_opponent_piece_improves_the_score() {
        let mut open = Board::new();
        open.push(Hex::new(0, 0), piece(Bug::Queen, Color::Black));
        open.push(Hex::new(10, 0), piece(Bug::Queen, Color::White));

        let mut boxed = open.clone();
        for hex in crate::engine::hex::neighbors(Hex::new(0, 0)) {
            boxed.push(hex, piece(Bug::Ant, Color::White));
        }

        let open_state = GameState::from_board(open, Color::White, 10);
        let boxed_state = GameState::from_board(boxed, Color::White, 10);

        let open_score = evaluate(&open_state, Color::White, Difficulty::Medium).tactical;
        let boxed_score = evaluate(&boxed_state, Color::White, Difficulty::Medium).tactical;
        assert!(boxed_score > open_score);
    }
}
