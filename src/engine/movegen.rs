//! Move generation and the strategic filter/tag layer that labels
//! candidates for the driver and MCTS root bias.

use itertools::Itertools;
use rustc_hash::FxHashSet;
use strum::IntoEnumIterator;

use crate::engine::evaluator::Difficulty;
use crate::engine::hex::{Hex, is_adjacent, neighbors};
use crate::engine::piece::{Bug, Color};
use crate::engine::rules;
use crate::engine::state::{GameState, Move};

/// All legal moves for `color` in `state`. Returns `[Move::Pass]` when no
/// placement or movement is available, signaling the no-legal-moves case
/// in-band rather than returning an empty vector.
pub fn legal_moves(state: &GameState, color: Color) -> Vec<Move> {
    let mut moves: Vec<Move> = placement_moves(state, color)
        .into_iter()
        .chain(movement_moves(state, color))
        .collect();

    if moves.is_empty() {
        moves.push(Move::Pass);
    }
    moves
}

/// The empty cells at which `color` may place a new piece, ignoring which
/// bug kinds are actually available (queen-by-4th-move / tournament-opening
/// filtering happens in [`placement_moves`]).
pub fn placement_zones(state: &GameState, color: Color) -> FxHashSet<Hex> {
    if state.board.is_empty() {
        let mut zones = FxHashSet::default();
        zones.insert(Hex::ORIGIN);
        return zones;
    }

    let color_has_pieces = state.board.cells_with_pieces().any(|(_, stack)| {
        stack.iter().any(|p| p.color == color)
    });

    if !color_has_pieces {
        // First placement for this color: anywhere adjacent to any opponent piece.
        return state
            .board
            .occupied_cells()
            .flat_map(neighbors)
            .filter(|hex| !state.board.occupied(*hex))
            .collect();
    }

    state
        .board
        .occupied_cells()
        .filter(|hex| state.board.top_of(*hex).is_some_and(|p| p.color == color))
        .flat_map(neighbors)
        .filter(|hex| !state.board.occupied(*hex))
        .filter(|hex| !is_adjacent_to_color(state, *hex, color.opposite()))
        .collect()
}

fn is_adjacent_to_color(state: &GameState, hex: Hex, color: Color) -> bool {
    neighbors(hex).any(|n| state.board.top_of(n).is_some_and(|p| p.color == color))
}

fn placement_moves(state: &GameState, color: Color) -> Vec<Move> {
    let zones = placement_zones(state, color);
    if zones.is_empty() {
        return Vec::new();
    }

    let bugs: Vec<Bug> = if state.must_place_queen_this_turn(color) {
        vec![Bug::Queen]
    } else {
        Bug::iter()
            .filter(|bug| state.reserve_count(color, *bug) > 0)
            .filter(|bug| !(*bug == Bug::Queen && state.queen_forbidden_this_turn(color)))
            .collect()
    };

    zones
        .into_iter()
        .cartesian_product(bugs)
        .map(|(hex, bug)| Move::Placement { bug, hex })
        .collect()
}

fn movement_moves(state: &GameState, color: Color) -> Vec<Move> {
    if !state.queen_placed(color) {
        return Vec::new();
    }

    let mut moves = Vec::new();
    let pieces: Vec<Hex> = state
        .board
        .occupied_cells()
        .filter(|hex| state.board.top_of(*hex).is_some_and(|p| p.color == color))
        .collect();

    for hex in pieces {
        let bug = state.board.top_of(hex).unwrap().bug;
        let origin_vacates = state.board.stack_height(hex) == 1;

        if origin_vacates && !is_connected_after_removal(state, hex) {
            // Removing this piece alone would split the hive; it is pinned.
            continue;
        }

        let destinations = match bug {
            Bug::Queen => queen_destinations(state, hex),
            Bug::Beetle => beetle_destinations(state, hex, origin_vacates),
            Bug::Grasshopper => grasshopper_destinations(state, hex),
            Bug::Ant => rules::allowed_slide_destinations(&state.board, hex, hex),
            Bug::Spider => spider_destinations(state, hex),
        };

        moves.extend(destinations.into_iter().map(|to| Move::Movement { from: hex, to }));
    }

    moves
}

fn is_connected_after_removal(state: &GameState, hex: Hex) -> bool {
    let mut occupied: FxHashSet<Hex> = state.board.occupied_cells().collect();
    occupied.remove(&hex);
    occupied.len() <= 1 || {
        let mut seen = FxHashSet::default();
        let Some(&start) = occupied.iter().next() else { return true };
        let mut frontier = vec![start];
        seen.insert(start);
        while let Some(current) = frontier.pop() {
            for n in neighbors(current) {
                if occupied.contains(&n) && seen.insert(n) {
                    frontier.push(n);
                }
            }
        }
        seen.len() == occupied.len()
    }
}

fn queen_destinations(state: &GameState, hex: Hex) -> FxHashSet<Hex> {
    neighbors(hex)
        .filter(|to| !state.board.occupied(*to))
        .filter(|to| rules::slide_is_allowed(&state.board, hex, *to, None))
        .filter(|to| !rules::move_would_break_hive(&state.board, hex, *to, true))
        .collect()
}

fn beetle_destinations(state: &GameState, hex: Hex, origin_vacates: bool) -> FxHashSet<Hex> {
    neighbors(hex)
        .filter(|to| {
            let is_ground_slide = origin_vacates && !state.board.occupied(*to);
            if is_ground_slide {
                rules::slide_is_allowed(&state.board, hex, *to, None)
            } else {
                true
            }
        })
        .filter(|to| !rules::move_would_break_hive(&state.board, hex, *to, origin_vacates))
        .collect()
}

fn grasshopper_destinations(state: &GameState, hex: Hex) -> FxHashSet<Hex> {
    let mut destinations = FxHashSet::default();
    for direction in crate::engine::hex::Direction::ALL {
        let first_step = crate::engine::hex::neighbor(hex, direction);
        if !state.board.occupied(first_step) {
            continue;
        }
        let mut current = first_step;
        while state.board.occupied(current) {
            current = crate::engine::hex::neighbor(current, direction);
        }
        if !rules::move_would_break_hive(&state.board, hex, current, true) {
            destinations.insert(current);
        }
    }
    destinations
}

fn spider_destinations(state: &GameState, origin: Hex) -> FxHashSet<Hex> {
    let mut finals = FxHashSet::default();
    let mut visited = vec![origin];
    walk_spider(state, origin, origin, &mut visited, 3, &mut finals);
    finals
}

fn walk_spider(
    state: &GameState,
    origin: Hex,
    current: Hex,
    visited: &mut Vec<Hex>,
    steps_remaining: u8,
    finals: &mut FxHashSet<Hex>,
) {
    if steps_remaining == 0 {
        finals.insert(current);
        return;
    }

    for to in neighbors(current) {
        if state.board.occupied(to) || visited.contains(&to) {
            continue;
        }
        if !rules::slide_is_allowed(&state.board, current, to, Some(origin)) {
            continue;
        }
        let touches_hive = state.board.occupied_neighbors(to).any(|n| n != origin);
        if !touches_hive {
            continue;
        }
        visited.push(to);
        let last_step = steps_remaining == 1;
        if !last_step || !rules::move_would_break_hive(&state.board, origin, to, true) {
            walk_spider(state, origin, to, visited, steps_remaining - 1, finals);
        }
        visited.pop();
    }
}

/// Fixed opening-pattern table (SPEC_FULL.md §4.5): for each difficulty, a
/// preferred bug kind for a color's 1st/2nd/3rd own-move, chosen to spread
/// mobile pieces before the Queen placement is forced on move 4. Indexed by
/// `own_move_number(color) - 1`; only consulted for `own_move_number` 1..=3.
const OPENING_PATTERNS: [[Bug; 3]; 3] = [
    // Easy: simple, unhurried development.
    [Bug::Spider, Bug::Beetle, Bug::Ant],
    // Medium: lead with the Grasshopper so the Ant stays in reserve for a
    // later perimeter run.
    [Bug::Grasshopper, Bug::Ant, Bug::Spider],
    // Hard: front-load Ant mobility to contest placement zones early.
    [Bug::Ant, Bug::Grasshopper, Bug::Spider],
];

/// Counters one of the table's first-move bug kinds with a kind that either
/// matches common Hive response theory (meet an Ant rush with a Spider to
/// start ringing the opponent's placement zone) or, absent a specific
/// counter, repeats the opponent's own choice.
fn opening_counter(opponent_bug: Bug) -> Bug {
    match opponent_bug {
        Bug::Ant => Bug::Spider,
        Bug::Grasshopper => Bug::Ant,
        Bug::Spider => Bug::Grasshopper,
        other => other,
    }
}

/// Advisory bonus added to a placement candidate's strategic value during a
/// color's first three own-moves, biasing (never restricting) root candidate
/// generation toward the difficulty's opening pattern and, from the second
/// own-move on, toward a counter to the opponent's most recent placement.
/// Patterns are a preference only: `tag_move`'s legality is untouched, so a
/// pattern-favored bug that happens to be unavailable simply receives no
/// bonus.
pub fn opening_bias(state: &GameState, color: Color, difficulty: Difficulty, mv: Move) -> f64 {
    let own_move = state.own_move_number(color);
    if !(1..=3).contains(&own_move) {
        return 0.0;
    }
    let Move::Placement { bug, .. } = mv else { return 0.0 };

    let pattern = match difficulty {
        Difficulty::Easy => &OPENING_PATTERNS[0],
        Difficulty::Medium => &OPENING_PATTERNS[1],
        Difficulty::Hard => &OPENING_PATTERNS[2],
    };
    let mut bonus = if bug == pattern[(own_move - 1) as usize] { 2.0 } else { 0.0 };

    if let Some(Move::Placement { bug: opponent_bug, .. }) = state.last_move {
        if bug == opening_counter(opponent_bug) {
            bonus += 1.0;
        }
    }

    bonus
}

/// Strategic priority tags, most urgent first. Ties within a tag are broken
/// by the caller (driver/MCTS), not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    WinningMove,
    EmergencyDefense,
    PinEscape,
    CriticalPinning,
    StrongPinning,
    BuildingPressure,
    StartPinning,
    MaintainPressure,
    SupportPinning,
    QueenEscape,
    CatchUpDevelopment,
    DangerousSelfThreat,
    AbandonPressure,
    Neutral,
}

#[derive(Debug, Clone, Copy)]
pub struct TaggedMove {
    pub mv: Move,
    pub priority: Priority,
    pub value: f64,
}

/// Labels every legal move for `color` with a [`Priority`] and a strategic
/// value used as an MCTS root bias and as the 4.8 override source. A strict
/// 6-of-6 Queen-neighbor count is required for `WinningMove` (a 5-of-6 threat
/// is `CriticalPinning` instead; see DESIGN.md's Open Question resolution).
pub fn tag_moves(state: &GameState, color: Color) -> Vec<TaggedMove> {
    legal_moves(state, color)
        .into_iter()
        .map(|mv| tag_move(state, color, mv))
        .collect()
}

pub fn tag_move(state: &GameState, color: Color, mv: Move) -> TaggedMove {
    let opponent = color.opposite();
    let resulting = state.apply(mv).ok();

    if let Some(ref next) = resulting {
        if let Some(opp_queen) = next.queen_hex(opponent) {
            if next.board.occupied_neighbors(opp_queen).count() == 6 {
                return TaggedMove { mv, priority: Priority::WinningMove, value: 1_000.0 };
            }
        }
    }

    let own_queen_threats = state
        .queen_hex(color)
        .map(|hex| state.board.occupied_neighbors(hex).count())
        .unwrap_or(0);

    if own_queen_threats >= 4 {
        let relieves = resulting.as_ref().is_some_and(|next| {
            next.queen_hex(color)
                .map(|hex| next.board.occupied_neighbors(hex).count())
                .unwrap_or(0)
                < own_queen_threats
        });
        if relieves {
            let priority = if matches!(mv, Move::Movement { from, .. } if state.queen_hex(color) == Some(from))
            {
                Priority::PinEscape
            } else {
                Priority::EmergencyDefense
            };
            return TaggedMove { mv, priority, value: 500.0 };
        }
    }

    if let Some(next) = &resulting {
        if let Some(opp_queen) = next.queen_hex(opponent) {
            let threats = next.board.occupied_neighbors(opp_queen).count();
            let priority = match threats {
                5 => Some(Priority::CriticalPinning),
                4 => Some(Priority::StrongPinning),
                3 => Some(Priority::BuildingPressure),
                2 => Some(Priority::StartPinning),
                _ => None,
            };
            if let Some(priority) = priority {
                return TaggedMove { mv, priority, value: threats as f64 * 10.0 };
            }

            let was_adjacent_before = matches!(mv, Move::Movement { from, .. } if is_adjacent(from, opp_queen));
            if was_adjacent_before && is_adjacent_destination(mv, opp_queen) {
                return TaggedMove { mv, priority: Priority::MaintainPressure, value: 20.0 };
            }
            if was_adjacent_before && !is_adjacent_destination(mv, opp_queen) {
                return TaggedMove { mv, priority: Priority::AbandonPressure, value: -20.0 };
            }
        }

        if let Some(queen) = state.queen_hex(color) {
            if matches!(mv, Move::Movement { from, .. } if from == queen) && own_queen_threats > 0 {
                return TaggedMove { mv, priority: Priority::QueenEscape, value: 30.0 };
            }
            if is_adjacent_destination(mv, queen) {
                let self_threats_after = next
                    .queen_hex(color)
                    .map(|hex| next.board.occupied_neighbors(hex).count())
                    .unwrap_or(0);
                if self_threats_after >= 4 {
                    return TaggedMove {
                        mv,
                        priority: Priority::DangerousSelfThreat,
                        value: -30.0,
                    };
                }
            }
        }
    }

    if state.placed_count(opponent) > state.placed_count(color) && matches!(mv, Move::Placement { .. }) {
        return TaggedMove { mv, priority: Priority::CatchUpDevelopment, value: 5.0 };
    }

    TaggedMove { mv, priority: Priority::Neutral, value: 0.0 }
}

fn is_adjacent_destination(mv: Move, target: Hex) -> bool {
    match mv {
        Move::Placement { hex, .. } => is_adjacent(hex, target),
        Move::Movement { to, .. } => is_adjacent(to, target),
        Move::Pass => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::piece::Bug;
    use crate::engine::state::GameState;

    #[test]
    fn opening_bias_favors_the_difficultys_first_move_pattern() {
        let state = GameState::new();
        let preferred = OPENING_PATTERNS[2][0]; // Hard, 1st own-move: Ant
        let other = Bug::Beetle;
        assert_ne!(preferred, other);

        let preferred_bias =
            opening_bias(&state, Color::White, Difficulty::Hard, Move::Placement { bug: preferred, hex: Hex::ORIGIN });
        let other_bias =
            opening_bias(&state, Color::White, Difficulty::Hard, Move::Placement { bug: other, hex: Hex::ORIGIN });
        assert!(preferred_bias > other_bias);
    }

    #[test]
    fn opening_bias_counters_the_opponents_last_placement() {
        let state = GameState::new()
            .apply(Move::Placement { bug: Bug::Ant, hex: Hex::ORIGIN })
            .unwrap();
        let counter = opening_counter(Bug::Ant);
        let bias = opening_bias(
            &state,
            Color::Black,
            Difficulty::Medium,
            Move::Placement { bug: counter, hex: Hex::new(1, 0) },
        );
        assert!(bias > 0.0);
    }

    #[test]
    fn opening_bias_is_zero_past_the_third_own_move() {
        let mut state = GameState::new();
        let seq = [
            (Bug::Ant, Hex::new(0, 0)),
            (Bug::Ant, Hex::new(1, 0)),
            (Bug::Grasshopper, Hex::new(-1, 1)),
            (Bug::Grasshopper, Hex::new(2, 0)),
            (Bug::Spider, Hex::new(-1, 0)),
            (Bug::Spider, Hex::new(3, 0)),
            (Bug::Beetle, Hex::new(-2, 1)),
        ];
        for (bug, hex) in seq {
            state = state.apply(Move::Placement { bug, hex }).unwrap();
        }
        assert_eq!(state.own_move_number(Color::White), 4);
        let bias = opening_bias(
            &state,
            Color::White,
            Difficulty::Easy,
            Move::Placement { bug: Bug::Queen, hex: Hex::new(-2, 0) },
        );
        assert_eq!(bias, 0.0);
    }

    #[test]
    fn empty_board_offers_exactly_four_kinds_without_the_queen() {
        let state = GameState::new();
        let moves = legal_moves(&state, Color::White);
        assert_eq!(moves.len(), 4);
        assert!(moves.iter().all(|m| !matches!(m, Move::Placement { bug: Bug::Queen, .. })));
    }

    #[test]
    fn second_player_can_only_place_adjacent_to_the_first_piece() {
        let state = GameState::new()
            .apply(Move::Placement { bug: Bug::Ant, hex: Hex::ORIGIN })
            .unwrap();
        let moves = legal_moves(&state, Color::Black);
        assert_eq!(moves.len(), 4);
        for m in moves {
            let Move::Placement { hex, .. } = m else { panic!("expected placement") };
            assert!(is_adjacent(hex, Hex::ORIGIN));
        }
    }

    #[test]
    fn queen_is_forced_on_the_fourth_own_move() {
        let mut state = GameState::new();
        let seq = [
            (Bug::Ant, Hex::new(0, 0)),
            (Bug::Ant, Hex::new(1, 0)),
            (Bug::Grasshopper, Hex::new(-1, 1)),
            (Bug::Grasshopper, Hex::new(2, 0)),
            (Bug::Ant, Hex::new(-1, 0)),
            (Bug::Ant, Hex::new(3, 0)),
        ];
        for (bug, hex) in seq {
            state = state.apply(Move::Placement { bug, hex }).unwrap();
        }
        let moves = legal_moves(&state, Color::White);
        assert!(moves.iter().all(|m| matches!(m, Move::Placement { bug: Bug::Queen, .. })));
    }

    use crate::engine::board::Board;
    use crate::engine::piece::{Color as C, Piece};
    use crate::engine::state::GameState as State;

    fn piece(bug: Bug, color: C) -> Piece {
        Piece { bug, color, instance: 1 }
    }

    #[test]
    fn grasshopper_jumps_over_a_run_of_pieces_to_the_first_gap() {
        let mut board = Board::new();
        board.push(Hex::new(0, 0), piece(Bug::Ant, C::White));
        board.push(Hex::new(1, 0), piece(Bug::Ant, C::White));
        board.push(Hex::new(-1, 0), piece(Bug::Grasshopper, C::White));
        let state = State::from_board(board, C::White, 10);

        let moves = movement_moves(&state, C::White);
        let hopper_destinations: Vec<Hex> = moves
            .into_iter()
            .filter_map(|m| match m {
                Move::Movement { from, to } if from == Hex::new(-1, 0) => Some(to),
                _ => None,
            })
            .collect();
        assert_eq!(hopper_destinations, vec![Hex::new(2, 0)]);
    }

    #[test]
    fn slide_gate_blocks_a_queen_move_when_both_flanks_are_occupied() {
        let mut board = Board::new();
        board.push(Hex::new(0, 0), piece(Bug::Queen, C::White));
        board.push(Hex::new(1, -1), piece(Bug::Ant, C::Black));
        board.push(Hex::new(0, 1), piece(Bug::Ant, C::Black));
        let state = State::from_board(board, C::White, 10);

        let moves = movement_moves(&state, C::White);
        assert!(
            !moves.contains(&Move::Movement { from: Hex::new(0, 0), to: Hex::new(1, 0) }),
            "queen should not be able to slide between two occupied flanks"
        );
    }

    #[test]
    fn a_beetle_on_top_pins_the_piece_it_covers() {
        let mut board = Board::new();
        board.push(Hex::new(0, 0), piece(Bug::Queen, C::White));
        board.push(Hex::new(1, 0), piece(Bug::Ant, C::Black));
        board.push(Hex::new(1, 0), piece(Bug::Beetle, C::White));
        let state = State::from_board(board, C::Black, 10);

        let moves = movement_moves(&state, C::Black);
        assert!(moves.is_empty(), "the covered ant has no legal moves while pinned");
    }
}
