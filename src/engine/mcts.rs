//! Monte Carlo Tree Search: a UCB1 tree held as a flat node arena (a
//! cyclic parent-pointer tree would fight the borrow checker, so parent and
//! child links are plain indices into a `Vec<Node>`). Selection, expansion,
//! weighted simulation, and backpropagation each operate on node indices;
//! only `search` owns the arena.

use rand::Rng;
use rand::rngs::StdRng;

use crate::engine::evaluator::{self, Difficulty};
use crate::engine::hex::Hex;
use crate::engine::movegen::{self, Priority, TaggedMove};
use crate::engine::piece::{Bug, Color};
use crate::engine::state::{GameResult, GameState, Move};

const UCB1_EXPLORATION: f64 = std::f64::consts::SQRT_2;
const SIMULATION_DEPTH_CAP: u32 = 50;

struct Node {
    state: GameState,
    parent: Option<usize>,
    children: Vec<(Move, usize)>,
    visits: u32,
    /// Accumulated win probability for the player to move *at this node*
    /// (see backpropagation below); `score / visits` is that player's
    /// empirical win rate.
    score: f64,
    untried: Option<Vec<Move>>,
}

impl Node {
    fn is_terminal(&self) -> bool {
        self.state.result != GameResult::Ongoing
    }
}

/// What phase of the driver's search emitted a [`crate::engine::driver::ProgressEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Mcts,
    Minimax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub phase: SearchPhase,
    pub iteration: u32,
    pub total: u32,
    pub tree_size: usize,
}

/// One root child's standing at the end of search, used by the driver's
/// override step to find winning-move / emergency-defense candidates
/// without re-running search.
#[derive(Debug, Clone, Copy)]
pub struct RootChild {
    pub mv: Move,
    pub priority: Priority,
    pub visits: u32,
    pub composite_score: f64,
}

pub struct MctsOutcome {
    pub chosen_move: Move,
    pub iterations_run: u32,
    pub root_children: Vec<RootChild>,
}

/// Runs MCTS from `state` for `ai_color`. `cancel` is polled at ~20 coarse
/// checkpoints; on a cancellation with iterations already completed the
/// root child with the most visits is returned, never the composite-score
/// argmax (that formula only applies once the iteration budget is spent in
/// full). With zero completed iterations the first strategically-tagged move
/// is returned instead.
pub fn search(
    state: &GameState,
    ai_color: Color,
    difficulty: Difficulty,
    rng: &mut StdRng,
    cancel: &dyn Fn() -> bool,
    progress: &mut dyn FnMut(ProgressEvent),
) -> MctsOutcome {
    let total = difficulty.mcts_iterations();
    let checkpoint = (total / 20).max(1);

    let mut arena: Vec<Node> = vec![Node {
        state: state.clone(),
        parent: None,
        children: Vec::new(),
        visits: 0,
        score: 0.0,
        untried: None,
    }];
    const ROOT: usize = 0;

    let mut iterations_run = 0u32;
    let mut was_cancelled = false;

    for i in 0..total {
        if i % checkpoint == 0 {
            progress(ProgressEvent {
                phase: SearchPhase::Mcts,
                iteration: i,
                total,
                tree_size: arena.len(),
            });
            if cancel() {
                was_cancelled = true;
                break;
            }
        }
        run_iteration(&mut arena, ROOT, ai_color, difficulty, rng);
        iterations_run += 1;
    }

    progress(ProgressEvent {
        phase: SearchPhase::Mcts,
        iteration: iterations_run,
        total,
        tree_size: arena.len(),
    });

    let root_children = root_children_report(&arena, ROOT, state, ai_color);

    let chosen_move = if arena[ROOT].children.is_empty() {
        first_strategic_move(state, ai_color, difficulty)
    } else if was_cancelled {
        arena[ROOT]
            .children
            .iter()
            .max_by_key(|(_, idx)| arena[*idx].visits)
            .map(|(mv, _)| *mv)
            .unwrap_or(Move::Pass)
    } else {
        root_children
            .iter()
            .max_by(|a, b| a.composite_score.total_cmp(&b.composite_score))
            .map(|c| c.mv)
            .unwrap_or(Move::Pass)
    };

    MctsOutcome { chosen_move, iterations_run, root_children }
}

fn first_strategic_move(state: &GameState, ai_color: Color, difficulty: Difficulty) -> Move {
    let mut tagged = movegen::tag_moves(state, ai_color);
    for t in &mut tagged {
        t.value += movegen::opening_bias(state, ai_color, difficulty, t.mv);
    }
    tagged.sort_by(|a, b| a.priority.cmp(&b.priority).then(b.value.total_cmp(&a.value)));
    tagged.first().map(|t| t.mv).unwrap_or(Move::Pass)
}

fn run_iteration(
    arena: &mut Vec<Node>,
    root: usize,
    ai_color: Color,
    difficulty: Difficulty,
    rng: &mut StdRng,
) {
    let leaf = select(arena, root, difficulty);
    let expanded = expand(arena, leaf, root, difficulty);
    let s = simulate(&arena[expanded].state, ai_color, difficulty, rng);
    backpropagate(arena, expanded, ai_color, s);
}

/// Descends from `root` by repeated UCB1 selection until hitting a node that
/// is terminal or still has untried moves.
fn select(arena: &mut [Node], root: usize, difficulty: Difficulty) -> usize {
    let mut node = root;
    loop {
        if arena[node].is_terminal() {
            return node;
        }
        if arena[node].untried.is_none() {
            materialize_untried(arena, node, node == root, difficulty);
        }
        if !arena[node].untried.as_ref().unwrap().is_empty() {
            return node;
        }
        if arena[node].children.is_empty() {
            return node;
        }
        node = select_best_child(arena, node);
    }
}

/// At the root, untried moves are materialized from the strategic filter
/// biased by the opening-pattern table (SPEC_FULL.md §4.5) for a color's
/// first three own-moves; below the root, the full legal-move set is used
/// unbiased, so the opening book only ever shapes root exploration order.
fn materialize_untried(arena: &mut [Node], node: usize, is_root: bool, difficulty: Difficulty) {
    let state = &arena[node].state;
    let color = state.side_to_move;
    let moves = if is_root {
        // Sorted so the most urgent move (smallest `Priority` discriminant) is
        // *last*: `expand` consumes `untried` with `Vec::pop`, so the most
        // urgent candidate is tried first even though the list is built once.
        let mut tagged = movegen::tag_moves(state, color);
        for t in &mut tagged {
            t.value += movegen::opening_bias(state, color, difficulty, t.mv);
        }
        tagged.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.value.total_cmp(&b.value)));
        tagged.into_iter().map(|t| t.mv).collect()
    } else {
        movegen::legal_moves(state, color)
    };
    arena[node].untried = Some(moves);
}

fn select_best_child(arena: &[Node], node: usize) -> usize {
    let parent_visits = arena[node].visits.max(1) as f64;
    let mut best_idx = arena[node].children[0].1;
    let mut best_ucb1 = f64::NEG_INFINITY;
    for &(_, child_idx) in &arena[node].children {
        let child = &arena[child_idx];
        let ucb1 = if child.visits == 0 {
            f64::INFINITY
        } else {
            child.score / child.visits as f64
                + UCB1_EXPLORATION * (parent_visits.ln() / child.visits as f64).sqrt()
        };
        if ucb1 > best_ucb1 {
            best_ucb1 = ucb1;
            best_idx = child_idx;
        }
    }
    best_idx
}

/// Pops one untried move from `node` (already terminal-checked by `select`)
/// and attaches a freshly applied child. Returns `node` unchanged if it has
/// no untried moves (a terminal leaf).
fn expand(arena: &mut Vec<Node>, node: usize, root: usize, difficulty: Difficulty) -> usize {
    if arena[node].is_terminal() {
        return node;
    }
    if arena[node].untried.is_none() {
        materialize_untried(arena, node, node == root, difficulty);
    }
    let Some(mv) = arena[node].untried.as_mut().and_then(|u| u.pop()) else {
        return node;
    };
    let child_state = match arena[node].state.apply(mv) {
        Ok(s) => s,
        Err(_) => return node,
    };
    let child_idx = arena.len();
    arena.push(Node {
        state: child_state,
        parent: Some(node),
        children: Vec::new(),
        visits: 0,
        score: 0.0,
        untried: None,
    });
    arena[node].children.push((mv, child_idx));
    child_idx
}

/// A weighted-random playout to a terminal state or the depth cap, then the
/// evaluator's positional score for `ai_color`.
fn simulate(start: &GameState, ai_color: Color, difficulty: Difficulty, rng: &mut StdRng) -> f64 {
    let mut state = start.clone();
    for depth in 0..SIMULATION_DEPTH_CAP {
        if state.result != GameResult::Ongoing {
            break;
        }
        let moves = movegen::legal_moves(&state, state.side_to_move);
        let mv = weighted_choice(&state, &moves, depth, rng);
        state = match state.apply(mv) {
            Ok(next) => next,
            Err(_) => break,
        };
    }
    evaluator::evaluate(&state, ai_color, difficulty).positional
}

fn weighted_choice(state: &GameState, moves: &[Move], depth: u32, rng: &mut StdRng) -> Move {
    if moves.len() == 1 {
        return moves[0];
    }
    let weights: Vec<f64> = moves.iter().map(|mv| playout_weight(state, *mv, depth)).collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return moves[rng.random_range(0..moves.len())];
    }
    let mut pick = rng.random::<f64>() * total;
    for (mv, weight) in moves.iter().zip(weights.iter()) {
        if pick < *weight {
            return *mv;
        }
        pick -= weight;
    }
    *moves.last().unwrap()
}

/// Playout move weighting: favors early Queen placements, moves that
/// threaten the opponent Queen (reusing the strategic filter's value
/// function), and central positions.
fn playout_weight(state: &GameState, mv: Move, depth: u32) -> f64 {
    let color = state.side_to_move;
    let mut weight = 1.0;

    if depth < 6 && matches!(mv, Move::Placement { bug: Bug::Queen, .. }) {
        weight += 5.0;
    }

    let tagged_value = movegen::tag_move(state, color, mv).value;
    weight += tagged_value.max(0.0).min(50.0) / 10.0;

    if let Some(hex) = destination_hex(mv) {
        let centrality = (3 - crate::engine::hex::hex_distance(hex, Hex::ORIGIN)).max(0) as f64;
        weight += centrality * 0.3;
    }

    weight.max(0.01)
}

fn destination_hex(mv: Move) -> Option<Hex> {
    match mv {
        Move::Placement { hex, .. } => Some(hex),
        Move::Movement { to, .. } => Some(to),
        Move::Pass => None,
    }
}

/// Walks from `node` to the root, crediting each visited node's mover: a
/// node stores the empirical win probability *for the player to move at that
/// node*, so `s` (always from `ai_color`'s perspective) is added directly
/// when that player is `ai_color`, and `1 - s` otherwise. This keeps UCB1
/// selection uniform (every node maximizes its own stored average) without
/// a sign flip at alternating plies.
fn backpropagate(arena: &mut [Node], leaf: usize, ai_color: Color, s: f64) {
    let mut current = Some(leaf);
    let mut depth = 0;
    const MAX_BACKPROP_DEPTH: u32 = 512;
    while let Some(idx) = current {
        if depth > MAX_BACKPROP_DEPTH {
            break;
        }
        let node = &mut arena[idx];
        node.visits += 1;
        node.score += if node.state.side_to_move == ai_color { s } else { 1.0 - s };
        current = node.parent;
        depth += 1;
    }
}

/// Composite root score: `0.4*queen_focus + 0.3*win_rate +
/// 0.2*visit_share + 0.1*strategic_bonus`. `win_rate` is flipped relative to
/// the node's own stored average, since root's children always have the
/// opponent to move (the root mover is always `ai_color`): a child's stored
/// average is the *opponent's* win rate, so the AI's win rate is `1 -
/// stored`.
fn root_children_report(
    arena: &[Node],
    root: usize,
    state: &GameState,
    ai_color: Color,
) -> Vec<RootChild> {
    let total_visits: u32 = arena[root].children.iter().map(|(_, idx)| arena[*idx].visits).sum();
    let tags: Vec<TaggedMove> = movegen::tag_moves(state, ai_color);

    arena[root]
        .children
        .iter()
        .map(|&(mv, idx)| {
            let child = &arena[idx];
            let win_rate = if child.visits == 0 { 0.5 } else { 1.0 - child.score / child.visits as f64 };
            let visit_share = if total_visits == 0 { 0.0 } else { child.visits as f64 / total_visits as f64 };
            let tag = tags.iter().find(|t| t.mv == mv).copied();
            let priority = tag.map(|t| t.priority).unwrap_or(Priority::Neutral);
            let queen_focus = queen_focus_bonus(state, ai_color, mv);
            let strategic_bonus = strategic_bonus(priority);

            let composite_score =
                0.4 * queen_focus + 0.3 * win_rate + 0.2 * visit_share + 0.1 * strategic_bonus;

            RootChild { mv, priority, visits: child.visits, composite_score }
        })
        .collect()
}

/// How much a move presses the opponent Queen / relieves our own, mapped to
/// `[0,1]`.
fn queen_focus_bonus(state: &GameState, ai_color: Color, mv: Move) -> f64 {
    let Ok(next) = state.apply(mv) else { return 0.5 };
    let opponent = ai_color.opposite();

    let opp_threats_before =
        state.queen_hex(opponent).map(|h| state.board.occupied_neighbors(h).count()).unwrap_or(0);
    let opp_threats_after =
        next.queen_hex(opponent).map(|h| next.board.occupied_neighbors(h).count()).unwrap_or(0);
    let own_threats_before =
        state.queen_hex(ai_color).map(|h| state.board.occupied_neighbors(h).count()).unwrap_or(0);
    let own_threats_after =
        next.queen_hex(ai_color).map(|h| next.board.occupied_neighbors(h).count()).unwrap_or(0);

    let pressure_delta = opp_threats_after as f64 - opp_threats_before as f64;
    let relief_delta = own_threats_before as f64 - own_threats_after as f64;
    let raw = (pressure_delta + relief_delta) / 6.0;
    (0.5 + raw * 0.5).clamp(0.0, 1.0)
}

fn strategic_bonus(priority: Priority) -> f64 {
    match priority {
        Priority::WinningMove => 1.0,
        Priority::EmergencyDefense | Priority::PinEscape => 0.95,
        Priority::CriticalPinning => 0.9,
        Priority::StrongPinning => 0.8,
        Priority::BuildingPressure => 0.7,
        Priority::StartPinning => 0.6,
        Priority::MaintainPressure | Priority::SupportPinning | Priority::QueenEscape => 0.55,
        Priority::CatchUpDevelopment => 0.5,
        Priority::Neutral => 0.4,
        Priority::DangerousSelfThreat | Priority::AbandonPressure => 0.0,
    }
}
