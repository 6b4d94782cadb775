//! Rules kernel: the hive-connectivity invariant, the slide gate, and pin
//! (articulation point) detection. Everything here operates on the set of
//! occupied cells at ground level; stack height above the bottom piece never
//! affects connectivity (a covered piece still keeps its cell "occupied").

use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::min;

use crate::engine::board::Board;
use crate::engine::hex::{Direction, Hex, is_adjacent, neighbor};

/// Is the occupied-cell set of `board` connected? Trivially true for zero or
/// one occupied cells.
pub fn is_connected(board: &Board) -> bool {
    let occupied: Vec<Hex> = board.occupied_cells().collect();
    is_connected_set(&occupied)
}

fn is_connected_set(occupied: &[Hex]) -> bool {
    if occupied.len() <= 1 {
        return true;
    }
    let set: FxHashSet<Hex> = occupied.iter().copied().collect();
    let mut seen = FxHashSet::default();
    let mut frontier = vec![occupied[0]];
    seen.insert(occupied[0]);
    while let Some(hex) = frontier.pop() {
        for n in crate::engine::hex::neighbors(hex) {
            if set.contains(&n) && seen.insert(n) {
                frontier.push(n);
            }
        }
    }
    seen.len() == set.len()
}

/// Would moving the top piece at `from` to `to` (both ground-level, i.e. the
/// move is not a beetle climbing on or off a stack) break the One Hive
/// invariant? `from` and `to` are the cells as they exist *before* the move.
/// `origin_vacates` is true when `from`'s stack has exactly one piece (so the
/// cell becomes empty once the piece leaves); beetle-stack moves pass `false`
/// since the cell underneath stays occupied.
pub fn move_would_break_hive(board: &Board, from: Hex, to: Hex, origin_vacates: bool) -> bool {
    if !origin_vacates {
        // The origin cell stays occupied (a beetle is leaving a stack), so
        // removing the mover can never disconnect anything.
        return false;
    }

    let mut occupied: FxHashSet<Hex> = board.occupied_cells().collect();
    occupied.remove(&from);
    occupied.insert(to);
    !is_connected_set(&occupied.into_iter().collect::<Vec<_>>())
}

/// The slide gate: sliding from `from` to an adjacent empty `to` is legal
/// only if the two cells flanking the shared edge are not both occupied.
/// `ignore_hex`, when present, is treated as unoccupied regardless of the
/// board (used while walking a multi-step perimeter path, where the mover's
/// origin cell must not block its own subsequent steps).
pub fn slide_is_allowed(board: &Board, from: Hex, to: Hex, ignore_hex: Option<Hex>) -> bool {
    debug_assert!(is_adjacent(from, to));
    let direction = Direction::from_vector(to - from).expect("from/to must be adjacent");
    let flank_a = neighbor(from, direction.rotated(-1));
    let flank_b = neighbor(from, direction.rotated(1));

    let occupied = |hex: Hex| Some(hex) != ignore_hex && board.occupied(hex);
    !(occupied(flank_a) && occupied(flank_b))
}

/// All empty cells reachable from `from` by repeated legal slides that stay
/// adjacent to the hive throughout, with `ignore_hex` (the mover's own
/// origin) treated as unoccupied. Used by both the Ant (no step limit) and,
/// bounded externally, the Spider (exactly three steps) move generators.
pub fn allowed_slide_destinations(board: &Board, from: Hex, ignore_hex: Hex) -> FxHashSet<Hex> {
    let mut reachable = FxHashSet::default();
    let mut frontier = vec![from];
    let mut seen = FxHashSet::default();
    seen.insert(from);

    while let Some(current) = frontier.pop() {
        for to in crate::engine::hex::neighbors(current) {
            if seen.contains(&to) {
                continue;
            }
            if board.occupied(to) {
                continue;
            }
            let touches_hive = board.occupied_neighbors(to).any(|n| n != ignore_hex);
            if !touches_hive {
                continue;
            }
            if !slide_is_allowed(board, current, to, Some(ignore_hex)) {
                continue;
            }
            seen.insert(to);
            reachable.insert(to);
            frontier.push(to);
        }
    }

    reachable
}

/// Articulation points of the occupied-cell graph: cells whose removal (from
/// the set of cells with at least one piece) would disconnect the hive.
/// Tarjan's algorithm over undirected adjacency; iterative over recursion
/// depth is not needed at Hive's scale (<= 22 pieces).
pub fn articulation_points(board: &Board) -> FxHashSet<Hex> {
    let occupied: Vec<Hex> = board.occupied_cells().collect();
    if occupied.is_empty() {
        return FxHashSet::default();
    }
    let set: FxHashSet<Hex> = occupied.iter().copied().collect();

    let mut visited = FxHashSet::default();
    let mut depth = FxHashMap::default();
    let mut low = FxHashMap::default();
    let mut points = FxHashSet::default();

    let start = occupied[0];
    visited.insert(start);
    depth.insert(start, 0);
    low.insert(start, 0);

    let mut root_children = 0;
    for child in crate::engine::hex::neighbors(start).filter(|h| set.contains(h)) {
        if !visited.contains(&child) {
            root_children += 1;
            visit(&set, child, start, 1, &mut visited, &mut depth, &mut low, &mut points);
        }
    }
    if root_children >= 2 {
        points.insert(start);
    }
    points
}

#[allow(clippy::too_many_arguments)]
fn visit(
    set: &FxHashSet<Hex>,
    current: Hex,
    parent: Hex,
    depth_value: i32,
    visited: &mut FxHashSet<Hex>,
    depth: &mut FxHashMap<Hex, i32>,
    low: &mut FxHashMap<Hex, i32>,
    points: &mut FxHashSet<Hex>,
) {
    visited.insert(current);
    depth.insert(current, depth_value);
    low.insert(current, depth_value);

    for child in crate::engine::hex::neighbors(current).filter(|h| set.contains(h)) {
        if !visited.contains(&child) {
            visit(set, child, current, depth_value + 1, visited, depth, low, points);
            let child_low = low[&child];
            let entry = low.get_mut(&current).unwrap();
            *entry = min(*entry, child_low);
            if low[&child] >= depth[&current] {
                points.insert(current);
            }
        } else if child != parent {
            let child_depth = depth[&child];
            let entry = low.get_mut(&current).unwrap();
            *entry = min(*entry, child_depth);
        }
    }
}
