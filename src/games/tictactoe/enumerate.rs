//! State space enumeration.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use super::board::{Board, Mark};

/// Every position reachable from the empty board, breadth first.
///
/// Order is deterministic: by number of marks, then by the order moves were
/// discovered.
pub fn reachable_positions() -> Vec<Board> {
    let start = Board::empty();
    let mut seen = FxHashSet::default();
    let mut queue = VecDeque::from([start]);
    let mut positions = Vec::new();
    seen.insert(start);

    while let Some(board) = queue.pop_front() {
        positions.push(board);
        for mv in board.possible_moves() {
            let next = board.place(mv);
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }

    positions
}

/// All reachable positions where `turn` is to move, plus every reachable
/// terminal position.
///
/// This set is closed under one agent move followed by one opponent reply,
/// which is what the solvers require.
pub fn generate_all_states(turn: Mark) -> Vec<Board> {
    reachable_positions()
        .into_iter()
        .filter(|b| b.is_terminal() || b.to_move() == turn)
        .collect()
}
