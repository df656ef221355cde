//! Opponent response models.
//!
//! The opponent is part of the environment: after the agent moves, it replies
//! uniformly at random from a set of candidate moves. The models differ only
//! in which moves are candidates.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::board::{Board, Move};
use super::enumerate::reachable_positions;

/// Which replies the opponent considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Opponent {
    /// Any empty cell, uniformly.
    #[default]
    Random,
    /// Only game-theoretically optimal replies, uniformly among them.
    Perfect,
}

impl Opponent {
    /// Candidate replies in `board`, in cell order. Empty iff `board` is terminal.
    pub fn replies(self, board: &Board, negamax: &Negamax) -> Vec<Move> {
        let moves = board.possible_moves();
        match self {
            Opponent::Random => moves,
            Opponent::Perfect => {
                let scored: Vec<(Move, i8)> = moves
                    .into_iter()
                    .map(|mv| (mv, -negamax.score(&board.place(mv))))
                    .collect();
                let best = scored.iter().map(|&(_, s)| s).max().unwrap_or(0);
                scored
                    .into_iter()
                    .filter(|&(_, s)| s == best)
                    .map(|(mv, _)| mv)
                    .collect()
            }
        }
    }
}

/// Game-theoretic value of every reachable position.
///
/// Scores are from the point of view of the player to move: 1 for a forced
/// win, 0 for a draw, -1 for a forced loss.
#[derive(Debug, Clone)]
pub struct Negamax {
    scores: FxHashMap<Board, i8>,
}

impl Negamax {
    /// Solve every position reachable from the empty board.
    pub fn solve() -> Self {
        let mut scores = FxHashMap::default();
        // deepest positions first so every child is already scored
        for board in reachable_positions().into_iter().rev() {
            let score = Self::score_with(&board, &mut |child| scores.get(child).copied());
            scores.insert(board, score);
        }
        Self { scores }
    }

    /// Score of `board` for the player to move.
    ///
    /// Positions outside the reachable set are searched on demand.
    pub fn score(&self, board: &Board) -> i8 {
        match self.scores.get(board) {
            Some(&score) => score,
            None => Self::score_with(board, &mut |child| Some(self.score(child))),
        }
    }

    fn score_with<F>(board: &Board, lookup: &mut F) -> i8
    where
        F: FnMut(&Board) -> Option<i8>,
    {
        // whoever just moved made the line, so the player to move has lost
        if board.winner().is_some() {
            return -1;
        }
        if board.is_full() {
            return 0;
        }
        board
            .possible_moves()
            .into_iter()
            .map(|mv| {
                let child = board.place(mv);
                -lookup(&child).unwrap_or_else(|| Self::score_with(&child, lookup))
            })
            .max()
            .unwrap_or(0)
    }

    /// Number of solved positions.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether nothing has been solved.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
