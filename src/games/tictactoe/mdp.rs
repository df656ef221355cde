//! Tic-tac-toe as an MDP for one player.

use serde::{Deserialize, Serialize};

use crate::mdp::model::{Mdp, Transition};
use crate::mdp::ValueFunction;

use super::board::{Board, Mark, Move};
use super::enumerate::generate_all_states;
use super::opponent::{Negamax, Opponent};

/// Reward structure of the game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rewards {
    /// Agent completes a line.
    pub win: f64,
    /// Opponent completes a line.
    pub lose: f64,
    /// Board fills with no line.
    pub draw: f64,
    /// Any move that does not end the game.
    pub living: f64,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            win: 1.0,
            lose: -1.0,
            draw: 0.0,
            living: 0.0,
        }
    }
}

impl Rewards {
    /// The coursework rewards: ±10 for a win or loss.
    pub fn classic() -> Self {
        Self {
            win: 10.0,
            lose: -10.0,
            ..Default::default()
        }
    }
}

/// Tic-tac-toe from one player's seat.
///
/// A step is the agent's move followed, unless the game just ended, by the
/// opponent's reply. The agent observes only positions where it is to move
/// or the game is over.
#[derive(Debug, Clone)]
pub struct TicTacToeMdp {
    agent: Mark,
    opponent: Opponent,
    rewards: Rewards,
    negamax: Negamax,
}

impl Default for TicTacToeMdp {
    fn default() -> Self {
        Self::new(Mark::X, Opponent::Random, Rewards::default())
    }
}

impl TicTacToeMdp {
    /// Create the model for `agent` against `opponent`.
    pub fn new(agent: Mark, opponent: Opponent, rewards: Rewards) -> Self {
        Self {
            agent,
            opponent,
            rewards,
            negamax: Negamax::solve(),
        }
    }

    /// The solving player's mark.
    pub fn agent(&self) -> Mark {
        self.agent
    }

    /// The opponent response model.
    pub fn opponent(&self) -> Opponent {
        self.opponent
    }

    /// The reward structure.
    pub fn rewards(&self) -> &Rewards {
        &self.rewards
    }

    /// Game-theoretic values used by the perfect opponent.
    pub fn negamax(&self) -> &Negamax {
        &self.negamax
    }

    /// Candidate opponent replies in `board`.
    pub fn replies(&self, board: &Board) -> Vec<Move> {
        self.opponent.replies(board, &self.negamax)
    }

    /// Expected value of a game from the empty board under `values`.
    ///
    /// For an agent playing O this averages over the opponent's opening
    /// replies, since the empty board is not one of the agent's states.
    pub fn opening_value(&self, values: &ValueFunction<Board>) -> Option<f64> {
        let start = Board::empty();
        if self.agent == Mark::X {
            return values.get(&start);
        }
        let openings = self.replies(&start);
        let total = openings
            .iter()
            .map(|&mv| values.get(&start.place(mv)))
            .sum::<Option<f64>>()?;
        Some(total / openings.len() as f64)
    }

    fn reward_after_reply(&self, board: &Board) -> f64 {
        if board.winner().is_some() {
            self.rewards.lose
        } else if board.is_full() {
            self.rewards.draw
        } else {
            self.rewards.living
        }
    }
}

impl Mdp for TicTacToeMdp {
    type State = Board;
    type Action = Move;

    fn states(&self) -> Vec<Board> {
        generate_all_states(self.agent)
    }

    fn is_terminal(&self, state: &Board) -> bool {
        state.is_terminal()
    }

    fn actions(&self, state: &Board) -> Vec<Move> {
        state.possible_moves()
    }

    fn transitions(&self, state: &Board, action: &Move) -> Vec<Transition<Board>> {
        let after = state.place(*action);

        if after.is_terminal() {
            let reward = if after.winner() == Some(self.agent) {
                self.rewards.win
            } else {
                self.rewards.draw
            };
            return vec![Transition::new(1.0, after, reward)];
        }

        let replies = self.replies(&after);
        let probability = 1.0 / replies.len() as f64;
        replies
            .into_iter()
            .map(|reply| {
                let next = after.place(reply);
                Transition::new(probability, next, self.reward_after_reply(&next))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    fn mv(i: u8) -> Move {
        Move::new(i).unwrap()
    }

    #[test]
    fn test_winning_move_is_deterministic() {
        let mdp = TicTacToeMdp::default();
        let t = mdp.transitions(&board("XX. OO. ..."), &mv(2));
        assert_eq!(t.len(), 1);
        assert_eq!(t[0].probability, 1.0);
        assert_eq!(t[0].outcome.reward, 1.0);
        assert!(t[0].outcome.next.is_terminal());
    }

    #[test]
    fn test_random_reply_is_uniform() {
        let mdp = TicTacToeMdp::default();
        let t = mdp.transitions(&Board::empty(), &mv(4));
        assert_eq!(t.len(), 8);
        assert!(t.iter().all(|t| (t.probability - 0.125).abs() < 1e-12));
        assert!(t.iter().all(|t| t.outcome.reward == 0.0));
        assert!(t.iter().all(|t| t.outcome.next.to_move() == Mark::X));
    }

    #[test]
    fn test_losing_reply_pays_lose_reward() {
        let mdp = TicTacToeMdp::new(Mark::X, Opponent::Perfect, Rewards::classic());
        // X ignores O's open row; the perfect opponent completes it
        let t = mdp.transitions(&board("X.. OO. ..X"), &mv(2));
        assert_eq!(t.len(), 1);
        assert_eq!(t[0].outcome.reward, -10.0);
        assert_eq!(t[0].outcome.next.winner(), Some(Mark::O));
    }

    #[test]
    fn test_draw_and_living_rewards() {
        let rewards = Rewards {
            win: 1.0,
            lose: -1.0,
            draw: 0.25,
            living: -0.01,
        };
        let mdp = TicTacToeMdp::new(Mark::X, Opponent::Random, rewards);

        // X fills the last cell without a line
        let t = mdp.transitions(&board("XOX XOO OX."), &mv(8));
        assert_eq!(t[0].outcome.reward, 0.25);

        let t = mdp.transitions(&Board::empty(), &mv(0));
        assert!(t.iter().all(|t| t.outcome.reward == -0.01));
    }

    #[test]
    fn test_agent_o_sees_o_positions() {
        let mdp = TicTacToeMdp::new(Mark::O, Opponent::Random, Rewards::default());
        let states = mdp.states();
        assert!(states.iter().all(|b| b.is_terminal() || b.to_move() == Mark::O));

        let t = mdp.transitions(&board("X.. ... ..."), &mv(4));
        assert_eq!(t.len(), 7);
        assert!(t.iter().all(|t| t.outcome.next.to_move() == Mark::O));
    }
}
