//! Tic-tac-toe against a stochastic opponent.
//!
//! The agent plays one mark; the opponent is folded into the environment
//! and replies uniformly from a candidate set chosen by [`Opponent`]. Every
//! reachable position where the agent is to move, plus every finished
//! position, is a state. Rewards arrive only when a game ends unless a
//! living reward is configured.
//!
//! Against [`Opponent::Random`] the optimal policy from the empty board is
//! worth about 0.79 with the default rewards and a discount of 0.9. Against
//! [`Opponent::Perfect`] it is worth exactly 0: the best the agent can do is
//! draw.

pub mod board;
pub mod enumerate;
pub mod mdp;
pub mod opponent;
pub mod output;
pub mod playout;

pub use board::{Board, Cell, GameError, Mark, Move};
pub use enumerate::{generate_all_states, reachable_positions};
pub use mdp::{Rewards, TicTacToeMdp};
pub use opponent::{Negamax, Opponent};
pub use output::{PolicyEntry, SolveOutput};
pub use playout::{play_out, tally, GameResult, Tally};
