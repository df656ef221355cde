//! Simulated games between a solved policy and the opponent model.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::mdp::{Policy, SolverError};

use super::board::{Board, Move};
use super::mdp::TicTacToeMdp;

/// Result of one game from the agent's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    /// The agent completed a line.
    Win,
    /// The board filled up.
    Draw,
    /// The opponent completed a line.
    Loss,
}

/// Results over a batch of games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Games the agent won.
    pub wins: u64,
    /// Games that ended full.
    pub draws: u64,
    /// Games the agent lost.
    pub losses: u64,
}

impl Tally {
    /// Total games recorded.
    pub fn games(&self) -> u64 {
        self.wins + self.draws + self.losses
    }

    /// Add one result.
    pub fn record(&mut self, result: GameResult) {
        match result {
            GameResult::Win => self.wins += 1,
            GameResult::Draw => self.draws += 1,
            GameResult::Loss => self.losses += 1,
        }
    }
}

/// Play one game from the empty board.
///
/// The agent follows `policy`; the opponent draws uniformly from the
/// model's candidate replies, exactly as the transition model assumes.
pub fn play_out<R: Rng>(
    mdp: &TicTacToeMdp,
    policy: &Policy<Board, Move>,
    rng: &mut R,
) -> Result<GameResult, SolverError> {
    let mut board = Board::empty();

    while !board.is_terminal() {
        let mv = if board.to_move() == mdp.agent() {
            *policy.action(&board)?
        } else {
            match mdp.replies(&board).choose(rng) {
                Some(&reply) => reply,
                None => break,
            }
        };
        board = board.place(mv);
    }

    Ok(match board.winner() {
        Some(mark) if mark == mdp.agent() => GameResult::Win,
        Some(_) => GameResult::Loss,
        None => GameResult::Draw,
    })
}

/// Play `games` games and count the results.
pub fn tally<R: Rng>(
    mdp: &TicTacToeMdp,
    policy: &Policy<Board, Move>,
    games: u64,
    rng: &mut R,
) -> Result<Tally, SolverError> {
    let mut tally = Tally::default();
    for _ in 0..games {
        tally.record(play_out(mdp, policy, rng)?);
    }
    log::debug!(
        "{} games: {} won, {} drawn, {} lost",
        tally.games(),
        tally.wins,
        tally.draws,
        tally.losses
    );
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::tictactoe::{Mark, Opponent, Rewards};
    use crate::mdp::{SolverConfig, ValueIteration};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn solved(agent: Mark, opponent: Opponent) -> (TicTacToeMdp, Policy<Board, Move>) {
        let mdp = TicTacToeMdp::new(agent, opponent, Rewards::default());
        let mut vi = ValueIteration::new(&mdp, SolverConfig::default()).unwrap();
        vi.train();
        let policy = vi.policy().cloned().unwrap();
        (mdp, policy)
    }

    #[test]
    fn test_tally_counts() {
        let mut tally = Tally::default();
        tally.record(GameResult::Win);
        tally.record(GameResult::Draw);
        tally.record(GameResult::Win);
        assert_eq!(tally.games(), 3);
        assert_eq!(tally.wins, 2);
        assert_eq!(tally.losses, 0);
    }

    #[test]
    fn test_perfect_play_always_draws() {
        let (mdp, policy) = solved(Mark::X, Opponent::Perfect);
        let mut rng = StdRng::seed_from_u64(3);
        let tally = tally(&mdp, &policy, 200, &mut rng).unwrap();
        assert_eq!(tally.draws, 200);
    }

    #[test]
    fn test_never_loses_to_random_play() {
        let (mdp, policy) = solved(Mark::X, Opponent::Random);
        let mut rng = StdRng::seed_from_u64(11);
        let tally = tally(&mdp, &policy, 500, &mut rng).unwrap();
        assert_eq!(tally.games(), 500);
        assert_eq!(tally.losses, 0);
        assert!(tally.wins > tally.draws);
    }

    #[test]
    fn test_agent_o_plays_second() {
        let (mdp, policy) = solved(Mark::O, Opponent::Perfect);
        let mut rng = StdRng::seed_from_u64(5);
        let tally = tally(&mdp, &policy, 100, &mut rng).unwrap();
        assert_eq!(tally.losses, 0);
    }

    #[test]
    fn test_missing_policy_entry_is_an_error() {
        let mdp = TicTacToeMdp::default();
        let policy = Policy::default();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            play_out(&mdp, &policy, &mut rng),
            Err(SolverError::MissingPolicyEntry { .. })
        ));
    }
}
