//! Solution export.
//!
//! A solved run is written as one JSON document: the settings it was solved
//! with, the solver statistics, and the greedy move with its value for every
//! non-terminal position.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::mdp::{Policy, SolverConfig, SolverStats, ValueFunction};

use super::board::{Board, Mark, Move};
use super::mdp::{Rewards, TicTacToeMdp};
use super::opponent::Opponent;
use super::playout::Tally;

/// The chosen move in one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    /// Nine-character board encoding
    pub board: String,
    /// Cell index 0..9 of the chosen move
    pub cell: usize,
    /// Expected return of the position
    pub value: f64,
}

/// Complete solver output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveOutput {
    /// "value_iteration" or "policy_iteration"
    pub algorithm: String,
    /// The solving player
    pub agent: Mark,
    /// Opponent model the policy was solved against
    pub opponent: Opponent,
    /// Reward structure
    pub rewards: Rewards,
    /// Solver settings
    pub config: SolverConfig,
    /// Training statistics
    pub stats: SolverStats,
    /// Expected return of a game from the empty board
    pub opening_value: Option<f64>,
    /// Simulated results, if games were played
    pub tally: Option<Tally>,
    /// One entry per non-terminal position, sorted by board
    pub policy: Vec<PolicyEntry>,
}

impl SolveOutput {
    /// Collect the output of a finished run.
    pub fn new(
        algorithm: &str,
        mdp: &TicTacToeMdp,
        config: &SolverConfig,
        stats: &SolverStats,
        values: &ValueFunction<Board>,
        policy: &Policy<Board, Move>,
    ) -> Self {
        let mut entries: Vec<PolicyEntry> = policy
            .iter()
            .map(|(board, mv)| PolicyEntry {
                board: board.encode(),
                cell: mv.index(),
                value: values.get(board).unwrap_or(0.0),
            })
            .collect();
        entries.sort_by(|a, b| a.board.cmp(&b.board));

        Self {
            algorithm: algorithm.to_string(),
            agent: mdp.agent(),
            opponent: mdp.opponent(),
            rewards: *mdp.rewards(),
            config: config.clone(),
            stats: stats.clone(),
            opening_value: mdp.opening_value(values),
            tally: None,
            policy: entries,
        }
    }

    /// Attach simulated game results.
    pub fn with_tally(mut self, tally: Tally) -> Self {
        self.tally = Some(tally);
        self
    }

    /// Look up the entry for `board`.
    pub fn entry(&self, board: &Board) -> Option<&PolicyEntry> {
        let key = board.encode();
        self.policy
            .binary_search_by(|e| e.board.cmp(&key))
            .ok()
            .map(|i| &self.policy[i])
    }

    /// Save to JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::ValueIteration;

    fn solved() -> SolveOutput {
        let mdp = TicTacToeMdp::new(Mark::X, Opponent::Perfect, Rewards::default());
        let config = SolverConfig::default();
        let mut vi = ValueIteration::new(&mdp, config.clone()).unwrap();
        vi.train();
        let policy = vi.policy().cloned().unwrap();
        SolveOutput::new(
            "value_iteration",
            &mdp,
            &config,
            vi.stats(),
            &vi.value_function(),
            &policy,
        )
    }

    #[test]
    fn test_entries_cover_policy_sorted() {
        let output = solved();
        assert_eq!(output.policy.len(), 2423);
        assert!(output.policy.windows(2).all(|w| w[0].board < w[1].board));
        assert!(output.policy.iter().all(|e| e.cell < 9));
        assert!(output.opening_value.unwrap().abs() < 1e-9);

        let entry = output.entry(&Board::empty()).unwrap();
        assert_eq!(entry.board, ".........");
        assert!(output.entry(&"XXX OO. ...".parse().unwrap()).is_none());
    }

    #[test]
    fn test_json_shape() {
        let output = solved().with_tally(Tally {
            wins: 0,
            draws: 4,
            losses: 0,
        });
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["algorithm"], "value_iteration");
        assert_eq!(json["agent"], "X");
        assert_eq!(json["opponent"], "Perfect");
        assert_eq!(json["stats"]["termination"], "Converged");
        assert_eq!(json["tally"]["draws"], 4);
        assert_eq!(json["policy"][0]["board"].as_str().unwrap().len(), 9);
    }

    #[test]
    fn test_save_json() {
        let path = std::env::temp_dir().join("tictactoe_mdp_output_test.json");
        let output = solved();
        output.save_json(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let back: SolveOutput = serde_json::from_str(&text).unwrap();
        assert_eq!(back.policy, output.policy);
        let _ = std::fs::remove_file(&path);
    }
}
