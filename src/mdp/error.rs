//! Error types for the MDP solvers.

use thiserror::Error;

use crate::mdp::config::ConfigError;

/// Errors surfaced by model compilation and the solvers.
///
/// Every variant except `Config` is a violated precondition of the model:
/// the state set is not closed, a non-terminal state has no actions, or a
/// transition distribution is not a probability distribution.
#[derive(Debug, Error)]
pub enum SolverError {
    /// A successor or queried state is not part of the enumerated state set.
    #[error("state {state} is not in the enumerated state set")]
    UnknownState {
        /// Debug rendering of the offending state.
        state: String,
    },

    /// A non-terminal state reported no valid actions.
    #[error("non-terminal state {state} has no valid actions")]
    NoActions {
        /// Debug rendering of the offending state.
        state: String,
    },

    /// An action was requested for a terminal state.
    #[error("terminal state {state} has no action")]
    TerminalAction {
        /// Debug rendering of the offending state.
        state: String,
    },

    /// An action is not among the valid actions of a state.
    #[error("{action} is not a valid action in {state}")]
    InvalidAction {
        /// Debug rendering of the state.
        state: String,
        /// Debug rendering of the action.
        action: String,
    },

    /// A single transition probability is NaN or outside `[0, 1]`.
    #[error("transition of {state} under {action} has probability {probability}")]
    InvalidProbability {
        /// Debug rendering of the state.
        state: String,
        /// Debug rendering of the action.
        action: String,
        /// The offending probability.
        probability: f64,
    },

    /// Transition probabilities for a `(state, action)` pair do not sum to 1.
    #[error("transitions of {state} under {action} sum to {sum}, expected 1")]
    InvalidDistribution {
        /// Debug rendering of the state.
        state: String,
        /// Debug rendering of the action.
        action: String,
        /// The observed probability mass.
        sum: f64,
    },

    /// The policy has no entry for a non-terminal state.
    #[error("policy has no action for {state}")]
    MissingPolicyEntry {
        /// Debug rendering of the state.
        state: String,
    },

    /// The solver configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
