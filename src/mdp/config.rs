//! Configuration options for the MDP solvers.
//!
//! This module provides the configuration struct shared by value iteration
//! and policy iteration, plus the statistics both solvers report.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a sweep writes new values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UpdateScheme {
    /// Write each state's value as soon as it is computed, so later states in
    /// the same sweep read it (Gauss-Seidel).
    #[default]
    InPlace,
    /// Read only the values from before the sweep began (Jacobi).
    Synchronous,
}

/// Configuration for the solvers.
///
/// # Example
/// ```
/// use tictactoe_mdp::mdp::SolverConfig;
///
/// let config = SolverConfig::default();
/// assert_eq!(config.discount, 0.9);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Multiplier applied to future rewards. Must lie in `[0, 1)`.
    pub discount: f64,

    /// Convergence threshold on the maximum absolute value change in a sweep.
    ///
    /// Used by value iteration when `sweeps` is `None`, and as the `delta`
    /// of policy evaluation.
    pub theta: f64,

    /// Fixed number of value-iteration sweeps.
    ///
    /// `None` runs value iteration until the maximum change drops below
    /// `theta` (or `max_sweeps` is hit).
    pub sweeps: Option<usize>,

    /// Cap on sweeps per value-iteration run and per policy evaluation.
    pub max_sweeps: usize,

    /// Cap on policy-iteration evaluate/improve cycles.
    pub max_rounds: usize,

    /// Whether sweeps update in place or from a snapshot.
    pub update: UpdateScheme,

    /// Evaluate synchronous sweeps on the rayon thread pool.
    ///
    /// Ignored for in-place sweeps, which are inherently ordered.
    pub parallel: bool,

    /// Numeric slack for argmax ties and "strictly exceeds" comparisons.
    pub tolerance: f64,

    /// Random seed for the initial policy of policy iteration.
    ///
    /// If `None`, the solver seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            discount: 0.9,
            theta: 1e-9,
            sweeps: None,
            max_sweeps: 10_000,
            max_rounds: 1_000,
            update: UpdateScheme::InPlace,
            parallel: false,
            tolerance: 1e-9,
            seed: None,
        }
    }
}

impl SolverConfig {
    /// Create a new SolverConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// The coursework constants: ten value-iteration sweeps and a policy
    /// evaluation delta of 0.1.
    pub fn classic() -> Self {
        Self {
            theta: 0.1,
            sweeps: Some(10),
            ..Default::default()
        }
    }

    /// Run everything to a tight fixed point with synchronous sweeps.
    pub fn exact() -> Self {
        Self {
            theta: 1e-12,
            update: UpdateScheme::Synchronous,
            ..Default::default()
        }
    }

    /// Builder method: set the discount factor.
    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    /// Builder method: set the convergence threshold.
    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    /// Builder method: use a fixed number of value-iteration sweeps.
    pub fn with_sweeps(mut self, sweeps: usize) -> Self {
        self.sweeps = Some(sweeps);
        self
    }

    /// Builder method: set the per-run sweep cap.
    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    /// Builder method: set the policy-iteration round cap.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Builder method: set the update scheme.
    pub fn with_update(mut self, update: UpdateScheme) -> Self {
        self.update = update;
        self
    }

    /// Builder method: evaluate synchronous sweeps in parallel.
    pub fn with_parallel(mut self, enable: bool) -> Self {
        self.parallel = enable;
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string. Missing fields take their
    /// default values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.discount) {
            return Err(ConfigError::InvalidDiscount(self.discount));
        }

        if !(self.theta >= 0.0) {
            return Err(ConfigError::InvalidThreshold(self.theta));
        }

        if !(self.tolerance >= 0.0) {
            return Err(ConfigError::InvalidTolerance(self.tolerance));
        }

        if self.sweeps == Some(0) {
            return Err(ConfigError::ZeroCap("sweeps"));
        }

        if self.max_sweeps == 0 {
            return Err(ConfigError::ZeroCap("max_sweeps"));
        }

        if self.max_rounds == 0 {
            return Err(ConfigError::ZeroCap("max_rounds"));
        }

        Ok(())
    }
}

/// Errors that can occur when validating solver configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Discount factor is out of range [0, 1).
    #[error("discount {0} is out of range [0, 1)")]
    InvalidDiscount(f64),
    /// Convergence threshold is negative or NaN.
    #[error("convergence threshold {0} must be non-negative")]
    InvalidThreshold(f64),
    /// Tolerance is negative or NaN.
    #[error("tolerance {0} must be non-negative")]
    InvalidTolerance(f64),
    /// A resource cap was set to zero.
    #[error("{0} must be at least 1")]
    ZeroCap(&'static str),
    /// The configuration file could not be read.
    #[error("cannot read config: {0}")]
    Io(String),
    /// The configuration text is not valid JSON for `SolverConfig`.
    #[error("cannot parse config: {0}")]
    Parse(String),
}

/// Why a training run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Termination {
    /// Not trained yet.
    #[default]
    Pending,
    /// Values converged (and, for policy iteration, the policy is stable).
    Converged,
    /// Value iteration ran its configured fixed number of sweeps and the
    /// last one changed no value by `theta` or more.
    FixedSweeps,
    /// A value-iteration run or a policy evaluation hit `max_sweeps`, or a
    /// fixed sweep count ran out while values were still moving.
    SweepLimit,
    /// Policy iteration hit `max_rounds` while the policy was still changing.
    RoundLimit,
}

impl Termination {
    /// True when the run ended by reaching its stopping condition rather
    /// than a resource cap.
    pub fn is_complete(self) -> bool {
        matches!(self, Termination::Converged | Termination::FixedSweeps)
    }
}

/// Statistics tracked during training.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverStats {
    /// Number of states in the enumerated set.
    pub states: usize,

    /// Number of those states that are terminal.
    pub terminal_states: usize,

    /// Total sweeps performed across all runs.
    pub sweeps: u64,

    /// Policy-iteration evaluate/improve cycles (0 for value iteration).
    pub rounds: u64,

    /// Policy entries changed by improvement steps.
    pub policy_changes: u64,

    /// Maximum absolute value change in the last sweep.
    pub last_delta: f64,

    /// Total time spent training (in seconds).
    pub elapsed_seconds: f64,

    /// Why training stopped.
    pub termination: Termination,
}

impl SolverStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the last training run completed.
    pub fn is_complete(&self) -> bool {
        self.termination.is_complete()
    }
}
