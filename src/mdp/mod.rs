//! Dynamic-programming solvers for finite Markov Decision Processes.
//!
//! This module provides generic implementations of the two classical
//! planning algorithms for MDPs whose model is known in advance.
//!
//! # Overview
//!
//! Both solvers work on the same compiled model: an ordered state set, the
//! valid actions of each state, and for every `(state, action)` the
//! distribution over `(next state, reward)` outcomes.
//!
//! - **Value Iteration**: repeat the Bellman optimality backup
//!   `V(s) ← max_a Σ p (r + γ V(s'))` over all states, then act greedily.
//! - **Policy Iteration**: evaluate a fixed policy with the expectation backup
//!   `V(s) ← Σ p (r + γ V(s'))` for `a = π(s)`, improve `π` greedily, repeat
//!   until `π` stops changing.
//!
//! Terminal states are pinned to a value of 0.0 in every sweep and carry no
//! policy entry.
//!
//! # Usage
//!
//! 1. Implement the `Mdp` trait for your model
//! 2. Create a `ValueIteration` or `PolicyIteration` with a `SolverConfig`
//! 3. Call `train()`
//! 4. Read the `Policy` and check `SolverStats::termination`
//!
//! # Example
//!
//! ```ignore
//! use tictactoe_mdp::mdp::{PolicyIteration, SolverConfig, ValueIteration};
//!
//! let config = SolverConfig::default().with_seed(42);
//!
//! let mut vi = ValueIteration::new(&my_mdp, config.clone())?;
//! vi.train();
//!
//! let mut pi = PolicyIteration::new(&my_mdp, config)?;
//! let stats = pi.train();
//! println!("{} rounds, {:?}", stats.rounds, stats.termination);
//! ```
//!
//! # Sweep order
//!
//! Sweeps update values in place by default, so a state visited later in a
//! sweep already reads the values written earlier in it. Synchronous sweeps
//! read only the previous sweep's values and can run on the rayon pool. Both
//! converge to the same fixed point for a discount below one.

pub mod backup;
pub mod config;
pub mod error;
pub mod model;
pub mod policy_iteration;
pub mod storage;
pub mod value_iteration;

// Re-export main types for convenient access
pub use config::{ConfigError, SolverConfig, SolverStats, Termination, UpdateScheme};
pub use error::SolverError;
pub use model::{Mdp, MdpAction, MdpState, Outcome, Transition};
pub use policy_iteration::PolicyIteration;
pub use storage::{ModelTable, Policy, StateSpace, ValueFunction};
pub use value_iteration::ValueIteration;
