//! # Tic-Tac-Toe MDP
//!
//! Dynamic-programming planners for finite Markov Decision Processes, with
//! tic-tac-toe against a stochastic opponent as the worked model.
//!
//! ## Features
//!
//! - **Generic Solvers**: Value Iteration and Policy Iteration over any model
//!   implementing the `Mdp` trait
//! - **Compiled Model**: States, actions and transitions are validated once
//!   and stored by index
//! - **Sweep Schemes**: In-place (Gauss-Seidel) or synchronous sweeps, the
//!   latter optionally on the rayon pool
//! - **Explicit Termination**: Every run reports whether it converged or hit
//!   a cap
//!
//! ## Quick Start
//!
//! ```ignore
//! use tictactoe_mdp::games::tictactoe::{Mark, Opponent, Rewards, TicTacToeMdp};
//! use tictactoe_mdp::mdp::{SolverConfig, ValueIteration};
//!
//! let mdp = TicTacToeMdp::new(Mark::X, Opponent::Random, Rewards::default());
//! let mut solver = ValueIteration::new(&mdp, SolverConfig::default())?;
//! solver.train();
//! let policy = solver.policy().unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`mdp`]: Model trait, compiled storage and both solvers
//! - [`games`]: Game models (tic-tac-toe)
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                 MDP Solvers (Generic)                     │
//! │  - Value Iteration        - Policy Iteration              │
//! │  - Bellman backups        - Greedy policy extraction      │
//! └───────────────────────────────────────────────────────────┘
//!                             │
//!                             │ implements Mdp trait
//!                             ▼
//!                    ┌─────────────────┐
//!                    │   Tic-Tac-Toe   │
//!                    │ Random/Perfect  │
//!                    └─────────────────┘
//! ```

#![warn(missing_docs)]

/// Markov Decision Process solvers.
///
/// This is the core module containing the generic planning algorithms.
pub mod mdp;

/// Game models module.
///
/// Contains tic-tac-toe expressed as an MDP.
pub mod games;

// Re-export commonly used types at crate root for convenience
pub use mdp::{Mdp, Policy, PolicyIteration, SolverConfig, SolverError, SolverStats, ValueIteration};
