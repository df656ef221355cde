//! Game models for the MDP solvers.
//!
//! A game becomes an MDP by fixing the seat the agent plays and folding the
//! other player into the transition model. These models serve as:
//!
//! 1. **Validation**: Tic-tac-toe has a known game-theoretic value, so the
//!    solvers can be checked against it.
//!
//! 2. **Examples**: Demonstrate how to implement the `Mdp` trait.
//!
//! 3. **Benchmarks**: Provide a standard model for performance testing.
//!
//! ## Available Games
//!
//! - [`tictactoe`]: Tic-tac-toe against a random or perfect opponent

pub mod tictactoe;
