//! MDP trait definition for the dynamic-programming solvers.
//!
//! Any finite model that implements the `Mdp` trait can be solved with
//! value iteration or policy iteration. This keeps the algorithms apart from
//! the specific game being modeled.

use std::fmt::Debug;
use std::hash::Hash;

/// Trait for states of a finite MDP.
///
/// States are used as keys, so two independently constructed but identical
/// states must compare equal and hash the same.
pub trait MdpState: Clone + Eq + Hash + Debug + Send + Sync {}

impl<T: Clone + Eq + Hash + Debug + Send + Sync> MdpState for T {}

/// Trait for actions of a finite MDP.
pub trait MdpAction: Clone + Eq + Debug + Send + Sync {}

impl<T: Clone + Eq + Debug + Send + Sync> MdpAction for T {}

/// The result of taking an action and letting the environment respond.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<S> {
    /// The state the agent observes next.
    pub next: S,
    /// Immediate reward collected on the way there.
    pub reward: f64,
}

/// One of possibly several outcomes of taking an action in a state.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    /// Probability of this outcome. All transitions for a fixed
    /// `(state, action)` sum to 1.0.
    pub probability: f64,
    /// The resulting state and reward.
    pub outcome: Outcome<S>,
}

impl<S> Transition<S> {
    /// Create a transition from its parts.
    pub fn new(probability: f64, next: S, reward: f64) -> Self {
        Self {
            probability,
            outcome: Outcome { next, reward },
        }
    }
}

/// The main MDP trait that defines the interface the solvers consume.
///
/// # Example
/// ```ignore
/// struct MyMdp;
///
/// impl Mdp for MyMdp {
///     type State = MyState;
///     type Action = MyAction;
///
///     // ... implement required methods
/// }
/// ```
pub trait Mdp: Send + Sync {
    /// The type representing a state.
    type State: MdpState;

    /// The type representing an action the agent can take.
    type Action: MdpAction;

    /// Enumerate every state the solvers will cover, in a fixed order.
    ///
    /// The set must contain every non-terminal state the agent can face and
    /// must be closed under one transition step.
    fn states(&self) -> Vec<Self::State>;

    /// Check if the given state is terminal.
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Valid actions in `state`, in a deterministic order.
    ///
    /// Returns an empty vector if and only if the state is terminal.
    fn actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Distribution over outcomes of taking `action` in `state`.
    ///
    /// Only defined for non-terminal states and actions returned by
    /// [`Mdp::actions`]. Must be a pure function of its inputs.
    fn transitions(&self, state: &Self::State, action: &Self::Action) -> Vec<Transition<Self::State>>;
}
