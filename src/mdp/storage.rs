//! Storage for the state set, the compiled transition model, values, and policies.
//!
//! The solvers never touch the `Mdp` after construction. Instead they compile it
//! once into a [`ModelTable`]: an ordered, indexed state set plus every
//! transition rewritten to point at successor indices. Values live in a flat
//! `Vec<f64>` aligned with that index, and are handed out as a keyed
//! [`ValueFunction`] or [`Policy`] once the caller asks for them.

use rustc_hash::FxHashMap;

use crate::mdp::error::SolverError;
use crate::mdp::model::{Mdp, MdpAction, MdpState};

/// Probability mass may deviate from 1.0 by at most this much.
const DISTRIBUTION_SLACK: f64 = 1e-9;

/// An ordered state set with constant-time lookup by state.
#[derive(Debug, Clone)]
pub struct StateSpace<S: MdpState> {
    /// States in enumeration order.
    states: Vec<S>,

    /// state -> position in `states`
    index: FxHashMap<S, usize>,

    /// Terminal flag per state.
    terminal: Vec<bool>,
}

impl<S: MdpState> StateSpace<S> {
    /// Build a state space, keeping the first occurrence of any duplicate.
    pub fn new<F>(states: Vec<S>, is_terminal: F) -> Self
    where
        F: Fn(&S) -> bool,
    {
        let mut index = FxHashMap::with_capacity_and_hasher(states.len(), Default::default());
        let mut ordered = Vec::with_capacity(states.len());

        for state in states {
            if index.contains_key(&state) {
                continue;
            }
            index.insert(state.clone(), ordered.len());
            ordered.push(state);
        }

        let terminal = ordered.iter().map(|s| is_terminal(s)).collect();

        Self {
            states: ordered,
            index,
            terminal,
        }
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Position of `state`, if it belongs to the set.
    pub fn index_of(&self, state: &S) -> Option<usize> {
        self.index.get(state).copied()
    }

    /// Position of `state`, or an `UnknownState` error.
    pub fn require(&self, state: &S) -> Result<usize, SolverError> {
        self.index_of(state).ok_or_else(|| SolverError::UnknownState {
            state: format!("{:?}", state),
        })
    }

    /// State at position `idx`.
    pub fn state(&self, idx: usize) -> &S {
        &self.states[idx]
    }

    /// Whether the state at `idx` is terminal.
    pub fn is_terminal(&self, idx: usize) -> bool {
        self.terminal[idx]
    }

    /// Number of terminal states.
    pub fn num_terminal(&self) -> usize {
        self.terminal.iter().filter(|&&t| t).count()
    }

    /// States in enumeration order.
    pub fn states(&self) -> &[S] {
        &self.states
    }
}

/// A transition with its successor resolved to a state index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Probability of this outcome.
    pub probability: f64,
    /// Immediate reward.
    pub reward: f64,
    /// Index of the successor state.
    pub next: usize,
}

/// The solver-local view of an MDP.
///
/// Compiling validates the model's preconditions up front: the state set is
/// closed under one transition, every non-terminal state has at least one
/// action, and each distribution sums to one.
#[derive(Debug, Clone)]
pub struct ModelTable<S: MdpState, A: MdpAction> {
    space: StateSpace<S>,

    /// Valid actions per state; empty for terminal states.
    actions: Vec<Vec<A>>,

    /// edges[state][action] -> outcomes
    edges: Vec<Vec<Vec<Edge>>>,
}

impl<S: MdpState, A: MdpAction> ModelTable<S, A> {
    /// Enumerate and compile `mdp`.
    pub fn compile<M>(mdp: &M) -> Result<Self, SolverError>
    where
        M: Mdp<State = S, Action = A>,
    {
        let space = StateSpace::new(mdp.states(), |s| mdp.is_terminal(s));
        let mut actions = Vec::with_capacity(space.len());
        let mut edges = Vec::with_capacity(space.len());

        for idx in 0..space.len() {
            let state = space.state(idx);

            if space.is_terminal(idx) {
                actions.push(Vec::new());
                edges.push(Vec::new());
                continue;
            }

            let valid = mdp.actions(state);
            if valid.is_empty() {
                return Err(SolverError::NoActions {
                    state: format!("{:?}", state),
                });
            }

            let mut per_action = Vec::with_capacity(valid.len());
            for action in &valid {
                let transitions = mdp.transitions(state, action);
                if let Some(t) = transitions
                    .iter()
                    .find(|t| !(0.0..=1.0).contains(&t.probability))
                {
                    return Err(SolverError::InvalidProbability {
                        state: format!("{:?}", state),
                        action: format!("{:?}", action),
                        probability: t.probability,
                    });
                }
                let sum: f64 = transitions.iter().map(|t| t.probability).sum();
                if !((sum - 1.0).abs() <= DISTRIBUTION_SLACK) {
                    return Err(SolverError::InvalidDistribution {
                        state: format!("{:?}", state),
                        action: format!("{:?}", action),
                        sum,
                    });
                }

                let resolved = transitions
                    .iter()
                    .map(|t| {
                        Ok(Edge {
                            probability: t.probability,
                            reward: t.outcome.reward,
                            next: space.require(&t.outcome.next)?,
                        })
                    })
                    .collect::<Result<Vec<_>, SolverError>>()?;
                per_action.push(resolved);
            }

            actions.push(valid);
            edges.push(per_action);
        }

        log::debug!(
            "compiled model: {} states ({} terminal)",
            space.len(),
            space.num_terminal()
        );

        Ok(Self {
            space,
            actions,
            edges,
        })
    }

    /// The indexed state set.
    pub fn space(&self) -> &StateSpace<S> {
        &self.space
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.space.len()
    }

    /// Whether the model has no states.
    pub fn is_empty(&self) -> bool {
        self.space.is_empty()
    }

    /// Whether the state at `idx` is terminal.
    pub fn is_terminal(&self, idx: usize) -> bool {
        self.space.is_terminal(idx)
    }

    /// Valid actions of the state at `idx`.
    pub fn actions(&self, idx: usize) -> &[A] {
        &self.actions[idx]
    }

    /// Outcomes of taking the `action`-th valid action in state `idx`.
    pub fn edges(&self, idx: usize, action: usize) -> &[Edge] {
        &self.edges[idx][action]
    }

    /// Outcome lists for every valid action of state `idx`.
    pub fn action_edges(&self, idx: usize) -> &[Vec<Edge>] {
        &self.edges[idx]
    }

    /// Indices of non-terminal states, in enumeration order.
    pub fn non_terminal(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(move |&i| !self.is_terminal(i))
    }

    /// Position of `action` among the valid actions of state `idx`.
    pub fn action_index(&self, idx: usize, action: &A) -> Option<usize> {
        self.actions[idx].iter().position(|a| a == action)
    }

    /// Key a flat value vector by state.
    pub fn value_function(&self, values: &[f64]) -> ValueFunction<S> {
        let values = self
            .space
            .states()
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .collect();
        ValueFunction { values }
    }

    /// Key a flat action-index vector by state, skipping terminal states.
    pub fn policy(&self, choices: &[usize]) -> Policy<S, A> {
        let actions = self
            .non_terminal()
            .map(|i| (self.space.state(i).clone(), self.actions[i][choices[i]].clone()))
            .collect();
        Policy { actions }
    }
}

/// A frozen mapping from state to expected return.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueFunction<S: MdpState> {
    values: FxHashMap<S, f64>,
}

impl<S: MdpState> ValueFunction<S> {
    /// Value of `state`, if it is in the state set.
    pub fn get(&self, state: &S) -> Option<f64> {
        self.values.get(state).copied()
    }

    /// Number of states covered.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no state is covered.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(state, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&S, f64)> {
        self.values.iter().map(|(s, &v)| (s, v))
    }
}

/// A deterministic mapping from non-terminal state to action.
///
/// This is the artifact both solvers produce and the play-out driver consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy<S: MdpState, A: MdpAction> {
    actions: FxHashMap<S, A>,
}

impl<S: MdpState, A: MdpAction> Default for Policy<S, A> {
    fn default() -> Self {
        Self {
            actions: FxHashMap::default(),
        }
    }
}

impl<S: MdpState, A: MdpAction> Policy<S, A> {
    /// Action chosen in `state`. `None` for terminal or unknown states.
    pub fn get(&self, state: &S) -> Option<&A> {
        self.actions.get(state)
    }

    /// Action chosen in `state`, or a `MissingPolicyEntry` error.
    pub fn action(&self, state: &S) -> Result<&A, SolverError> {
        self.get(state).ok_or_else(|| SolverError::MissingPolicyEntry {
            state: format!("{:?}", state),
        })
    }

    /// Number of states with an entry.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the policy has no entries.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Iterate over `(state, action)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&S, &A)> {
        self.actions.iter()
    }
}
