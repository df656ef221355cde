//! Bellman backups and sweeps shared by both solvers.
//!
//! Value iteration and policy iteration differ only in which backup they
//! feed to [`sweep`]: the optimality backup maximizes over actions, the
//! expectation backup follows one fixed action per state.

use rayon::prelude::*;

use crate::mdp::config::UpdateScheme;
use crate::mdp::model::{MdpAction, MdpState};
use crate::mdp::storage::{Edge, ModelTable};

/// Expected return of one action: `Σ p * (r + γ V(s'))`.
#[inline]
pub fn q_value(edges: &[Edge], values: &[f64], discount: f64) -> f64 {
    edges
        .iter()
        .map(|e| e.probability * (e.reward + discount * values[e.next]))
        .sum()
}

/// Result of a one-step lookahead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Greedy {
    /// Index of the chosen action among the state's valid actions.
    pub action: usize,
    /// The maximum expected return over all actions.
    pub value: f64,
}

/// One-step lookahead over every action of state `idx`.
///
/// Picks the first action (in action order) whose expected return is within
/// `tolerance` of the maximum. Returns `None` for states without actions.
pub fn greedy<S: MdpState, A: MdpAction>(
    table: &ModelTable<S, A>,
    idx: usize,
    values: &[f64],
    discount: f64,
    tolerance: f64,
) -> Option<Greedy> {
    let q: Vec<f64> = table
        .action_edges(idx)
        .iter()
        .map(|edges| q_value(edges, values, discount))
        .collect();

    let best = q.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    q.iter()
        .position(|&v| v >= best - tolerance)
        .map(|action| Greedy { action, value: best })
}

/// Bellman optimality backup: the best expected return over all actions.
pub fn optimal_backup<S: MdpState, A: MdpAction>(
    table: &ModelTable<S, A>,
    idx: usize,
    values: &[f64],
    discount: f64,
) -> f64 {
    table
        .action_edges(idx)
        .iter()
        .map(|edges| q_value(edges, values, discount))
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Bellman expectation backup under the fixed action `action`.
pub fn policy_backup<S: MdpState, A: MdpAction>(
    table: &ModelTable<S, A>,
    idx: usize,
    action: usize,
    values: &[f64],
    discount: f64,
) -> f64 {
    q_value(table.edges(idx, action), values, discount)
}

/// Apply `backup` to every non-terminal state once and pin terminal states
/// to 0.0.
///
/// Returns the maximum absolute change of any state's value.
pub fn sweep<S, A, F>(
    table: &ModelTable<S, A>,
    values: &mut [f64],
    scheme: UpdateScheme,
    parallel: bool,
    backup: F,
) -> f64
where
    S: MdpState,
    A: MdpAction,
    F: Fn(usize, &[f64]) -> f64 + Sync,
{
    match scheme {
        UpdateScheme::InPlace => {
            let mut delta = 0.0_f64;
            for idx in 0..values.len() {
                let updated = if table.is_terminal(idx) {
                    0.0
                } else {
                    backup(idx, values)
                };
                delta = delta.max((updated - values[idx]).abs());
                values[idx] = updated;
            }
            delta
        }
        UpdateScheme::Synchronous => {
            let prior = values.to_vec();
            let update = |idx: usize| {
                if table.is_terminal(idx) {
                    0.0
                } else {
                    backup(idx, &prior)
                }
            };

            let next: Vec<f64> = if parallel {
                (0..prior.len()).into_par_iter().map(update).collect()
            } else {
                (0..prior.len()).map(update).collect()
            };

            let delta = prior
                .iter()
                .zip(next.iter())
                .map(|(old, new)| (new - old).abs())
                .fold(0.0, f64::max);
            values.copy_from_slice(&next);
            delta
        }
    }
}
