//! Policy Iteration solver.
//!
//! Alternates between evaluating the current policy to convergence and
//! improving it by one-step lookahead, until no state changes its action.
//!
//! Two convergence notions are involved:
//! - **value convergence** of one fixed policy, reached when a whole
//!   evaluation sweep changes no value by `theta` or more;
//! - **policy stability**, reached when an improvement step changes nothing.
//!
//! Only the second ends training.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::mdp::backup::{self, greedy, policy_backup};
use crate::mdp::config::{SolverConfig, SolverStats, Termination};
use crate::mdp::error::SolverError;
use crate::mdp::model::{Mdp, MdpAction, MdpState};
use crate::mdp::storage::{ModelTable, Policy, ValueFunction};

/// Policy iteration over a compiled MDP.
///
/// # Example
/// ```ignore
/// use tictactoe_mdp::mdp::{PolicyIteration, SolverConfig};
///
/// let config = SolverConfig::default().with_seed(7);
/// let mut solver = PolicyIteration::new(&my_mdp, config)?;
/// let stats = solver.train();
/// assert!(stats.is_complete());
/// ```
#[derive(Debug, Clone)]
pub struct PolicyIteration<S: MdpState, A: MdpAction> {
    table: ModelTable<S, A>,
    config: SolverConfig,

    /// V^π(s), shared across rounds and never reset.
    values: Vec<f64>,

    /// Chosen action index per state. Entries of terminal states are unused.
    choices: Vec<usize>,

    stats: SolverStats,
}

impl<S: MdpState, A: MdpAction> PolicyIteration<S, A> {
    /// Compile `mdp` and draw a uniformly random initial policy.
    ///
    /// The draw uses `config.seed` when set, so runs are reproducible.
    pub fn new<M>(mdp: &M, config: SolverConfig) -> Result<Self, SolverError>
    where
        M: Mdp<State = S, Action = A>,
    {
        config.validate()?;
        let table = ModelTable::compile(mdp)?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self::from_table(table, config, &mut rng))
    }

    /// Set up a solver over an already compiled model, drawing the initial
    /// policy from `rng`.
    pub fn from_table<R: Rng>(table: ModelTable<S, A>, config: SolverConfig, rng: &mut R) -> Self {
        let choices = (0..table.len())
            .map(|idx| match table.actions(idx).len() {
                0 => 0,
                n => rng.gen_range(0..n),
            })
            .collect();

        let stats = SolverStats {
            states: table.len(),
            terminal_states: table.space().num_terminal(),
            ..SolverStats::new()
        };

        Self {
            values: vec![0.0; table.len()],
            choices,
            table,
            config,
            stats,
        }
    }

    /// Evaluate the current policy with the configured `theta` as delta.
    pub fn evaluate_policy(&mut self) -> Termination {
        self.evaluate_policy_with(self.config.theta)
    }

    /// Sweep Bellman expectation backups under the fixed current policy until
    /// the largest change in a sweep is below `delta`.
    ///
    /// Returns `SweepLimit` if `max_sweeps` sweeps did not get there.
    pub fn evaluate_policy_with(&mut self, delta: f64) -> Termination {
        let table = &self.table;
        let choices = &self.choices;
        let discount = self.config.discount;

        for sweep in 1..=self.config.max_sweeps {
            let change = backup::sweep(
                table,
                &mut self.values,
                self.config.update,
                self.config.parallel,
                |idx, values| policy_backup(table, idx, choices[idx], values, discount),
            );

            self.stats.sweeps += 1;
            self.stats.last_delta = change;

            if change < delta {
                log::debug!("policy evaluated in {} sweeps", sweep);
                return Termination::Converged;
            }
        }

        Termination::SweepLimit
    }

    /// Improve the policy by one-step lookahead on the current values.
    ///
    /// A state switches to its best action only if that action's expected
    /// return exceeds the stored value by more than `tolerance`. Returns
    /// true iff at least one state's action changed.
    pub fn improve_policy(&mut self) -> bool {
        let mut changed = 0u64;

        for idx in 0..self.table.len() {
            if self.table.is_terminal(idx) {
                continue;
            }
            let Some(best) = greedy(
                &self.table,
                idx,
                &self.values,
                self.config.discount,
                self.config.tolerance,
            ) else {
                continue;
            };

            // a lagging evaluation of the action already chosen is not a change
            if best.value > self.values[idx] + self.config.tolerance
                && best.action != self.choices[idx]
            {
                self.choices[idx] = best.action;
                changed += 1;
            }
        }

        self.stats.policy_changes += changed;
        log::debug!("policy improvement changed {} states", changed);
        changed > 0
    }

    /// Alternate evaluation and improvement until the policy is stable.
    ///
    /// Training is abandoned, and reported as such in
    /// [`SolverStats::termination`], if an evaluation exceeds `max_sweeps` or
    /// the policy is still changing after `max_rounds` rounds.
    ///
    /// Values and the policy carry over between calls; the round, sweep and
    /// change counts in the stats cover this call only.
    pub fn train(&mut self) -> &SolverStats {
        let start_time = Instant::now();
        self.stats.rounds = 0;
        self.stats.sweeps = 0;
        self.stats.policy_changes = 0;
        log::info!(
            "policy iteration over {} states (discount {}, delta {:.1e})",
            self.table.len(),
            self.config.discount,
            self.config.theta
        );

        let termination = loop {
            self.stats.rounds += 1;

            if self.evaluate_policy() == Termination::SweepLimit {
                log::warn!(
                    "policy evaluation abandoned after {} sweeps in round {}",
                    self.config.max_sweeps,
                    self.stats.rounds
                );
                break Termination::SweepLimit;
            }

            if !self.improve_policy() {
                break Termination::Converged;
            }

            if self.stats.rounds >= self.config.max_rounds as u64 {
                log::warn!(
                    "policy still changing after {} rounds",
                    self.config.max_rounds
                );
                break Termination::RoundLimit;
            }
        };

        self.stats.termination = termination;
        self.stats.elapsed_seconds = start_time.elapsed().as_secs_f64();
        log::info!(
            "policy iteration finished: {:?} after {} rounds ({} sweeps, {} changes) in {:.3}s",
            termination,
            self.stats.rounds,
            self.stats.sweeps,
            self.stats.policy_changes,
            self.stats.elapsed_seconds
        );

        &self.stats
    }

    /// Fix the action taken in `state`.
    pub fn set_action(&mut self, state: &S, action: &A) -> Result<(), SolverError> {
        let idx = self.table.space().require(state)?;
        if self.table.is_terminal(idx) {
            return Err(SolverError::TerminalAction {
                state: format!("{:?}", state),
            });
        }
        let choice = self
            .table
            .action_index(idx, action)
            .ok_or_else(|| SolverError::InvalidAction {
                state: format!("{:?}", state),
                action: format!("{:?}", action),
            })?;
        self.choices[idx] = choice;
        Ok(())
    }

    /// Action the current policy takes in `state`.
    pub fn action(&self, state: &S) -> Result<&A, SolverError> {
        let idx = self.table.space().require(state)?;
        if self.table.is_terminal(idx) {
            return Err(SolverError::TerminalAction {
                state: format!("{:?}", state),
            });
        }
        Ok(&self.table.actions(idx)[self.choices[idx]])
    }

    /// Snapshot of the current policy.
    pub fn policy(&self) -> Policy<S, A> {
        self.table.policy(&self.choices)
    }

    /// Current value of `state`, if it is in the state set.
    pub fn value(&self, state: &S) -> Option<f64> {
        self.table.space().index_of(state).map(|idx| self.values[idx])
    }

    /// Snapshot of the current value function.
    pub fn value_function(&self) -> ValueFunction<S> {
        self.table.value_function(&self.values)
    }

    /// Get current statistics.
    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    /// Get reference to the compiled model.
    pub fn table(&self) -> &ModelTable<S, A> {
        &self.table
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::model::Transition;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Toy {
        Start,
        Won,
        Lost,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Bet {
        Gamble,
        Safe,
    }

    /// `Gamble` pays +1 w.p. 0.7 and -1 w.p. 0.3; `Safe` pays 0.5.
    struct ToyMdp;

    impl Mdp for ToyMdp {
        type State = Toy;
        type Action = Bet;

        fn states(&self) -> Vec<Toy> {
            vec![Toy::Start, Toy::Won, Toy::Lost]
        }

        fn is_terminal(&self, state: &Toy) -> bool {
            *state != Toy::Start
        }

        fn actions(&self, state: &Toy) -> Vec<Bet> {
            if self.is_terminal(state) {
                vec![]
            } else {
                vec![Bet::Gamble, Bet::Safe]
            }
        }

        fn transitions(&self, _state: &Toy, action: &Bet) -> Vec<Transition<Toy>> {
            match action {
                Bet::Gamble => vec![
                    Transition::new(0.7, Toy::Won, 1.0),
                    Transition::new(0.3, Toy::Lost, -1.0),
                ],
                Bet::Safe => vec![Transition::new(1.0, Toy::Won, 0.5)],
            }
        }
    }

    /// A ring of `n` states where `Step` pays 1 and `Stay` pays 0, forever.
    struct Ring(u8);

    impl Mdp for Ring {
        type State = u8;
        type Action = bool;

        fn states(&self) -> Vec<u8> {
            (0..self.0).collect()
        }

        fn is_terminal(&self, _state: &u8) -> bool {
            false
        }

        fn actions(&self, _state: &u8) -> Vec<bool> {
            vec![false, true]
        }

        fn transitions(&self, state: &u8, step: &bool) -> Vec<Transition<u8>> {
            if *step {
                vec![Transition::new(1.0, (state + 1) % self.0, 1.0)]
            } else {
                vec![Transition::new(1.0, *state, 0.0)]
            }
        }
    }

    #[test]
    fn test_evaluate_fixed_policy_matches_analytic_value() {
        let mut solver = PolicyIteration::new(&ToyMdp, SolverConfig::default().with_seed(1)).unwrap();

        solver.set_action(&Toy::Start, &Bet::Gamble).unwrap();
        assert_eq!(solver.evaluate_policy(), Termination::Converged);
        assert!((solver.value(&Toy::Start).unwrap() - 0.4).abs() < 1e-6);

        solver.set_action(&Toy::Start, &Bet::Safe).unwrap();
        solver.evaluate_policy();
        assert!((solver.value(&Toy::Start).unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_train_finds_safe_bet() {
        for seed in 0..8 {
            let mut solver =
                PolicyIteration::new(&ToyMdp, SolverConfig::default().with_seed(seed)).unwrap();
            let stats = solver.train();
            assert_eq!(stats.termination, Termination::Converged);
            assert_eq!(solver.action(&Toy::Start).unwrap(), &Bet::Safe);
            assert!((solver.value(&Toy::Start).unwrap() - 0.5).abs() < 1e-6);
            assert_eq!(solver.value(&Toy::Won), Some(0.0));
        }
    }

    #[test]
    fn test_improve_reports_no_change_when_optimal() {
        let mut solver = PolicyIteration::new(&ToyMdp, SolverConfig::default().with_seed(3)).unwrap();
        solver.set_action(&Toy::Start, &Bet::Safe).unwrap();
        solver.evaluate_policy();
        assert!(!solver.improve_policy());

        solver.set_action(&Toy::Start, &Bet::Gamble).unwrap();
        solver.evaluate_policy();
        assert!(solver.improve_policy());
        assert_eq!(solver.action(&Toy::Start).unwrap(), &Bet::Safe);
    }

    #[test]
    fn test_improve_ignores_stale_value_of_chosen_action() {
        let mut solver = PolicyIteration::new(&ToyMdp, SolverConfig::default().with_seed(3)).unwrap();
        solver.set_action(&Toy::Start, &Bet::Safe).unwrap();
        // not evaluated yet: V(Start) = 0.0 trails Q(Start, Safe) = 0.5
        assert_eq!(solver.value(&Toy::Start), Some(0.0));
        assert!(!solver.improve_policy());
        assert_eq!(solver.stats().policy_changes, 0);
        assert_eq!(solver.action(&Toy::Start).unwrap(), &Bet::Safe);
    }

    #[test]
    fn test_retraining_counts_rounds_afresh() {
        let config = SolverConfig::default().with_max_rounds(2).with_seed(6);
        let mut solver = PolicyIteration::new(&ToyMdp, config).unwrap();
        assert_eq!(solver.train().termination, Termination::Converged);

        // one improving round, then one confirming round
        solver.set_action(&Toy::Start, &Bet::Gamble).unwrap();
        let stats = solver.train();
        assert_eq!(stats.termination, Termination::Converged);
        assert_eq!(stats.rounds, 2);
        assert_eq!(stats.policy_changes, 1);
        assert_eq!(solver.action(&Toy::Start).unwrap(), &Bet::Safe);
    }

    #[test]
    fn test_cyclic_model_converges_to_discounted_sum() {
        let config = SolverConfig::default().with_discount(0.5).with_seed(11);
        let mut solver = PolicyIteration::new(&Ring(3), config).unwrap();
        let stats = solver.train();
        assert!(stats.is_complete());
        // stepping forever pays 1 + 0.5 + 0.25 + ... = 2
        for s in 0..3 {
            assert!((solver.value(&s).unwrap() - 2.0).abs() < 1e-6);
            assert_eq!(solver.action(&s).unwrap(), &true);
        }
    }

    #[test]
    fn test_evaluation_sweep_cap_abandons_training() {
        let config = SolverConfig::default()
            .with_discount(0.99)
            .with_theta(0.0)
            .with_max_sweeps(20)
            .with_seed(5);
        let mut solver = PolicyIteration::new(&Ring(4), config).unwrap();
        let stats = solver.train();
        assert_eq!(stats.termination, Termination::SweepLimit);
        assert_eq!(stats.rounds, 1);
        assert!(!stats.is_complete());
    }

    #[test]
    fn test_round_cap_is_reported() {
        let config = SolverConfig::default()
            .with_discount(0.5)
            .with_max_rounds(1)
            .with_seed(2);
        let mut solver = PolicyIteration::new(&Ring(3), config).unwrap();
        for s in 0..3 {
            solver.set_action(&s, &false).unwrap();
        }
        let stats = solver.train();
        assert_eq!(stats.termination, Termination::RoundLimit);
    }

    #[test]
    fn test_precondition_violations() {
        let mut solver = PolicyIteration::new(&ToyMdp, SolverConfig::default().with_seed(0)).unwrap();
        assert!(matches!(
            solver.set_action(&Toy::Won, &Bet::Safe),
            Err(SolverError::TerminalAction { .. })
        ));
        assert!(matches!(
            solver.action(&Toy::Lost),
            Err(SolverError::TerminalAction { .. })
        ));
        assert_eq!(solver.policy().len(), 1);
    }

    #[test]
    fn test_same_seed_same_initial_policy() {
        let config = SolverConfig::default().with_seed(42);
        let a = PolicyIteration::new(&Ring(16), config.clone()).unwrap();
        let b = PolicyIteration::new(&Ring(16), config).unwrap();
        assert_eq!(a.policy(), b.policy());
    }
}
