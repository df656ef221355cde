//! Value Iteration solver.
//!
//! Repeats Bellman optimality sweeps over the whole state set, then reads a
//! greedy policy off the converged values.

use std::time::Instant;

use crate::mdp::backup::{self, greedy, optimal_backup};
use crate::mdp::config::{SolverConfig, SolverStats, Termination};
use crate::mdp::error::SolverError;
use crate::mdp::model::{Mdp, MdpAction, MdpState};
use crate::mdp::storage::{ModelTable, Policy, ValueFunction};

/// Value iteration over a compiled MDP.
///
/// # Example
/// ```ignore
/// use tictactoe_mdp::mdp::{SolverConfig, ValueIteration};
///
/// let mut solver = ValueIteration::new(&my_mdp, SolverConfig::default())?;
/// solver.train();
/// let policy = solver.policy().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ValueIteration<S: MdpState, A: MdpAction> {
    table: ModelTable<S, A>,
    config: SolverConfig,

    /// V(s), aligned with the state index. Starts at 0.0 everywhere.
    values: Vec<f64>,

    /// Policy extracted by the last `train` call.
    policy: Option<Policy<S, A>>,

    stats: SolverStats,
}

impl<S: MdpState, A: MdpAction> ValueIteration<S, A> {
    /// Compile `mdp` and set up a solver with all values at 0.0.
    pub fn new<M>(mdp: &M, config: SolverConfig) -> Result<Self, SolverError>
    where
        M: Mdp<State = S, Action = A>,
    {
        config.validate()?;
        let table = ModelTable::compile(mdp)?;
        Ok(Self::from_table(table, config))
    }

    /// Set up a solver over an already compiled model.
    pub fn from_table(table: ModelTable<S, A>, config: SolverConfig) -> Self {
        let stats = SolverStats {
            states: table.len(),
            terminal_states: table.space().num_terminal(),
            ..SolverStats::new()
        };

        Self {
            values: vec![0.0; table.len()],
            table,
            config,
            policy: None,
            stats,
        }
    }

    /// Run one Bellman optimality sweep and return the largest value change.
    pub fn sweep(&mut self) -> f64 {
        let table = &self.table;
        let discount = self.config.discount;
        let delta = backup::sweep(
            table,
            &mut self.values,
            self.config.update,
            self.config.parallel,
            |idx, values| optimal_backup(table, idx, values, discount),
        );

        self.stats.sweeps += 1;
        self.stats.last_delta = delta;
        log::debug!("value sweep {}: delta = {:.3e}", self.stats.sweeps, delta);
        delta
    }

    /// Run exactly `sweeps` sweeps and return the last value change.
    pub fn iterate(&mut self, sweeps: usize) -> f64 {
        let mut delta = 0.0;
        for _ in 0..sweeps {
            delta = self.sweep();
        }
        delta
    }

    /// Sweep until the largest change drops below `theta`, or `max_sweeps`
    /// sweeps have run.
    pub fn run_to_convergence(&mut self) -> Termination {
        for _ in 0..self.config.max_sweeps {
            if self.sweep() < self.config.theta {
                return Termination::Converged;
            }
        }
        Termination::SweepLimit
    }

    /// Read a greedy policy off the current values.
    ///
    /// For every non-terminal state the first action (in action order) whose
    /// one-step lookahead attains the maximum is chosen. Once the values have
    /// converged that maximum equals the stored value. The only write is
    /// re-pinning terminal states to 0.0.
    pub fn extract_policy(&mut self) -> Policy<S, A> {
        let mut choices = vec![0; self.table.len()];

        for idx in 0..self.table.len() {
            if self.table.is_terminal(idx) {
                self.values[idx] = 0.0;
                continue;
            }
            if let Some(best) = greedy(
                &self.table,
                idx,
                &self.values,
                self.config.discount,
                self.config.tolerance,
            ) {
                choices[idx] = best.action;
            }
        }

        self.table.policy(&choices)
    }

    /// Run value iteration as configured and extract the policy.
    ///
    /// With `sweeps` set, exactly that many sweeps run; otherwise the solver
    /// iterates to `theta`. Either way the run only counts as complete if the
    /// last sweep changed no value by `theta` or more. Check
    /// [`SolverStats::termination`] to see how it ended.
    ///
    /// The sweep count in the stats covers this call only.
    pub fn train(&mut self) -> &SolverStats {
        let start_time = Instant::now();
        log::info!(
            "value iteration over {} states (discount {})",
            self.table.len(),
            self.config.discount
        );

        self.stats.sweeps = 0;

        let termination = match self.config.sweeps {
            Some(sweeps) => {
                if self.iterate(sweeps) < self.config.theta {
                    Termination::FixedSweeps
                } else {
                    Termination::SweepLimit
                }
            }
            None => self.run_to_convergence(),
        };

        if termination == Termination::SweepLimit {
            log::warn!(
                "value iteration stopped after {} sweeps with values still moving (delta {:.3e} >= {:.3e})",
                self.stats.sweeps,
                self.stats.last_delta,
                self.config.theta
            );
        }

        self.policy = Some(self.extract_policy());

        self.stats.termination = termination;
        self.stats.elapsed_seconds = start_time.elapsed().as_secs_f64();
        log::info!(
            "value iteration finished: {:?} after {} sweeps in {:.3}s",
            termination,
            self.stats.sweeps,
            self.stats.elapsed_seconds
        );

        &self.stats
    }

    /// Current value of `state`, if it is in the state set.
    pub fn value(&self, state: &S) -> Option<f64> {
        self.table.space().index_of(state).map(|idx| self.values[idx])
    }

    /// Snapshot of the current value function.
    pub fn value_function(&self) -> ValueFunction<S> {
        self.table.value_function(&self.values)
    }

    /// Policy produced by the last `train` call.
    pub fn policy(&self) -> Option<&Policy<S, A>> {
        self.policy.as_ref()
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
    use crate::mdp::config::{ConfigError, UpdateScheme};
    use crate::mdp::model::Transition;

    /// One decision, two terminal outcomes.
    ///
    /// `Gamble` wins 1.0 with probability 0.7 and loses 1.0 otherwise,
    /// `Safe` always collects 0.5.
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

    #[test]
    fn test_toy_mdp_converges_to_analytic_value() {
        for update in [UpdateScheme::InPlace, UpdateScheme::Synchronous] {
            let config = SolverConfig::default().with_update(update);
            let mut solver = ValueIteration::new(&ToyMdp, config).unwrap();
            let stats = solver.train();

            assert_eq!(stats.termination, Termination::Converged);
            assert!((solver.value(&Toy::Start).unwrap() - 0.5).abs() < 1e-6);
            assert_eq!(solver.value(&Toy::Won), Some(0.0));
            assert_eq!(solver.value(&Toy::Lost), Some(0.0));
            assert_eq!(solver.policy().unwrap().get(&Toy::Start), Some(&Bet::Safe));
            assert!(solver.policy().unwrap().get(&Toy::Won).is_none());
        }
    }

    #[test]
    fn test_fixed_sweeps_are_reported() {
        let config = SolverConfig::default().with_sweeps(3);
        let mut solver = ValueIteration::new(&ToyMdp, config).unwrap();
        let stats = solver.train();
        assert_eq!(stats.termination, Termination::FixedSweeps);
        assert_eq!(stats.sweeps, 3);
        assert!(stats.is_complete());
    }

    #[test]
    fn test_too_few_fixed_sweeps_are_not_success() {
        // the first sweep still moves V(Start) from 0.0 to 0.5
        let config = SolverConfig::default().with_sweeps(1);
        let mut solver = ValueIteration::new(&ToyMdp, config).unwrap();
        let stats = solver.train();
        assert_eq!(stats.termination, Termination::SweepLimit);
        assert_eq!(stats.sweeps, 1);
        assert!(!stats.is_complete());

        let config = SolverConfig::default().with_sweeps(0);
        assert!(matches!(
            ValueIteration::new(&ToyMdp, config),
            Err(SolverError::Config(ConfigError::ZeroCap("sweeps")))
        ));
    }

    #[test]
    fn test_retraining_counts_sweeps_afresh() {
        let mut solver = ValueIteration::new(&ToyMdp, SolverConfig::default()).unwrap();
        let first = solver.train().sweeps;
        assert!(first >= 2);
        // already converged: one sweep confirms it
        let stats = solver.train();
        assert_eq!(stats.sweeps, 1);
        assert_eq!(stats.termination, Termination::Converged);
    }

    #[test]
    fn test_sweep_limit_is_not_success() {
        let config = SolverConfig::default().with_theta(0.0).with_max_sweeps(5);
        let mut solver = ValueIteration::new(&ToyMdp, config).unwrap();
        let stats = solver.train();
        assert_eq!(stats.termination, Termination::SweepLimit);
        assert!(!stats.is_complete());
        // a policy is still produced from the best values available
        assert_eq!(solver.policy().unwrap().len(), 1);
    }

    #[test]
    fn test_extract_policy_is_idempotent() {
        let mut solver = ValueIteration::new(&ToyMdp, SolverConfig::default()).unwrap();
        solver.iterate(4);
        let before = solver.value_function();
        let first = solver.extract_policy();
        let second = solver.extract_policy();
        assert_eq!(first, second);
        assert_eq!(before, solver.value_function());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SolverConfig::default().with_discount(1.5);
        let err = ValueIteration::new(&ToyMdp, config).unwrap_err();
        assert!(matches!(err, SolverError::Config(_)));
    }
}
