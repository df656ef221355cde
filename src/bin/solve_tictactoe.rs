//! Tic-tac-toe MDP solver binary.
//!
//! Usage:
//!   cargo run --release --bin solve_tictactoe -- [OPTIONS]
//!
//! Examples:
//!   # Value iteration for X against a random opponent
//!   solve_tictactoe --algorithm value
//!
//!   # Policy iteration for O against a perfect opponent, then play 1000 games
//!   solve_tictactoe --algorithm policy --agent o --opponent perfect --games 1000
//!
//!   # The coursework setup: ±10 rewards, 10 sweeps, evaluation delta 0.1
//!   solve_tictactoe --rewards classic --sweeps 10 --theta 0.1

use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;

use tictactoe_mdp::games::tictactoe::{
    tally, Board, Mark, Move, Opponent, Rewards, SolveOutput, TicTacToeMdp,
};
use tictactoe_mdp::mdp::{
    Policy, PolicyIteration, SolverConfig, SolverStats, UpdateScheme, ValueFunction,
    ValueIteration,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    Value,
    Policy,
}

impl Algorithm {
    fn name(self) -> &'static str {
        match self {
            Algorithm::Value => "value_iteration",
            Algorithm::Policy => "policy_iteration",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Seat {
    X,
    O,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OpponentArg {
    Random,
    Perfect,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RewardsArg {
    /// +1 win, -1 loss
    Unit,
    /// +10 win, -10 loss
    Classic,
}

/// Solve tic-tac-toe against a stochastic opponent.
#[derive(Parser)]
#[command(name = "solve_tictactoe", about = "Solve tic-tac-toe as an MDP")]
struct Cli {
    /// Planning algorithm
    #[arg(long, value_enum, default_value = "value")]
    algorithm: Algorithm,

    /// Mark the agent plays
    #[arg(long, value_enum, default_value = "x")]
    agent: Seat,

    /// Opponent response model
    #[arg(long, value_enum, default_value = "random")]
    opponent: OpponentArg,

    /// Reward structure
    #[arg(long, value_enum, default_value = "unit")]
    rewards: RewardsArg,

    /// Solver configuration JSON file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Discount factor in [0, 1)
    #[arg(long)]
    discount: Option<f64>,

    /// Convergence threshold (value iteration) and evaluation delta (policy iteration)
    #[arg(long)]
    theta: Option<f64>,

    /// Fixed number of value-iteration sweeps
    #[arg(long)]
    sweeps: Option<usize>,

    /// Use synchronous sweeps instead of in-place updates
    #[arg(long)]
    synchronous: bool,

    /// Evaluate synchronous sweeps on all cores
    #[arg(long)]
    parallel: bool,

    /// Random seed for the initial policy and simulated games
    #[arg(short, long)]
    seed: Option<u64>,

    /// Play this many games with the solved policy
    #[arg(short, long, default_value_t = 0)]
    games: u64,

    /// Print the value and chosen move for this position, e.g. "X.O .X. ..."
    #[arg(short, long)]
    board: Option<String>,

    /// Write the solution as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

struct Solution {
    stats: SolverStats,
    values: ValueFunction<Board>,
    policy: Policy<Board, Move>,
}

fn build_config(cli: &Cli) -> Result<SolverConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            println!("Loading configuration from: {}", path.display());
            SolverConfig::from_json_file(path)?
        }
        None => SolverConfig::default(),
    };

    if let Some(discount) = cli.discount {
        config = config.with_discount(discount);
    }
    if let Some(theta) = cli.theta {
        config = config.with_theta(theta);
    }
    if let Some(sweeps) = cli.sweeps {
        config = config.with_sweeps(sweeps);
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if cli.synchronous {
        config = config.with_update(UpdateScheme::Synchronous);
    }
    if cli.parallel {
        config = config.with_update(UpdateScheme::Synchronous).with_parallel(true);
    }
    config.validate()?;
    Ok(config)
}

fn solve(
    algorithm: Algorithm,
    mdp: &TicTacToeMdp,
    config: &SolverConfig,
) -> Result<Solution, Box<dyn Error>> {
    match algorithm {
        Algorithm::Value => {
            let mut solver = ValueIteration::new(mdp, config.clone())?;
            solver.train();
            let policy = solver.policy().cloned().unwrap_or_default();
            Ok(Solution {
                stats: solver.stats().clone(),
                values: solver.value_function(),
                policy,
            })
        }
        Algorithm::Policy => {
            let mut solver = PolicyIteration::new(mdp, config.clone())?;
            solver.train();
            Ok(Solution {
                stats: solver.stats().clone(),
                values: solver.value_function(),
                policy: solver.policy(),
            })
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let agent = match cli.agent {
        Seat::X => Mark::X,
        Seat::O => Mark::O,
    };
    let opponent = match cli.opponent {
        OpponentArg::Random => Opponent::Random,
        OpponentArg::Perfect => Opponent::Perfect,
    };
    let rewards = match cli.rewards {
        RewardsArg::Unit => Rewards::default(),
        RewardsArg::Classic => Rewards::classic(),
    };
    let config = build_config(&cli)?;

    println!("=================================================");
    println!("  Tic-Tac-Toe MDP Solver");
    println!("=================================================");
    println!();
    println!("Algorithm: {}", cli.algorithm.name());
    println!("Agent: {}  Opponent: {:?}", agent, opponent);
    println!(
        "Rewards: win {} / lose {} / draw {} / living {}",
        rewards.win, rewards.lose, rewards.draw, rewards.living
    );
    println!("Discount: {}  Theta: {:.1e}", config.discount, config.theta);
    match config.sweeps {
        Some(sweeps) => println!("Sweeps: {} (fixed)", sweeps),
        None => println!("Sweeps: until converged (max {})", config.max_sweeps),
    }
    println!("Update: {:?}{}", config.update, if config.parallel { " (parallel)" } else { "" });
    if let Some(seed) = config.seed {
        println!("Seed: {}", seed);
    }
    println!();

    let start_time = Instant::now();
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    spinner.set_message("Enumerating states...");
    let mdp = TicTacToeMdp::new(agent, opponent, rewards);

    spinner.set_message("Solving...");
    let solution = solve(cli.algorithm, &mdp, &config)?;
    spinner.finish_and_clear();

    let stats = &solution.stats;
    println!("Training finished: {:?}", stats.termination);
    println!("States: {} ({} terminal)", stats.states, stats.terminal_states);
    println!("Sweeps: {}", stats.sweeps);
    if stats.rounds > 0 {
        println!("Rounds: {} ({} policy changes)", stats.rounds, stats.policy_changes);
    }
    println!("Last delta: {:.3e}", stats.last_delta);
    println!("Total time: {:.2}s", start_time.elapsed().as_secs_f64());
    if !stats.is_complete() {
        eprintln!("Warning: training hit a cap before converging");
    }
    if let Some(value) = mdp.opening_value(&solution.values) {
        println!("Opening value: {:.6}", value);
    }
    println!();

    let mut output = SolveOutput::new(
        cli.algorithm.name(),
        &mdp,
        &config,
        stats,
        &solution.values,
        &solution.policy,
    );

    if cli.games > 0 {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let results = tally(&mdp, &solution.policy, cli.games, &mut rng)?;
        println!("=== {} Games vs {:?} ===", results.games(), opponent);
        let pct = |n: u64| 100.0 * n as f64 / results.games() as f64;
        println!("  Wins:   {:>6} ({:.1}%)", results.wins, pct(results.wins));
        println!("  Draws:  {:>6} ({:.1}%)", results.draws, pct(results.draws));
        println!("  Losses: {:>6} ({:.1}%)", results.losses, pct(results.losses));
        println!();
        output = output.with_tally(results);
    }

    if let Some(text) = &cli.board {
        let board: Board = text.parse()?;
        println!("=== Position ===");
        println!();
        print!("{}", board);
        println!();
        match (solution.values.get(&board), solution.policy.get(&board)) {
            (Some(value), Some(mv)) => {
                println!("Value: {:.6}", value);
                println!("Best move: cell {} {}", mv.index(), mv);
            }
            (Some(value), None) => println!("Value: {:.6} (game over)", value),
            _ => println!("Not one of {}'s positions", agent),
        }
        println!();
    }

    if let Some(path) = &cli.output {
        println!("Exporting results to {}...", path.display());
        output.save_json(path)?;
        println!("Results saved successfully!");
    }

    println!("Done!");
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
