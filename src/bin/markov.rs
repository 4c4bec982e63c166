//! Solve an MDP text file with policy iteration and print the policies and values.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use markov_solver::{solve_sections, InputSections, SolverConfig};

#[derive(Parser, Debug)]
#[command(name = "markov")]
#[command(version, about = "Value and policy iteration for Markov Decision Processes", long_about = None)]
struct Cli {
    /// Input file with state rewards, adjacency lists and probabilities
    input: PathBuf,

    /// Discount factor in [0, 1] applied to future rewards
    #[arg(long = "df", default_value_t = 1.0)]
    discount: f64,

    /// Minimize values as costs instead of maximizing rewards
    #[arg(long = "min")]
    minimize: bool,

    /// Tolerance for exiting value iteration
    #[arg(long = "tol", default_value_t = 0.001)]
    tolerance: f64,

    /// Cutoff for value-iteration sweeps per policy round
    #[arg(long = "iter", default_value_t = 100)]
    iterations: usize,

    /// Stop policy iteration after this many rounds even if policies still change
    #[arg(long)]
    max_policy_rounds: Option<usize>,

    /// Print the solution as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn config(&self) -> SolverConfig {
        SolverConfig {
            gamma: self.discount,
            minimize: self.minimize,
            max_iterations: self.iterations,
            tolerance: self.tolerance,
            max_policy_rounds: self.max_policy_rounds,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let sections = InputSections::read(&cli.input)?;
    if sections.is_empty() {
        log::warn!("{} declares no states", cli.input.display());
    }
    let solution = solve_sections(&sections, &cli.config())
        .with_context(|| format!("failed to solve {}", cli.input.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&solution)?);
    } else {
        print!("{}", solution);
    }
    Ok(())
}
