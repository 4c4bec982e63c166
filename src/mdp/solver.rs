use log::info;
use serde::Serialize;

use crate::config::SolverConfig;
use crate::error::Result;
use crate::input::InputSections;
use crate::mdp::builder::GraphBuilder;
use crate::mdp::graph::MarkovGraph;
use crate::mdp::policy_iteration;

/// Final value and policy of one state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolvedState {
    pub name: String,
    pub value: f64,
    /// Chosen successor, for decision states only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
}

/// Result of a solve, states ordered by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub states: Vec<SolvedState>,
    /// Number of policy-iteration rounds
    pub policy_rounds: usize,
    /// Value-iteration sweeps over all rounds
    pub sweeps: usize,
    /// Whether the last value iteration converged within its budget
    pub converged: bool,
    /// Whether the policies stopped changing
    pub stable: bool,
}

impl Solution {
    pub fn get(&self, name: &str) -> Option<&SolvedState> {
        self.states
            .binary_search_by(|s| s.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.states[i])
    }

    /// Decision states and their chosen successors, by name.
    pub fn policies(&self) -> impl Iterator<Item = (&str, &str)> {
        self.states
            .iter()
            .filter_map(|s| s.policy.as_deref().map(|p| (s.name.as_str(), p)))
    }
}

/// Solves the MDP in place.
///
/// Every decision state starts from its first neighbor, then policy iteration
/// runs until no policy changes (or `max_policy_rounds` is reached).
///
/// # Examples
///
/// ```
/// use markov_solver::mdp::{solve, GraphBuilder};
/// use markov_solver::SolverConfig;
///
/// let mut graph = GraphBuilder::new()
///     .build(&["D=1", "X=5", "Y=0"], &["D: [X, Y]"], &["D % 0.8"])
///     .unwrap();
///
/// let solution = solve(&mut graph, &SolverConfig::default()).unwrap();
/// let d = solution.get("D").unwrap();
/// assert_eq!(d.policy.as_deref(), Some("X"));
/// assert!((d.value - 5.0).abs() < 1e-9);
/// ```
pub fn solve(graph: &mut MarkovGraph, config: &SolverConfig) -> Result<Solution> {
    config.validate()?;
    graph.seed_policies();

    let run = policy_iteration::improve(graph, config)?;
    info!(
        "solved {} states in {} policy rounds ({} sweeps)",
        graph.len(),
        run.rounds,
        run.sweeps
    );

    let states = graph
        .sorted()
        .into_iter()
        .map(|state| SolvedState {
            name: state.name().to_string(),
            value: state.value(),
            policy: state.policy().map(str::to_string),
        })
        .collect();

    Ok(Solution {
        states,
        policy_rounds: run.rounds,
        sweeps: run.sweeps,
        converged: run.converged,
        stable: run.stable,
    })
}

/// Builds the graph from parsed input and solves it.
pub fn solve_sections(sections: &InputSections, config: &SolverConfig) -> Result<Solution> {
    let mut graph = GraphBuilder::from_sections(sections)?;
    solve(&mut graph, config)
}
