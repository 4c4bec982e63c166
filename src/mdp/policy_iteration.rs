//! Alternates policy evaluation with greedy policy improvement until no
//! decision state switches successor.

use std::collections::HashSet;

use log::{debug, warn};

use crate::config::SolverConfig;
use crate::error::Result;
use crate::mdp::graph::MarkovGraph;
use crate::mdp::state::StateKind;
use crate::mdp::value_iteration::{self, chance_expectation, policy_target};

/// Statistics of a policy-iteration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyIteration {
    /// Number of evaluate-then-improve rounds
    pub rounds: usize,
    /// Value-iteration sweeps summed over all rounds
    pub sweeps: usize,
    /// Whether the last evaluation converged within its sweep budget
    pub converged: bool,
    /// Whether the last round left every policy unchanged
    pub stable: bool,
}

/// Runs policy iteration from the policies currently set on `graph`.
///
/// A decision state only switches to a neighbor that is strictly better than
/// its current policy; among strictly better neighbors with the same value the
/// first one in neighbor order wins. Once the policies are stable, chance
/// states get one more update from the final estimates.
///
/// When the improvement step revisits a policy assignment seen in an earlier
/// round, or `max_policy_rounds` is reached, the run stops with
/// `stable = false` and keeps the policies of the last evaluation so every
/// reported value belongs to the reported policy.
pub fn improve(graph: &mut MarkovGraph, config: &SolverConfig) -> Result<PolicyIteration> {
    let mut rounds = 0;
    let mut sweeps = 0;
    let mut seen = HashSet::new();
    seen.insert(policies(graph));

    let (converged, stable) = loop {
        let evaluation = value_iteration::evaluate(
            graph,
            config.gamma,
            config.max_iterations,
            config.tolerance,
        )?;
        rounds += 1;
        sweeps += evaluation.sweeps;

        let evaluated = policies(graph);
        let switched = improve_policies(graph, config.minimize)?;
        debug!("policy round {}: {} decision states switched", rounds, switched);
        if switched == 0 {
            break (evaluation.converged, true);
        }
        if !seen.insert(policies(graph)) {
            warn!(
                "policy iteration cycled back to an earlier assignment after {} rounds",
                rounds
            );
            restore_policies(graph, evaluated);
            break (evaluation.converged, false);
        }
        if let Some(limit) = config.max_policy_rounds {
            if rounds >= limit {
                warn!("policy iteration stopped after {} rounds without stabilizing", rounds);
                restore_policies(graph, evaluated);
                break (evaluation.converged, false);
            }
        }
    };

    refresh_chance_states(graph, config.gamma);
    Ok(PolicyIteration {
        rounds,
        sweeps,
        converged,
        stable,
    })
}

/// Policy position of every state, in declaration order.
fn policies(graph: &MarkovGraph) -> Vec<Option<usize>> {
    graph.states.iter().map(|s| s.policy).collect()
}

fn restore_policies(graph: &mut MarkovGraph, policies: Vec<Option<usize>>) {
    for (state, policy) in graph.states.iter_mut().zip(policies) {
        state.policy = policy;
    }
}

/// Points every decision state at its best neighbor. Returns how many switched.
fn improve_policies(graph: &mut MarkovGraph, minimize: bool) -> Result<usize> {
    let mut switched = 0;

    for i in 0..graph.states.len() {
        let state = &graph.states[i];
        if !state.is_decision() {
            continue;
        }
        let current = policy_target(state)?;
        let mut best_value = graph.states[current].curr_value;
        let mut best = None;

        for (position, &j) in state.successors.iter().enumerate() {
            let value = graph.states[j].curr_value;
            let better = if minimize {
                value < best_value
            } else {
                value > best_value
            };
            if better {
                best_value = value;
                best = Some(position);
            }
        }

        if let Some(position) = best {
            graph.states[i].policy = Some(position);
            switched += 1;
        }
    }

    Ok(switched)
}

/// Recomputes chance states, in declaration order, from current estimates.
fn refresh_chance_states(graph: &mut MarkovGraph, gamma: f64) {
    for i in 0..graph.states.len() {
        let state = &graph.states[i];
        let expectation = match &state.kind {
            StateKind::Chance { probabilities } => {
                chance_expectation(&graph.states, state, probabilities, |s| s.curr_value)
            }
            _ => continue,
        };

        let state = &mut graph.states[i];
        let next = state.reward + gamma * expectation;
        state.prev_value = state.curr_value;
        state.curr_value = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::builder::GraphBuilder;
    use approx::assert_relative_eq;

    fn build(assignments: &[&str], adjacencies: &[&str], probabilities: &[&str]) -> MarkovGraph {
        GraphBuilder::new()
            .build(assignments, adjacencies, probabilities)
            .unwrap()
    }

    fn minimizing() -> SolverConfig {
        SolverConfig {
            minimize: true,
            ..SolverConfig::default()
        }
    }

    #[test]
    fn test_keeps_better_policy() {
        let mut graph = build(&["D=1", "X=5", "Y=0"], &["D:[X,Y]"], &["D%0.8"]);
        let run = improve(&mut graph, &SolverConfig::default()).unwrap();

        assert_eq!(run.rounds, 1);
        assert!(run.stable);
        assert!(run.converged);
        let d = graph.get("D").unwrap();
        assert_eq!(d.policy(), Some("X"));
        assert_relative_eq!(d.value(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_minimize_switches_to_cheaper_neighbor() {
        let mut graph = build(&["D=1", "X=5", "Y=0"], &["D:[X,Y]"], &["D%0.8"]);
        let run = improve(&mut graph, &minimizing()).unwrap();

        assert_eq!(run.rounds, 2);
        let d = graph.get("D").unwrap();
        assert_eq!(d.policy(), Some("Y"));
        assert_relative_eq!(d.value(), 1.0 + 0.2 * 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ties_keep_current_policy() {
        let mut graph = build(&["D=0", "X=5", "Y=5"], &["D:[X,Y]"], &[]);
        graph.set_policy("D", "Y").unwrap();
        let run = improve(&mut graph, &SolverConfig::default()).unwrap();

        assert_eq!(run.rounds, 1);
        assert_eq!(graph.get("D").unwrap().policy(), Some("Y"));
    }

    #[test]
    fn test_first_strictly_better_neighbor_wins() {
        let mut graph = build(&["D=0", "X=1", "Y=9", "Z=9"], &["D:[X,Y,Z]"], &[]);
        improve(&mut graph, &SolverConfig::default()).unwrap();
        assert_eq!(graph.get("D").unwrap().policy(), Some("Y"));
    }

    #[test]
    fn test_round_cap() {
        let config = SolverConfig {
            max_policy_rounds: Some(1),
            ..SolverConfig::default()
        };
        let mut graph = build(&["D=0", "X=0", "Y=5"], &["D:[X,Y]"], &[]);
        let run = improve(&mut graph, &config).unwrap();

        assert_eq!(run.rounds, 1);
        assert!(!run.stable);
        // the switch to Y was never evaluated, so D keeps X and its value
        assert_eq!(graph.get("D").unwrap().policy(), Some("X"));
        assert_eq!(graph.get("D").unwrap().value(), 0.0);
    }

    #[test]
    fn test_stops_when_policies_cycle() {
        // Self-loops under gamma = 1 keep growing, so the greedy choices flip
        // between assignments that were already tried.
        let mut graph = build(
            &["s0=10", "s1=5", "s2=7", "s3=4", "s4=10"],
            &["s1:[s0,s1,s2]", "s3:[s0,s1,s3]", "s4:[s1,s3,s0,s2]"],
            &[],
        );
        let run = improve(&mut graph, &SolverConfig::default()).unwrap();

        assert!(!run.stable);
        // at most one round per distinct assignment of 3 * 3 * 4 choices
        assert!(run.rounds <= 36);
        for name in ["s1", "s3", "s4"] {
            let state = graph.get(name).unwrap();
            assert!(state.policy().is_some());
            assert!(state.value().is_finite());
        }
    }

    #[test]
    fn test_chance_states_refreshed_after_stabilizing() {
        // C is swept before D and lags one estimate behind it.
        let mut graph = build(&["C=0", "D=0", "X=0", "Y=5"], &["C:[D]", "D:[X,Y]"], &[]);
        let run = improve(&mut graph, &SolverConfig::default()).unwrap();

        assert_eq!(run.rounds, 2);
        assert_eq!(graph.get("D").unwrap().policy(), Some("Y"));
        assert_eq!(graph.get("D").unwrap().value(), 5.0);
        assert_eq!(graph.get("C").unwrap().value(), 5.0);
        assert_eq!(graph.get("C").unwrap().previous_value(), 0.0);
    }

    #[test]
    fn test_decision_values_not_refreshed() {
        let mut graph = build(&["D=0", "X=0", "Y=5"], &["D:[X,Y]"], &[]);
        improve(&mut graph, &SolverConfig::default()).unwrap();
        let d = graph.get("D").unwrap();
        assert_eq!(d.value(), 5.0);
        assert_eq!(d.previous_value(), 5.0);
    }
}
