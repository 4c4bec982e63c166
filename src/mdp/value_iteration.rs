//! Policy evaluation by repeated sweeps over the state graph.
//!
//! Each sweep recomputes every non-terminal state from its neighbors'
//! previous values and shifts the estimates (`prev <- curr`, `curr <- new`)
//! state by state, in declaration order.

use log::debug;

use crate::error::{Error, Result};
use crate::mdp::graph::MarkovGraph;
use crate::mdp::state::{State, StateKind};

/// Outcome of one value-iteration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// Number of sweeps performed
    pub sweeps: usize,
    /// Whether every non-terminal state moved by less than the tolerance in the last sweep
    pub converged: bool,
}

/// Evaluates the current policy assignment of `graph` in place.
///
/// # Arguments
/// - `graph`: the state graph; decision states must have a policy
/// - `gamma`: discount applied to the expected continuation
/// - `max_iterations`: maximum number of sweeps
/// - `tolerance`: stop once every non-terminal state changes by less than this
///
/// Running out of sweeps is not an error; the estimates reached so far are
/// kept and `converged` is `false`.
///
/// # Examples
///
/// ```
/// use markov_solver::mdp::{value_iteration, GraphBuilder};
///
/// let mut graph = GraphBuilder::new()
///     .build(&["A=0", "B=10"], &["A: [B]"], &["A % 1.0"])
///     .unwrap();
///
/// let evaluation = value_iteration::evaluate(&mut graph, 1.0, 100, 0.001).unwrap();
/// assert!(evaluation.converged);
/// assert_eq!(graph.get("A").unwrap().value(), 10.0);
/// ```
pub fn evaluate(
    graph: &mut MarkovGraph,
    gamma: f64,
    max_iterations: usize,
    tolerance: f64,
) -> Result<Evaluation> {
    let mut sweeps = 0;
    let mut converged = false;

    while !converged && sweeps < max_iterations {
        for i in 0..graph.states.len() {
            if graph.states[i].is_terminal() {
                continue;
            }
            let expectation = expected_continuation(&graph.states, &graph.states[i])?;
            let state = &mut graph.states[i];
            let next = state.reward + gamma * expectation;
            state.prev_value = state.curr_value;
            state.curr_value = next;
        }
        sweeps += 1;

        converged = graph
            .states
            .iter()
            .filter(|s| !s.is_terminal())
            .all(|s| (s.curr_value - s.prev_value).abs() < tolerance);
    }

    if converged {
        debug!("value iteration converged after {} sweeps", sweeps);
    } else {
        debug!(
            "value iteration stopped after {} sweeps without converging",
            sweeps
        );
    }
    Ok(Evaluation { sweeps, converged })
}

/// Expected neighbor value of a non-terminal state, read from `prev_value`.
fn expected_continuation(states: &[State], state: &State) -> Result<f64> {
    match &state.kind {
        StateKind::Terminal => Ok(0.0),
        StateKind::Chance { probabilities } => {
            Ok(chance_expectation(states, state, probabilities, |s| s.prev_value))
        }
        StateKind::Decision { success } => {
            let count = state.successors.len();
            if count < 2 {
                return Err(Error::DegenerateDecision {
                    state: state.name.clone(),
                    neighbors: count,
                });
            }
            let target = policy_target(state)?;
            let failure = (1.0 - success) / (count - 1) as f64;

            Ok(state
                .successors
                .iter()
                .map(|&j| {
                    let weight = if j == target { *success } else { failure };
                    weight * states[j].prev_value
                })
                .sum())
        }
    }
}

/// Probability-weighted sum of the neighbors' values as read by `value`.
pub(crate) fn chance_expectation(
    states: &[State],
    state: &State,
    probabilities: &[f64],
    value: impl Fn(&State) -> f64,
) -> f64 {
    state
        .successors
        .iter()
        .zip(probabilities)
        .map(|(&j, p)| p * value(&states[j]))
        .sum()
}

/// Graph index of a decision state's policy successor.
pub(crate) fn policy_target(state: &State) -> Result<usize> {
    let position = state.policy.ok_or_else(|| Error::MissingPolicy {
        state: state.name.clone(),
    })?;
    state
        .policy_successor()
        .ok_or_else(|| Error::PolicyNotANeighbor {
            state: state.name.clone(),
            policy: format!("#{}", position),
        })
}
