//! Turns assignment, adjacency and probability tokens into a [`MarkovGraph`],
//! classifying every state exactly once.
//!
//! Classification rules:
//! - no neighbors: terminal (declaring probabilities for it is an error)
//! - exactly one neighbor: chance, whatever probabilities were declared
//! - one declared probability: decision, that probability is the success weight
//! - several declared probabilities: chance, zipped against the neighbors
//! - neighbors but no probabilities: decision with success weight 1

use std::collections::HashMap;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::input::InputSections;
use crate::mdp::graph::MarkovGraph;
use crate::mdp::state::{State, StateKind};

#[derive(Debug)]
struct PendingState {
    name: String,
    reward: f64,
    value: f64,
    neighbors: Vec<String>,
    probabilities: Option<Vec<f64>>,
}

impl PendingState {
    fn new(name: &str, reward: f64) -> Self {
        Self {
            name: name.to_string(),
            reward,
            value: reward,
            neighbors: Vec::new(),
            probabilities: None,
        }
    }
}

/// Collects declarations in declaration order and produces the final graph.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    pending: Vec<PendingState>,
    index: HashMap<String, usize>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from the three token groups of a parsed input.
    pub fn from_sections(sections: &InputSections) -> Result<MarkovGraph> {
        Self::new().build(
            sections.assignments.as_slice(),
            sections.adjacencies.as_slice(),
            sections.probabilities.as_slice(),
        )
    }

    /// Processes assignments, then adjacency lists, then probability lists,
    /// and classifies every state.
    ///
    /// # Examples
    ///
    /// ```
    /// use markov_solver::mdp::GraphBuilder;
    ///
    /// let graph = GraphBuilder::new()
    ///     .build(&["D=1", "X=5", "Y=0"], &["D: [X, Y]"], &["D % 0.8"])
    ///     .unwrap();
    ///
    /// let d = graph.get("D").unwrap();
    /// assert!(d.is_decision());
    /// assert_eq!(d.policy(), Some("X"));
    /// assert!(graph.get("X").unwrap().is_terminal());
    /// ```
    pub fn build<S: AsRef<str>>(
        mut self,
        assignments: &[S],
        adjacencies: &[S],
        probabilities: &[S],
    ) -> Result<MarkovGraph> {
        for token in assignments {
            self.assignment(token.as_ref())?;
        }
        for token in adjacencies {
            self.adjacency(token.as_ref())?;
        }
        for token in probabilities {
            self.probability(token.as_ref())?;
        }
        self.finish()
    }

    fn assignment(&mut self, token: &str) -> Result<()> {
        let (name, value) = split_pair(token, '=').ok_or_else(|| Error::InvalidAssignment {
            token: token.to_string(),
        })?;
        let reward = parse_number(value, token)?;

        match self.index.get(name) {
            Some(&i) => {
                warn!("state '{}' assigned more than once, keeping the last value", name);
                self.pending[i] = PendingState::new(name, reward);
            }
            None => self.insert(PendingState::new(name, reward)),
        }
        Ok(())
    }

    fn adjacency(&mut self, token: &str) -> Result<()> {
        let (name, list) = split_pair(token, ':').ok_or_else(|| Error::InvalidAdjacency {
            token: token.to_string(),
        })?;
        let neighbors: Vec<String> = list
            .split(|c: char| c == '[' || c == ']' || c == ',' || c.is_whitespace())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();

        if !self.index.contains_key(name) {
            self.insert(PendingState::new(name, 0.0));
        }
        let state = &mut self.pending[self.index[name]];
        if !state.neighbors.is_empty() {
            warn!("state '{}' has more than one adjacency list, keeping the last", name);
        }
        state.neighbors = neighbors;
        Ok(())
    }

    fn probability(&mut self, token: &str) -> Result<()> {
        let (name, list) = split_pair(token, '%').ok_or_else(|| Error::InvalidProbabilities {
            token: token.to_string(),
        })?;
        let probabilities = list
            .split_whitespace()
            .map(|p| parse_number(p, token))
            .collect::<Result<Vec<f64>>>()?;

        let &i = self.index.get(name).ok_or_else(|| Error::UndeclaredState {
            name: name.to_string(),
        })?;
        let state = &mut self.pending[i];
        if state.probabilities.is_some() {
            warn!("state '{}' has more than one probability list, keeping the last", name);
        }
        state.probabilities = Some(probabilities);
        Ok(())
    }

    fn insert(&mut self, state: PendingState) {
        self.index.insert(state.name.clone(), self.pending.len());
        self.pending.push(state);
    }

    fn finish(self) -> Result<MarkovGraph> {
        let index = self.index;
        let mut states = Vec::with_capacity(self.pending.len());

        for pending in self.pending {
            let successors = pending
                .neighbors
                .iter()
                .map(|neighbor| {
                    index
                        .get(neighbor)
                        .copied()
                        .ok_or_else(|| Error::UnknownNeighbor {
                            state: pending.name.clone(),
                            neighbor: neighbor.clone(),
                        })
                })
                .collect::<Result<Vec<usize>>>()?;

            let kind = classify(&pending)?;
            // A probability list that makes a state chance resets its current estimate.
            let reset = matches!(&kind, StateKind::Chance { .. }) && pending.probabilities.is_some();
            let policy = matches!(kind, StateKind::Decision { .. }).then_some(0);

            states.push(State {
                curr_value: if reset { 0.0 } else { pending.value },
                prev_value: pending.value,
                name: pending.name,
                reward: pending.reward,
                kind,
                neighbors: pending.neighbors,
                successors,
                policy,
            });
        }

        debug!(
            "built graph with {} states ({} decision, {} chance)",
            states.len(),
            states.iter().filter(|s| s.is_decision()).count(),
            states.iter().filter(|s| s.is_chance()).count()
        );
        Ok(MarkovGraph::from_states(states))
    }
}

fn classify(state: &PendingState) -> Result<StateKind> {
    let declared = state.probabilities.as_deref();
    match (state.neighbors.len(), declared) {
        (0, Some(p)) if !p.is_empty() => Err(Error::ProbabilitiesWithoutNeighbors {
            state: state.name.clone(),
        }),
        (0, _) => Ok(StateKind::Terminal),
        (1, p) => Ok(StateKind::Chance {
            probabilities: vec![p.and_then(|p| p.first().copied()).unwrap_or(1.0)],
        }),
        (_, Some([success])) => Ok(StateKind::Decision { success: *success }),
        (n, Some(p)) if p.len() > 1 => {
            if p.len() < n {
                return Err(Error::MissingProbabilities {
                    state: state.name.clone(),
                    neighbors: n,
                    got: p.len(),
                });
            }
            if p.len() > n {
                warn!(
                    "state '{}' declares {} probabilities for {} neighbors, ignoring the rest",
                    state.name,
                    p.len(),
                    n
                );
            }
            Ok(StateKind::Chance {
                probabilities: p[..n].to_vec(),
            })
        }
        _ => Ok(StateKind::Decision { success: 1.0 }),
    }
}

/// Splits `name<sep>rest` where the separator appears exactly once and the
/// name is not blank. Both halves are trimmed.
fn split_pair(token: &str, separator: char) -> Option<(&str, &str)> {
    let (name, rest) = token.split_once(separator)?;
    if rest.contains(separator) {
        return None;
    }
    let name = name.trim();
    (!name.is_empty()).then_some((name, rest.trim()))
}

fn parse_number(value: &str, token: &str) -> Result<f64> {
    value.trim().parse().map_err(|source| Error::InvalidNumber {
        value: value.trim().to_string(),
        token: token.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(assignments: &[&str], adjacencies: &[&str], probabilities: &[&str]) -> Result<MarkovGraph> {
        GraphBuilder::new().build(assignments, adjacencies, probabilities)
    }

    #[test]
    fn test_assignment_initializes_values() {
        let graph = build(&["A = 3.5"], &[], &[]).unwrap();
        let a = graph.get("A").unwrap();
        assert_eq!(a.reward(), 3.5);
        assert_eq!(a.value(), 3.5);
        assert_eq!(a.previous_value(), 3.5);
        assert!(a.is_terminal());
        assert_eq!(a.policy(), None);
    }

    #[test]
    fn test_single_neighbor_is_chance() {
        let graph = build(&["A=0", "B=10"], &["A : [B]"], &[]).unwrap();
        let a = graph.get("A").unwrap();
        assert_eq!(
            a.kind(),
            &StateKind::Chance {
                probabilities: vec![1.0]
            }
        );
        assert_eq!(a.policy(), None);
    }

    #[test]
    fn test_single_neighbor_with_probability_stays_chance() {
        let graph = build(&["A=4", "B=10"], &["A:[B]"], &["A%0.5"]).unwrap();
        let a = graph.get("A").unwrap();
        assert_eq!(
            a.kind(),
            &StateKind::Chance {
                probabilities: vec![0.5]
            }
        );
        // chance classification from a probability list resets the estimate
        assert_eq!(a.value(), 0.0);
        assert_eq!(a.previous_value(), 4.0);
    }

    #[test]
    fn test_one_probability_is_decision() {
        let graph = build(&["D=1", "X=5", "Y=0"], &["D:[X,Y]"], &["D%0.8"]).unwrap();
        let d = graph.get("D").unwrap();
        assert_eq!(d.kind(), &StateKind::Decision { success: 0.8 });
        assert_eq!(d.policy(), Some("X"));
        assert_eq!(d.value(), 1.0);
    }

    #[test]
    fn test_several_probabilities_are_chance() {
        let graph = build(&["C=2", "X=5", "Y=0"], &["C:[X,Y]"], &["C % 0.3 0.7"]).unwrap();
        let c = graph.get("C").unwrap();
        assert_eq!(
            c.kind(),
            &StateKind::Chance {
                probabilities: vec![0.3, 0.7]
            }
        );
        assert_eq!(c.value(), 0.0);
        assert_eq!(c.previous_value(), 2.0);
    }

    #[test]
    fn test_adjacency_only_is_deterministic_decision() {
        let graph = build(&["X=5", "Y=0"], &["D:[X, Y]"], &[]).unwrap();
        let d = graph.get("D").unwrap();
        assert_eq!(d.kind(), &StateKind::Decision { success: 1.0 });
        assert_eq!(d.policy(), Some("X"));
        assert_eq!(d.reward(), 0.0);
        assert_eq!(d.value(), 0.0);
    }

    #[test]
    fn test_adjacency_creates_states_in_declaration_order() {
        let graph = build(&["X=1"], &["B:[X]", "A:[X, B]"], &[]).unwrap();
        let order: Vec<&str> = graph.states().map(State::name).collect();
        assert_eq!(order, vec!["X", "B", "A"]);
    }

    #[test]
    fn test_extra_probabilities_are_ignored() {
        let graph = build(&["X=1", "Y=2"], &["C:[X,Y]"], &["C% 0.2 0.3 0.5"]).unwrap();
        assert_eq!(
            graph.get("C").unwrap().kind(),
            &StateKind::Chance {
                probabilities: vec![0.2, 0.3]
            }
        );
    }

    #[test]
    fn test_empty_probability_list_falls_back_to_default() {
        let graph = build(&["X=1", "Y=2"], &["D:[X,Y]"], &["D%"]).unwrap();
        assert_eq!(
            graph.get("D").unwrap().kind(),
            &StateKind::Decision { success: 1.0 }
        );
    }

    #[test]
    fn test_probability_for_undeclared_state_fails() {
        let err = build(&["X=1"], &[], &["Q%0.5"]).unwrap_err();
        assert!(matches!(err, Error::UndeclaredState { name } if name == "Q"));
    }

    #[test]
    fn test_unknown_neighbor_fails() {
        let err = build(&["A=1"], &["A:[B, C]"], &[]).unwrap_err();
        assert!(matches!(err, Error::UnknownNeighbor { neighbor, .. } if neighbor == "B"));
    }

    #[test]
    fn test_probabilities_without_neighbors_fail() {
        let err = build(&["A=1"], &[], &["A%0.5"]).unwrap_err();
        assert!(matches!(err, Error::ProbabilitiesWithoutNeighbors { .. }));
    }

    #[test]
    fn test_too_few_probabilities_fail() {
        let err = build(&["X=1", "Y=1", "Z=1"], &["C:[X,Y,Z]"], &["C%0.5 0.5"]).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingProbabilities {
                neighbors: 3,
                got: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_tokens_fail() {
        assert!(matches!(
            build(&["A=1=2"], &[], &[]),
            Err(Error::InvalidAssignment { .. })
        ));
        assert!(matches!(
            build(&["=1"], &[], &[]),
            Err(Error::InvalidAssignment { .. })
        ));
        assert!(matches!(
            build(&["A=ten"], &[], &[]),
            Err(Error::InvalidNumber { .. })
        ));
        assert!(matches!(
            build(&["A=1", "B=2"], &["A:[B]"], &["A%x"]),
            Err(Error::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_repeated_assignment_keeps_last() {
        let graph = build(&["A=1", "A=7"], &[], &[]).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get("A").unwrap().reward(), 7.0);
    }

    #[test]
    fn test_repeated_adjacency_replaces_neighbors() {
        let graph = build(&["A=0", "X=1", "Y=2"], &["A:[X]", "A:[X,Y]"], &[]).unwrap();
        let a = graph.get("A").unwrap();
        assert_eq!(a.neighbors(), ["X", "Y"]);
        assert_eq!(a.kind(), &StateKind::Decision { success: 1.0 });
        assert_eq!(a.policy(), Some("X"));
    }

    #[test]
    fn test_repeated_probabilities_replace_earlier_list() {
        let graph = build(
            &["C=3", "X=5", "Y=0"],
            &["C:[X,Y]"],
            &["C%0.2 0.8", "C%0.5"],
        )
        .unwrap();
        let c = graph.get("C").unwrap();
        assert_eq!(c.kind(), &StateKind::Decision { success: 0.5 });
        assert_eq!(c.policy(), Some("X"));
        assert_eq!(c.value(), 3.0);
    }
}
