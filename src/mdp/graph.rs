use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::mdp::state::State;

/// The MDP as an owned collection of named states.
///
/// States are kept in declaration order, which is also the order both engines
/// sweep them in. Use [`MarkovGraph::sorted`] for name-ordered output.
#[derive(Debug, Clone, Default)]
pub struct MarkovGraph {
    pub(crate) states: Vec<State>,
    index: HashMap<String, usize>,
}

impl MarkovGraph {
    /// Builds the graph from fully classified states. Neighbor names must
    /// already be resolved into `successors`.
    pub(crate) fn from_states(states: Vec<State>) -> Self {
        let index = states
            .iter()
            .enumerate()
            .map(|(i, state)| (state.name.clone(), i))
            .collect();
        Self { states, index }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&State> {
        self.index.get(name).map(|&i| &self.states[i])
    }

    /// States in declaration order.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    /// States ordered by name.
    pub fn sorted(&self) -> Vec<&State> {
        let mut sorted: Vec<&State> = self.states.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        sorted
    }

    /// Points a decision state at one of its neighbors.
    pub fn set_policy(&mut self, state: &str, neighbor: &str) -> Result<()> {
        let &i = self.index.get(state).ok_or_else(|| Error::UndeclaredState {
            name: state.to_string(),
        })?;
        let target = &mut self.states[i];
        if !target.is_decision() {
            return Err(Error::invalid_input(format!(
                "state '{}' is not a decision state",
                state
            )));
        }
        let position = target
            .neighbors
            .iter()
            .position(|n| n == neighbor)
            .ok_or_else(|| Error::PolicyNotANeighbor {
                state: state.to_string(),
                policy: neighbor.to_string(),
            })?;
        target.policy = Some(position);
        Ok(())
    }

    /// Resets every decision state's policy to its first neighbor.
    pub(crate) fn seed_policies(&mut self) {
        for state in self.states.iter_mut().filter(|s| s.is_decision()) {
            state.policy = if state.neighbors.is_empty() {
                None
            } else {
                Some(0)
            };
        }
    }
}
