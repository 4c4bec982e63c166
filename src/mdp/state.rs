//! A single node of the MDP graph.

/// How a state's value depends on its successors.
#[derive(Debug, Clone, PartialEq)]
pub enum StateKind {
    /// No successors; the value is the reward and never changes.
    Terminal,
    /// Fixed distribution over successors, one probability per neighbor position.
    Chance { probabilities: Vec<f64> },
    /// The policy neighbor is reached with `success`; the remaining mass is
    /// split uniformly over the other neighbors.
    Decision { success: f64 },
}

#[derive(Debug, Clone)]
pub struct State {
    pub(crate) name: String,
    pub(crate) reward: f64,
    pub(crate) kind: StateKind,
    pub(crate) neighbors: Vec<String>,
    /// Graph indices of `neighbors`, position for position.
    pub(crate) successors: Vec<usize>,
    /// Position in `neighbors` of the chosen successor (decision states only).
    pub(crate) policy: Option<usize>,
    pub(crate) curr_value: f64,
    pub(crate) prev_value: f64,
}

impl State {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reward(&self) -> f64 {
        self.reward
    }

    pub fn kind(&self) -> &StateKind {
        &self.kind
    }

    pub fn neighbors(&self) -> &[String] {
        &self.neighbors
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, StateKind::Terminal)
    }

    pub fn is_decision(&self) -> bool {
        matches!(self.kind, StateKind::Decision { .. })
    }

    pub fn is_chance(&self) -> bool {
        matches!(self.kind, StateKind::Chance { .. })
    }

    /// Name of the chosen successor, if this is a decision state with a policy.
    pub fn policy(&self) -> Option<&str> {
        self.policy
            .and_then(|position| self.neighbors.get(position))
            .map(String::as_str)
    }

    /// Value estimate after the most recent update.
    pub fn value(&self) -> f64 {
        self.curr_value
    }

    /// Value estimate before the most recent update.
    pub fn previous_value(&self) -> f64 {
        self.prev_value
    }

    /// Graph index of the policy successor.
    pub(crate) fn policy_successor(&self) -> Option<usize> {
        self.policy
            .and_then(|position| self.successors.get(position))
            .copied()
    }
}
