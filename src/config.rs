use crate::error::{Error, Result};

/// Run parameters for a solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Discount applied to the expected continuation (0 <= gamma <= 1)
    pub gamma: f64,
    /// Treat values as costs and pick the cheapest neighbor
    pub minimize: bool,
    /// Maximum number of value-iteration sweeps per policy round
    pub max_iterations: usize,
    /// Per-state delta below which value iteration is considered converged
    pub tolerance: f64,
    /// Optional cap on policy-improvement rounds; `None` runs until stable or
    /// until the policies cycle. A capped run keeps the policies its values
    /// were last evaluated under.
    pub max_policy_rounds: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            gamma: 1.0,
            minimize: false,
            max_iterations: 100,
            tolerance: 0.001,
            max_policy_rounds: None,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.gamma.is_finite() || !(0.0..=1.0).contains(&self.gamma) {
            return Err(Error::invalid_input(format!(
                "discount factor must be between 0 and 1, got {}",
                self.gamma
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(Error::invalid_input(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}
