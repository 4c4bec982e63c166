pub mod builder;
pub mod graph;
pub mod policy_iteration;
pub mod solver;
pub mod state;
pub mod value_iteration;

pub use builder::GraphBuilder;
pub use graph::MarkovGraph;
pub use policy_iteration::{improve, PolicyIteration};
pub use solver::{solve, solve_sections, Solution, SolvedState};
pub use state::{State, StateKind};
pub use value_iteration::{evaluate, Evaluation};
