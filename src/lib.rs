//! Value and policy iteration for Markov Decision Processes given as graphs of
//! named states.
//!
//! ```
//! use markov_solver::{solve_sections, InputSections, SolverConfig};
//!
//! let input = InputSections::from_text("D=1\nX=5\nY=0\nD : [X, Y]\nD % 0.8\n");
//! let solution = solve_sections(&input, &SolverConfig::default()).unwrap();
//!
//! assert_eq!(solution.to_string(), "D -> X\n\nD=5.0 X=5.0 Y=0.0\n");
//! ```

pub mod config;
pub mod error;
pub mod input;
pub mod mdp;
pub mod report;

pub use config::SolverConfig;
pub use error::{Error, Result};
pub use input::InputSections;
pub use mdp::{solve, solve_sections, GraphBuilder, MarkovGraph, Solution, SolvedState};
