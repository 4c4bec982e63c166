//! Error types shared by the input reader, the graph builder and both engines.

use std::num::ParseFloatError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("malformed assignment '{token}' (expected 'name=value')")]
    InvalidAssignment { token: String },

    #[error("malformed adjacency '{token}' (expected 'name: [a, b, ...]')")]
    InvalidAdjacency { token: String },

    #[error("malformed probability list '{token}' (expected 'name % p1 p2 ...')")]
    InvalidProbabilities { token: String },

    #[error("invalid number '{value}' in '{token}': {source}")]
    InvalidNumber {
        value: String,
        token: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("state '{name}' is not declared")]
    UndeclaredState { name: String },

    #[error("state '{state}' lists unknown neighbor '{neighbor}'")]
    UnknownNeighbor { state: String, neighbor: String },

    #[error("probabilities declared for state '{state}' which has no neighbors")]
    ProbabilitiesWithoutNeighbors { state: String },

    #[error("chance state '{state}' has {neighbors} neighbors but only {got} probabilities")]
    MissingProbabilities {
        state: String,
        neighbors: usize,
        got: usize,
    },

    #[error("policy '{policy}' of decision state '{state}' is not one of its neighbors")]
    PolicyNotANeighbor { state: String, policy: String },

    #[error("decision state '{state}' has no policy")]
    MissingPolicy { state: String },

    #[error("decision state '{state}' needs at least two neighbors, found {neighbors}")]
    DegenerateDecision { state: String, neighbors: usize },

    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
