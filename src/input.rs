//! Reader for the line-oriented MDP text format.
//!
//! ```text
//! # comment
//! D = 1            reward (or cost) of a state
//! D : [X, Y]       successors of a state
//! D % 0.8          one probability: decision, several: chance
//! ```

use std::convert::Infallible;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::debug;

use crate::error::{Error, Result};

/// The three token groups of an input, each in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSections {
    pub assignments: Vec<String>,
    pub adjacencies: Vec<String>,
    pub probabilities: Vec<String>,
}

impl InputSections {
    /// Sorts the lines of `text` into assignments, adjacency lists and
    /// probability lists. Blank lines and `#` comments are skipped; a line is
    /// classified by the first of `=`, `:`, `%` it contains, in that order of
    /// precedence. Anything else is ignored.
    pub fn from_text(text: &str) -> Self {
        let mut sections = Self::default();

        for (number, raw) in text.lines().enumerate() {
            let line = raw.replace('\r', "");
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.contains('=') {
                sections.assignments.push(line);
            } else if line.contains(':') {
                sections.adjacencies.push(line);
            } else if line.contains('%') {
                sections.probabilities.push(line);
            } else {
                debug!("ignoring line {}: '{}'", number + 1, line);
            }
        }

        sections
    }

    /// Reads and categorizes an input file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_text(&text))
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty() && self.adjacencies.is_empty() && self.probabilities.is_empty()
    }
}

impl FromStr for InputSections {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_text(s))
    }
}
