//! Text rendering of a [`Solution`].
//!
//! ```text
//! D -> X
//!
//! D=5.0 X=5.0 Y=0.0
//! ```

use std::fmt::{self, Display, Formatter};

use crate::mdp::Solution;

/// Rounds to three decimals and prints the shortest form with at least one
/// decimal digit.
///
/// Rounding is done on the exact binary value, so `0.0055` prints as `0.005`.
pub fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let mut text = format!("{:.3}", value);
    while text.ends_with('0') && !text.ends_with(".0") {
        text.pop();
    }
    text
}

impl Display for Solution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (state, policy) in self.policies() {
            writeln!(f, "{} -> {}", state, policy)?;
        }
        writeln!(f)?;

        let values: Vec<String> = self
            .states
            .iter()
            .map(|s| format!("{}={}", s.name, format_value(s.value)))
            .collect();
        writeln!(f, "{}", values.join(" "))
    }
}
