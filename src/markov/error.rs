// =============================================================================
// Markov Core Errors
// =============================================================================
//
// All three variants represent caller misuse or genuinely insufficient input.
// They are raised synchronously by the offending operation and never retried;
// the API layer turns them into user-facing messages.

use thiserror::Error;

use crate::markov::state::MarketState;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarkovError {
    /// The classification thresholds are inverted (down > up).
    #[error("invalid thresholds: down ({down}) must be <= up ({up})")]
    InvalidThresholds { down: f64, up: f64 },

    /// Too few observations to estimate any transition.
    #[error("insufficient data: need at least {needed} states, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The requested state never appeared in the observed sequence.
    #[error("state '{0}' not found in transition matrix")]
    UnknownState(MarketState),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_offending_values() {
        let e = MarkovError::InvalidThresholds {
            down: 0.01,
            up: -0.01,
        };
        assert!(e.to_string().contains("0.01"));

        let e = MarkovError::InsufficientData { needed: 2, got: 1 };
        assert_eq!(
            e.to_string(),
            "insufficient data: need at least 2 states, got 1"
        );

        let e = MarkovError::UnknownState(MarketState::Flat);
        assert!(e.to_string().contains("flat"));
    }
}
