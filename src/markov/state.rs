// =============================================================================
// Market State Classification
// =============================================================================
//
// Discretizes a daily return into one of three states using two thresholds:
//
//   return < down_threshold                        -> DOWN
//   down_threshold <= return <= up_threshold       -> FLAT
//   return > up_threshold                          -> UP
//
// Both boundary values classify as FLAT. The variant order matches the
// lexicographic order of the lowercase labels (down < flat < up), which is
// the canonical order used for matrix indexing, iteration, and tie-breaking
// everywhere in this crate.

use serde::{Deserialize, Serialize};

use crate::markov::error::MarkovError;

/// Discrete daily price-behavior state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MarketState {
    Down,
    Flat,
    Up,
}

/// Number of distinct states. Matrix rows/columns are always this size.
pub const STATE_COUNT: usize = 3;

impl MarketState {
    /// All states in canonical (lexicographic) order.
    pub const ALL: [MarketState; STATE_COUNT] =
        [MarketState::Down, MarketState::Flat, MarketState::Up];

    /// Index of this state in the canonical order.
    pub fn index(self) -> usize {
        match self {
            Self::Down => 0,
            Self::Flat => 1,
            Self::Up => 2,
        }
    }

    /// Inverse of [`index`]. Panics on an out-of-range index.
    pub fn from_index(idx: usize) -> Self {
        Self::ALL[idx]
    }
}

impl std::fmt::Display for MarketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Down => write!(f, "down"),
            Self::Flat => write!(f, "flat"),
            Self::Up => write!(f, "up"),
        }
    }
}

// =============================================================================
// StateThresholds
// =============================================================================

/// Validated classification boundaries.
///
/// Construction fails when `down > up`, so a held value always represents a
/// usable configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateThresholds {
    down: f64,
    up: f64,
}

impl StateThresholds {
    /// Build a threshold pair, rejecting inverted boundaries.
    pub fn new(down: f64, up: f64) -> Result<Self, MarkovError> {
        if down > up {
            return Err(MarkovError::InvalidThresholds { down, up });
        }
        Ok(Self { down, up })
    }

    pub fn down(&self) -> f64 {
        self.down
    }

    pub fn up(&self) -> f64 {
        self.up
    }

    /// Classify a single return. Total: every finite input maps to exactly
    /// one state, and the three predicates partition the real line.
    pub fn classify(&self, ret: f64) -> MarketState {
        if ret < self.down {
            MarketState::Down
        } else if ret > self.up {
            MarketState::Up
        } else {
            MarketState::Flat
        }
    }

    /// Classify a return sequence, preserving order and length.
    pub fn classify_returns(&self, returns: &[f64]) -> Vec<MarketState> {
        returns.iter().map(|&r| self.classify(r)).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_thresholds_rejected() {
        let err = StateThresholds::new(0.002, -0.002).unwrap_err();
        assert!(matches!(err, MarkovError::InvalidThresholds { .. }));
    }

    #[test]
    fn test_equal_thresholds_allowed() {
        let t = StateThresholds::new(0.0, 0.0).unwrap();
        assert_eq!(t.classify(0.0), MarketState::Flat);
        assert_eq!(t.classify(-0.0001), MarketState::Down);
        assert_eq!(t.classify(0.0001), MarketState::Up);
    }

    #[test]
    fn test_boundaries_classify_as_flat() {
        let t = StateThresholds::new(-0.002, 0.002).unwrap();
        assert_eq!(t.classify(-0.002), MarketState::Flat);
        assert_eq!(t.classify(0.002), MarketState::Flat);
    }

    #[test]
    fn test_three_bucket_scenario() {
        // returns [-0.01, -0.001, 0.0, 0.001, 0.01] with thresholds +-0.002
        let t = StateThresholds::new(-0.002, 0.002).unwrap();
        let states = t.classify_returns(&[-0.01, -0.001, 0.0, 0.001, 0.01]);
        assert_eq!(
            states,
            vec![
                MarketState::Down,
                MarketState::Flat,
                MarketState::Flat,
                MarketState::Flat,
                MarketState::Up,
            ]
        );
    }

    #[test]
    fn test_batch_preserves_length_and_order() {
        let t = StateThresholds::new(-0.002, 0.002).unwrap();
        let returns = vec![0.05, -0.05, 0.0];
        let states = t.classify_returns(&returns);
        assert_eq!(states.len(), returns.len());
        assert_eq!(states[0], MarketState::Up);
        assert_eq!(states[1], MarketState::Down);
        assert_eq!(states[2], MarketState::Flat);
    }

    #[test]
    fn test_canonical_order_is_lexicographic() {
        assert!(MarketState::Down < MarketState::Flat);
        assert!(MarketState::Flat < MarketState::Up);
        let mut labels: Vec<String> =
            MarketState::ALL.iter().map(|s| s.to_string()).collect();
        let sorted = labels.clone();
        labels.sort();
        assert_eq!(labels, sorted);
    }

    #[test]
    fn test_index_roundtrip() {
        for state in MarketState::ALL {
            assert_eq!(MarketState::from_index(state.index()), state);
        }
    }

    #[test]
    fn test_serde_lowercase_labels() {
        assert_eq!(
            serde_json::to_string(&MarketState::Down).unwrap(),
            "\"down\""
        );
        let s: MarketState = serde_json::from_str("\"up\"").unwrap();
        assert_eq!(s, MarketState::Up);
    }
}
