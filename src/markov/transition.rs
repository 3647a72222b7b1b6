// =============================================================================
// Transition Matrix Estimation
// =============================================================================
//
// Counts observed state transitions and row-normalizes them into a
// probability matrix. Both tables are fixed 3x3 arrays indexed by the
// canonical state order, so row-sum invariants can be asserted directly and
// output order never depends on observation order.
//
// A source state with no observed outgoing transition keeps an all-zero row.
// That is an explicit "no data" marker, not a uniform distribution; the
// predictor and simulator both document how they treat it.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::markov::error::MarkovError;
use crate::markov::state::{MarketState, STATE_COUNT};

// =============================================================================
// TransitionCounts
// =============================================================================

/// Raw transition counts: `counts[from][to]` over the canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionCounts {
    counts: [[u64; STATE_COUNT]; STATE_COUNT],
    observed: [bool; STATE_COUNT],
}

impl TransitionCounts {
    /// Count transitions from `state[i]` to `state[i+1]` for every
    /// consecutive pair. Requires at least 2 states.
    pub fn from_states(states: &[MarketState]) -> Result<Self, MarkovError> {
        if states.len() < 2 {
            return Err(MarkovError::InsufficientData {
                needed: 2,
                got: states.len(),
            });
        }

        let mut counts = [[0u64; STATE_COUNT]; STATE_COUNT];
        let mut observed = [false; STATE_COUNT];

        for pair in states.windows(2) {
            counts[pair[0].index()][pair[1].index()] += 1;
        }
        for state in states {
            observed[state.index()] = true;
        }

        Ok(Self { counts, observed })
    }

    /// Count of observed `from -> to` transitions.
    pub fn count(&self, from: MarketState, to: MarketState) -> u64 {
        self.counts[from.index()][to.index()]
    }

    /// Total outgoing transitions from `from`.
    pub fn row_total(&self, from: MarketState) -> u64 {
        self.counts[from.index()].iter().sum()
    }

    /// Row-normalize into a probability matrix. Zero-total rows stay all
    /// zero; division by zero is suppressed, never propagated as NaN.
    pub fn normalize(&self) -> TransitionMatrix {
        let mut rows = [[0.0f64; STATE_COUNT]; STATE_COUNT];

        for from in MarketState::ALL {
            let total = self.row_total(from);
            if total == 0 {
                continue;
            }
            for to in MarketState::ALL {
                rows[from.index()][to.index()] =
                    self.count(from, to) as f64 / total as f64;
            }
        }

        TransitionMatrix {
            rows,
            observed: self.observed,
        }
    }
}

// =============================================================================
// TransitionMatrix
// =============================================================================

/// Row-stochastic transition probabilities, `rows[from][to]`.
///
/// Membership (`contains`) is defined by the observed-state set: a state
/// counts as a row of the matrix when it appeared anywhere in the estimated
/// sequence, even if it was only ever a destination and its row sums to 0.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    rows: [[f64; STATE_COUNT]; STATE_COUNT],
    observed: [bool; STATE_COUNT],
}

impl TransitionMatrix {
    /// Estimate directly from a state sequence (count + normalize).
    pub fn from_states(states: &[MarketState]) -> Result<Self, MarkovError> {
        Ok(TransitionCounts::from_states(states)?.normalize())
    }

    /// P(to | from).
    pub fn prob(&self, from: MarketState, to: MarketState) -> f64 {
        self.rows[from.index()][to.index()]
    }

    /// The full probability row for `from`, in canonical order.
    pub fn row(&self, from: MarketState) -> [f64; STATE_COUNT] {
        self.rows[from.index()]
    }

    /// Sum of the row for `from` (1.0 for estimated rows, 0.0 for no-data
    /// rows, within floating tolerance).
    pub fn row_sum(&self, from: MarketState) -> f64 {
        self.rows[from.index()].iter().sum()
    }

    /// Whether `state` appeared anywhere in the estimated sequence.
    pub fn contains(&self, state: MarketState) -> bool {
        self.observed[state.index()]
    }

    /// Observed states in canonical order.
    pub fn observed_states(&self) -> impl Iterator<Item = MarketState> + '_ {
        MarketState::ALL
            .into_iter()
            .filter(move |s| self.observed[s.index()])
    }

    /// Serializable nested map (observed source states only), keyed in
    /// canonical order. This is the output-contract representation.
    pub fn to_map(&self) -> BTreeMap<MarketState, BTreeMap<MarketState, f64>> {
        self.observed_states()
            .map(|from| {
                let row = MarketState::ALL
                    .into_iter()
                    .map(|to| (to, self.prob(from, to)))
                    .collect();
                (from, row)
            })
            .collect()
    }
}

impl Serialize for TransitionMatrix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_map().serialize(serializer)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use MarketState::{Down, Flat, Up};

    const TOL: f64 = 1e-9;

    fn scenario_states() -> Vec<MarketState> {
        // transitions: down->up, up->up, up->flat, flat->down
        vec![Down, Up, Up, Flat, Down]
    }

    #[test]
    fn test_too_few_states_rejected() {
        let err = TransitionCounts::from_states(&[Down]).unwrap_err();
        assert_eq!(err, MarkovError::InsufficientData { needed: 2, got: 1 });
        assert!(TransitionCounts::from_states(&[]).is_err());
    }

    #[test]
    fn test_scenario_counts() {
        let counts = TransitionCounts::from_states(&scenario_states()).unwrap();
        assert_eq!(counts.count(Down, Up), 1);
        assert_eq!(counts.count(Up, Up), 1);
        assert_eq!(counts.count(Up, Flat), 1);
        assert_eq!(counts.count(Flat, Down), 1);
        assert_eq!(counts.count(Down, Down), 0);
        assert_eq!(counts.row_total(Up), 2);
    }

    #[test]
    fn test_scenario_matrix() {
        let matrix = TransitionMatrix::from_states(&scenario_states()).unwrap();
        assert!((matrix.prob(Down, Up) - 1.0).abs() < TOL);
        assert!((matrix.prob(Flat, Down) - 1.0).abs() < TOL);
        assert!((matrix.prob(Up, Up) - 0.5).abs() < TOL);
        assert!((matrix.prob(Up, Flat) - 0.5).abs() < TOL);
    }

    #[test]
    fn test_rows_sum_to_one_or_zero() {
        let matrix = TransitionMatrix::from_states(&scenario_states()).unwrap();
        for from in MarketState::ALL {
            let sum = matrix.row_sum(from);
            assert!(
                (sum - 1.0).abs() < TOL || sum == 0.0,
                "row {from} sums to {sum}"
            );
        }
    }

    #[test]
    fn test_terminal_only_state_has_zero_row() {
        // up is only ever a destination: its row is an explicit no-data row.
        let matrix = TransitionMatrix::from_states(&[Down, Up]).unwrap();
        assert!(matrix.contains(Up));
        assert_eq!(matrix.row_sum(Up), 0.0);
        for to in MarketState::ALL {
            assert_eq!(matrix.prob(Up, to), 0.0);
        }
    }

    #[test]
    fn test_never_observed_state_is_not_contained() {
        let matrix = TransitionMatrix::from_states(&[Down, Up]).unwrap();
        assert!(!matrix.contains(Flat));
        assert!(matrix.contains(Down));
    }

    #[test]
    fn test_zero_rows_are_finite() {
        let matrix = TransitionMatrix::from_states(&[Down, Up]).unwrap();
        for from in MarketState::ALL {
            for to in MarketState::ALL {
                assert!(matrix.prob(from, to).is_finite());
            }
        }
    }

    #[test]
    fn test_map_is_canonically_ordered() {
        let matrix = TransitionMatrix::from_states(&scenario_states()).unwrap();
        let map = matrix.to_map();
        let keys: Vec<MarketState> = map.keys().copied().collect();
        assert_eq!(keys, vec![Down, Flat, Up]);
        // Every row addresses the full fixed state set.
        for row in map.values() {
            assert_eq!(row.len(), STATE_COUNT);
        }
    }

    #[test]
    fn test_map_skips_unobserved_sources() {
        let matrix = TransitionMatrix::from_states(&[Down, Up]).unwrap();
        let map = matrix.to_map();
        assert!(map.contains_key(&Down));
        assert!(map.contains_key(&Up));
        assert!(!map.contains_key(&Flat));
    }

    #[test]
    fn test_observation_order_does_not_change_indexing() {
        // Same transitions observed in a different arrival order.
        let a = TransitionMatrix::from_states(&[Up, Down, Up, Down]).unwrap();
        let b = TransitionMatrix::from_states(&[Down, Up, Down, Up]).unwrap();
        assert!((a.prob(Up, Down) - b.prob(Up, Down)).abs() < TOL);
        let keys_a: Vec<_> = a.to_map().keys().copied().collect();
        let keys_b: Vec<_> = b.to_map().keys().copied().collect();
        assert_eq!(keys_a, keys_b);
    }
}
