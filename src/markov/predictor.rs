// =============================================================================
// Next-State Prediction
// =============================================================================
//
// Looks up the probability row for the current state and selects the most
// likely successor. Tie-break rule: the FIRST state in canonical order among
// those achieving the maximum wins. Because the scan keeps only strictly
// greater values, this holds for genuine ties and for the degenerate
// all-zero row, where `predict` returns `down` — callers must treat that as
// an uninformative answer, not a real forecast.

use std::collections::BTreeMap;

use crate::markov::error::MarkovError;
use crate::markov::state::MarketState;
use crate::markov::transition::TransitionMatrix;

/// P(next | current) for every state, keyed in canonical order.
///
/// Fails with [`MarkovError::UnknownState`] when `current` never appeared in
/// the estimated sequence.
pub fn next_state_probabilities(
    matrix: &TransitionMatrix,
    current: MarketState,
) -> Result<BTreeMap<MarketState, f64>, MarkovError> {
    if !matrix.contains(current) {
        return Err(MarkovError::UnknownState(current));
    }

    Ok(MarketState::ALL
        .into_iter()
        .map(|to| (to, matrix.prob(current, to)))
        .collect())
}

/// Most likely next state from `current`, first-in-canonical-order on ties.
pub fn predict(
    matrix: &TransitionMatrix,
    current: MarketState,
) -> Result<MarketState, MarkovError> {
    if !matrix.contains(current) {
        return Err(MarkovError::UnknownState(current));
    }

    let row = matrix.row(current);
    let mut best = MarketState::ALL[0];
    for state in MarketState::ALL {
        if row[state.index()] > row[best.index()] {
            best = state;
        }
    }
    Ok(best)
}
