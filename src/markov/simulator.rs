// =============================================================================
// Monte Carlo Path Simulation
// =============================================================================
//
// Estimates the steps-ahead state distribution by running repeated stochastic
// walks over the transition matrix and tallying terminal states. Converges to
// the exact matrix-power result as the trial count grows;
// `exact_distribution` provides that closed-form alternative directly.
//
// Walk rules per trial:
//   - start from `start`; take up to `steps` transitions;
//   - an unknown state or an absorbing (zero-sum) row stops the walk early
//     and keeps the current state as the terminal value;
//   - otherwise the next state is drawn from the categorical distribution
//     given by the current row.
//
// Randomness is an explicit, injectable generator so runs are reproducible
// given a seed and trials could be parallelized by a caller if needed.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::markov::state::{MarketState, STATE_COUNT};
use crate::markov::transition::TransitionMatrix;

/// Terminal-state relative frequencies, keyed in canonical order. Only
/// states reached at least once appear; empty when the start state is
/// unknown to the matrix.
pub type SimulationResult = BTreeMap<MarketState, f64>;

/// Build the simulation RNG: seeded for reproducible runs, entropy-seeded
/// otherwise.
pub fn forecast_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Run `trials` independent walks of up to `steps` transitions from `start`
/// and report the empirical terminal-state distribution.
///
/// An unknown `start` yields an empty result rather than an error: there is
/// nothing to simulate from a state that was never observed.
pub fn simulate(
    matrix: &TransitionMatrix,
    start: MarketState,
    steps: u32,
    trials: u32,
    rng: &mut impl Rng,
) -> SimulationResult {
    if !matrix.contains(start) || trials == 0 {
        return SimulationResult::new();
    }

    let mut counts = [0u64; STATE_COUNT];

    for _ in 0..trials {
        let mut state = start;
        for _ in 0..steps {
            if !matrix.contains(state) {
                break;
            }
            let row = matrix.row(state);
            let total: f64 = row.iter().sum();
            if total <= 0.0 {
                // Absorbing row: no observed way out of this state.
                break;
            }
            state = sample_row(&row, total, rng);
        }
        counts[state.index()] += 1;
    }

    MarketState::ALL
        .into_iter()
        .filter(|s| counts[s.index()] > 0)
        .map(|s| (s, counts[s.index()] as f64 / trials as f64))
        .collect()
}

/// Draw one state from the categorical distribution in `row`.
///
/// Caller guarantees `total > 0`. Scans in canonical order; floating
/// round-off at the tail resolves to the last state with positive mass.
fn sample_row(row: &[f64; STATE_COUNT], total: f64, rng: &mut impl Rng) -> MarketState {
    let mut draw = rng.gen::<f64>() * total;
    let mut chosen = MarketState::ALL[0];
    for state in MarketState::ALL {
        let p = row[state.index()];
        if p <= 0.0 {
            continue;
        }
        chosen = state;
        if draw < p {
            break;
        }
        draw -= p;
    }
    chosen
}

/// Exact steps-ahead distribution: the transition matrix applied `steps`
/// times to a one-hot start vector.
///
/// Zero-sum rows are treated as self-absorbing so the result matches the
/// walk semantics that [`simulate`] converges to; a literal matrix power
/// would let probability mass vanish from absorbing states instead.
pub fn exact_distribution(
    matrix: &TransitionMatrix,
    start: MarketState,
    steps: u32,
) -> SimulationResult {
    if !matrix.contains(start) {
        return SimulationResult::new();
    }

    let mut dist = [0.0f64; STATE_COUNT];
    dist[start.index()] = 1.0;

    for _ in 0..steps {
        let mut next = [0.0f64; STATE_COUNT];
        for from in MarketState::ALL {
            let mass = dist[from.index()];
            if mass == 0.0 {
                continue;
            }
            if matrix.row_sum(from) <= 0.0 {
                next[from.index()] += mass;
            } else {
                for to in MarketState::ALL {
                    next[to.index()] += mass * matrix.prob(from, to);
                }
            }
        }
        dist = next;
    }

    MarketState::ALL
        .into_iter()
        .filter(|s| dist[s.index()] > 0.0)
        .map(|s| (s, dist[s.index()]))
        .collect()
}
