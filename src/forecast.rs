// =============================================================================
// Forecast Pipeline
// =============================================================================
//
// End-to-end assembly of the forecasting steps:
//   history -> returns -> states -> transition matrix
//           -> next-day probabilities + prediction -> path simulation
//
// The resulting `Forecast` is the serializable output contract consumed by
// the startup report, the REST API, and the dashboard. It carries the
// data-quality counters (raw vs clean rows, date range) alongside the model
// output so a reader can judge how much data backs the numbers.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::market_data::{simple_returns, PriceHistory};
use crate::markov::{
    forecast_rng, next_state_probabilities, predict, simulate, MarkovError, MarketState,
    SimulationResult, StateThresholds, TransitionMatrix,
};
use crate::runtime_config::RuntimeConfig;

// =============================================================================
// ForecastParams
// =============================================================================

/// Everything the pipeline needs beyond the price history itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastParams {
    pub thresholds: StateThresholds,
    pub steps: u32,
    pub trials: u32,
    pub seed: Option<u64>,
}

impl ForecastParams {
    /// Derive pipeline parameters from the runtime configuration,
    /// revalidating the threshold pair.
    pub fn from_config(config: &RuntimeConfig) -> Result<Self, MarkovError> {
        Ok(Self {
            thresholds: StateThresholds::new(config.down_threshold, config.up_threshold)?,
            steps: config.simulation_steps,
            trials: config.simulation_trials,
            seed: config.simulation_seed,
        })
    }
}

// =============================================================================
// Forecast
// =============================================================================

/// Full forecast output: model results plus data-quality counters.
#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    // Input data summary.
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub raw_rows: usize,
    pub clean_rows: usize,

    // Model inputs.
    pub down_threshold: f64,
    pub up_threshold: f64,

    // Next-day view.
    pub current_state: MarketState,
    pub next_day_probabilities: BTreeMap<MarketState, f64>,
    pub predicted_state: MarketState,
    pub transition_matrix: TransitionMatrix,

    // Multi-step view.
    pub simulation_steps: u32,
    pub simulation_trials: u32,
    pub simulation: SimulationResult,
}

/// Run the full pipeline over `history`.
///
/// The history type guarantees at least 3 prices, hence at least 2 returns,
/// so the estimator's minimum-length requirement is met by construction. The
/// current state is the classification of the most recent return.
pub fn run_forecast(
    history: &PriceHistory,
    params: &ForecastParams,
) -> Result<Forecast, MarkovError> {
    let returns = simple_returns(&history.closes());
    let states = params.thresholds.classify_returns(&returns);

    let matrix = TransitionMatrix::from_states(&states)?;
    // from_states guarantees at least two states, so the last one exists.
    let current_state = states[states.len() - 1];

    let next_day_probabilities = next_state_probabilities(&matrix, current_state)?;
    let predicted_state = predict(&matrix, current_state)?;

    let mut rng = forecast_rng(params.seed);
    let simulation = simulate(&matrix, current_state, params.steps, params.trials, &mut rng);

    Ok(Forecast {
        first_date: history.first_date(),
        last_date: history.last_date(),
        raw_rows: history.raw_rows(),
        clean_rows: history.clean_rows(),
        down_threshold: params.thresholds.down(),
        up_threshold: params.thresholds.up(),
        current_state,
        next_day_probabilities,
        predicted_state,
        transition_matrix: matrix,
        simulation_steps: params.steps,
        simulation_trials: params.trials,
        simulation,
    })
}
