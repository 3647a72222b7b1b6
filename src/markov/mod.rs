// =============================================================================
// Markov Core Module
// =============================================================================
//
// Discrete-state Markov model of daily price behavior:
// - state classification by return thresholds (down / flat / up)
// - transition-matrix estimation from the observed state sequence
// - next-state probabilities and most-likely prediction
// - Monte Carlo simulation of multi-step future state paths
//
// Everything here is pure and synchronous; the only resource consumed is the
// injected RNG in the simulator.

pub mod error;
pub mod predictor;
pub mod simulator;
pub mod state;
pub mod transition;

pub use error::MarkovError;
pub use predictor::{next_state_probabilities, predict};
pub use simulator::{exact_distribution, forecast_rng, simulate, SimulationResult};
pub use state::{MarketState, StateThresholds, STATE_COUNT};
pub use transition::{TransitionCounts, TransitionMatrix};
