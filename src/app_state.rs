// =============================================================================
// Central Application State — Horizon Forecast
// =============================================================================
//
// The single source of truth for the running service: runtime configuration,
// the loaded price history, the most recent forecast, and a bounded error
// log for the dashboard.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for all mutable shared values.
//   - Wrapped in Arc and shared across the axum handlers.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::forecast::{run_forecast, Forecast, ForecastParams};
use crate::market_data::PriceHistory;
use crate::runtime_config::RuntimeConfig;

// =============================================================================
// Error Record
// =============================================================================

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

// =============================================================================
// AppState
// =============================================================================

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    /// Monotonically increasing version counter. Incremented on every
    /// meaningful state mutation so clients can detect fresh data.
    pub state_version: AtomicU64,

    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    /// Cleaned price history, present once the CSV has loaded successfully.
    pub price_history: RwLock<Option<PriceHistory>>,

    /// Most recent forecast computed from the held history and config.
    pub latest_forecast: RwLock<Option<Forecast>>,

    /// Bounded log of recent errors for the dashboard.
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    /// Instant when the service was started. Used for uptime reporting.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct a new `AppState` from the given runtime configuration.
    /// The returned value is typically wrapped in `Arc` immediately.
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),
            price_history: RwLock::new(None),
            latest_forecast: RwLock::new(None),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version. Call this after every
    /// meaningful mutation.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Read the current state version without modifying it.
    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message. The ring buffer is capped at
    /// [`MAX_RECENT_ERRORS`]; oldest entries are evicted when the limit is
    /// reached.
    pub fn push_error(&self, msg: String) {
        let record = ErrorRecord {
            message: msg,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
        drop(errors);

        self.increment_version();
    }

    // ── Price History ───────────────────────────────────────────────────

    /// Install a freshly loaded price history.
    pub fn set_price_history(&self, history: PriceHistory) {
        *self.price_history.write() = Some(history);
        self.increment_version();
    }

    // ── Forecast ────────────────────────────────────────────────────────

    /// Recompute the forecast from the held history and the current
    /// configuration, cache it, and bump the state version.
    ///
    /// Fails when no history is loaded or the pipeline rejects its input;
    /// the cached forecast is left untouched in that case.
    pub fn refresh_forecast(&self) -> Result<Forecast> {
        let params = {
            let config = self.runtime_config.read();
            ForecastParams::from_config(&config)?
        };

        let forecast = {
            let history = self.price_history.read();
            let history = history
                .as_ref()
                .context("no price history loaded")?;
            run_forecast(history, &params)?
        };

        *self.latest_forecast.write() = Some(forecast.clone());
        self.increment_version();

        Ok(forecast)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::PricePoint;
    use chrono::NaiveDate;

    fn sample_history() -> PriceHistory {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let closes = [100.0, 102.0, 100.0, 102.0, 100.0];
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                close,
            })
            .collect();
        PriceHistory::new(points, closes.len()).unwrap()
    }

    #[test]
    fn test_version_increments() {
        let state = AppState::new(RuntimeConfig::default());
        let before = state.current_state_version();
        state.increment_version();
        assert_eq!(state.current_state_version(), before + 1);
    }

    #[test]
    fn test_error_ring_buffer_is_capped() {
        let state = AppState::new(RuntimeConfig::default());
        for i in 0..(MAX_RECENT_ERRORS + 10) {
            state.push_error(format!("error {i}"));
        }
        let errors = state.recent_errors.read();
        assert_eq!(errors.len(), MAX_RECENT_ERRORS);
        // Oldest entries were evicted first.
        assert_eq!(errors[0].message, "error 10");
    }

    #[test]
    fn test_refresh_without_history_fails() {
        let state = AppState::new(RuntimeConfig::default());
        let err = state.refresh_forecast().unwrap_err();
        assert!(err.to_string().contains("no price history"));
        assert!(state.latest_forecast.read().is_none());
    }

    #[test]
    fn test_refresh_caches_forecast_and_bumps_version() {
        let mut config = RuntimeConfig::default();
        config.simulation_seed = Some(11);
        let state = AppState::new(config);
        state.set_price_history(sample_history());

        let before = state.current_state_version();
        let forecast = state.refresh_forecast().unwrap();
        assert!(state.current_state_version() > before);

        let cached = state.latest_forecast.read().clone().unwrap();
        assert_eq!(cached.current_state, forecast.current_state);
        assert_eq!(cached.predicted_state, forecast.predicted_state);
    }

    #[test]
    fn test_refresh_rejects_invalid_thresholds() {
        let mut config = RuntimeConfig::default();
        config.down_threshold = 0.5;
        config.up_threshold = -0.5;
        let state = AppState::new(config);
        state.set_price_history(sample_history());
        assert!(state.refresh_forecast().is_err());
        assert!(state.latest_forecast.read().is_none());
    }
}
