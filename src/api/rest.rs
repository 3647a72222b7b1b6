// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All JSON endpoints live under `/api/v1/`; `/` serves the embedded
// dashboard. Forecast and simulation endpoints accept optional query
// overrides (`down`, `up`, `steps`, `trials`, `seed`) that recompute from
// the loaded history without touching the persisted configuration.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::api::dashboard;
use crate::app_state::AppState;
use crate::forecast::{run_forecast, Forecast, ForecastParams};
use crate::markov::{MarkovError, StateThresholds, TransitionMatrix};
use crate::runtime_config::RuntimeConfig;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Dashboard ───────────────────────────────────────────────
        .route("/", get(dashboard::index))
        // ── JSON API ────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        .route("/api/v1/forecast", get(forecast))
        .route("/api/v1/matrix", get(matrix))
        .route("/api/v1/simulation", get(simulation))
        .route("/api/v1/config", post(update_config))
        // ── Middleware & State ──────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Error helpers
// =============================================================================

type ApiError = (StatusCode, Json<serde_json::Value>);

fn bad_request(err: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
}

fn unavailable(err: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
}

// =============================================================================
// Query overrides
// =============================================================================

/// Optional per-request parameter overrides shared by the forecast and
/// simulation endpoints. Absent fields fall back to the runtime config.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
struct ForecastQuery {
    down: Option<f64>,
    up: Option<f64>,
    steps: Option<u32>,
    trials: Option<u32>,
    seed: Option<u64>,
}

impl ForecastQuery {
    fn has_overrides(&self) -> bool {
        self.down.is_some()
            || self.up.is_some()
            || self.steps.is_some()
            || self.trials.is_some()
            || self.seed.is_some()
    }

    fn merge(&self, config: &RuntimeConfig) -> Result<ForecastParams, MarkovError> {
        Ok(ForecastParams {
            thresholds: StateThresholds::new(
                self.down.unwrap_or(config.down_threshold),
                self.up.unwrap_or(config.up_threshold),
            )?,
            steps: self.steps.unwrap_or(config.simulation_steps),
            trials: self.trials.unwrap_or(config.simulation_trials),
            seed: self.seed.or(config.simulation_seed),
        })
    }
}

/// Recompute a forecast from the loaded history with the merged parameters,
/// without touching the cached forecast or the persisted config.
fn compute_with_overrides(
    state: &AppState,
    query: &ForecastQuery,
) -> Result<Forecast, ApiError> {
    let params = {
        let config = state.runtime_config.read();
        query.merge(&config).map_err(bad_request)?
    };

    let history = state.price_history.read();
    let history = history
        .as_ref()
        .ok_or_else(|| unavailable("no price history loaded"))?;

    run_forecast(history, &params).map_err(bad_request)
}

// =============================================================================
// Health
// =============================================================================

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "state_version": state.current_state_version(),
        "uptime_s": state.start_time.elapsed().as_secs(),
        "server_time": chrono::Utc::now().timestamp_millis(),
    }))
}

// =============================================================================
// Forecast
// =============================================================================

async fn forecast(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<Forecast>, ApiError> {
    if query.has_overrides() {
        return compute_with_overrides(&state, &query).map(Json);
    }

    let cached = state.latest_forecast.read().clone();
    if let Some(forecast) = cached {
        return Ok(Json(forecast));
    }

    state.refresh_forecast().map(Json).map_err(unavailable)
}

// =============================================================================
// Transition matrix
// =============================================================================

async fn matrix(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TransitionMatrix>, ApiError> {
    let cached = state
        .latest_forecast
        .read()
        .as_ref()
        .map(|f| f.transition_matrix.clone());
    if let Some(matrix) = cached {
        return Ok(Json(matrix));
    }

    let forecast = state.refresh_forecast().map_err(unavailable)?;
    Ok(Json(forecast.transition_matrix))
}

// =============================================================================
// Simulation
// =============================================================================

async fn simulation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let forecast = if query.has_overrides() {
        compute_with_overrides(&state, &query)?
    } else {
        let cached = state.latest_forecast.read().clone();
        match cached {
            Some(forecast) => forecast,
            None => state.refresh_forecast().map_err(unavailable)?,
        }
    };

    Ok(Json(serde_json::json!({
        "start_state": forecast.current_state,
        "steps": forecast.simulation_steps,
        "trials": forecast.simulation_trials,
        "distribution": forecast.simulation,
    })))
}

// =============================================================================
// Config update
// =============================================================================

#[derive(Debug, Deserialize)]
struct ConfigUpdate {
    #[serde(default)]
    down_threshold: Option<f64>,
    #[serde(default)]
    up_threshold: Option<f64>,
    #[serde(default)]
    simulation_steps: Option<u32>,
    #[serde(default)]
    simulation_trials: Option<u32>,
}

async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ConfigUpdate>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut changes = Vec::new();

    let updated = {
        let config = state.runtime_config.read();
        let mut updated = config.clone();

        macro_rules! apply_field {
            ($field:ident) => {
                if let Some(val) = update.$field {
                    if updated.$field != val {
                        changes.push(format!(
                            "{}: {} -> {}",
                            stringify!($field),
                            updated.$field,
                            val
                        ));
                        updated.$field = val;
                    }
                }
            };
        }

        apply_field!(down_threshold);
        apply_field!(up_threshold);
        apply_field!(simulation_steps);
        apply_field!(simulation_trials);

        updated
    };

    // Reject the whole update if the combined result is invalid.
    updated.validate().map_err(bad_request)?;

    if changes.is_empty() {
        return Ok(Json(serde_json::json!({
            "changes": [],
            "config": serde_json::to_value(&updated).unwrap_or_default(),
        })));
    }

    *state.runtime_config.write() = updated.clone();
    info!(changes = ?changes, "runtime config updated via API");

    // Save to disk (best-effort).
    if let Err(e) = updated.save("forecast_config.json") {
        warn!(error = %e, "failed to save runtime config to disk");
    }

    state.increment_version();

    // Recompute the cached forecast under the new settings (best-effort:
    // the config change itself stands even if no history is loaded yet).
    if let Err(e) = state.refresh_forecast() {
        warn!(error = %e, "forecast refresh after config update failed");
        state.push_error(format!("forecast refresh failed: {e}"));
    }

    Ok(Json(serde_json::json!({
        "changes": changes,
        "config": serde_json::to_value(&updated).unwrap_or_default(),
    })))
}
