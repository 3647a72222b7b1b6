// =============================================================================
// Horizon Forecast — Main Entry Point
// =============================================================================
//
// Loads the configured price CSV, computes the initial forecast, logs the
// startup report, and serves the dashboard + JSON API. If the CSV cannot be
// loaded the API still starts so the dashboard can surface the error.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod forecast;
mod market_data;
mod markov;
mod report;
mod runtime_config;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Horizon Forecast — Starting Up                    ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = RuntimeConfig::load("forecast_config.json").unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Override the CSV path from env if available.
    if let Ok(path) = std::env::var("HORIZON_CSV_PATH") {
        if !path.trim().is_empty() {
            config.csv_path = path.trim().to_string();
        }
    }

    config.validate().context("invalid runtime configuration")?;

    info!(
        csv_path = %config.csv_path,
        down_threshold = config.down_threshold,
        up_threshold = config.up_threshold,
        steps = config.simulation_steps,
        trials = config.simulation_trials,
        "forecaster configured"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(config));

    // ── 3. Load prices & compute the initial forecast ────────────────────
    let csv_path = state.runtime_config.read().csv_path.clone();
    match market_data::load_prices(&csv_path) {
        Ok(history) => {
            state.set_price_history(history);
            match state.refresh_forecast() {
                Ok(forecast) => report::log_forecast(&forecast),
                Err(e) => {
                    error!(error = %e, "initial forecast failed");
                    state.push_error(format!("initial forecast failed: {e}"));
                }
            }
        }
        Err(e) => {
            error!(path = %csv_path, error = %e, "failed to load price history — serving API without a forecast");
            state.push_error(format!("failed to load price history: {e}"));
        }
    }

    // ── 4. Start the API server ──────────────────────────────────────────
    let api_state = state.clone();
    let bind_addr =
        std::env::var("HORIZON_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3001".into());
    let bind_addr_clone = bind_addr.clone();

    tokio::spawn(async move {
        let app = api::rest::router(api_state);
        let listener = tokio::net::TcpListener::bind(&bind_addr_clone)
            .await
            .expect("Failed to bind API server");
        info!(addr = %bind_addr_clone, "API server listening");
        axum::serve(listener, app)
            .await
            .expect("API server failed");
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 5. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    if let Err(e) = state.runtime_config.read().save("forecast_config.json") {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Horizon Forecast shut down complete.");
    Ok(())
}
