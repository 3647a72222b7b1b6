// =============================================================================
// Startup Forecast Report
// =============================================================================
//
// Renders a forecast as human-readable report lines and emits them through
// `tracing` at startup, so a terminal run shows the full picture without
// opening the dashboard.

use tracing::info;

use crate::forecast::Forecast;

/// Render the forecast as plain report lines.
pub fn summary_lines(forecast: &Forecast) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!(
        "data: {} to {} ({} of {} rows clean)",
        forecast.first_date, forecast.last_date, forecast.clean_rows, forecast.raw_rows
    ));
    lines.push(format!("last observed date: {}", forecast.last_date));
    lines.push(format!("current state: {}", forecast.current_state));

    lines.push("next-day state probabilities:".to_string());
    for (state, p) in &forecast.next_day_probabilities {
        lines.push(format!("  {state}: {:.2}%", p * 100.0));
    }

    lines.push(format!(
        "predicted next-day state: {}",
        forecast.predicted_state
    ));

    lines.push(format!(
        "simulated distribution after {} steps ({} trials):",
        forecast.simulation_steps, forecast.simulation_trials
    ));
    for (state, p) in &forecast.simulation {
        lines.push(format!("  {state}: {:.2}%", p * 100.0));
    }

    lines
}

/// Log the forecast report at info level.
pub fn log_forecast(forecast: &Forecast) {
    info!(
        current_state = %forecast.current_state,
        predicted_state = %forecast.predicted_state,
        last_date = %forecast.last_date,
        "forecast ready"
    );
    for line in summary_lines(forecast) {
        info!("{line}");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::{run_forecast, ForecastParams};
    use crate::market_data::{PriceHistory, PricePoint};
    use crate::markov::StateThresholds;
    use chrono::NaiveDate;

    fn sample_forecast() -> Forecast {
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
        let history = PriceHistory::new(points, closes.len()).unwrap();
        let params = ForecastParams {
            thresholds: StateThresholds::new(-0.002, 0.002).unwrap(),
            steps: 4,
            trials: 100,
            seed: Some(21),
        };
        run_forecast(&history, &params).unwrap()
    }

    #[test]
    fn test_report_covers_all_sections() {
        let forecast = sample_forecast();
        let lines = summary_lines(&forecast);
        let text = lines.join("\n");

        assert!(text.contains("last observed date: 2024-01-05"));
        assert!(text.contains("current state: down"));
        assert!(text.contains("next-day state probabilities:"));
        assert!(text.contains("  up: 100.00%"));
        assert!(text.contains("predicted next-day state: up"));
        assert!(text.contains("simulated distribution after 4 steps (100 trials):"));
    }

    #[test]
    fn test_probability_lines_are_percent_formatted() {
        let forecast = sample_forecast();
        let lines = summary_lines(&forecast);
        assert!(lines.iter().any(|l| l.trim_start().ends_with('%')));
    }
}
