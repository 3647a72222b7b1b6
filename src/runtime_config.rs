// =============================================================================
// Runtime Configuration — Hot-reloadable forecaster settings with atomic save
// =============================================================================
//
// Central configuration hub for the forecaster.  Every tunable parameter
// lives here so that thresholds and simulation settings can be reconfigured
// at runtime without a restart.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::markov::StateThresholds;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_csv_path() -> String {
    "data/prices.csv".to_string()
}

fn default_down_threshold() -> f64 {
    -0.002
}

fn default_up_threshold() -> f64 {
    0.002
}

fn default_simulation_steps() -> u32 {
    10
}

fn default_simulation_trials() -> u32 {
    1000
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the forecaster.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Data source ---------------------------------------------------------

    /// Path to the daily price CSV.
    #[serde(default = "default_csv_path")]
    pub csv_path: String,

    // --- State classification ------------------------------------------------

    /// Returns strictly below this value classify as `down`.
    #[serde(default = "default_down_threshold")]
    pub down_threshold: f64,

    /// Returns strictly above this value classify as `up`.
    #[serde(default = "default_up_threshold")]
    pub up_threshold: f64,

    // --- Simulation ----------------------------------------------------------

    /// Number of transitions per simulated path. Must be > 0.
    #[serde(default = "default_simulation_steps")]
    pub simulation_steps: u32,

    /// Number of independent simulated paths. Must be > 0.
    #[serde(default = "default_simulation_trials")]
    pub simulation_trials: u32,

    /// Fixed RNG seed for reproducible simulations; `None` seeds from
    /// entropy.
    #[serde(default)]
    pub simulation_seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            down_threshold: default_down_threshold(),
            up_threshold: default_up_threshold(),
            simulation_steps: default_simulation_steps(),
            simulation_trials: default_simulation_trials(),
            simulation_seed: None,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            csv_path = %config.csv_path,
            down_threshold = config.down_threshold,
            up_threshold = config.up_threshold,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    ///
    /// This prevents corruption if the process crashes mid-write.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        // Atomic write: write to a temporary sibling file, then rename.
        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Check cross-field constraints: threshold ordering and positive
    /// simulation sizes.
    pub fn validate(&self) -> Result<()> {
        StateThresholds::new(self.down_threshold, self.up_threshold)
            .context("invalid classification thresholds")?;

        if self.simulation_steps == 0 {
            bail!("simulation_steps must be greater than 0");
        }
        if self.simulation_trials == 0 {
            bail!("simulation_trials must be greater than 0");
        }
        Ok(())
    }
}
