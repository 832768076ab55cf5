//! Deployment configuration
//!
//! All aggregation tunables and source settings as operator-tunable TOML
//! values. Each struct implements `Default` with the documented constants,
//! so behavior is unchanged when no config file is present.
//!
//! ## Loading Order
//!
//! 1. `TIDEWATCH_CONFIG` environment variable (path to TOML file)
//! 2. `tidewatch.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The config is passed explicitly into the aggregation engine: there is no
//! process-wide config state, and one process may aggregate concurrent
//! batches under different configs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::aggregation::{DEFAULT_DISAGREEMENT_NORM, DEFAULT_HUBER_K, DEFAULT_MAD_FLOOR};

/// Env var holding the path to a config file.
pub const CONFIG_ENV_VAR: &str = "TIDEWATCH_CONFIG";

/// Default config filename searched in the working directory.
pub const CONFIG_FILENAME: &str = "tidewatch.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a tidewatch deployment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TidewatchConfig {
    /// Aggregation engine tunables
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Classification source settings
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl TidewatchConfig {
    /// Load configuration using the standard search order:
    /// 1. `$TIDEWATCH_CONFIG` environment variable
    /// 2. `./tidewatch.toml`
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from TIDEWATCH_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from TIDEWATCH_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "TIDEWATCH_CONFIG points to non-existent file, falling back");
            }
        }

        let local = Path::new(CONFIG_FILENAME);
        if local.exists() {
            match Self::load_from_file(local) {
                Ok(config) => {
                    info!(path = CONFIG_FILENAME, "Loaded config from working directory");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse local config, using defaults");
                }
            }
        }

        info!("No config file found, using built-in defaults");
        Self::default()
    }

    /// Parse a TOML config file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

// ============================================================================
// Aggregation tunables
// ============================================================================

/// Tunables for the consensus engine, with the documented defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Huber multiplier on the weighted severity MAD
    #[serde(default = "default_huber_k")]
    pub huber_k: f64,

    /// Floor on the winsorization half-width
    #[serde(default = "default_mad_floor")]
    pub mad_floor: f64,

    /// Severity MAD at which the confidence agreement factor reaches zero
    #[serde(default = "default_disagreement_norm")]
    pub disagreement_norm: f64,

    /// Weak-link confidence penalty coefficient (0.0 disables)
    #[serde(default = "default_min_penalty_k")]
    pub min_penalty_k: f64,

    /// Ballot weight for the reporter's self-declared hazard category
    #[serde(default = "default_reporter_prior_weight")]
    pub reporter_prior_weight: u32,
}

const fn default_huber_k() -> f64 {
    DEFAULT_HUBER_K
}
const fn default_mad_floor() -> f64 {
    DEFAULT_MAD_FLOOR
}
const fn default_disagreement_norm() -> f64 {
    DEFAULT_DISAGREEMENT_NORM
}
/// The deployed system opts into the weak-link penalty at 0.3.
const fn default_min_penalty_k() -> f64 {
    0.3
}
/// Reporter prior: 80 of a notional 100-point scale.
const fn default_reporter_prior_weight() -> u32 {
    80
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            huber_k: default_huber_k(),
            mad_floor: default_mad_floor(),
            disagreement_norm: default_disagreement_norm(),
            min_penalty_k: default_min_penalty_k(),
            reporter_prior_weight: default_reporter_prior_weight(),
        }
    }
}

// ============================================================================
// Source settings
// ============================================================================

/// Settings for the classification source fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Chat-completions endpoint base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model slugs queried independently for every report
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Sampling temperature for classification requests
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Response token cap per classification request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_models() -> Vec<String> {
    vec![
        "openai/gpt-4o-mini".to_string(),
        "google/gemini-2.0-flash-001".to_string(),
        "deepseek/deepseek-r1-distill-llama-70b".to_string(),
    ]
}

const fn default_temperature() -> f64 {
    0.1
}
const fn default_max_tokens() -> u32 {
    500
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            models: default_models(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}
